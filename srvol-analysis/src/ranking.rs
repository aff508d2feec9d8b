//! Ordering of crystals by decreasing simulated energy.

use std::cmp::Ordering;

use srvol_core::ChannelId;

use crate::error::Result;
use crate::store::ChannelEnergyStore;

/// Sorts channels by decreasing simulated energy.
///
/// The sort is stable: channels with equal energies keep their input order.
/// The ranking only orders; deciding which channels are of high interest is
/// left to the caller.
pub fn rank(ids: &[ChannelId], store: &ChannelEnergyStore) -> Result<Vec<ChannelId>> {
    let mut keyed = ids
        .iter()
        .map(|id| store.sim_energy(id).map(|energy| (*id, energy)))
        .collect::<Result<Vec<_>>>()?;
    keyed.sort_by(|a, b| descending(a.1, b.1));
    Ok(keyed.into_iter().map(|(id, _)| id).collect())
}

/// The `n` channels with the largest simulated energies, in ranking order.
pub fn leading(ids: &[ChannelId], store: &ChannelEnergyStore, n: usize) -> Result<Vec<ChannelId>> {
    let mut ranked = rank(ids, store)?;
    ranked.truncate(n);
    Ok(ranked)
}

// Larger energy first. NaN sorts last so the order stays total.
fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => b.total_cmp(&a),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use srvol_core::BarrelCrystal;

    fn ids(n: i32) -> Vec<ChannelId> {
        (1..=n)
            .map(|iphi| BarrelCrystal::new(1, iphi).unwrap().into())
            .collect()
    }

    fn store_with(ids: &[ChannelId], energies: &[f64]) -> ChannelEnergyStore {
        let mut store = ChannelEnergyStore::new();
        for (id, &energy) in ids.iter().zip(energies) {
            store.accumulate(id, energy, true).unwrap();
        }
        store
    }

    #[test]
    fn test_ties_keep_input_order() {
        let ids = ids(3);
        let store = store_with(&ids, &[5.0, 5.0, 3.0]);
        assert_eq!(rank(&ids, &store).unwrap(), vec![ids[0], ids[1], ids[2]]);

        let reversed = vec![ids[1], ids[0], ids[2]];
        assert_eq!(rank(&reversed, &store).unwrap(), reversed);
    }

    #[test]
    fn test_descending_order() {
        let ids = ids(5);
        let store = store_with(&ids, &[0.5, 7.0, 0.0, 3.0, 7.5]);
        assert_eq!(
            rank(&ids, &store).unwrap(),
            vec![ids[4], ids[1], ids[3], ids[0], ids[2]]
        );
    }

    #[test]
    fn test_leading() {
        let ids = ids(4);
        let store = store_with(&ids, &[1.0, 4.0, 2.0, 3.0]);
        assert_eq!(leading(&ids, &store, 2).unwrap(), vec![ids[1], ids[3]]);
        assert_eq!(leading(&ids, &store, 10).unwrap().len(), 4);
        assert!(leading(&ids, &store, 0).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_channel_is_an_error() {
        let store = ChannelEnergyStore::new();
        let bad = [ChannelId::Barrel(BarrelCrystal { ieta: 1, iphi: 0 })];
        assert!(rank(&bad, &store).is_err());
    }

    #[test]
    fn test_nan_sorts_last() {
        let ids = ids(3);
        let store = store_with(&ids, &[f64::NAN, 1.0, 2.0]);
        assert_eq!(rank(&ids, &store).unwrap(), vec![ids[2], ids[1], ids[0]]);
    }
}
