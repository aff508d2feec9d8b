//! Fixed electronics and grid layout of the calorimeter readout.
//!
//! All board counts, grid sizes and readout-unit tables live here so the
//! per-board and per-subdetector totals can be audited in one place.
//! Logical DCC numbers are 0-based unless stated otherwise.
#![allow(clippy::cast_possible_wrap)]

use crate::channel::Subdetector;
use crate::error::{Error, Result};

/// Number of bytes in one kByte.
pub const KBYTE: f64 = 1024.0;

/// Total number of DCCs.
pub const N_DCCS: usize = 54;
/// Number of barrel DCCs.
pub const N_EB_DCCS: usize = 36;
/// Number of endcap DCCs.
pub const N_EE_DCCS: usize = 18;

/// First barrel DCC (0-based). Boards below are EE-.
pub const FIRST_EB_DCC: usize = 9;
/// First EE+ DCC (0-based). Boards from here on are EE+.
pub const FIRST_EE_PLUS_DCC: usize = 45;

/// Trigger towers read by one barrel DCC.
pub const EB_RUS_PER_DCC: u32 = 68;

/// Readout units of the barrel.
pub const N_EB_RUS: u32 = 36 * 68;
/// Readout units of the endcaps (supercrystals, partial ones included).
pub const N_EE_RUS: u32 = 2 * (34 + 32 + 33 + 33 + 32 + 34 + 33 + 34 + 33);

/// Number of endcaps.
pub const N_ENDCAPS: usize = 2;
/// Crystals along eta in the barrel.
pub const N_EB_ETA: usize = 170;
/// Crystals along phi in the barrel.
pub const N_EB_PHI: usize = 360;
/// Endcap crystal grid size along x.
pub const N_EE_X: usize = 100;
/// Endcap crystal grid size along y.
pub const N_EE_Y: usize = 100;
/// Crystals along a supercrystal edge.
pub const SC_EDGE: usize = 5;
/// Trigger towers along eta.
pub const N_TT_ETA: usize = 56;
/// Trigger towers along phi.
pub const N_TT_PHI: usize = 72;

/// Supercrystals per EE- DCC, boards 0..=8.
const EE_MINUS_RUS: [u32; 9] = [34, 32, 33, 33, 32, 34, 33, 34, 33];
/// Supercrystals per EE+ DCC, boards 45..=53.
const EE_PLUS_RUS: [u32; 9] = [32, 33, 33, 32, 34, 33, 34, 33, 34];

const fn standard_ru_counts() -> [u32; N_DCCS] {
    let mut counts = [EB_RUS_PER_DCC; N_DCCS];
    let mut i = 0;
    while i < EE_MINUS_RUS.len() {
        counts[i] = EE_MINUS_RUS[i];
        counts[FIRST_EE_PLUS_DCC + i] = EE_PLUS_RUS[i];
        i += 1;
    }
    counts
}

/// Readout units per DCC for the installed electronics.
pub const STANDARD_RU_COUNTS: [u32; N_DCCS] = standard_ru_counts();

/// Subdetector read by a DCC.
///
/// Boards `0..9` and `45..54` read the endcaps, the rest the barrel.
pub fn subdetector_of_dcc(dcc: usize) -> Result<Subdetector> {
    if dcc >= N_DCCS {
        return Err(Error::InvalidDcc(dcc as i64));
    }
    if dcc < FIRST_EB_DCC || dcc >= FIRST_EE_PLUS_DCC {
        Ok(Subdetector::Endcap)
    } else {
        Ok(Subdetector::Barrel)
    }
}

/// Converts a 1-based DCC logical number to the 0-based form.
pub fn dcc_from_logical(logical: i64) -> Result<usize> {
    if (1..=N_DCCS as i64).contains(&logical) {
        Ok((logical - 1) as usize)
    } else {
        Err(Error::InvalidDcc(logical))
    }
}

/// Per-board readout-unit counts together with the subdetector totals they
/// must add up to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardLayout {
    ru_counts: [u32; N_DCCS],
    barrel_total: u32,
    endcap_total: u32,
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self::standard()
    }
}

impl BoardLayout {
    /// Layout of the installed electronics.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            ru_counts: STANDARD_RU_COUNTS,
            barrel_total: N_EB_RUS,
            endcap_total: N_EE_RUS,
        }
    }

    /// Creates a layout, rejecting it when the per-board counts do not sum
    /// to the given totals.
    pub fn new(ru_counts: [u32; N_DCCS], barrel_total: u32, endcap_total: u32) -> Result<Self> {
        let layout = Self {
            ru_counts,
            barrel_total,
            endcap_total,
        };
        layout.validate()?;
        Ok(layout)
    }

    /// Checks that each subdetector's boards sum to its total.
    pub fn validate(&self) -> Result<()> {
        for (subdetector, expected) in [
            (Subdetector::Barrel, self.barrel_total),
            (Subdetector::Endcap, self.endcap_total),
        ] {
            let actual: u64 = Self::boards(subdetector)
                .map(|dcc| u64::from(self.ru_counts[dcc]))
                .sum();
            let expected = u64::from(expected);
            if actual != expected {
                return Err(Error::InconsistentReadoutUnits {
                    subdetector,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Readout units read by a DCC.
    pub fn ru_count(&self, dcc: usize) -> Result<u32> {
        self.ru_counts
            .get(dcc)
            .copied()
            .ok_or(Error::InvalidDcc(dcc as i64))
    }

    /// Total readout units of a subdetector.
    #[must_use]
    pub fn total_ru(&self, subdetector: Subdetector) -> u32 {
        match subdetector {
            Subdetector::Barrel => self.barrel_total,
            Subdetector::Endcap => self.endcap_total,
        }
    }

    /// Number of DCCs reading a subdetector.
    #[must_use]
    pub fn dcc_count(subdetector: Subdetector) -> usize {
        match subdetector {
            Subdetector::Barrel => N_EB_DCCS,
            Subdetector::Endcap => N_EE_DCCS,
        }
    }

    /// 0-based numbers of the DCCs reading a subdetector.
    pub fn boards(subdetector: Subdetector) -> impl Iterator<Item = usize> {
        (0..N_DCCS).filter(move |&dcc| {
            let endcap = dcc < FIRST_EB_DCC || dcc >= FIRST_EE_PLUS_DCC;
            endcap == (subdetector == Subdetector::Endcap)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_layout_is_consistent() {
        let layout = BoardLayout::standard();
        assert!(layout.validate().is_ok());
        assert_eq!(N_EB_RUS, 2448);
        assert_eq!(N_EE_RUS, 596);
        assert_eq!(BoardLayout::boards(Subdetector::Barrel).count(), N_EB_DCCS);
        assert_eq!(BoardLayout::boards(Subdetector::Endcap).count(), N_EE_DCCS);
    }

    #[test]
    fn test_subdetector_boundaries() {
        for dcc in (0..9).chain(45..54) {
            assert_eq!(subdetector_of_dcc(dcc).unwrap(), Subdetector::Endcap);
        }
        for dcc in 9..45 {
            assert_eq!(subdetector_of_dcc(dcc).unwrap(), Subdetector::Barrel);
        }
        assert_eq!(subdetector_of_dcc(54), Err(Error::InvalidDcc(54)));
    }

    #[test]
    fn test_ru_counts() {
        let layout = BoardLayout::standard();
        assert_eq!(layout.ru_count(0).unwrap(), 34);
        assert_eq!(layout.ru_count(1).unwrap(), 32);
        assert_eq!(layout.ru_count(20).unwrap(), 68);
        assert_eq!(layout.ru_count(45).unwrap(), 32);
        assert_eq!(layout.ru_count(53).unwrap(), 34);
        assert!(layout.ru_count(54).is_err());
    }

    #[test]
    fn test_inconsistent_layout_rejected() {
        let mut counts = STANDARD_RU_COUNTS;
        counts[3] += 1;
        let err = BoardLayout::new(counts, N_EB_RUS, N_EE_RUS).unwrap_err();
        assert_eq!(
            err,
            Error::InconsistentReadoutUnits {
                subdetector: Subdetector::Endcap,
                expected: u64::from(N_EE_RUS),
                actual: u64::from(N_EE_RUS) + 1,
            }
        );
    }

    #[test]
    fn test_huge_counts_are_rejected_not_overflowed() {
        let err = BoardLayout::new([u32::MAX; N_DCCS], 0, 0).unwrap_err();
        assert_eq!(
            err,
            Error::InconsistentReadoutUnits {
                subdetector: Subdetector::Barrel,
                expected: 0,
                actual: N_EB_DCCS as u64 * u64::from(u32::MAX),
            }
        );

        let mut counts = STANDARD_RU_COUNTS;
        counts[0] = u32::MAX;
        assert!(matches!(
            BoardLayout::new(counts, N_EB_RUS, u32::MAX),
            Err(Error::InconsistentReadoutUnits {
                subdetector: Subdetector::Endcap,
                ..
            })
        ));
    }

    #[test]
    fn test_custom_layout_with_matching_totals() {
        let mut counts = STANDARD_RU_COUNTS;
        counts[10] = 60;
        let layout = BoardLayout::new(counts, N_EB_RUS - 8, N_EE_RUS).unwrap();
        assert_eq!(layout.total_ru(Subdetector::Barrel), 2440);
    }

    #[test]
    fn test_dcc_from_logical() {
        assert_eq!(dcc_from_logical(1).unwrap(), 0);
        assert_eq!(dcc_from_logical(54).unwrap(), 53);
        assert!(dcc_from_logical(0).is_err());
        assert!(dcc_from_logical(55).is_err());
    }
}
