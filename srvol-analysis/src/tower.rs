//! Trigger-tower transverse-energy sums.

use srvol_core::channel::{BarrelCrystal, TriggerTower, N_TRIGGER_TOWERS};

use crate::error::Result;

/// Sum of crystal transverse energies per trigger tower.
#[derive(Debug, Clone)]
pub struct TowerEtSums {
    sums: Vec<f64>,
}

impl Default for TowerEtSums {
    fn default() -> Self {
        Self::new()
    }
}

impl TowerEtSums {
    /// Creates a zeroed table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sums: vec![0.0; N_TRIGGER_TOWERS],
        }
    }

    /// Zeroes every tower.
    pub fn reset(&mut self) {
        self.sums.fill(0.0);
    }

    /// Adds transverse energy to a tower.
    pub fn add(&mut self, tower: &TriggerTower, et: f64) -> Result<()> {
        self.sums[tower.dense_index()?] += et;
        Ok(())
    }

    /// Adds the transverse energy of a barrel crystal deposit to its tower.
    pub fn add_barrel_crystal(&mut self, crystal: &BarrelCrystal, energy: f64, eta: f64) -> Result<()> {
        self.add(&crystal.tower()?, energy / eta.cosh())
    }

    /// Transverse-energy sum of a tower.
    pub fn get(&self, tower: &TriggerTower) -> Result<f64> {
        Ok(self.sums[tower.dense_index()?])
    }

    /// Towers with a non-zero sum.
    pub fn active(&self) -> impl Iterator<Item = (TriggerTower, f64)> + '_ {
        self.sums
            .iter()
            .enumerate()
            .filter(|(_, &et)| et != 0.0)
            .filter_map(|(index, &et)| TriggerTower::from_dense_index(index).ok().map(|tt| (tt, et)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_crystal_deposits_sum_into_tower() {
        let mut sums = TowerEtSums::new();
        let a = BarrelCrystal::new(1, 11).unwrap();
        let b = BarrelCrystal::new(5, 15).unwrap();
        sums.add_barrel_crystal(&a, 2.0, 0.0).unwrap();
        sums.add_barrel_crystal(&b, 1.0, 0.0).unwrap();
        let tower = TriggerTower::new(1, 1).unwrap();
        assert_relative_eq!(sums.get(&tower).unwrap(), 3.0);
        assert_eq!(sums.active().count(), 1);
    }

    #[test]
    fn test_transverse_projection() {
        let mut sums = TowerEtSums::new();
        let crystal = BarrelCrystal::new(-60, 100).unwrap();
        sums.add_barrel_crystal(&crystal, 10.0, -1.0).unwrap();
        let tower = crystal.tower().unwrap();
        assert_relative_eq!(sums.get(&tower).unwrap(), 10.0 / 1.0_f64.cosh());
    }

    #[test]
    fn test_reset() {
        let mut sums = TowerEtSums::new();
        let tower = TriggerTower::new(-28, 72).unwrap();
        sums.add(&tower, 5.0).unwrap();
        sums.reset();
        assert_relative_eq!(sums.get(&tower).unwrap(), 0.0);
        assert_eq!(sums.active().count(), 0);
    }

    #[test]
    fn test_invalid_tower() {
        let mut sums = TowerEtSums::new();
        assert!(sums.add(&TriggerTower { ieta: 29, iphi: 1 }, 1.0).is_err());
    }
}
