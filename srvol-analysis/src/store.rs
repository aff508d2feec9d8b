//! Per-crystal energy table filled once per event.
//!
//! The table covers every barrel crystal and every endcap grid cell. It is
//! zeroed by [`ChannelEnergyStore::reset`] at the start of each event and
//! only read after the event has been filled.

use serde::Serialize;
use srvol_core::channel::{
    BarrelCrystal, ChannelId, EndcapCrystal, N_BARREL_CRYSTALS, N_ENDCAP_CELLS,
};

use crate::error::Result;

/// Digi collection a reconstructed energy comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readout {
    /// Zero-suppressed (selective readout) digis.
    ZeroSuppressed,
    /// Unsuppressed digis.
    Unsuppressed,
}

/// Energies recorded for one crystal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CrystalEnergies {
    /// Sum of simulated hit energies.
    pub sim_e: f64,
    /// Energy reconstructed from the unsuppressed digi.
    pub no_zs_rec_e: f64,
    /// Energy reconstructed from the zero-suppressed digi.
    pub rec_e: f64,
    /// Number of simulated hits.
    pub sim_hits: u32,
    /// Crystal phi position in degrees.
    pub phi: f64,
    /// Crystal eta position.
    pub eta: f64,
}

/// Dense table of [`CrystalEnergies`] for both subdetectors.
#[derive(Debug, Clone)]
pub struct ChannelEnergyStore {
    barrel: Vec<CrystalEnergies>,
    endcap: Vec<CrystalEnergies>,
}

impl Default for ChannelEnergyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelEnergyStore {
    /// Creates a zeroed store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            barrel: vec![CrystalEnergies::default(); N_BARREL_CRYSTALS],
            endcap: vec![CrystalEnergies::default(); N_ENDCAP_CELLS],
        }
    }

    /// Zeroes every entry of both tables.
    pub fn reset(&mut self) {
        self.barrel.fill(CrystalEnergies::default());
        self.endcap.fill(CrystalEnergies::default());
    }

    fn slot(&self, id: &ChannelId) -> Result<&CrystalEnergies> {
        Ok(match id {
            ChannelId::Barrel(crystal) => &self.barrel[crystal.dense_index()?],
            ChannelId::Endcap(crystal) => &self.endcap[crystal.dense_index()?],
        })
    }

    fn slot_mut(&mut self, id: &ChannelId) -> Result<&mut CrystalEnergies> {
        Ok(match id {
            ChannelId::Barrel(crystal) => &mut self.barrel[crystal.dense_index()?],
            ChannelId::Endcap(crystal) => &mut self.endcap[crystal.dense_index()?],
        })
    }

    /// Adds a simulated energy deposit, counting a hit when `has_sim_hit`.
    pub fn accumulate(&mut self, id: &ChannelId, sim_energy: f64, has_sim_hit: bool) -> Result<()> {
        let entry = self.slot_mut(id)?;
        entry.sim_e += sim_energy;
        if has_sim_hit {
            entry.sim_hits += 1;
        }
        Ok(())
    }

    /// Overwrites one of the two reconstructed energies.
    pub fn set_reconstructed(&mut self, id: &ChannelId, readout: Readout, value: f64) -> Result<()> {
        let entry = self.slot_mut(id)?;
        match readout {
            Readout::ZeroSuppressed => entry.rec_e = value,
            Readout::Unsuppressed => entry.no_zs_rec_e = value,
        }
        Ok(())
    }

    /// Records the crystal position.
    pub fn set_position(&mut self, id: &ChannelId, eta: f64, phi_deg: f64) -> Result<()> {
        let entry = self.slot_mut(id)?;
        entry.eta = eta;
        entry.phi = phi_deg;
        Ok(())
    }

    /// Copy of the entry of a channel.
    pub fn get(&self, id: &ChannelId) -> Result<CrystalEnergies> {
        self.slot(id).copied()
    }

    /// Simulated energy of a channel.
    pub fn sim_energy(&self, id: &ChannelId) -> Result<f64> {
        self.slot(id).map(|entry| entry.sim_e)
    }

    /// All barrel entries with their crystal.
    pub fn barrel(&self) -> impl Iterator<Item = (BarrelCrystal, &CrystalEnergies)> {
        self.barrel.iter().enumerate().filter_map(|(index, entry)| {
            BarrelCrystal::from_dense_index(index)
                .ok()
                .map(|crystal| (crystal, entry))
        })
    }

    /// All endcap grid entries with their cell.
    pub fn endcap(&self) -> impl Iterator<Item = (EndcapCrystal, &CrystalEnergies)> {
        self.endcap.iter().enumerate().filter_map(|(index, entry)| {
            EndcapCrystal::from_dense_index(index)
                .ok()
                .map(|crystal| (crystal, entry))
        })
    }
}
