//! Channel identifiers and selective-readout flags.
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use std::fmt;

use crate::error::{Error, Result, Space};
use crate::index::{
    barrel_eta_to_index, barrel_phi_to_index, endcap_xy_to_index, index_to_barrel_eta,
    index_to_barrel_phi, index_to_endcap_xy, index_to_tower_eta, index_to_tower_phi,
    tower_eta_to_index, tower_phi_to_index,
};
use crate::layout::{N_EB_ETA, N_EB_PHI, N_EE_X, N_EE_Y, N_ENDCAPS, N_TT_ETA, N_TT_PHI};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Calorimeter partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Subdetector {
    /// Barrel (EB).
    Barrel,
    /// Endcaps (EE).
    Endcap,
}

impl fmt::Display for Subdetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Barrel => "EB",
            Self::Endcap => "EE",
        })
    }
}

/// Endcap side along z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EndcapSide {
    /// EE-.
    Minus,
    /// EE+.
    Plus,
}

impl EndcapSide {
    /// Index of the side: 0 for EE-, 1 for EE+.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Minus => 0,
            Self::Plus => 1,
        }
    }

    /// Inverse of [`EndcapSide::index`].
    pub fn from_index(index: usize) -> Result<Self> {
        match index {
            0 => Ok(Self::Minus),
            1 => Ok(Self::Plus),
            _ => Err(Error::InvalidIndex {
                space: Space::EndcapCrystal,
                index,
                len: N_ENDCAPS,
            }),
        }
    }
}

/// Barrel crystal in native numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BarrelCrystal {
    /// Eta index, `-85..=-1` or `1..=85`.
    pub ieta: i32,
    /// Phi index, `1..=360`.
    pub iphi: i32,
}

/// Number of barrel crystals.
pub const N_BARREL_CRYSTALS: usize = N_EB_ETA * N_EB_PHI;
/// Number of cells of the two endcap grids.
pub const N_ENDCAP_CELLS: usize = N_ENDCAPS * N_EE_X * N_EE_Y;
/// Number of trigger towers.
pub const N_TRIGGER_TOWERS: usize = N_TT_ETA * N_TT_PHI;

/// Eta width of a barrel crystal.
pub const EB_CRYSTAL_ETA_WIDTH: f64 = 0.0174;

impl BarrelCrystal {
    /// Creates a barrel crystal, checking the coordinates.
    pub fn new(ieta: i32, iphi: i32) -> Result<Self> {
        let crystal = Self { ieta, iphi };
        crystal.dense_index()?;
        Ok(crystal)
    }

    /// Dense `(eta, phi)` array indices.
    pub fn indices(&self) -> Result<(usize, usize)> {
        Ok((barrel_eta_to_index(self.ieta)?, barrel_phi_to_index(self.iphi)?))
    }

    /// Flat index in `0..N_BARREL_CRYSTALS`.
    pub fn dense_index(&self) -> Result<usize> {
        let (eta, phi) = self.indices()?;
        Ok(eta * N_EB_PHI + phi)
    }

    /// Inverse of [`BarrelCrystal::dense_index`].
    pub fn from_dense_index(index: usize) -> Result<Self> {
        if index >= N_BARREL_CRYSTALS {
            return Err(Error::InvalidIndex {
                space: Space::BarrelCrystal,
                index,
                len: N_BARREL_CRYSTALS,
            });
        }
        Ok(Self {
            ieta: index_to_barrel_eta(index / N_EB_PHI)?,
            iphi: index_to_barrel_phi(index % N_EB_PHI)?,
        })
    }

    /// Pseudorapidity of the crystal centre for an ideal barrel, where each
    /// crystal spans 0.0174 in eta.
    #[must_use]
    pub fn nominal_eta(&self) -> f64 {
        f64::from(self.ieta.signum()) * (f64::from(self.ieta.abs()) - 0.5) * EB_CRYSTAL_ETA_WIDTH
    }

    /// Trigger tower containing this crystal.
    ///
    /// Towers group 5x5 crystals; tower phi numbering starts two towers
    /// after crystal phi numbering.
    pub fn tower(&self) -> Result<TriggerTower> {
        self.indices()?;
        let tower_ieta = self.ieta.signum() * ((self.ieta.abs() - 1) / 5 + 1);
        let mut tower_iphi = (self.iphi - 1) / 5 + 1 - 2;
        if tower_iphi <= 0 {
            tower_iphi += N_TT_PHI as i32;
        }
        Ok(TriggerTower {
            ieta: tower_ieta,
            iphi: tower_iphi,
        })
    }
}

impl fmt::Display for BarrelCrystal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EB(ieta={}, iphi={})", self.ieta, self.iphi)
    }
}

/// Endcap crystal in native numbering.
///
/// Not every `(ix, iy)` cell holds a crystal; the physical map is owned by
/// the geometry service and is not checked here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EndcapCrystal {
    /// Endcap side.
    pub side: EndcapSide,
    /// X index, `1..=100`.
    pub ix: i32,
    /// Y index, `1..=100`.
    pub iy: i32,
}

impl EndcapCrystal {
    /// Creates an endcap crystal, checking the grid coordinates.
    pub fn new(side: EndcapSide, ix: i32, iy: i32) -> Result<Self> {
        let crystal = Self { side, ix, iy };
        crystal.dense_index()?;
        Ok(crystal)
    }

    /// Dense `(side, x, y)` array indices.
    pub fn indices(&self) -> Result<(usize, usize, usize)> {
        Ok((
            self.side.index(),
            endcap_xy_to_index(self.ix)?,
            endcap_xy_to_index(self.iy)?,
        ))
    }

    /// Flat index in `0..N_ENDCAP_CELLS`.
    pub fn dense_index(&self) -> Result<usize> {
        let (side, x, y) = self.indices()?;
        Ok((side * N_EE_X + x) * N_EE_Y + y)
    }

    /// Inverse of [`EndcapCrystal::dense_index`].
    pub fn from_dense_index(index: usize) -> Result<Self> {
        if index >= N_ENDCAP_CELLS {
            return Err(Error::InvalidIndex {
                space: Space::EndcapCrystal,
                index,
                len: N_ENDCAP_CELLS,
            });
        }
        Ok(Self {
            side: EndcapSide::from_index(index / (N_EE_X * N_EE_Y))?,
            ix: index_to_endcap_xy(index / N_EE_Y % N_EE_X)?,
            iy: index_to_endcap_xy(index % N_EE_Y)?,
        })
    }
}

impl fmt::Display for EndcapCrystal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.side {
            EndcapSide::Minus => '-',
            EndcapSide::Plus => '+',
        };
        write!(f, "EE{side}(ix={}, iy={})", self.ix, self.iy)
    }
}

/// Trigger tower in native numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TriggerTower {
    /// Eta index, `-28..=-1` or `1..=28`.
    pub ieta: i32,
    /// Phi index, `1..=72`.
    pub iphi: i32,
}

impl TriggerTower {
    /// Creates a trigger tower, checking the coordinates.
    pub fn new(ieta: i32, iphi: i32) -> Result<Self> {
        let tower = Self { ieta, iphi };
        tower.dense_index()?;
        Ok(tower)
    }

    /// Dense `(eta, phi)` array indices.
    pub fn indices(&self) -> Result<(usize, usize)> {
        Ok((tower_eta_to_index(self.ieta)?, tower_phi_to_index(self.iphi)?))
    }

    /// Flat index in `0..N_TRIGGER_TOWERS`.
    pub fn dense_index(&self) -> Result<usize> {
        let (eta, phi) = self.indices()?;
        Ok(eta * N_TT_PHI + phi)
    }

    /// Inverse of [`TriggerTower::dense_index`].
    pub fn from_dense_index(index: usize) -> Result<Self> {
        if index >= N_TRIGGER_TOWERS {
            return Err(Error::InvalidIndex {
                space: Space::TriggerTower,
                index,
                len: N_TRIGGER_TOWERS,
            });
        }
        Ok(Self {
            ieta: index_to_tower_eta(index / N_TT_PHI)?,
            iphi: index_to_tower_phi(index % N_TT_PHI)?,
        })
    }
}

impl fmt::Display for TriggerTower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TT(ieta={}, iphi={})", self.ieta, self.iphi)
    }
}

/// Crystal channel of either subdetector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ChannelId {
    /// Barrel crystal.
    Barrel(BarrelCrystal),
    /// Endcap crystal.
    Endcap(EndcapCrystal),
}

impl ChannelId {
    /// Subdetector the channel belongs to.
    #[inline]
    #[must_use]
    pub fn subdetector(&self) -> Subdetector {
        match self {
            Self::Barrel(_) => Subdetector::Barrel,
            Self::Endcap(_) => Subdetector::Endcap,
        }
    }

    /// Checks the coordinates against their domains.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Barrel(crystal) => crystal.dense_index().map(|_| ()),
            Self::Endcap(crystal) => crystal.dense_index().map(|_| ()),
        }
    }
}

impl From<BarrelCrystal> for ChannelId {
    fn from(crystal: BarrelCrystal) -> Self {
        Self::Barrel(crystal)
    }
}

impl From<EndcapCrystal> for ChannelId {
    fn from(crystal: EndcapCrystal) -> Self {
        Self::Endcap(crystal)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Barrel(crystal) => crystal.fmt(f),
            Self::Endcap(crystal) => crystal.fmt(f),
        }
    }
}

/// Selective-readout flag of a readout unit.
///
/// The low two bits carry the readout mode, bit 2 marks a flag forced by
/// the readout electronics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SrFlag(pub u8);

impl SrFlag {
    /// Readout unit not read.
    pub const SUPPRESS: Self = Self(0);
    /// Zero suppression, first threshold.
    pub const ZS1: Self = Self(1);
    /// Zero suppression, second threshold.
    pub const ZS2: Self = Self(2);
    /// Full readout.
    pub const FULL: Self = Self(3);
    /// Forced-flag bit.
    pub const FORCED_MASK: u8 = 0x4;

    /// Readout mode with the forced bit cleared.
    #[inline]
    #[must_use]
    pub fn mode(self) -> Self {
        Self(self.0 & !Self::FORCED_MASK)
    }

    /// Whether the flag was forced.
    #[inline]
    #[must_use]
    pub fn is_forced(self) -> bool {
        self.0 & Self::FORCED_MASK != 0
    }

    /// Whether the unit is read in full (high interest).
    #[inline]
    #[must_use]
    pub fn is_high_interest(self) -> bool {
        self.mode() == Self::FULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_barrel_dense_index_bijection() {
        let mut seen = vec![false; N_BARREL_CRYSTALS];
        for ieta in (-85..=-1).chain(1..=85) {
            for iphi in 1..=360 {
                let crystal = BarrelCrystal::new(ieta, iphi).unwrap();
                let index = crystal.dense_index().unwrap();
                assert!(!seen[index]);
                seen[index] = true;
                assert_eq!(BarrelCrystal::from_dense_index(index).unwrap(), crystal);
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_endcap_dense_index_bijection() {
        let mut seen = vec![false; N_ENDCAP_CELLS];
        for side in [EndcapSide::Minus, EndcapSide::Plus] {
            for ix in 1..=100 {
                for iy in 1..=100 {
                    let crystal = EndcapCrystal::new(side, ix, iy).unwrap();
                    let index = crystal.dense_index().unwrap();
                    assert!(!seen[index]);
                    seen[index] = true;
                    assert_eq!(EndcapCrystal::from_dense_index(index).unwrap(), crystal);
                }
            }
        }
        assert!(seen.iter().all(|&s| s));
        assert!(EndcapCrystal::from_dense_index(N_ENDCAP_CELLS).is_err());
    }

    #[test]
    fn test_tower_dense_index_bijection() {
        for index in 0..N_TRIGGER_TOWERS {
            let tower = TriggerTower::from_dense_index(index).unwrap();
            assert_eq!(tower.dense_index().unwrap(), index);
        }
        assert!(TriggerTower::from_dense_index(N_TRIGGER_TOWERS).is_err());
    }

    #[test]
    fn test_invalid_channels() {
        assert!(BarrelCrystal::new(0, 1).is_err());
        assert!(BarrelCrystal::new(1, 361).is_err());
        assert!(EndcapCrystal::new(EndcapSide::Plus, 0, 50).is_err());
        let raw = ChannelId::Barrel(BarrelCrystal { ieta: 90, iphi: 1 });
        assert_eq!(
            raw.validate(),
            Err(Error::InvalidCoordinate {
                space: Space::BarrelEta,
                value: 90
            })
        );
    }

    #[test]
    fn test_crystal_to_tower() {
        let tower = |ieta, iphi| BarrelCrystal::new(ieta, iphi).unwrap().tower().unwrap();
        assert_eq!(tower(1, 11), TriggerTower { ieta: 1, iphi: 1 });
        assert_eq!(tower(5, 15), TriggerTower { ieta: 1, iphi: 1 });
        assert_eq!(tower(6, 16), TriggerTower { ieta: 2, iphi: 2 });
        assert_eq!(tower(-85, 1), TriggerTower { ieta: -17, iphi: 71 });
        assert_eq!(tower(85, 360), TriggerTower { ieta: 17, iphi: 70 });
    }

    #[test]
    fn test_every_barrel_crystal_has_a_valid_tower() {
        for ieta in (-85..=-1).chain(1..=85) {
            for iphi in 1..=360 {
                let tower = BarrelCrystal { ieta, iphi }.tower().unwrap();
                assert!(tower.dense_index().is_ok());
            }
        }
    }

    #[test]
    fn test_nominal_eta() {
        let crystal = BarrelCrystal::new(1, 1).unwrap();
        assert!((crystal.nominal_eta() - 0.0087).abs() < 1e-12);
        let crystal = BarrelCrystal::new(-85, 1).unwrap();
        assert!((crystal.nominal_eta() + 84.5 * 0.0174).abs() < 1e-12);
    }

    #[test]
    fn test_sr_flags() {
        assert!(SrFlag::FULL.is_high_interest());
        assert!(SrFlag(SrFlag::FULL.0 | SrFlag::FORCED_MASK).is_high_interest());
        assert!(SrFlag(SrFlag::FULL.0 | SrFlag::FORCED_MASK).is_forced());
        assert!(!SrFlag::ZS1.is_high_interest());
        assert!(!SrFlag(SrFlag::ZS2.0 | SrFlag::FORCED_MASK).is_high_interest());
        assert_eq!(SrFlag::default(), SrFlag::SUPPRESS);
    }

    #[test]
    fn test_display() {
        let id: ChannelId = BarrelCrystal { ieta: -3, iphi: 7 }.into();
        assert_eq!(id.to_string(), "EB(ieta=-3, iphi=7)");
        let id: ChannelId = EndcapCrystal {
            side: EndcapSide::Plus,
            ix: 10,
            iy: 20,
        }
        .into();
        assert_eq!(id.to_string(), "EE+(ix=10, iy=20)");
        assert_eq!(id.subdetector(), Subdetector::Endcap);
    }

    #[test]
    fn test_subdetector_honors_width() {
        assert_eq!(format!("[{:<4}]", Subdetector::Barrel), "[EB  ]");
        assert_eq!(format!("[{:>4}]", Subdetector::Endcap), "[  EE]");
    }
}
