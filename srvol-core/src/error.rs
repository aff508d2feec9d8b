//! Error types for srvol-core.

use thiserror::Error;

use crate::channel::Subdetector;

/// Result type alias for srvol operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Numbering space of a coordinate or dense index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Space {
    BarrelEta,
    BarrelPhi,
    EndcapXy,
    TowerEta,
    TowerPhi,
    BarrelCrystal,
    EndcapCrystal,
    TriggerTower,
}

impl std::fmt::Display for Space {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::BarrelEta => "barrel ieta",
            Self::BarrelPhi => "barrel iphi",
            Self::EndcapXy => "endcap ix/iy",
            Self::TowerEta => "trigger tower ieta",
            Self::TowerPhi => "trigger tower iphi",
            Self::BarrelCrystal => "barrel crystal",
            Self::EndcapCrystal => "endcap crystal",
            Self::TriggerTower => "trigger tower",
        };
        f.write_str(name)
    }
}

/// Core error types for srvol operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Native coordinate outside the documented domain of its space.
    #[error("invalid {space} coordinate: {value}")]
    InvalidCoordinate { space: Space, value: i32 },

    /// Dense index outside `[0, len)` of its space.
    #[error("invalid {space} index: {index} (expected < {len})")]
    InvalidIndex {
        space: Space,
        index: usize,
        len: usize,
    },

    /// DCC logical number outside the board layout.
    #[error("invalid DCC number: {0}")]
    InvalidDcc(i64),

    /// Per-board readout-unit counts disagree with the subdetector total.
    #[error("inconsistent {subdetector} readout units: boards sum to {actual}, expected {expected}")]
    InconsistentReadoutUnits {
        subdetector: Subdetector,
        expected: u64,
        actual: u64,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
