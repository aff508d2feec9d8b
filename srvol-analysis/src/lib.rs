//! srvol-analysis: Per-event selective-readout analysis.
//!
//! This crate provides:
//! - **ChannelEnergyStore** - dense per-crystal energy table, reset every event
//! - **Ranking** - stable ordering of crystals by decreasing simulated energy
//! - **TowerEtSums** - trigger-tower transverse-energy sums, compared with
//!   trigger primitives
//! - **AmplitudeReconstructor** - weighted-sum energy from ADC samples
//! - **SelectiveReadoutAnalyzer** - data volume and energy bookkeeping per event
//!
#![warn(missing_docs)]

pub mod amplitude;
pub mod config;
pub mod error;
pub mod event;
mod processing;
pub mod ranking;
pub mod report;
pub mod store;
pub mod tower;

pub use amplitude::{AdcSample, AmplitudeReconstructor};
pub use config::AnalysisConfig;
pub use error::{Error, Result};
pub use event::{CrystalRecord, EventFile, EventRecord, Position, Reading, TriggerPrimitive};
pub use processing::{analyze_events, SelectiveReadoutAnalyzer};
pub use ranking::{leading, rank};
pub use report::{
    EnergyReport, EventReport, ReadCounts, RunSummary, Stat, TowerComparison, VolumeReport,
};
pub use store::{ChannelEnergyStore, CrystalEnergies, Readout};
pub use tower::TowerEtSums;

// Re-export core types for convenience
pub use srvol_core::{ChannelId, Subdetector, VolumeModel};
