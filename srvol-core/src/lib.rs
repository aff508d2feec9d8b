//! srvol-core: Channel numbering and event-size model for calorimeter
//! selective readout.
//!
//! This crate provides the dense index maps between native detector
//! numbering and array indices, the fixed DCC board layout, and the
//! formulas giving the raw event-fragment size of each readout board.
//!

pub mod channel;
pub mod error;
pub mod index;
pub mod layout;
pub mod volume;

pub use channel::{
    BarrelCrystal, ChannelId, EndcapCrystal, EndcapSide, SrFlag, Subdetector, TriggerTower,
};
pub use error::{Error, Result, Space};
pub use layout::BoardLayout;
pub use volume::VolumeModel;
