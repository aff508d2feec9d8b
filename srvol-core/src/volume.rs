//! Raw event-fragment size model of the calorimeter DCCs.
//!
//! A DCC fragment is a fixed header/trailer, one 64-bit word per readout
//! unit for its flag, and three 64-bit words per read crystal channel.
#![allow(clippy::cast_precision_loss)]

use crate::channel::Subdetector;
use crate::error::Result;
use crate::layout::{subdetector_of_dcc, BoardLayout, KBYTE};

/// Bytes in one DAQ word.
const WORD: f64 = 8.0;

/// Fixed part of a DCC fragment, in bytes.
#[inline]
#[must_use]
pub fn board_overhead(subdetector: Subdetector) -> f64 {
    match subdetector {
        Subdetector::Barrel => 33.0 * WORD,
        Subdetector::Endcap => 51.0 * WORD,
    }
}

/// Payload of one read crystal channel, in bytes.
#[inline]
#[must_use]
pub fn bytes_per_channel() -> f64 {
    3.0 * WORD
}

/// Fragment size of one DCC, in bytes.
#[inline]
#[must_use]
pub fn board_event_size(subdetector: Subdetector, ru_count: u32, read_channels: f64) -> f64 {
    board_overhead(subdetector) + read_channels * bytes_per_channel() + f64::from(ru_count) * WORD
}

/// Converts bytes to kBytes.
#[inline]
#[must_use]
pub fn to_kbytes(bytes: f64) -> f64 {
    bytes / KBYTE
}

/// Event-size model bound to a validated board layout.
#[derive(Debug, Clone, Default)]
pub struct VolumeModel {
    layout: BoardLayout,
}

impl VolumeModel {
    /// Model of the installed electronics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Model for a custom layout. The layout is checked before use.
    pub fn with_layout(layout: BoardLayout) -> Result<Self> {
        layout.validate()?;
        Ok(Self { layout })
    }

    /// Board layout in use.
    #[must_use]
    pub fn layout(&self) -> &BoardLayout {
        &self.layout
    }

    /// Subdetector read by a DCC (0-based).
    pub fn board_kind_of(&self, dcc: usize) -> Result<Subdetector> {
        subdetector_of_dcc(dcc)
    }

    /// Readout units read by a DCC (0-based).
    pub fn readout_unit_count_of(&self, dcc: usize) -> Result<u32> {
        self.layout.ru_count(dcc)
    }

    /// Fragment size of a DCC (0-based) given its read channel count.
    pub fn dcc_event_size(&self, dcc: usize, read_channels: f64) -> Result<f64> {
        let subdetector = self.board_kind_of(dcc)?;
        let ru_count = self.readout_unit_count_of(dcc)?;
        Ok(board_event_size(subdetector, ru_count, read_channels))
    }

    /// Size of all fragments of a subdetector when read channels are pooled
    /// over `dcc_count` boards.
    #[must_use]
    pub fn subdetector_event_size(
        &self,
        subdetector: Subdetector,
        dcc_count: usize,
        total_read_channels: f64,
    ) -> f64 {
        board_overhead(subdetector) * dcc_count as f64
            + total_read_channels * bytes_per_channel()
            + f64::from(self.layout.total_ru(subdetector)) * WORD
    }

    /// Barrel event size with all barrel DCCs.
    #[must_use]
    pub fn barrel_event_size(&self, read_channels: f64) -> f64 {
        self.subdetector_event_size(
            Subdetector::Barrel,
            BoardLayout::dcc_count(Subdetector::Barrel),
            read_channels,
        )
    }

    /// Endcap event size with all endcap DCCs.
    #[must_use]
    pub fn endcap_event_size(&self, read_channels: f64) -> f64 {
        self.subdetector_event_size(
            Subdetector::Endcap,
            BoardLayout::dcc_count(Subdetector::Endcap),
            read_channels,
        )
    }
}
