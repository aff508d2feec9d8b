//! Analysis error types.

use thiserror::Error;

/// Result type for analysis operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Analysis error types.
#[derive(Error, Debug)]
pub enum Error {
    /// Core library error (domain violation, layout).
    #[error("core error: {0}")]
    CoreError(#[from] srvol_core::Error),

    /// ADC sample with a gain id missing from the gain-ratio table.
    #[error("invalid gain id {gain_id} (table has {table_len} entries)")]
    InvalidGainId {
        /// Gain id found in the sample.
        gain_id: u8,
        /// Number of configured gain ratios.
        table_len: usize,
    },

    /// Crystal record that cannot be booked (missing or mismatched DCC).
    #[error("invalid record for {channel}: {reason}")]
    InvalidRecord {
        /// Channel or tower the record refers to.
        channel: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON input.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
