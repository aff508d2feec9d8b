//! Crystal amplitude reconstruction from digitized samples.
//!
//! The amplitude is a weighted sum of the ADC samples, each sample first
//! brought to the scale of the highest gain range.
#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default weights for ten-sample frames: the mean of the first three
/// samples is taken as pedestal and subtracted from the sixth.
pub const DEFAULT_WEIGHTS: [f64; 10] = [
    -1.0 / 3.0,
    -1.0 / 3.0,
    -1.0 / 3.0,
    0.0,
    0.0,
    1.0,
    0.0,
    0.0,
    0.0,
    0.0,
];

/// Default gain ratios indexed by gain id. Id 0 flags a saturated sample
/// read on the lowest range.
pub const DEFAULT_GAIN_RATIOS: [f64; 4] = [12.0, 1.0, 2.0, 12.0];

/// One digitized sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdcSample {
    /// 12-bit ADC count.
    pub adc: u16,
    /// 2-bit gain id.
    pub gain_id: u8,
}

impl AdcSample {
    /// Creates a sample.
    #[must_use]
    pub fn new(adc: u16, gain_id: u8) -> Self {
        Self { adc, gain_id }
    }

    /// Decodes a raw word: bits 0-11 ADC count, bits 12-13 gain id.
    #[must_use]
    pub fn from_raw(raw: u16) -> Self {
        Self {
            adc: raw & 0x0FFF,
            gain_id: ((raw >> 12) & 0x3) as u8,
        }
    }
}

/// Weighted-sum amplitude reconstruction.
#[derive(Debug, Clone, PartialEq)]
pub struct AmplitudeReconstructor {
    weights: Vec<f64>,
    gain_ratios: Vec<f64>,
}

impl Default for AmplitudeReconstructor {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS.to_vec(),
            gain_ratios: DEFAULT_GAIN_RATIOS.to_vec(),
        }
    }
}

impl AmplitudeReconstructor {
    /// Creates a reconstructor from sample weights and per-gain-id ratios.
    pub fn new(weights: Vec<f64>, gain_ratios: Vec<f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(Error::ConfigError("amplitude weights are empty".into()));
        }
        if gain_ratios.is_empty() || gain_ratios.iter().any(|r| !r.is_finite()) {
            return Err(Error::ConfigError(format!(
                "gain ratios must be finite and non-empty: {gain_ratios:?}"
            )));
        }
        Ok(Self {
            weights,
            gain_ratios,
        })
    }

    /// Sample weights.
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Amplitude of the triggered bunch crossing.
    pub fn reconstruct(&self, samples: &[AdcSample]) -> Result<f64> {
        self.reconstruct_with_offset(samples, 0)
    }

    /// Amplitude with the weight window shifted by `offset` samples.
    ///
    /// `-1` and `+1` estimate the previous and next bunch crossings. Weights
    /// falling outside the frame are skipped.
    pub fn reconstruct_with_offset(&self, samples: &[AdcSample], offset: isize) -> Result<f64> {
        let mut acc = 0.0;
        for (i, weight) in self.weights.iter().enumerate() {
            let position = i as isize + offset;
            if position < 0 {
                continue;
            }
            let Some(sample) = samples.get(position as usize) else {
                break;
            };
            acc += weight * f64::from(sample.adc) * self.gain_ratio(sample.gain_id)?;
        }
        Ok(acc)
    }

    fn gain_ratio(&self, gain_id: u8) -> Result<f64> {
        self.gain_ratios
            .get(usize::from(gain_id))
            .copied()
            .ok_or(Error::InvalidGainId {
                gain_id,
                table_len: self.gain_ratios.len(),
            })
    }
}
