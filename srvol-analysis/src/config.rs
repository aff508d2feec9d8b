//! Analysis configuration.

use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::amplitude::{AmplitudeReconstructor, DEFAULT_GAIN_RATIOS, DEFAULT_WEIGHTS};
use crate::error::{Error, Result};

/// Settings of the per-event selective-readout analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisConfig {
    /// Weights applied to ADC samples when energies are given as frames.
    pub weights: Vec<f64>,
    /// Gain ratio per gain id.
    pub gain_ratios: Vec<f64>,
    /// Number of leading crystals reported per subdetector.
    pub leading_crystals: usize,
    /// Fill trigger-tower Et sums from unsuppressed energies.
    pub fill_tower_sums: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS.to_vec(),
            gain_ratios: DEFAULT_GAIN_RATIOS.to_vec(),
            leading_crystals: 10,
            fill_tower_sums: true,
        }
    }
}

// JSON schema: { "analysis": { "amplitude": {...}, "ranking": {...}, "trigger_towers": {...} } }
#[derive(Deserialize)]
struct JsonConfig {
    analysis: JsonAnalysis,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct JsonAnalysis {
    amplitude: JsonAmplitude,
    ranking: JsonRanking,
    trigger_towers: JsonTriggerTowers,
}

#[derive(Deserialize)]
#[serde(default)]
struct JsonAmplitude {
    weights: Vec<f64>,
    gain_ratios: Vec<f64>,
}

impl Default for JsonAmplitude {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS.to_vec(),
            gain_ratios: DEFAULT_GAIN_RATIOS.to_vec(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct JsonRanking {
    leading_crystals: usize,
}

impl Default for JsonRanking {
    fn default() -> Self {
        Self {
            leading_crystals: 10,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct JsonTriggerTowers {
    enabled: bool,
}

impl Default for JsonTriggerTowers {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl AnalysisConfig {
    /// Load configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let json_config: JsonConfig = serde_json::from_reader(reader)?;
        Self::from_json_config(json_config)
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let json_config: JsonConfig = serde_json::from_str(json)?;
        Self::from_json_config(json_config)
    }

    fn from_json_config(config: JsonConfig) -> Result<Self> {
        let analysis = config.analysis;
        let config = Self {
            weights: analysis.amplitude.weights,
            gain_ratios: analysis.amplitude.gain_ratios,
            leading_crystals: analysis.ranking.leading_crystals,
            fill_tower_sums: analysis.trigger_towers.enabled,
        };

        // Checked once at load time, not per event
        config.validate()?;

        Ok(config)
    }

    /// Checks the settings.
    pub fn validate(&self) -> Result<()> {
        if self.gain_ratios.len() != DEFAULT_GAIN_RATIOS.len() {
            return Err(Error::ConfigError(format!(
                "expected {} gain ratios, got {}",
                DEFAULT_GAIN_RATIOS.len(),
                self.gain_ratios.len()
            )));
        }
        if self.leading_crystals == 0 {
            return Err(Error::ConfigError(
                "leading crystal count must be positive".into(),
            ));
        }
        self.reconstructor().map(|_| ())
    }

    /// Amplitude reconstructor for these settings.
    pub fn reconstructor(&self) -> Result<AmplitudeReconstructor> {
        AmplitudeReconstructor::new(self.weights.clone(), self.gain_ratios.clone())
    }
}
