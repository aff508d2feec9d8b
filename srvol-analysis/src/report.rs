//! Per-event reports and run-level summary.
#![allow(clippy::cast_precision_loss)]

use serde::Serialize;
use srvol_core::layout::N_DCCS;
use srvol_core::{ChannelId, TriggerTower};

use crate::event::N_TTF;

/// Read channel counts of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReadCounts {
    /// Barrel channels read.
    pub barrel: u32,
    /// Endcap channels read.
    pub endcap: u32,
    /// Barrel channels read from low-interest units.
    pub barrel_low: u32,
    /// Barrel channels read from high-interest units.
    pub barrel_high: u32,
    /// Endcap channels read from low-interest units.
    pub endcap_low: u32,
    /// Endcap channels read from high-interest units.
    pub endcap_high: u32,
}

/// Data volume of one event, in kBytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeReport {
    /// Read channel counts.
    pub read: ReadCounts,
    /// Barrel plus endcap.
    pub total_kb: f64,
    /// Barrel.
    pub barrel_kb: f64,
    /// Endcap.
    pub endcap_kb: f64,
    /// Barrel, low-interest channels only.
    pub barrel_low_kb: f64,
    /// Barrel, high-interest channels only.
    pub barrel_high_kb: f64,
    /// Endcap, low-interest channels only.
    pub endcap_low_kb: f64,
    /// Endcap, high-interest channels only.
    pub endcap_high_kb: f64,
    /// Barrel plus endcap, low-interest channels only.
    pub low_interest_kb: f64,
    /// Barrel plus endcap, high-interest channels only.
    pub high_interest_kb: f64,
    /// Read channels per DCC (0-based).
    pub dcc_read: Vec<u32>,
    /// Fragment size per DCC (0-based).
    pub dcc_kb: Vec<f64>,
}

/// Crystal with one of the largest simulated energies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadingCrystal {
    /// Crystal identifier.
    pub channel: ChannelId,
    /// Simulated energy.
    pub sim_e: f64,
    /// Energy from the zero-suppressed digi.
    pub rec_e: f64,
    /// Energy from the unsuppressed digi.
    pub no_zs_rec_e: f64,
}

/// Energy bookkeeping of one subdetector for one event.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EnergyReport {
    /// Crystals booked in the event.
    pub crystals: usize,
    /// Crystals with at least one simulated hit.
    pub hit_crystals: usize,
    /// Sum of simulated energies.
    pub sim_e_sum: f64,
    /// Sum of zero-suppressed reconstructed energies.
    pub rec_e_sum: f64,
    /// Sum of unsuppressed reconstructed energies.
    pub no_zs_rec_e_sum: f64,
    /// Zero-suppressed energy found in crystals without simulated hits.
    pub noise_rec_e_sum: f64,
    /// Crystals with the largest simulated energies, largest first.
    pub leading: Vec<LeadingCrystal>,
}

/// Transverse-energy sum of one trigger tower.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TowerEt {
    /// Tower identifier.
    pub tower: TriggerTower,
    /// Transverse-energy sum.
    pub et: f64,
}

/// Trigger primitive next to the tower sum it estimates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TowerComparison {
    /// Tower identifier.
    pub tower: TriggerTower,
    /// Trigger-primitive transverse energy.
    pub tp_et: f64,
    /// Trigger-tower flag.
    pub ttf: u8,
    /// Crystal transverse-energy sum of the tower.
    pub et_sum: f64,
}

/// Everything computed for one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventReport {
    /// Event number.
    pub event_id: u64,
    /// Data volume.
    pub volume: VolumeReport,
    /// Barrel energies.
    pub barrel: EnergyReport,
    /// Endcap energies.
    pub endcap: EnergyReport,
    /// Trigger towers with deposits.
    pub towers: Vec<TowerEt>,
    /// Trigger primitives compared with the tower sums.
    pub primitives: Vec<TowerComparison>,
    /// Diagnostics of crystal records left out of the event.
    pub rejected: Vec<String>,
}

/// Running statistics of one quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stat {
    /// Number of values.
    pub count: usize,
    /// Mean value.
    pub mean: f64,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
}

impl Default for Stat {
    fn default() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl Stat {
    /// Adds a value.
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.mean += (value - self.mean) / self.count as f64;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }
}

/// Data-volume statistics over a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Events summarized.
    pub events: usize,
    /// Total volume.
    pub total_kb: Stat,
    /// Barrel volume.
    pub barrel_kb: Stat,
    /// Endcap volume.
    pub endcap_kb: Stat,
    /// Low-interest volume.
    pub low_interest_kb: Stat,
    /// High-interest volume.
    pub high_interest_kb: Stat,
    /// Volume per DCC (0-based).
    pub dcc_kb: Vec<Stat>,
    /// Trigger-primitive Et minus tower Et sum.
    pub tp_minus_et_sum: Stat,
    /// Trigger-primitive Et per trigger-tower flag.
    pub tp_et_by_ttf: Vec<Stat>,
    /// Tower Et sum per trigger-tower flag.
    pub et_sum_by_ttf: Vec<Stat>,
    /// Records rejected over the run.
    pub rejected_channels: usize,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self {
            events: 0,
            total_kb: Stat::default(),
            barrel_kb: Stat::default(),
            endcap_kb: Stat::default(),
            low_interest_kb: Stat::default(),
            high_interest_kb: Stat::default(),
            dcc_kb: vec![Stat::default(); N_DCCS],
            tp_minus_et_sum: Stat::default(),
            tp_et_by_ttf: vec![Stat::default(); N_TTF],
            et_sum_by_ttf: vec![Stat::default(); N_TTF],
            rejected_channels: 0,
        }
    }
}

impl RunSummary {
    /// Creates an empty summary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one event.
    pub fn push(&mut self, report: &EventReport) {
        let volume = &report.volume;
        self.events += 1;
        self.total_kb.push(volume.total_kb);
        self.barrel_kb.push(volume.barrel_kb);
        self.endcap_kb.push(volume.endcap_kb);
        self.low_interest_kb.push(volume.low_interest_kb);
        self.high_interest_kb.push(volume.high_interest_kb);
        for (stat, &kb) in self.dcc_kb.iter_mut().zip(&volume.dcc_kb) {
            stat.push(kb);
        }
        for comparison in &report.primitives {
            self.tp_minus_et_sum
                .push(comparison.tp_et - comparison.et_sum);
            let ttf = usize::from(comparison.ttf);
            if let (Some(tp), Some(sum)) = (
                self.tp_et_by_ttf.get_mut(ttf),
                self.et_sum_by_ttf.get_mut(ttf),
            ) {
                tp.push(comparison.tp_et);
                sum.push(comparison.et_sum);
            }
        }
        self.rejected_channels += report.rejected.len();
    }
}

impl<'a> FromIterator<&'a EventReport> for RunSummary {
    fn from_iter<I: IntoIterator<Item = &'a EventReport>>(iter: I) -> Self {
        let mut summary = Self::new();
        for report in iter {
            summary.push(report);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_stat() {
        let mut stat = Stat::default();
        for value in [2.0, 4.0, 9.0] {
            stat.push(value);
        }
        assert_eq!(stat.count, 3);
        assert_relative_eq!(stat.mean, 5.0);
        assert_relative_eq!(stat.min, 2.0);
        assert_relative_eq!(stat.max, 9.0);
    }

    #[test]
    fn test_summary_groups_primitives_by_flag() {
        let tower = TriggerTower { ieta: 1, iphi: 1 };
        let report = EventReport {
            event_id: 1,
            volume: VolumeReport {
                read: ReadCounts::default(),
                total_kb: 0.0,
                barrel_kb: 0.0,
                endcap_kb: 0.0,
                barrel_low_kb: 0.0,
                barrel_high_kb: 0.0,
                endcap_low_kb: 0.0,
                endcap_high_kb: 0.0,
                low_interest_kb: 0.0,
                high_interest_kb: 0.0,
                dcc_read: vec![0; N_DCCS],
                dcc_kb: vec![0.0; N_DCCS],
            },
            barrel: EnergyReport::default(),
            endcap: EnergyReport::default(),
            towers: vec![],
            primitives: vec![
                TowerComparison {
                    tower,
                    tp_et: 5.0,
                    ttf: 3,
                    et_sum: 4.0,
                },
                TowerComparison {
                    tower,
                    tp_et: 1.0,
                    ttf: 3,
                    et_sum: 2.0,
                },
                TowerComparison {
                    tower,
                    tp_et: 0.0,
                    ttf: 0,
                    et_sum: 0.0,
                },
            ],
            rejected: vec![],
        };
        let summary: RunSummary = std::iter::once(&report).collect();

        assert_eq!(summary.tp_minus_et_sum.count, 3);
        assert_relative_eq!(summary.tp_minus_et_sum.mean, 0.0);
        assert_relative_eq!(summary.tp_minus_et_sum.max, 1.0);
        assert_eq!(summary.tp_et_by_ttf[3].count, 2);
        assert_relative_eq!(summary.tp_et_by_ttf[3].mean, 3.0);
        assert_relative_eq!(summary.et_sum_by_ttf[3].mean, 3.0);
        assert_eq!(summary.et_sum_by_ttf[0].count, 1);
        assert_eq!(summary.et_sum_by_ttf[1].count, 0);
    }
}
