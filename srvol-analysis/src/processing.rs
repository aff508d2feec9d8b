//! Per-event selective-readout analysis.
//!
//! For each event the analyzer resets its tables, books every crystal
//! record, then derives the data volume and the energy bookkeeping.
//! An analyzer owns its store exclusively; parallel processing gives each
//! worker its own analyzer.
#![allow(clippy::cast_precision_loss)]

use log::{debug, trace, warn};
use rayon::prelude::*;
use std::collections::HashSet;

use srvol_core::layout::{dcc_from_logical, N_DCCS};
use srvol_core::volume::to_kbytes;
use srvol_core::{ChannelId, Subdetector, TriggerTower, VolumeModel};

use crate::amplitude::AmplitudeReconstructor;
use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::event::{CrystalRecord, EventRecord, Reading, TriggerPrimitive, N_TTF};
use crate::ranking;
use crate::report::{
    EnergyReport, EventReport, LeadingCrystal, ReadCounts, TowerComparison, TowerEt,
    VolumeReport,
};
use crate::store::{ChannelEnergyStore, Readout};
use crate::tower::TowerEtSums;

/// Record checked and converted, ready to be booked.
struct Booking {
    channel: ChannelId,
    dcc: Option<usize>,
    unsuppressed: Option<f64>,
    suppressed: Option<f64>,
    // Tower receiving the unsuppressed deposit, with the eta used for Et.
    tower: Option<(TriggerTower, f64)>,
}

/// Accumulates per-crystal statistics and data volume for one event at a
/// time.
#[derive(Debug, Clone)]
pub struct SelectiveReadoutAnalyzer {
    config: AnalysisConfig,
    model: VolumeModel,
    reconstructor: AmplitudeReconstructor,
    store: ChannelEnergyStore,
    towers: TowerEtSums,
    dcc_read: [u32; N_DCCS],
    read: ReadCounts,
    booked: Vec<ChannelId>,
    seen: HashSet<ChannelId>,
    events_processed: u64,
}

impl SelectiveReadoutAnalyzer {
    /// Creates an analyzer for the installed electronics.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        Self::with_model(config, VolumeModel::new())
    }

    /// Creates an analyzer with a custom volume model.
    pub fn with_model(config: AnalysisConfig, model: VolumeModel) -> Result<Self> {
        config.validate()?;
        model.layout().validate()?;
        let reconstructor = config.reconstructor()?;
        Ok(Self {
            config,
            model,
            reconstructor,
            store: ChannelEnergyStore::new(),
            towers: TowerEtSums::new(),
            dcc_read: [0; N_DCCS],
            read: ReadCounts::default(),
            booked: Vec::new(),
            seen: HashSet::new(),
            events_processed: 0,
        })
    }

    /// Crystal table of the last analyzed event.
    #[must_use]
    pub fn store(&self) -> &ChannelEnergyStore {
        &self.store
    }

    /// Trigger-tower sums of the last analyzed event.
    #[must_use]
    pub fn towers(&self) -> &TowerEtSums {
        &self.towers
    }

    /// Number of events analyzed so far.
    #[must_use]
    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// Analyzes one event.
    ///
    /// Records with an invalid crystal, DCC or frame are left out and
    /// listed in [`EventReport::rejected`]; they never reach the sizes.
    pub fn analyze(&mut self, event: &EventRecord) -> EventReport {
        self.reset();

        let mut rejected = Vec::new();
        for record in &event.crystals {
            if let Err(err) = self.prepare(record).and_then(|booking| self.book(record, &booking)) {
                warn!("event {}: skipping {}: {err}", event.id, record.channel);
                rejected.push(format!("{}: {err}", record.channel));
            }
        }
        let primitives = self.compare_primitives(event, &mut rejected);
        self.events_processed += 1;

        let volume = self.volume_report();
        debug!(
            "event {}: {} crystals booked, {} EB / {} EE read, {:.2} kB",
            event.id,
            self.booked.len(),
            self.read.barrel,
            self.read.endcap,
            volume.total_kb
        );

        EventReport {
            event_id: event.id,
            volume,
            barrel: self.energy_report(Subdetector::Barrel),
            endcap: self.energy_report(Subdetector::Endcap),
            towers: self
                .towers
                .active()
                .map(|(tower, et)| TowerEt { tower, et })
                .collect(),
            primitives,
            rejected,
        }
    }

    fn reset(&mut self) {
        self.store.reset();
        self.towers.reset();
        self.dcc_read = [0; N_DCCS];
        self.read = ReadCounts::default();
        self.booked.clear();
        self.seen.clear();
    }

    // Checks everything that can fail before the tables are touched.
    fn prepare(&self, record: &CrystalRecord) -> Result<Booking> {
        let channel = record.channel;
        channel.validate()?;
        let invalid = |reason: String| Error::InvalidRecord {
            channel: channel.to_string(),
            reason,
        };

        if self.seen.contains(&channel) {
            return Err(invalid("channel repeated in event".into()));
        }
        if let Some(&energy) = record.sim_hits.iter().find(|e| e.is_nan() || **e < 0.0) {
            return Err(invalid(format!("simulated energy {energy} is negative or NaN")));
        }

        let dcc = match record.dcc {
            Some(logical) => {
                let dcc = dcc_from_logical(logical)?;
                let kind = self.model.board_kind_of(dcc)?;
                if kind != channel.subdetector() {
                    return Err(invalid(format!("DCC {logical} reads {kind}")));
                }
                Some(dcc)
            }
            None if record.is_read() => {
                return Err(invalid("read channel without DCC number".into()));
            }
            None => None,
        };

        let unsuppressed = self.energy(record.unsuppressed.as_ref())?;
        let tower = match (channel, record.tower) {
            (ChannelId::Barrel(crystal), given) => {
                let tower = crystal.tower()?;
                if let Some(given) = given.filter(|&given| given != tower) {
                    return Err(invalid(format!("crystal is not in {given}")));
                }
                let eta = record.position.map_or_else(|| crystal.nominal_eta(), |p| p.eta);
                Some((tower, eta))
            }
            (ChannelId::Endcap(_), Some(tower)) => {
                tower.dense_index()?;
                match record.position {
                    Some(position) => Some((tower, position.eta)),
                    None if unsuppressed.is_some() => {
                        return Err(invalid(format!("deposit in {tower} without position")));
                    }
                    None => None,
                }
            }
            (ChannelId::Endcap(_), None) => None,
        };

        Ok(Booking {
            channel,
            dcc,
            unsuppressed,
            suppressed: self.energy(record.suppressed.as_ref())?,
            tower,
        })
    }

    fn energy(&self, reading: Option<&Reading>) -> Result<Option<f64>> {
        reading
            .map(|reading| match reading {
                Reading::Energy(energy) => Ok(*energy),
                Reading::Samples(samples) => self.reconstructor.reconstruct(samples),
            })
            .transpose()
    }

    fn book(&mut self, record: &CrystalRecord, booking: &Booking) -> Result<()> {
        let channel = &booking.channel;

        for &energy in &record.sim_hits {
            self.store.accumulate(channel, energy, true)?;
        }
        if let Some(position) = record.position {
            self.store.set_position(channel, position.eta, position.phi)?;
        }

        if let Some(energy) = booking.unsuppressed {
            self.store
                .set_reconstructed(channel, Readout::Unsuppressed, energy)?;
            if let (true, Some((tower, eta))) = (self.config.fill_tower_sums, booking.tower) {
                self.towers.add(&tower, energy / eta.cosh())?;
            }
        }

        if let Some(energy) = booking.suppressed {
            self.store
                .set_reconstructed(channel, Readout::ZeroSuppressed, energy)?;
            self.count_read(channel.subdetector(), booking.dcc, record.sr_flag.is_high_interest());
        }

        self.seen.insert(*channel);
        self.booked.push(*channel);
        Ok(())
    }

    // Pairs each trigger primitive with the tower sum of this event.
    fn compare_primitives(
        &self,
        event: &EventRecord,
        rejected: &mut Vec<String>,
    ) -> Vec<TowerComparison> {
        if !self.config.fill_tower_sums {
            if !event.primitives.is_empty() {
                debug!("event {}: tower sums disabled, primitives ignored", event.id);
            }
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut comparisons = Vec::with_capacity(event.primitives.len());
        for primitive in &event.primitives {
            match self.compare_primitive(primitive, &mut seen) {
                Ok(comparison) => comparisons.push(comparison),
                Err(err) => {
                    warn!("event {}: skipping {}: {err}", event.id, primitive.tower);
                    rejected.push(format!("{}: {err}", primitive.tower));
                }
            }
        }
        comparisons
    }

    fn compare_primitive(
        &self,
        primitive: &TriggerPrimitive,
        seen: &mut HashSet<TriggerTower>,
    ) -> Result<TowerComparison> {
        let tower = primitive.tower;
        let invalid = |reason: String| Error::InvalidRecord {
            channel: tower.to_string(),
            reason,
        };
        let et_sum = self.towers.get(&tower)?;
        if usize::from(primitive.ttf) >= N_TTF {
            return Err(invalid(format!("TT flag {} out of range", primitive.ttf)));
        }
        if !primitive.et.is_finite() {
            return Err(invalid(format!("trigger primitive Et {}", primitive.et)));
        }
        if !seen.insert(tower) {
            return Err(invalid("tower repeated in event".into()));
        }
        Ok(TowerComparison {
            tower,
            tp_et: primitive.et,
            ttf: primitive.ttf,
            et_sum,
        })
    }

    fn count_read(&mut self, subdetector: Subdetector, dcc: Option<usize>, high_interest: bool) {
        if let Some(dcc) = dcc {
            self.dcc_read[dcc] += 1;
        }
        let read = &mut self.read;
        match (subdetector, high_interest) {
            (Subdetector::Barrel, true) => read.barrel_high += 1,
            (Subdetector::Barrel, false) => read.barrel_low += 1,
            (Subdetector::Endcap, true) => read.endcap_high += 1,
            (Subdetector::Endcap, false) => read.endcap_low += 1,
        }
        match subdetector {
            Subdetector::Barrel => read.barrel += 1,
            Subdetector::Endcap => read.endcap += 1,
        }
    }

    fn volume_report(&self) -> VolumeReport {
        let read = self.read;
        let eb = |n: u32| to_kbytes(self.model.barrel_event_size(f64::from(n)));
        let ee = |n: u32| to_kbytes(self.model.endcap_event_size(f64::from(n)));

        let dcc_kb = self
            .dcc_read
            .iter()
            .enumerate()
            .map(|(dcc, &n)| {
                // dcc < N_DCCS, the lookup cannot fail
                let kb = self
                    .model
                    .dcc_event_size(dcc, f64::from(n))
                    .map_or(0.0, to_kbytes);
                trace!("DCC {}: {n} channels, {kb:.3} kB", dcc + 1);
                kb
            })
            .collect();

        let barrel_low_kb = eb(read.barrel_low);
        let barrel_high_kb = eb(read.barrel_high);
        let endcap_low_kb = ee(read.endcap_low);
        let endcap_high_kb = ee(read.endcap_high);

        VolumeReport {
            read,
            total_kb: eb(read.barrel) + ee(read.endcap),
            barrel_kb: eb(read.barrel),
            endcap_kb: ee(read.endcap),
            barrel_low_kb,
            barrel_high_kb,
            endcap_low_kb,
            endcap_high_kb,
            low_interest_kb: barrel_low_kb + endcap_low_kb,
            high_interest_kb: barrel_high_kb + endcap_high_kb,
            dcc_read: self.dcc_read.to_vec(),
            dcc_kb,
        }
    }

    fn energy_report(&self, subdetector: Subdetector) -> EnergyReport {
        let mut report = EnergyReport::default();
        let mut hit = Vec::new();

        for channel in self
            .booked
            .iter()
            .filter(|channel| channel.subdetector() == subdetector)
        {
            // Booked channels passed validation.
            let Ok(entry) = self.store.get(channel) else {
                continue;
            };
            report.crystals += 1;
            report.sim_e_sum += entry.sim_e;
            report.rec_e_sum += entry.rec_e;
            report.no_zs_rec_e_sum += entry.no_zs_rec_e;
            if entry.sim_hits > 0 {
                report.hit_crystals += 1;
                hit.push(*channel);
            } else {
                report.noise_rec_e_sum += entry.rec_e;
            }
        }

        report.leading = ranking::leading(&hit, &self.store, self.config.leading_crystals)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|channel| {
                self.store.get(&channel).ok().map(|entry| LeadingCrystal {
                    channel,
                    sim_e: entry.sim_e,
                    rec_e: entry.rec_e,
                    no_zs_rec_e: entry.no_zs_rec_e,
                })
            })
            .collect();
        report
    }
}

/// Analyzes events in parallel.
///
/// Each worker clones its own analyzer, so no store is shared between
/// threads. Reports come back in input order.
pub fn analyze_events(events: &[EventRecord], config: &AnalysisConfig) -> Result<Vec<EventReport>> {
    let template = SelectiveReadoutAnalyzer::new(config.clone())?;
    Ok(events
        .par_iter()
        .map_init(|| template.clone(), |analyzer, event| analyzer.analyze(event))
        .collect())
}
