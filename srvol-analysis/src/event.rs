//! Event input records.
//!
//! An event lists the crystals touched by simulation or readout. Energies
//! can be given directly or as digitized frames to be reconstructed.

use serde::{Deserialize, Serialize};
use srvol_core::{ChannelId, SrFlag, TriggerTower};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::amplitude::AdcSample;
use crate::error::Result;

/// Reconstructed energy or the frame to reconstruct it from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    /// Energy already reconstructed upstream.
    Energy(f64),
    /// Digitized samples.
    Samples(Vec<AdcSample>),
}

/// Crystal position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuth in degrees.
    pub phi: f64,
}

/// Everything known about one crystal in one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrystalRecord {
    /// Crystal identifier.
    pub channel: ChannelId,
    /// DCC logical number, starting from 1. Needed for read channels.
    #[serde(default)]
    pub dcc: Option<i64>,
    /// Crystal position, if the geometry provided one.
    #[serde(default)]
    pub position: Option<Position>,
    /// Energies of the simulated hits in the crystal.
    #[serde(default)]
    pub sim_hits: Vec<f64>,
    /// Reading from the unsuppressed digis.
    #[serde(default)]
    pub unsuppressed: Option<Reading>,
    /// Reading from the zero-suppressed digis; present only when the
    /// channel was read out.
    #[serde(default)]
    pub suppressed: Option<Reading>,
    /// Selective-readout flag of the channel's readout unit.
    #[serde(default)]
    pub sr_flag: SrFlag,
    /// Trigger tower of the crystal. Endcap deposits reach the tower sums
    /// only through it; for a barrel crystal it must match the computed one.
    #[serde(default)]
    pub tower: Option<TriggerTower>,
}

impl CrystalRecord {
    /// Creates a record with no energies.
    #[must_use]
    pub fn new(channel: ChannelId) -> Self {
        Self {
            channel,
            dcc: None,
            position: None,
            sim_hits: Vec::new(),
            unsuppressed: None,
            suppressed: None,
            sr_flag: SrFlag::SUPPRESS,
            tower: None,
        }
    }

    /// Whether the channel survived selective readout.
    #[must_use]
    pub fn is_read(&self) -> bool {
        self.suppressed.is_some()
    }
}

/// Number of trigger-tower flag values (3-bit flag).
pub const N_TTF: usize = 8;

/// Trigger primitive of one tower.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerPrimitive {
    /// Tower identifier.
    pub tower: TriggerTower,
    /// Transverse energy computed by the trigger electronics.
    pub et: f64,
    /// Trigger-tower flag, `0..N_TTF`.
    #[serde(default)]
    pub ttf: u8,
}

/// One event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event number.
    pub id: u64,
    /// Crystals touched in the event.
    #[serde(default)]
    pub crystals: Vec<CrystalRecord>,
    /// Trigger primitives to compare with the tower sums.
    #[serde(default)]
    pub primitives: Vec<TriggerPrimitive>,
}

impl EventRecord {
    /// Creates an event without trigger primitives.
    #[must_use]
    pub fn new(id: u64, crystals: Vec<CrystalRecord>) -> Self {
        Self {
            id,
            crystals,
            primitives: Vec::new(),
        }
    }
}

/// A file of events.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventFile {
    /// Events in processing order.
    pub events: Vec<EventRecord>,
}

impl EventFile {
    /// Load events from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Load events from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use srvol_core::{BarrelCrystal, EndcapCrystal, EndcapSide};

    #[test]
    fn test_parse_event_file() {
        let json = r#"{
            "events": [
                {
                    "id": 7,
                    "crystals": [
                        {
                            "channel": { "barrel": { "ieta": -3, "iphi": 12 } },
                            "dcc": 15,
                            "sim_hits": [0.5, 0.25],
                            "unsuppressed": 0.8,
                            "suppressed": [{ "adc": 210, "gain_id": 1 }],
                            "sr_flag": 3
                        },
                        {
                            "channel": { "endcap": { "side": "plus", "ix": 40, "iy": 60 } },
                            "position": { "eta": 2.1, "phi": 33.0 }
                        }
                    ]
                }
            ]
        }"#;
        let file = EventFile::from_json(json).unwrap();
        assert_eq!(file.events.len(), 1);
        let event = &file.events[0];
        assert_eq!(event.id, 7);

        let eb = &event.crystals[0];
        assert_eq!(
            eb.channel,
            ChannelId::Barrel(BarrelCrystal { ieta: -3, iphi: 12 })
        );
        assert_eq!(eb.dcc, Some(15));
        assert_eq!(eb.unsuppressed, Some(Reading::Energy(0.8)));
        assert_eq!(
            eb.suppressed,
            Some(Reading::Samples(vec![AdcSample::new(210, 1)]))
        );
        assert!(eb.is_read());
        assert!(eb.sr_flag.is_high_interest());

        let ee = &event.crystals[1];
        assert_eq!(
            ee.channel,
            ChannelId::Endcap(EndcapCrystal {
                side: EndcapSide::Plus,
                ix: 40,
                iy: 60
            })
        );
        assert!(!ee.is_read());
        assert_eq!(ee.sr_flag, SrFlag::SUPPRESS);
        assert!(ee.sim_hits.is_empty());
        assert_eq!(ee.tower, None);
        assert!(event.primitives.is_empty());
    }

    #[test]
    fn test_parse_primitives_and_endcap_tower() {
        let json = r#"{
            "events": [{
                "id": 3,
                "crystals": [{
                    "channel": { "endcap": { "side": "minus", "ix": 20, "iy": 50 } },
                    "tower": { "ieta": -20, "iphi": 5 },
                    "position": { "eta": -2.0, "phi": 10.0 },
                    "unsuppressed": 4.0
                }],
                "primitives": [
                    { "tower": { "ieta": -20, "iphi": 5 }, "et": 0.5, "ttf": 3 },
                    { "tower": { "ieta": 1, "iphi": 1 }, "et": 0.0 }
                ]
            }]
        }"#;
        let file = EventFile::from_json(json).unwrap();
        let event = &file.events[0];
        assert_eq!(
            event.crystals[0].tower,
            Some(TriggerTower { ieta: -20, iphi: 5 })
        );
        assert_eq!(event.primitives.len(), 2);
        assert_eq!(event.primitives[0].ttf, 3);
        assert_eq!(event.primitives[1].ttf, 0);
    }

    #[test]
    fn test_malformed_input() {
        assert!(EventFile::from_json(r#"{ "events": [ { "crystals": [] } ] }"#).is_err());
        assert!(EventFile::from_json("not json").is_err());
    }
}
