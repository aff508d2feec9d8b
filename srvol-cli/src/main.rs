//!
//! This binary provides a CLI for the selective-readout data-volume model.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand, ValueEnum};

use srvol_analysis::{analyze_events, AnalysisConfig, EventFile, EventReport, RunSummary};
use srvol_core::layout::{BoardLayout, N_DCCS};
use srvol_core::volume::{board_overhead, to_kbytes};
use srvol_core::{BarrelCrystal, EndcapCrystal, EndcapSide, Subdetector, TriggerTower, VolumeModel};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Core error: {0}")]
    Core(#[from] srvol_core::Error),

    #[error("Analysis error: {0}")]
    Analysis(#[from] srvol_analysis::Error),
}

/// Endcap side selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Side {
    /// EE-
    Minus,
    /// EE+
    Plus,
}

impl From<Side> for EndcapSide {
    fn from(side: Side) -> Self {
        match side {
            Side::Minus => EndcapSide::Minus,
            Side::Plus => EndcapSide::Plus,
        }
    }
}

/// Selective-readout data-volume analysis.
#[derive(Parser)]
#[command(name = "srvol")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output (debug logging unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze JSON event files and report data volumes
    Analyze {
        /// Input event file(s)
        #[arg(required = true)]
        input: Vec<PathBuf>,

        /// Analysis configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the run summary as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print one line per event
        #[arg(long)]
        events: bool,

        /// Print mean fragment size per DCC
        #[arg(long)]
        per_dcc: bool,
    },

    /// Print the DCC board layout and check its readout-unit totals
    Layout,

    /// Compute the fragment size of one DCC
    Size {
        /// DCC logical number, starting from 1
        dcc: i64,

        /// Number of read crystal channels
        read_channels: f64,
    },

    /// Look up dense array indices of a channel
    Index {
        #[command(subcommand)]
        channel: IndexTarget,
    },
}

#[derive(Subcommand)]
enum IndexTarget {
    /// Barrel crystal
    Barrel {
        #[arg(allow_negative_numbers = true)]
        ieta: i32,
        iphi: i32,
    },
    /// Endcap crystal
    Endcap {
        #[arg(value_enum)]
        side: Side,
        ix: i32,
        iy: i32,
    },
    /// Trigger tower
    Tower {
        #[arg(allow_negative_numbers = true)]
        ieta: i32,
        iphi: i32,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn print_event(report: &EventReport) {
    let volume = &report.volume;
    println!(
        "event {:>8} | EB {:>5} read ({:>5} HI) | EE {:>5} read ({:>5} HI) | {:>8.2} kB{}",
        report.event_id,
        volume.read.barrel,
        volume.read.barrel_high,
        volume.read.endcap,
        volume.read.endcap_high,
        volume.total_kb,
        if report.rejected.is_empty() {
            String::new()
        } else {
            format!(" | {} rejected", report.rejected.len())
        }
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Analyze {
            input,
            config,
            output,
            events,
            per_dcc,
        } => {
            let config = match config {
                Some(path) => {
                    log::info!("Loading configuration from {}", path.display());
                    AnalysisConfig::from_file(path)?
                }
                None => AnalysisConfig::default(),
            };

            let start = Instant::now();
            let mut summary = RunSummary::new();

            for path in &input {
                log::info!("Reading: {}", path.display());
                let file = EventFile::from_file(path)?;
                let reports = analyze_events(&file.events, &config)?;
                for report in &reports {
                    if events {
                        print_event(report);
                    }
                    summary.push(report);
                }
                log::debug!("{}: {} events", path.display(), reports.len());
            }

            let elapsed = start.elapsed();

            println!(
                "Processed {} events from {} file(s) in {:.2}s",
                summary.events,
                input.len(),
                elapsed.as_secs_f64()
            );
            if summary.events > 0 {
                println!(
                    "{:<16} | {:>10} | {:>10} | {:>10}",
                    "Volume (kB)", "Mean", "Min", "Max"
                );
                println!("{:-<55}", "");
                for (name, stat) in [
                    ("Total", &summary.total_kb),
                    ("Barrel", &summary.barrel_kb),
                    ("Endcap", &summary.endcap_kb),
                    ("Low interest", &summary.low_interest_kb),
                    ("High interest", &summary.high_interest_kb),
                ] {
                    println!(
                        "{:<16} | {:>10.2} | {:>10.2} | {:>10.2}",
                        name, stat.mean, stat.min, stat.max
                    );
                }
            }
            if summary.tp_minus_et_sum.count > 0 {
                println!(
                    "Trigger primitives: {} compared, TP - Et sum mean {:.3} (min {:.3}, max {:.3})",
                    summary.tp_minus_et_sum.count,
                    summary.tp_minus_et_sum.mean,
                    summary.tp_minus_et_sum.min,
                    summary.tp_minus_et_sum.max
                );
                println!(
                    "{:<4} | {:>8} | {:>12} | {:>12}",
                    "TTF", "Towers", "TP Et", "Et sum"
                );
                println!("{:-<44}", "");
                for (ttf, (tp, sum)) in summary
                    .tp_et_by_ttf
                    .iter()
                    .zip(&summary.et_sum_by_ttf)
                    .enumerate()
                    .filter(|(_, (tp, _))| tp.count > 0)
                {
                    println!(
                        "{:<4} | {:>8} | {:>12.3} | {:>12.3}",
                        ttf, tp.count, tp.mean, sum.mean
                    );
                }
            }
            if summary.rejected_channels > 0 {
                println!("Rejected records: {}", summary.rejected_channels);
            }

            if per_dcc && summary.events > 0 {
                println!("{:<5} | {:<4} | {:>10}", "DCC", "Det", "Mean (kB)");
                println!("{:-<26}", "");
                for (dcc, stat) in summary.dcc_kb.iter().enumerate() {
                    let kind = srvol_core::layout::subdetector_of_dcc(dcc)?;
                    println!("{:<5} | {:<4} | {:>10.3}", dcc + 1, kind, stat.mean);
                }
            }

            if let Some(path) = output {
                let writer = BufWriter::new(File::create(&path)?);
                serde_json::to_writer_pretty(writer, &summary)?;
                log::info!("Summary written to {}", path.display());
            }
        }

        Commands::Layout => {
            let model = VolumeModel::new();
            let layout = model.layout();
            layout.validate()?;

            println!(
                "{:<5} | {:<4} | {:>4} | {:>14}",
                "DCC", "Det", "RUs", "Empty (bytes)"
            );
            println!("{:-<36}", "");
            for dcc in 0..N_DCCS {
                println!(
                    "{:<5} | {:<4} | {:>4} | {:>14.0}",
                    dcc + 1,
                    model.board_kind_of(dcc)?,
                    model.readout_unit_count_of(dcc)?,
                    model.dcc_event_size(dcc, 0.0)?
                );
            }
            for kind in [Subdetector::Barrel, Subdetector::Endcap] {
                println!(
                    "{}: {} DCCs, {} readout units, {:.0} bytes overhead per DCC",
                    kind,
                    BoardLayout::dcc_count(kind),
                    layout.total_ru(kind),
                    board_overhead(kind)
                );
            }
            println!("Readout-unit totals consistent");
        }

        Commands::Size { dcc, read_channels } => {
            let model = VolumeModel::new();
            let index = srvol_core::layout::dcc_from_logical(dcc)?;
            let bytes = model.dcc_event_size(index, read_channels)?;
            println!(
                "DCC {} ({}, {} RUs): {:.0} bytes ({:.3} kB)",
                dcc,
                model.board_kind_of(index)?,
                model.readout_unit_count_of(index)?,
                bytes,
                to_kbytes(bytes)
            );
        }

        Commands::Index { channel } => match channel {
            IndexTarget::Barrel { ieta, iphi } => {
                let crystal = BarrelCrystal::new(ieta, iphi)?;
                let (eta, phi) = crystal.indices()?;
                println!(
                    "{}: eta index {}, phi index {}, dense index {}, tower {}",
                    crystal,
                    eta,
                    phi,
                    crystal.dense_index()?,
                    crystal.tower()?
                );
            }
            IndexTarget::Endcap { side, ix, iy } => {
                let crystal = EndcapCrystal::new(side.into(), ix, iy)?;
                let (side, x, y) = crystal.indices()?;
                println!(
                    "{}: side {}, x index {}, y index {}, dense index {}",
                    crystal,
                    side,
                    x,
                    y,
                    crystal.dense_index()?
                );
            }
            IndexTarget::Tower { ieta, iphi } => {
                let tower = TriggerTower::new(ieta, iphi)?;
                let (eta, phi) = tower.indices()?;
                println!(
                    "{}: eta index {}, phi index {}, dense index {}",
                    tower,
                    eta,
                    phi,
                    tower.dense_index()?
                );
            }
        },
    }

    Ok(())
}
