//! mutrack: batch reconstruction of muon telescope data.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand};
use mutrack_core::{
    Diagnostic, DiagnosticSink, FitterConfig, Geometry, QualityConfig, QualityFilter, RowRange,
    Severity, TargetCoordinate, TrajectoryFitter,
};
use mutrack_io::{ingest, HitTable, NamingScheme, TrackWriter};
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

    #[error("I/O error: {0}")]
    MutrackIo(#[from] mutrack_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] mutrack_core::Error),
}

/// Forwards structured diagnostics to the `log` crate.
struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Info => log::info!("{diagnostic}"),
            Severity::Warning => log::warn!("{diagnostic}"),
            Severity::Error => log::error!("{diagnostic}"),
        }
    }
}

/// Muon telescope data processor.
#[derive(Parser)]
#[command(name = "mutrack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest raw plane files into a hit table
    Ingest {
        /// Directory to scan for dataset triplets
        data_dir: PathBuf,

        /// Output hit table path
        #[arg(short, long)]
        output: PathBuf,

        /// Naming tag between dataset prefix and plane suffix
        #[arg(long, default_value = "_06h00_mate-")]
        tag: String,
    },

    /// Fit trajectories for every table row and write them as CSV
    Reconstruct {
        /// Input hit table
        table: PathBuf,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,

        /// Plane z positions for the fit (defaults to the geometry depths)
        #[arg(long, num_args = 3, value_names = ["Z1", "Z2", "Z3"])]
        z_positions: Option<Vec<f64>>,

        /// Geometry JSON file (defaults to the deployed telescope)
        #[arg(long)]
        geometry: Option<PathBuf>,

        /// Disable parallel fitting
        #[arg(long)]
        sequential: bool,
    },

    /// Apply quality cuts and export accepted-event polylines
    Polylines {
        /// Input hit table
        table: PathBuf,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,

        /// Geometry JSON file
        #[arg(long)]
        geometry: Option<PathBuf>,

        /// Maximum transverse residual in cm
        #[arg(long, default_value = "1.0")]
        residual_tolerance: f64,

        /// Maximum kink angle in degrees
        #[arg(long, default_value = "5.0")]
        angle_tolerance: f64,

        /// Samples per polyline
        #[arg(long, default_value = "200")]
        samples: usize,

        /// First row ordinal (inclusive)
        #[arg(long)]
        start: Option<usize>,

        /// Last row ordinal (inclusive)
        #[arg(long)]
        end: Option<usize>,
    },

    /// List events crossing one middle-plane coordinate with their
    /// incidence angles
    Explore {
        /// Input hit table
        table: PathBuf,

        /// Target A strip on the middle plane [0, 11]
        #[arg(long)]
        a: i64,

        /// Target B strip on the middle plane [0, 11]
        #[arg(long)]
        b: i64,

        /// Geometry JSON file
        #[arg(long)]
        geometry: Option<PathBuf>,
    },

    /// Show information about a hit table
    Info {
        /// Input hit table
        table: PathBuf,
    },
}

fn load_geometry(path: Option<&PathBuf>) -> Result<Geometry> {
    match path {
        Some(path) => Ok(Geometry::from_file(path)?),
        None => Ok(Geometry::default()),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let mut sink = LogSink;

    match cli.command {
        Commands::Ingest {
            data_dir,
            output,
            tag,
        } => {
            let start = Instant::now();
            let scheme = NamingScheme::new(tag);
            let summary = ingest(&data_dir, &scheme, &output, &mut sink)?;
            println!(
                "Ingested {} dataset(s) ({} skipped): {} rows in {:.2?}",
                summary.datasets,
                summary.skipped_datasets,
                summary.rows,
                start.elapsed()
            );
        }

        Commands::Reconstruct {
            table,
            output,
            z_positions,
            geometry,
            sequential,
        } => {
            let start = Instant::now();
            let geometry = load_geometry(geometry.as_ref())?;
            let depths = match z_positions {
                Some(z) => [z[0], z[1], z[2]],
                None => geometry.plane_depths_cm,
            };
            let fitter = TrajectoryFitter::new(depths)?.with_config(FitterConfig {
                parallel: !sequential,
            });

            let table = HitTable::open(&table)?;
            let rows: Vec<_> = table.iter().collect();
            let fits = fitter.fit_rows(&rows);

            let mut writer = TrackWriter::create(&output)?;
            writer.write_fits_csv(&fits)?;
            println!(
                "Reconstructed {} track(s) in {:.2?} -> {}",
                fits.len(),
                start.elapsed(),
                output.display()
            );
        }

        Commands::Polylines {
            table,
            output,
            geometry,
            residual_tolerance,
            angle_tolerance,
            samples,
            start,
            end,
        } => {
            let began = Instant::now();
            let geometry = load_geometry(geometry.as_ref())?;
            let config = QualityConfig {
                residual_tolerance_cm: residual_tolerance,
                angle_tolerance_deg: angle_tolerance,
                polyline_samples: samples,
            };
            let filter = QualityFilter::new(geometry, config)?;

            let table = HitTable::open(&table)?;
            if table.is_empty() {
                println!("Table is empty; nothing to filter");
                return Ok(());
            }
            let range = RowRange::new(
                start.unwrap_or(0),
                end.unwrap_or(table.len().saturating_sub(1)),
                table.len(),
            )?;
            if let (Some(first), Some(last)) = (table.row(range.start), table.row(range.end)) {
                println!(
                    "Analyzing rows {}..={} (events {}..={})",
                    range.start, range.end, first.evn, last.evn
                );
            }

            let mut accepted = Vec::new();
            for (ordinal, row) in table.enumerate() {
                if ordinal < range.start || ordinal > range.end {
                    continue;
                }
                if let Some(line) = filter.polyline(&row) {
                    accepted.push((ordinal, line));
                }
            }

            let mut writer = TrackWriter::create(&output)?;
            writer.write_polylines_csv(accepted.iter().map(|(i, line)| (*i, line)))?;
            println!(
                "Accepted {} of {} event(s) in {:.2?} -> {}",
                accepted.len(),
                range.len(),
                began.elapsed(),
                output.display()
            );
        }

        Commands::Explore {
            table,
            a,
            b,
            geometry,
        } => {
            let geometry = load_geometry(geometry.as_ref())?;
            let target = TargetCoordinate::new(a, b)?;
            let table = HitTable::open(&table)?;
            let summary = mutrack_core::incidence_scan(table.enumerate(), target, &geometry);

            if summary.matches.is_empty() {
                println!("No events found at (A2, B2) = ({a}, {b})");
                return Ok(());
            }

            println!("row\tA1\tB1\ttheta_deg");
            for hit in &summary.matches {
                println!(
                    "{}\t{}\t{}\t{:.3}",
                    hit.row, hit.a1, hit.b1, hit.theta_deg
                );
            }
            match summary.fit {
                Some(fit) => println!(
                    "fit over {} point(s): slope {:.5}, intercept {:.5} cm, theta {:.3} deg",
                    summary.matches.len(),
                    fit.slope,
                    fit.intercept_cm,
                    fit.theta_deg
                ),
                None => println!("not enough points for an aggregate fit"),
            }
        }

        Commands::Info { table } => {
            let table = HitTable::open(&table)?;
            println!("rows: {}", table.len());
            println!("columns: {}", mutrack_io::COLUMNS.join(","));
            if let (Some(first), Some(last)) =
                (table.row(0), table.row(table.len().saturating_sub(1)))
            {
                println!("event range: {}..={}", first.evn, last.evn);
            }
        }
    }

    Ok(())
}
