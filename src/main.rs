use anyhow::Result;
use chrono::{Days, NaiveDate};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rust_decimal::Decimal;
use std::path::PathBuf;

use runtrend::config::AppConfig;
use runtrend::engine::TrendEngine;
use runtrend::error::ImportError;
use runtrend::import;
use runtrend::logging::{init_logging, LogLevel};
use runtrend::models::{Equipment, Estimate, RecoveryRecord, RunRecord};
use runtrend::{briefing::BriefingEngine, report};

/// runtrend - running performance trends from wearable data
///
/// Analyzes the logged run series and daily recovery series for
/// efficiency, rolling averages, cardiac drift, recovery correlation and
/// per-shoe breakdowns.
#[derive(Parser)]
#[command(name = "runtrend")]
#[command(version = "0.1.0")]
#[command(about = "Running performance trend analysis", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze both series and print the trend report
    Trends {
        /// Run series file (CSV or JSON), defaults to the configured path
        #[arg(long)]
        runs: Option<PathBuf>,

        /// Recovery series file (CSV), defaults to the configured path
        #[arg(long)]
        recovery: Option<PathBuf>,

        /// Short rolling window in days
        #[arg(long)]
        short_window: Option<u32>,

        /// Long rolling window in days
        #[arg(long)]
        long_window: Option<u32>,

        /// Runs in the trailing drift mean
        #[arg(long)]
        drift_runs: Option<usize>,

        /// Minimum joined pairs before correlating
        #[arg(long)]
        min_pairs: Option<usize>,

        /// Emit the raw report bundle as JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Morning readiness briefing from recent recovery data
    Briefing {
        /// Run series file (CSV or JSON), defaults to the configured path
        #[arg(long)]
        runs: Option<PathBuf>,

        /// Recovery series file (CSV), defaults to the configured path
        #[arg(long)]
        recovery: Option<PathBuf>,
    },

    /// Append a manually logged run to the run series
    Log {
        /// Distance in miles
        distance: Decimal,

        /// Elapsed time in minutes
        duration: Decimal,

        /// Average heart rate in bpm
        #[arg(long)]
        avg_hr: u16,

        /// Maximum heart rate in bpm
        #[arg(long)]
        max_hr: u16,

        /// Device strain score
        #[arg(long)]
        strain: Option<Decimal>,

        /// Shoes worn
        #[arg(long)]
        equipment: Option<Equipment>,

        /// Run date, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Show or initialize the configuration
    Config {
        /// Print the active configuration
        #[arg(long)]
        show: bool,

        /// Write a default config file to the standard location
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if cli.verbose > 0 {
        config.logging.level = LogLevel::from_verbosity(cli.verbose);
    }
    init_logging(&config.logging);

    match cli.command {
        Commands::Trends {
            runs,
            recovery,
            short_window,
            long_window,
            drift_runs,
            min_pairs,
            json,
        } => {
            let mut engine_config = config.engine;
            if let Some(days) = short_window {
                engine_config.short_window_days = days;
            }
            if let Some(days) = long_window {
                engine_config.long_window_days = days;
            }
            if let Some(count) = drift_runs {
                engine_config.drift_smoothing_runs = count;
            }
            if let Some(count) = min_pairs {
                engine_config.min_correlation_pairs = count;
            }
            let engine = TrendEngine::with_config(engine_config)?;

            let runs_path = runs.unwrap_or_else(|| config.data.runs_path());
            let recovery_path = recovery.unwrap_or_else(|| config.data.recovery_path());

            let loaded_runs = import::load_runs(&runs_path)?;
            let recovery_records = load_recovery_or_empty(&recovery_path)?;

            let report_bundle = engine.analyze(&loaded_runs.records, &recovery_records);

            if json {
                println!("{}", serde_json::to_string_pretty(&report_bundle)?);
            } else {
                println!("{}", report::render_report(&report_bundle));
            }
            if loaded_runs.skipped_rows > 0 {
                eprintln!(
                    "{}",
                    format!("{} run rows skipped during load", loaded_runs.skipped_rows).yellow()
                );
            }
        }

        Commands::Briefing { runs, recovery } => {
            let runs_path = runs.unwrap_or_else(|| config.data.runs_path());
            let recovery_path = recovery.unwrap_or_else(|| config.data.recovery_path());

            let recovery_records = import::csv::load_recovery(&recovery_path)?.records;
            let run_records = match import::load_runs(&runs_path) {
                Ok(loaded) => loaded.records,
                Err(ImportError::FileNotFound { .. }) => Vec::new(),
                Err(e) => return Err(e.into()),
            };

            let recent_recovery = trailing_days(&recovery_records, 30, |r| r.date);
            let recent_runs = trailing_days(&run_records, 30, |r| r.date);

            match BriefingEngine::generate(recent_recovery, recent_runs) {
                Estimate::Available(briefing) => {
                    println!("{}", report::render_briefing(&briefing));
                }
                Estimate::InsufficientData => {
                    println!("{}", "Not enough recovery data for a briefing yet.".dimmed());
                }
            }
        }

        Commands::Log {
            distance,
            duration,
            avg_hr,
            max_hr,
            strain,
            equipment,
            date,
        } => {
            let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());

            let mut record = RunRecord::new(date, distance, duration, avg_hr, max_hr)
                .map_err(runtrend::RunTrendError::from)?;
            if let Some(strain) = strain {
                record = record
                    .with_strain(strain)
                    .map_err(runtrend::RunTrendError::from)?;
            }
            if let Some(equipment) = equipment {
                record = record.with_equipment(equipment);
            }

            let runs_path = config.data.runs_path();
            import::csv::append_run(&runs_path, &record)?;

            let pace = if distance > Decimal::ZERO {
                report::fmt_pace(duration / distance)
            } else {
                "N/A".to_string()
            };
            println!(
                "{}",
                format!(
                    "Logged: {} mi in {} min ({}/mi) on {}",
                    distance, duration, pace, date
                )
                .green()
            );
        }

        Commands::Config { show, init } => {
            if init {
                let path = AppConfig::default_path().ok_or_else(|| {
                    anyhow::anyhow!("no config directory available on this platform")
                })?;
                config.save(&path)?;
                println!("{}", format!("Wrote {}", path.display()).green());
            }
            if show || !init {
                print!(
                    "{}",
                    toml::to_string_pretty(&config)
                        .map_err(|e| anyhow::anyhow!("config serialization: {e}"))?
                );
            }
        }
    }

    Ok(())
}

/// Last `days` calendar days of a date-ascending series, today inclusive.
fn trailing_days<T>(records: &[T], days: u64, date_of: impl Fn(&T) -> NaiveDate) -> &[T] {
    let Some(last) = records.last() else {
        return records;
    };
    let cutoff = date_of(last)
        .checked_sub_days(Days::new(days - 1))
        .unwrap_or(NaiveDate::MIN);
    let start = records.partition_point(|record| date_of(record) < cutoff);
    &records[start..]
}

/// Missing recovery data degrades the report instead of failing it.
fn load_recovery_or_empty(path: &std::path::Path) -> Result<Vec<RecoveryRecord>> {
    match import::csv::load_recovery(path) {
        Ok(loaded) => {
            if loaded.skipped_rows > 0 {
                tracing::warn!(skipped = loaded.skipped_rows, "recovery rows skipped");
            }
            Ok(loaded.records)
        }
        Err(ImportError::FileNotFound { .. }) => {
            tracing::warn!(path = %path.display(), "no recovery file; skipping correlation");
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}
