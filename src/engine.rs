//! Trend analysis engine
//!
//! `TrendEngine` is the in-process boundary of the system: it takes the
//! two read-only series, runs the five analytical components, and returns
//! one flat `TrendReport` bundle. It holds no state between invocations
//! and never mutates its inputs; all failures other than a bad
//! configuration are per-record and end up as audit notes, not errors.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cohort::{self, CohortSummary};
use crate::correlation::{Correlation, CorrelationAnalyzer};
use crate::drift::{DriftAnalyzer, DriftMeasurement};
use crate::metrics::{ExclusionNote, MetricNormalizer, NormalizedRun};
use crate::models::{Estimate, RecoveryRecord, RunRecord};
use crate::rolling::{RollingAggregator, RollingPoint};

/// Engine-level errors; only configuration is global and fatal
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Injectable engine parameters.
///
/// Defaults follow the analysis the reports were designed around:
/// trailing 7-day and 30-day windows, drift smoothed over the last 10
/// runs, and at least 3 joined pairs before correlating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Short trailing window in calendar days
    pub short_window_days: u32,

    /// Long trailing window in calendar days
    pub long_window_days: u32,

    /// Run count for the trailing drift mean
    pub drift_smoothing_runs: usize,

    /// Minimum joined (run, recovery) pairs before correlating
    pub min_correlation_pairs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            short_window_days: 7,
            long_window_days: 30,
            drift_smoothing_runs: 10,
            min_correlation_pairs: 3,
        }
    }
}

impl EngineConfig {
    /// Fail fast on parameters no computation can honor.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.short_window_days == 0 || self.long_window_days == 0 {
            return Err(EngineError::Configuration(
                "rolling window size must be at least 1 day".to_string(),
            ));
        }
        if self.drift_smoothing_runs == 0 {
            return Err(EngineError::Configuration(
                "drift smoothing run count must be at least 1".to_string(),
            ));
        }
        if self.min_correlation_pairs < 2 {
            return Err(EngineError::Configuration(
                "minimum correlation pairs must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

/// Normalized metrics for one surviving run, in date order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerRunMetrics {
    /// Position of the run in the input series
    pub index: usize,
    pub date: NaiveDate,
    pub distance: Decimal,
    pub duration: Decimal,
    pub pace: Decimal,
    pub efficiency: Decimal,
    pub avg_heart_rate: u16,
    pub strain: Option<Decimal>,
    pub equipment: Option<String>,
}

/// The flat result bundle for one analysis invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    /// Parameters the analysis ran with
    pub config: EngineConfig,

    /// Normalized per-run metrics, date-ascending
    pub per_run_metrics: Vec<PerRunMetrics>,

    /// Trailing means over the short window (7 days by default)
    pub rolling_short: Vec<RollingPoint>,

    /// Trailing means over the long window (30 days by default)
    pub rolling_long: Vec<RollingPoint>,

    /// Raw cardiac drift per run
    pub drift_per_run: Vec<DriftMeasurement>,

    /// Trailing smoothed drift, aligned with `drift_per_run`
    pub drift_rolling: Vec<DriftMeasurement>,

    /// Recovery score vs. efficiency
    pub correlation_efficiency: Estimate<Correlation>,

    /// Recovery score vs. pace
    pub correlation_pace: Estimate<Correlation>,

    /// Per-equipment summaries, count-descending
    pub cohort_breakdown: Vec<CohortSummary>,

    /// Audit notes for records dropped during normalization
    pub excluded_records: Vec<ExclusionNote>,
}

/// The analysis engine, configured once and reusable across invocations
pub struct TrendEngine {
    config: EngineConfig,
}

impl TrendEngine {
    /// Engine with default parameters
    pub fn new() -> Self {
        TrendEngine {
            config: EngineConfig::default(),
        }
    }

    /// Engine with caller-supplied parameters; rejects invalid ones
    /// before any computation runs.
    pub fn with_config(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(TrendEngine { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the full analysis over read-only snapshots of both series.
    ///
    /// The run series is expected date-ascending; out-of-order input is
    /// re-ordered internally (stably, keeping original indices for the
    /// audit trail) rather than treated as a failure.
    pub fn analyze(&self, runs: &[RunRecord], recovery: &[RecoveryRecord]) -> TrendReport {
        let mut series = MetricNormalizer::normalize_series(runs);
        series.runs.sort_by_key(|run| run.record.date);

        let rolling_short = RollingAggregator::new(self.config.short_window_days);
        let rolling_long = RollingAggregator::new(self.config.long_window_days);
        let drift = DriftAnalyzer::new(self.config.drift_smoothing_runs);
        let correlation = CorrelationAnalyzer::new(self.config.min_correlation_pairs);

        let drift_analysis = drift.analyze(&series.runs);
        let correlation_analysis = correlation.analyze(&series.runs, recovery);

        TrendReport {
            config: self.config,
            per_run_metrics: series.runs.iter().map(per_run_metrics).collect(),
            rolling_short: rolling_short.aggregate(&series.runs),
            rolling_long: rolling_long.aggregate(&series.runs),
            drift_per_run: drift_analysis.per_run,
            drift_rolling: drift_analysis.rolling,
            correlation_efficiency: correlation_analysis.efficiency,
            correlation_pace: correlation_analysis.pace,
            cohort_breakdown: cohort::breakdown(&series.runs),
            excluded_records: series.excluded,
        }
    }
}

impl Default for TrendEngine {
    fn default() -> Self {
        TrendEngine::new()
    }
}

fn per_run_metrics(run: &NormalizedRun<'_>) -> PerRunMetrics {
    PerRunMetrics {
        index: run.index,
        date: run.record.date,
        distance: run.record.distance,
        duration: run.record.duration,
        pace: run.metrics.pace,
        efficiency: run.metrics.efficiency,
        avg_heart_rate: run.record.avg_heart_rate,
        strain: run.record.strain,
        equipment: run.record.equipment.as_ref().map(|e| e.label().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn run(day: u32, distance: Decimal, duration: Decimal, avg_hr: u16) -> RunRecord {
        RunRecord {
            date: date(day),
            distance,
            duration,
            avg_heart_rate: avg_hr,
            max_heart_rate: avg_hr + 15,
            strain: None,
            equipment: None,
            heart_rate_trace: None,
        }
    }

    #[test]
    fn test_config_rejects_zero_window() {
        let config = EngineConfig {
            short_window_days: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            TrendEngine::with_config(config),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn test_config_rejects_zero_smoothing() {
        let config = EngineConfig {
            drift_smoothing_runs: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_tiny_pair_threshold() {
        let config = EngineConfig {
            min_correlation_pairs: 1,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_report_bundles_all_components() {
        let runs = vec![
            run(1, dec!(5), dec!(40), 150),
            run(2, dec!(5), dec!(40), 150),
            run(3, dec!(5), dec!(44), 160),
        ];
        let report = TrendEngine::new().analyze(&runs, &[]);

        assert_eq!(report.per_run_metrics.len(), 3);
        assert_eq!(report.rolling_short.len(), 3);
        assert_eq!(report.rolling_long.len(), 3);
        assert_eq!(report.drift_per_run.len(), 3);
        assert_eq!(report.drift_rolling.len(), 3);
        assert_eq!(report.cohort_breakdown.len(), 1);
        assert!(report.excluded_records.is_empty());
        // No recovery data joined: correlation cannot run
        assert_eq!(report.correlation_efficiency, Estimate::InsufficientData);
        assert_eq!(report.correlation_pace, Estimate::InsufficientData);
    }

    #[test]
    fn test_bad_record_is_noted_and_skipped_everywhere() {
        let runs = vec![
            run(1, dec!(5), dec!(40), 150),
            run(2, dec!(0), dec!(40), 150), // unusable distance
            run(3, dec!(5), dec!(44), 160),
        ];
        let report = TrendEngine::new().analyze(&runs, &[]);

        assert_eq!(report.per_run_metrics.len(), 2);
        assert_eq!(report.excluded_records.len(), 1);
        assert_eq!(report.excluded_records[0].index, 1);
        let counted: usize = report.cohort_breakdown.iter().map(|c| c.run_count).sum();
        assert_eq!(counted, 2);
    }

    #[test]
    fn test_out_of_order_input_is_reordered_with_original_indices() {
        let runs = vec![
            run(3, dec!(5), dec!(44), 160),
            run(1, dec!(5), dec!(40), 150),
        ];
        let report = TrendEngine::new().analyze(&runs, &[]);

        assert_eq!(report.per_run_metrics[0].date, date(1));
        assert_eq!(report.per_run_metrics[0].index, 1);
        assert_eq!(report.per_run_metrics[1].date, date(3));
        assert_eq!(report.per_run_metrics[1].index, 0);
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let runs = vec![run(3, dec!(5), dec!(44), 160), run(1, dec!(5), dec!(40), 150)];
        let before = runs.clone();
        let _ = TrendEngine::new().analyze(&runs, &[]);
        assert_eq!(runs, before);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let runs = vec![
            run(1, dec!(5), dec!(40), 150),
            run(1, dec!(3), dec!(27), 140),
            run(2, dec!(5), dec!(41), 152),
        ];
        let engine = TrendEngine::new();
        assert_eq!(engine.analyze(&runs, &[]), engine.analyze(&runs, &[]));
    }
}
