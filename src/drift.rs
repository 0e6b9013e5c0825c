//! Intra-run cardiac drift detection
//!
//! Drift is the rise in heart rate between the first and second half of a
//! run: the trace is split into two contiguous halves at the midpoint of
//! elapsed time, and drift = mean HR of the second half minus mean HR of
//! the first. Positive drift at steady effort is a fatigue / overreaching
//! signal. The output is a raw signed magnitude in bpm; thresholding and
//! interpretation are left to the caller.
//!
//! Runs with no trace or fewer than four samples report insufficient
//! data, never zero — zero would falsely read as "no drift". No
//! pace-stability gating is applied between the halves; a run whose pace
//! shifted between splits is still analyzed as-is. Known limitation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::metrics::NormalizedRun;
use crate::models::{Estimate, HrSample};

/// Minimum trace samples for a meaningful half-split
pub const MIN_TRACE_SAMPLES: usize = 4;

/// Drift value (or sentinel) for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftMeasurement {
    /// Position of the run in the input series
    pub index: usize,

    /// Date of the run
    pub date: NaiveDate,

    /// Second-half mean HR minus first-half mean HR, in bpm
    pub drift: Estimate<Decimal>,
}

/// Per-run drift plus the trailing smoothed series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftAnalysis {
    /// Raw drift for every analyzed run, in series order
    pub per_run: Vec<DriftMeasurement>,

    /// Trailing mean of available drift values over the last N runs,
    /// one entry per run, aligned with `per_run`
    pub rolling: Vec<DriftMeasurement>,
}

/// Cardiac drift detector with a configurable smoothing window
pub struct DriftAnalyzer {
    smoothing_runs: usize,
}

impl DriftAnalyzer {
    /// `smoothing_runs` is validated by the engine configuration.
    pub fn new(smoothing_runs: usize) -> Self {
        DriftAnalyzer { smoothing_runs }
    }

    /// Analyze every run and smooth the result.
    pub fn analyze(&self, runs: &[NormalizedRun<'_>]) -> DriftAnalysis {
        let per_run: Vec<DriftMeasurement> = runs
            .iter()
            .map(|run| DriftMeasurement {
                index: run.index,
                date: run.record.date,
                drift: run
                    .record
                    .heart_rate_trace
                    .as_deref()
                    .map_or(Estimate::InsufficientData, trace_drift),
            })
            .collect();

        let rolling = per_run
            .iter()
            .enumerate()
            .map(|(position, measurement)| DriftMeasurement {
                index: measurement.index,
                date: measurement.date,
                drift: self.trailing_mean(&per_run, position),
            })
            .collect();

        DriftAnalysis { per_run, rolling }
    }

    /// Mean of the available drift values among the trailing window of
    /// runs ending at `position`. Runs whose own drift is the sentinel do
    /// not contribute; a window with no values at all stays the sentinel.
    fn trailing_mean(&self, per_run: &[DriftMeasurement], position: usize) -> Estimate<Decimal> {
        let start = (position + 1).saturating_sub(self.smoothing_runs);

        let values: Vec<Decimal> = per_run[start..=position]
            .iter()
            .filter_map(|m| m.drift.value().copied())
            .collect();

        if values.is_empty() {
            return Estimate::InsufficientData;
        }

        let sum: Decimal = values.iter().sum();
        Estimate::Available(sum / Decimal::from(values.len() as u64))
    }
}

/// Drift of a single trace: split at the elapsed-time midpoint, compare
/// half means. A sample exactly on the midpoint belongs to the first half.
pub fn trace_drift(trace: &[HrSample]) -> Estimate<Decimal> {
    if trace.len() < MIN_TRACE_SAMPLES {
        return Estimate::InsufficientData;
    }

    let first = trace[0].elapsed_seconds;
    let last = trace[trace.len() - 1].elapsed_seconds;
    let midpoint = Decimal::from(u64::from(first) + u64::from(last)) / dec!(2);

    let mut first_sum = Decimal::ZERO;
    let mut first_count = 0u64;
    let mut second_sum = Decimal::ZERO;
    let mut second_count = 0u64;

    for sample in trace {
        if Decimal::from(sample.elapsed_seconds) <= midpoint {
            first_sum += Decimal::from(sample.heart_rate);
            first_count += 1;
        } else {
            second_sum += Decimal::from(sample.heart_rate);
            second_count += 1;
        }
    }

    // Strictly increasing elapsed times put the first sample below the
    // midpoint and the last above it, so both halves are non-empty here.
    let first_mean = first_sum / Decimal::from(first_count);
    let second_mean = second_sum / Decimal::from(second_count);

    Estimate::Available(second_mean - first_mean)
}
