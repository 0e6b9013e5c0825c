//! Per-run metric normalization
//!
//! Derives the two scalar metrics every other analysis consumes:
//!
//! - **pace** = duration / distance, in minutes per mile
//! - **efficiency** = pace / avg HR, heart-rate cost per unit of pace
//!
//! Lower efficiency means the same pace was held at a lower heart rate,
//! i.e. better cardiovascular fitness. Records that cannot be normalized
//! (non-positive distance or average HR) are excluded with an audit note
//! rather than failing the whole series.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::RunRecord;

/// Why a single record could not be normalized
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MetricError {
    #[error("distance must be positive to derive pace")]
    NonPositiveDistance,
    #[error("average heart rate must be positive to derive efficiency")]
    NonPositiveHeartRate,
}

/// Derived scalar metrics for one run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Minutes per mile
    pub pace: Decimal,

    /// Pace divided by average heart rate; lower is fitter
    pub efficiency: Decimal,
}

/// A run that passed normalization, carrying its derived metrics.
///
/// `index` is the position in the input series, preserved so audit notes
/// and per-run outputs line up with what the caller handed in.
#[derive(Debug, Clone, Copy)]
pub struct NormalizedRun<'a> {
    pub index: usize,
    pub record: &'a RunRecord,
    pub metrics: RunMetrics,
}

/// Audit note for a record dropped during normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionNote {
    /// Position of the record in the input series
    pub index: usize,

    /// Date of the excluded run
    pub date: NaiveDate,

    /// Human-readable reason the record was dropped
    pub reason: String,
}

/// Normalization output: the surviving runs plus the exclusion audit trail
#[derive(Debug, Clone)]
pub struct NormalizedSeries<'a> {
    pub runs: Vec<NormalizedRun<'a>>,
    pub excluded: Vec<ExclusionNote>,
}

/// Derive pace and efficiency for a single record.
pub fn normalize(record: &RunRecord) -> Result<RunMetrics, MetricError> {
    if record.distance <= Decimal::ZERO {
        return Err(MetricError::NonPositiveDistance);
    }
    if record.avg_heart_rate == 0 {
        return Err(MetricError::NonPositiveHeartRate);
    }

    let pace = record.duration / record.distance;
    let efficiency = pace / Decimal::from(record.avg_heart_rate);

    Ok(RunMetrics { pace, efficiency })
}

/// Stateless normalizer applying the exclude-and-continue policy
pub struct MetricNormalizer;

impl MetricNormalizer {
    /// Normalize a whole series, excluding records that fail and noting why.
    ///
    /// Indices refer to positions in `runs` as given; order is preserved.
    pub fn normalize_series(runs: &[RunRecord]) -> NormalizedSeries<'_> {
        let mut normalized = Vec::with_capacity(runs.len());
        let mut excluded = Vec::new();

        for (index, record) in runs.iter().enumerate() {
            match normalize(record) {
                Ok(metrics) => normalized.push(NormalizedRun {
                    index,
                    record,
                    metrics,
                }),
                Err(reason) => {
                    tracing::warn!(index, date = %record.date, %reason, "excluding run from analysis");
                    excluded.push(ExclusionNote {
                        index,
                        date: record.date,
                        reason: reason.to_string(),
                    });
                }
            }
        }

        NormalizedSeries {
            runs: normalized,
            excluded,
        }
    }
}
