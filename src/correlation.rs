//! Recovery-to-performance correlation
//!
//! Joins the run series to the recovery series on calendar date (same day
//! only, no lag or interpolation) and computes the Pearson correlation of
//! recovery score against efficiency, and against pace. Lower efficiency
//! and lower pace are better, so a *negative* coefficient is the
//! hypothesis-confirming direction ("higher recovery precedes better
//! runs"). The raw coefficient is reported as-is; the sign is never
//! flipped here.

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

use crate::metrics::NormalizedRun;
use crate::models::{Estimate, RecoveryRecord};

/// Pearson coefficient with the number of joined pairs behind it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    /// Coefficient in [-1, 1]
    pub coefficient: f64,

    /// Number of (run, recovery) pairs joined on date
    pub sample_count: usize,
}

/// Correlation of recovery score against both performance metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationAnalysis {
    /// Recovery score vs. efficiency (lower efficiency = fitter)
    pub efficiency: Estimate<Correlation>,

    /// Recovery score vs. pace (lower pace = faster)
    pub pace: Estimate<Correlation>,
}

/// Same-date join and Pearson correlation over the joined set
pub struct CorrelationAnalyzer {
    min_pairs: usize,
}

impl CorrelationAnalyzer {
    /// `min_pairs` is validated by the engine configuration.
    pub fn new(min_pairs: usize) -> Self {
        CorrelationAnalyzer { min_pairs }
    }

    /// Join runs to recovery records by date and correlate.
    ///
    /// Runs without a same-date recovery record are excluded from the
    /// joined set, not imputed. Duplicate recovery dates resolve to the
    /// last record seen.
    pub fn analyze(
        &self,
        runs: &[NormalizedRun<'_>],
        recovery: &[RecoveryRecord],
    ) -> CorrelationAnalysis {
        let by_date: BTreeMap<_, _> = recovery.iter().map(|r| (r.date, r)).collect();

        let mut scores = Vec::new();
        let mut efficiencies = Vec::new();
        let mut paces = Vec::new();

        for run in runs {
            if let Some(recovery) = by_date.get(&run.record.date) {
                scores.push(recovery.recovery_score.to_f64().unwrap_or(0.0));
                efficiencies.push(run.metrics.efficiency.to_f64().unwrap_or(0.0));
                paces.push(run.metrics.pace.to_f64().unwrap_or(0.0));
            }
        }

        CorrelationAnalysis {
            efficiency: self.pearson(&scores, &efficiencies),
            pace: self.pearson(&scores, &paces),
        }
    }

    /// Pearson coefficient over paired samples.
    ///
    /// Below the pair threshold, or when either variable has zero
    /// variance, the result is the insufficient-data sentinel — never
    /// NaN and never a division by zero.
    fn pearson(&self, xs: &[f64], ys: &[f64]) -> Estimate<Correlation> {
        let n = xs.len();
        if n < self.min_pairs {
            return Estimate::InsufficientData;
        }

        let mean_x = xs.iter().mean();
        let mean_y = ys.iter().mean();

        let mut ss_x = 0.0;
        let mut ss_y = 0.0;
        let mut ss_xy = 0.0;
        for (x, y) in xs.iter().zip(ys) {
            let dx = x - mean_x;
            let dy = y - mean_y;
            ss_x += dx * dx;
            ss_y += dy * dy;
            ss_xy += dx * dy;
        }

        if ss_x.abs() < f64::EPSILON || ss_y.abs() < f64::EPSILON {
            return Estimate::InsufficientData;
        }

        let coefficient = (ss_xy / (ss_x * ss_y).sqrt()).clamp(-1.0, 1.0);

        Estimate::Available(Correlation {
            coefficient,
            sample_count: n,
        })
    }
}
