//! Trailing calendar-day rolling aggregation
//!
//! For every date with at least one run, averages pace, average heart rate
//! and strain over all runs in the trailing window of `window_days`
//! calendar days (the window counts days, not runs). Dates whose window is
//! empty simply do not appear in the output. All arithmetic is `Decimal`,
//! so results are exact and independent of summation order.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::metrics::NormalizedRun;

/// Windowed means for one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingPoint {
    /// Last day of the window (a date with at least one run)
    pub date: NaiveDate,

    /// Number of runs inside the window
    pub run_count: usize,

    /// Mean pace over the window, minutes per mile
    pub mean_pace: Decimal,

    /// Mean of per-run average heart rates, bpm
    pub mean_heart_rate: Decimal,

    /// Mean strain over the runs that have one; None when no run in the
    /// window carries a strain value (partial aggregation, never zero)
    pub mean_strain: Option<Decimal>,
}

/// Trailing-window aggregator over the normalized run series
pub struct RollingAggregator {
    window_days: u32,
}

impl RollingAggregator {
    /// Window size is validated by the engine configuration before this
    /// is constructed, so a plain constructor is enough here.
    pub fn new(window_days: u32) -> Self {
        RollingAggregator { window_days }
    }

    /// Compute one `RollingPoint` per distinct run date, ascending.
    ///
    /// `runs` must be date-ordered; the engine guarantees that.
    pub fn aggregate(&self, runs: &[NormalizedRun<'_>]) -> Vec<RollingPoint> {
        let dates: BTreeSet<NaiveDate> = runs.iter().map(|run| run.record.date).collect();

        dates
            .into_iter()
            .filter_map(|date| self.window_point(runs, date))
            .collect()
    }

    fn window_point(&self, runs: &[NormalizedRun<'_>], date: NaiveDate) -> Option<RollingPoint> {
        let start = date
            .checked_sub_days(Days::new(u64::from(self.window_days).saturating_sub(1)))
            .unwrap_or(NaiveDate::MIN);

        let mut count = 0usize;
        let mut pace_sum = Decimal::ZERO;
        let mut hr_sum = Decimal::ZERO;
        let mut strain_sum = Decimal::ZERO;
        let mut strain_count = 0usize;

        for run in runs {
            if run.record.date < start || run.record.date > date {
                continue;
            }
            count += 1;
            pace_sum += run.metrics.pace;
            hr_sum += Decimal::from(run.record.avg_heart_rate);
            if let Some(strain) = run.record.strain {
                strain_sum += strain;
                strain_count += 1;
            }
        }

        if count == 0 {
            return None;
        }

        let divisor = Decimal::from(count as u64);
        let mean_strain = if strain_count > 0 {
            Some(strain_sum / Decimal::from(strain_count as u64))
        } else {
            None
        };

        Some(RollingPoint {
            date,
            run_count: count,
            mean_pace: pace_sum / divisor,
            mean_heart_rate: hr_sum / divisor,
            mean_strain,
        })
    }
}
