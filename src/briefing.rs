//! Morning readiness briefing
//!
//! Turns the recent recovery series and strain load into a daily status
//! assessment with evidence bullets and action items.
//!
//! # Sports Science Background
//!
//! The assessment leans on three readiness markers:
//!
//! - **HRV vs. baseline**: suppressed heart-rate variability relative to
//!   the personal 30-day baseline indicates incomplete autonomic
//!   recovery; several consecutive daily drops often precede illness or
//!   injury in endurance athletes.
//! - **HRV coefficient of variation**: large day-to-day HRV swings over
//!   the last week signal a nervous system struggling to stabilize,
//!   while a low CV reflects a well-regulated one.
//! - **Resting heart rate vs. baseline**: an overnight RHR a few bpm
//!   above the 30-day baseline signals incomplete recovery.
//!
//! Recent strain is weighed against the typical 3-day load so a heavy
//! block tempers the recommendation even when the morning numbers look
//! fine.

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt;

use crate::models::{Estimate, RecoveryRecord, RunRecord};

/// RHR this many bpm above baseline counts as elevated
const RHR_ELEVATED_BPM: f64 = 3.0;

/// HRV this many ms below baseline counts as suppressed
const HRV_BELOW_MS: f64 = 5.0;

/// HRV this many ms below baseline counts as strongly suppressed
const HRV_WELL_BELOW_MS: f64 = 10.0;

/// Weekly HRV CV above this is unstable, at or below `CV_LOW_PCT` stable
const CV_HIGH_PCT: f64 = 15.0;
const CV_LOW_PCT: f64 = 10.0;

/// Recovery trending down when the 3-day average sits this far under
/// the 7-day average
const RECOVERY_DROP_PCT: f64 = 5.0;

/// 3-day strain load above typical by this factor counts as high
const STRAIN_HIGH_FACTOR: f64 = 1.25;

/// Device green/red recovery bands
const RECOVERY_GREEN: f64 = 67.0;
const RECOVERY_RED: f64 = 34.0;

/// Four-level readiness status for the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadinessStatus {
    /// Everything green; a hard session will land well
    Primed,
    /// Normal training day
    Solid,
    /// Body is working hard; keep it easy
    Cautious,
    /// Protect recovery; rest or jog at most
    Recovery,
}

impl ReadinessStatus {
    pub fn headline(&self) -> &'static str {
        match self {
            ReadinessStatus::Primed => "You're primed. Push it today.",
            ReadinessStatus::Solid => "Solid foundation. Normal training.",
            ReadinessStatus::Cautious => "Your body is working hard. Go easy today.",
            ReadinessStatus::Recovery => "Recovery mode. Protect the streak.",
        }
    }
}

impl fmt::Display for ReadinessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessStatus::Primed => write!(f, "Primed"),
            ReadinessStatus::Solid => write!(f, "Solid"),
            ReadinessStatus::Cautious => write!(f, "Cautious"),
            ReadinessStatus::Recovery => write!(f, "Recovery"),
        }
    }
}

/// Derived numbers behind the assessment, surfaced for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefingMetrics {
    pub recovery_score: f64,
    pub hrv_today: f64,
    pub resting_hr_today: f64,

    /// Mean HRV over the last 7 readings
    pub hrv_7d_avg: Option<f64>,

    /// Sample coefficient of variation of the last 7 HRV readings, in
    /// percent; needs at least 3 readings
    pub hrv_7d_cv: Option<f64>,

    /// Mean HRV over the supplied history (up to 30 days)
    pub hrv_30d_baseline: Option<f64>,

    pub resting_hr_7d_avg: Option<f64>,
    pub resting_hr_30d_baseline: Option<f64>,

    /// Mean recovery score over the last 3 readings
    pub recovery_3d_avg: Option<f64>,
    pub recovery_7d_avg: Option<f64>,

    /// Summed strain over the last 3 strain-bearing runs
    pub strain_3d: Option<f64>,

    /// Typical 3-day strain derived from the supplied run history
    pub strain_typical_3d: Option<f64>,
}

/// The morning briefing: status plus the reasoning behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Briefing {
    pub status: ReadinessStatus,
    pub headline: String,

    /// At most three evidence bullets
    pub reasons: Vec<String>,

    /// At most three concrete action items
    pub actions: Vec<String>,

    pub metrics: BriefingMetrics,
}

/// Builds the morning briefing from recent history
pub struct BriefingEngine;

impl BriefingEngine {
    /// Assess today from the recovery series (date-ascending, today
    /// last, up to ~30 days) and the recent runs supplying strain.
    ///
    /// An empty recovery series yields the insufficient-data sentinel.
    pub fn generate(recovery: &[RecoveryRecord], runs: &[RunRecord]) -> Estimate<Briefing> {
        let Some(today) = recovery.last() else {
            return Estimate::InsufficientData;
        };

        let hrv_values: Vec<f64> = recovery
            .iter()
            .map(|r| r.hrv.to_f64().unwrap_or(0.0))
            .collect();
        let rhr_values: Vec<f64> = recovery
            .iter()
            .map(|r| f64::from(r.resting_heart_rate))
            .collect();
        let rec_values: Vec<f64> = recovery
            .iter()
            .map(|r| r.recovery_score.to_f64().unwrap_or(0.0))
            .collect();
        let strain_values: Vec<f64> = runs
            .iter()
            .filter_map(|r| r.strain)
            .map(|s| s.to_f64().unwrap_or(0.0))
            .collect();

        let score = today.recovery_score.to_f64().unwrap_or(0.0);
        let hrv_today = today.hrv.to_f64().unwrap_or(0.0);
        let rhr_today = f64::from(today.resting_heart_rate);

        let hrv_7d = tail(&hrv_values, 7);
        let hrv_7d_avg = mean_of(hrv_7d);
        let hrv_30d_baseline = mean_of(&hrv_values);
        let hrv_7d_cv = coefficient_of_variation(hrv_7d);
        let hrv_dropping = hrv_values.len() >= 3 && {
            let last3 = tail(&hrv_values, 3);
            last3[0] > last3[1] && last3[1] > last3[2]
        };

        let resting_hr_7d_avg = mean_of(tail(&rhr_values, 7));
        let resting_hr_30d_baseline = mean_of(&rhr_values);
        let rhr_diff = resting_hr_30d_baseline.map(|baseline| rhr_today - baseline);
        let rhr_elevated = rhr_diff.is_some_and(|diff| diff >= RHR_ELEVATED_BPM);

        let recovery_3d_avg = mean_of(tail(&rec_values, 3));
        let recovery_7d_avg = mean_of(tail(&rec_values, 7));
        let recovery_trending_down = match (recovery_3d_avg, recovery_7d_avg) {
            (Some(d3), Some(d7)) => d3 < d7 - RECOVERY_DROP_PCT,
            _ => false,
        };

        let strain_3d = if strain_values.is_empty() {
            None
        } else {
            Some(tail(&strain_values, 3).iter().sum())
        };
        let strain_typical_3d = if strain_values.is_empty() {
            None
        } else {
            Some(strain_values.iter().sum::<f64>() / strain_values.len() as f64 * 3.0)
        };
        let strain_high = match (strain_3d, strain_typical_3d) {
            (Some(load), Some(typical)) if typical > 0.0 => load > typical * STRAIN_HIGH_FACTOR,
            _ => false,
        };

        let hrv_above = hrv_30d_baseline.is_some_and(|b| hrv_today >= b);
        let hrv_below = hrv_30d_baseline.is_some_and(|b| hrv_today < b - HRV_BELOW_MS);
        let hrv_well_below = hrv_30d_baseline.is_some_and(|b| hrv_today < b - HRV_WELL_BELOW_MS);
        let cv_high = hrv_7d_cv.is_some_and(|cv| cv > CV_HIGH_PCT);
        let cv_low = hrv_7d_cv.is_some_and(|cv| cv <= CV_LOW_PCT);

        let status = if score >= RECOVERY_GREEN && hrv_above && !rhr_elevated && cv_low {
            ReadinessStatus::Primed
        } else if score >= 50.0 && !rhr_elevated && !hrv_well_below {
            ReadinessStatus::Solid
        } else if score < RECOVERY_RED && (hrv_well_below || (rhr_elevated && cv_high)) {
            ReadinessStatus::Recovery
        } else if score < 50.0 || hrv_below || rhr_elevated || cv_high {
            ReadinessStatus::Cautious
        } else {
            ReadinessStatus::Solid
        };

        let mut reasons = Vec::new();

        if hrv_dropping {
            let last3 = tail(&hrv_values, 3);
            reasons.push(format!(
                "HRV has dropped 3 days straight ({:.0} -> {:.0} -> {:.0} ms). \
                 Consecutive drops often precede illness or injury in endurance athletes.",
                last3[0], last3[1], last3[2]
            ));
        }

        if let Some(baseline) = hrv_30d_baseline {
            let diff = hrv_today - baseline;
            if diff.abs() > 3.0 {
                let explanation = if diff > 0.0 {
                    "Elevated HRV signals strong parasympathetic tone and readiness."
                } else {
                    "Suppressed HRV means the autonomic nervous system hasn't fully recovered."
                };
                reasons.push(format!(
                    "HRV is {:.0} ms, {:.0} {} your {:.0} ms baseline. {}",
                    hrv_today,
                    diff.abs(),
                    if diff > 0.0 { "above" } else { "below" },
                    baseline,
                    explanation
                ));
            }
        }

        if let Some(cv) = hrv_7d_cv {
            if cv > CV_HIGH_PCT {
                reasons.push(format!(
                    "HRV coefficient of variation is {cv:.0}% this week. \
                     High day-to-day swings mean the nervous system is struggling to stabilize."
                ));
            } else if cv <= 8.0 && status == ReadinessStatus::Primed {
                reasons.push(format!(
                    "HRV CV is only {cv:.0}% this week. \
                     Low variability between days reflects a well-regulated autonomic system."
                ));
            }
        }

        if let (Some(baseline), Some(diff)) = (resting_hr_30d_baseline, rhr_diff) {
            if diff.abs() >= 2.0 {
                let explanation = if diff > 0.0 {
                    "Elevated resting HR signals incomplete autonomic recovery."
                } else {
                    "Lower resting HR suggests strong cardiovascular recovery."
                };
                reasons.push(format!(
                    "Resting HR is {:.0} bpm, {:.0} {} your {:.0} bpm baseline. {}",
                    rhr_today,
                    diff.abs(),
                    if diff > 0.0 { "above" } else { "below" },
                    baseline,
                    explanation
                ));
            }
        }

        if recovery_trending_down {
            if let (Some(d3), Some(d7)) = (recovery_3d_avg, recovery_7d_avg) {
                reasons.push(format!(
                    "Recovery has averaged {d3:.0}% over the last 3 days vs your \
                     7-day average of {d7:.0}%. Fatigue is accumulating."
                ));
            }
        }

        if strain_high {
            if let (Some(load), Some(typical)) = (strain_3d, strain_typical_3d) {
                reasons.push(format!(
                    "3-day strain load is {load:.0} vs your typical {typical:.0}. \
                     Accumulated strain without adequate recovery raises overtraining risk."
                ));
            }
        }

        reasons.truncate(3);

        let mut actions = Vec::new();
        match status {
            ReadinessStatus::Primed => {
                actions.push("Good day for a tempo effort or intervals.".to_string());
                actions.push("Warm up with 10 minutes of easy running before picking up the pace.".to_string());
            }
            ReadinessStatus::Solid => {
                actions.push("Stick to your normal easy pace. Solid day to build mileage.".to_string());
                if strain_high {
                    actions.push("Strain has been high, so keep today's distance modest.".to_string());
                } else {
                    actions.push("Push distance slightly if you feel good after the first mile.".to_string());
                }
            }
            ReadinessStatus::Cautious => {
                actions.push("Keep today's run short and at conversational pace.".to_string());
                if hrv_dropping {
                    actions.push("If you feel off in the first mile, cut it short.".to_string());
                } else {
                    actions.push("Focus on nasal breathing to naturally cap intensity.".to_string());
                }
                actions.push("Add easy stretching or foam rolling afterwards.".to_string());
            }
            ReadinessStatus::Recovery => {
                actions.push("Consider taking today off or cross-training.".to_string());
                actions.push("If you must run, keep it to a short jog, not a run.".to_string());
                actions.push("Prioritize sleep tonight; it will do more than any workout.".to_string());
            }
        }
        actions.truncate(3);

        Estimate::Available(Briefing {
            status,
            headline: status.headline().to_string(),
            reasons,
            actions,
            metrics: BriefingMetrics {
                recovery_score: score,
                hrv_today,
                resting_hr_today: rhr_today,
                hrv_7d_avg,
                hrv_7d_cv,
                hrv_30d_baseline,
                resting_hr_7d_avg,
                resting_hr_30d_baseline,
                recovery_3d_avg,
                recovery_7d_avg,
                strain_3d,
                strain_typical_3d,
            },
        })
    }
}

/// Last `n` values, or all of them when fewer exist
fn tail(values: &[f64], n: usize) -> &[f64] {
    &values[values.len().saturating_sub(n)..]
}

fn mean_of(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().mean())
    }
}

/// Sample standard deviation over the mean, in percent
fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    if values.len() < 3 {
        return None;
    }
    let avg = values.iter().mean();
    if avg <= 0.0 {
        return None;
    }
    Some(values.iter().std_dev() / avg * 100.0)
}
