//! Terminal rendering of the trend report and morning briefing
//!
//! Formatting only; every number here is computed by the engine. Output
//! is a plain `String` so tests can assert on it and `main` just prints.

use colored::Colorize;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt::Write;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::briefing::{Briefing, ReadinessStatus};
use crate::engine::TrendReport;
use crate::models::Estimate;

/// Arrows matching the trend direction markers of the report format
const UP: &str = "^";
const DOWN: &str = "v";
const FLAT: &str = "=";

/// How many of the most recent runs the report table shows
const RECENT_RUNS: usize = 10;

#[derive(Tabled)]
struct RunDisplayRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Miles")]
    distance: String,
    #[tabled(rename = "Pace")]
    pace: String,
    #[tabled(rename = "Avg HR")]
    avg_heart_rate: String,
    #[tabled(rename = "Efficiency")]
    efficiency: String,
    #[tabled(rename = "Strain")]
    strain: String,
    #[tabled(rename = "Shoes")]
    equipment: String,
}

#[derive(Tabled)]
struct CohortDisplayRow {
    #[tabled(rename = "Shoes")]
    label: String,
    #[tabled(rename = "Runs")]
    run_count: usize,
    #[tabled(rename = "Avg Pace")]
    mean_pace: String,
    #[tabled(rename = "Avg HR")]
    mean_heart_rate: String,
    #[tabled(rename = "Avg Efficiency")]
    mean_efficiency: String,
    #[tabled(rename = "Avg Strain")]
    mean_strain: String,
}

/// Format float minutes (7.817) as a M:SS pace string (7:49).
pub fn fmt_pace(minutes: Decimal) -> String {
    if minutes <= Decimal::ZERO {
        return "N/A".to_string();
    }
    let whole = minutes.trunc();
    let seconds = ((minutes - whole) * Decimal::from(60))
        .trunc()
        .to_i64()
        .unwrap_or(0);
    format!("{}:{:02}", whole, seconds)
}

/// Trend arrow plus a word for it, given which direction is good.
pub fn trend_arrow(diff: f64, threshold: f64, lower_is_better: bool) -> (&'static str, &'static str) {
    if diff.abs() < threshold {
        return (FLAT, "steady");
    }
    let improving = if lower_is_better { diff < 0.0 } else { diff > 0.0 };
    if improving {
        (if diff < 0.0 { DOWN } else { UP }, "improving")
    } else {
        (if diff < 0.0 { DOWN } else { UP }, "declining")
    }
}

/// Render the full trend report.
pub fn render_report(report: &TrendReport) -> String {
    let mut out = String::new();

    let header = format!(
        "RUN TREND REPORT — {} runs analyzed, {} excluded",
        report.per_run_metrics.len(),
        report.excluded_records.len()
    );
    let _ = writeln!(out, "{}", header.bold());

    render_recent_runs(&mut out, report);
    render_snapshot(&mut out, report);
    render_drift(&mut out, report);
    render_correlation(&mut out, report);
    render_cohorts(&mut out, report);
    render_exclusions(&mut out, report);

    out
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{}", title.cyan().bold());
}

fn render_recent_runs(out: &mut String, report: &TrendReport) {
    if report.per_run_metrics.is_empty() {
        return;
    }
    section(out, "RECENT RUNS");

    let start = report.per_run_metrics.len().saturating_sub(RECENT_RUNS);
    let rows: Vec<RunDisplayRow> = report.per_run_metrics[start..]
        .iter()
        .map(|run| RunDisplayRow {
            date: run.date.to_string(),
            distance: run.distance.round_dp(1).to_string(),
            pace: fmt_pace(run.pace),
            avg_heart_rate: run.avg_heart_rate.to_string(),
            efficiency: run.efficiency.round_dp(4).to_string(),
            strain: run
                .strain
                .map_or_else(|| "-".to_string(), |s| s.round_dp(1).to_string()),
            equipment: run.equipment.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    let _ = writeln!(out, "{}", Table::new(rows).with(Style::sharp()));
}

fn render_snapshot(out: &mut String, report: &TrendReport) {
    let (Some(short), Some(long)) = (report.rolling_short.last(), report.rolling_long.last())
    else {
        return;
    };

    section(
        out,
        &format!(
            "SNAPSHOT — trailing {}d vs {}d",
            report.config.short_window_days, report.config.long_window_days
        ),
    );

    let pace_diff = (short.mean_pace - long.mean_pace).to_f64().unwrap_or(0.0);
    let (arrow, status) = trend_arrow(pace_diff, 0.1, true);
    let _ = writeln!(
        out,
        "  Pace    {} vs {}  {} ({})",
        fmt_pace(short.mean_pace),
        fmt_pace(long.mean_pace),
        arrow,
        status
    );

    let hr_diff = (short.mean_heart_rate - long.mean_heart_rate)
        .to_f64()
        .unwrap_or(0.0);
    let (arrow, status) = trend_arrow(hr_diff, 1.0, true);
    let _ = writeln!(
        out,
        "  Avg HR  {} vs {} bpm  {} ({})",
        short.mean_heart_rate.round_dp(0),
        long.mean_heart_rate.round_dp(0),
        arrow,
        status
    );

    if let (Some(short_strain), Some(long_strain)) = (short.mean_strain, long.mean_strain) {
        let _ = writeln!(
            out,
            "  Strain  {} vs {}  ({:+.1})",
            short_strain.round_dp(1),
            long_strain.round_dp(1),
            (short_strain - long_strain).to_f64().unwrap_or(0.0)
        );
    }
}

fn render_drift(out: &mut String, report: &TrendReport) {
    let Some(latest) = report.drift_rolling.last() else {
        return;
    };

    section(out, "CARDIAC DRIFT");
    match &latest.drift {
        Estimate::Available(drift) => {
            let value = format!("{:+.1} bpm", drift.to_f64().unwrap_or(0.0));
            let _ = writeln!(
                out,
                "  Smoothed drift over last {} runs: {}",
                report.config.drift_smoothing_runs,
                if *drift > Decimal::from(3) {
                    value.red()
                } else {
                    value.normal()
                }
            );
        }
        Estimate::InsufficientData => {
            let _ = writeln!(out, "  {}", "Not enough trace data yet.".dimmed());
        }
    }
}

fn render_correlation(out: &mut String, report: &TrendReport) {
    section(out, "RECOVERY vs PERFORMANCE");

    for (name, estimate) in [
        ("efficiency", &report.correlation_efficiency),
        ("pace", &report.correlation_pace),
    ] {
        match estimate {
            Estimate::Available(correlation) => {
                let _ = writeln!(
                    out,
                    "  recovery ~ {:<10} r = {:+.2}  ({} pairs)",
                    name, correlation.coefficient, correlation.sample_count
                );
            }
            Estimate::InsufficientData => {
                let _ = writeln!(
                    out,
                    "  recovery ~ {:<10} {}",
                    name,
                    "insufficient data".dimmed()
                );
            }
        }
    }
    let _ = writeln!(
        out,
        "  {}",
        "(negative r = better recovery went with better runs)".dimmed()
    );
}

fn render_cohorts(out: &mut String, report: &TrendReport) {
    if report.cohort_breakdown.is_empty() {
        return;
    }
    section(out, "SHOE BREAKDOWN");

    let rows: Vec<CohortDisplayRow> = report
        .cohort_breakdown
        .iter()
        .map(|cohort| CohortDisplayRow {
            label: cohort.label.clone(),
            run_count: cohort.run_count,
            mean_pace: fmt_pace(cohort.mean_pace),
            mean_heart_rate: cohort.mean_heart_rate.round_dp(0).to_string(),
            mean_efficiency: cohort.mean_efficiency.round_dp(4).to_string(),
            mean_strain: cohort
                .mean_strain
                .map_or_else(|| "-".to_string(), |s| s.round_dp(1).to_string()),
        })
        .collect();

    let _ = writeln!(out, "{}", Table::new(rows).with(Style::sharp()));
}

fn render_exclusions(out: &mut String, report: &TrendReport) {
    if report.excluded_records.is_empty() {
        return;
    }
    section(out, "EXCLUDED RECORDS");
    for note in &report.excluded_records {
        let _ = writeln!(
            out,
            "  {} run #{} on {}: {}",
            "!".yellow(),
            note.index,
            note.date,
            note.reason
        );
    }
}

/// Render the morning briefing.
pub fn render_briefing(briefing: &Briefing) -> String {
    let mut out = String::new();

    let headline = match briefing.status {
        ReadinessStatus::Primed => briefing.headline.green().bold(),
        ReadinessStatus::Solid => briefing.headline.yellow().bold(),
        ReadinessStatus::Cautious => briefing.headline.truecolor(255, 140, 0).bold(),
        ReadinessStatus::Recovery => briefing.headline.red().bold(),
    };
    let _ = writeln!(out, "{} — {}", briefing.status.to_string().bold(), headline);

    let metrics = &briefing.metrics;
    let _ = writeln!(
        out,
        "  Recovery {:.0}%  HRV {:.0} ms  RHR {:.0} bpm",
        metrics.recovery_score, metrics.hrv_today, metrics.resting_hr_today
    );
    if let (Some(avg), Some(baseline)) = (metrics.hrv_7d_avg, metrics.hrv_30d_baseline) {
        let _ = writeln!(
            out,
            "  HRV 7d avg {:.1} ms, 30d baseline {:.1} ms",
            avg, baseline
        );
    }

    if !briefing.reasons.is_empty() {
        let _ = writeln!(out, "\n{}", "WHY".cyan().bold());
        for reason in &briefing.reasons {
            let _ = writeln!(out, "  - {}", reason);
        }
    }

    if !briefing.actions.is_empty() {
        let _ = writeln!(out, "\n{}", "TODAY".cyan().bold());
        for action in &briefing.actions {
            let _ = writeln!(out, "  - {}", action);
        }
    }

    out
}
