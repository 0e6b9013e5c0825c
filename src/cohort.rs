//! Per-equipment cohort breakdown
//!
//! Groups normalized runs by shoe label (runs without one form the
//! explicit "unlabeled" group) and summarizes each group. Groups are
//! ordered by descending run count with ties broken lexically by label,
//! so the output is stable and diffable across invocations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::metrics::NormalizedRun;

/// Group label for runs logged without equipment
pub const UNLABELED: &str = "unlabeled";

/// Summary statistics for one equipment group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortSummary {
    /// Equipment label, or "unlabeled"
    pub label: String,

    /// Number of runs in the group
    pub run_count: usize,

    /// Mean pace across the group, minutes per mile
    pub mean_pace: Decimal,

    /// Mean of per-run average heart rates, bpm
    pub mean_heart_rate: Decimal,

    /// Mean efficiency across the group; lower is fitter
    pub mean_efficiency: Decimal,

    /// Mean strain over the runs that have one; None when none do
    pub mean_strain: Option<Decimal>,
}

/// Group runs by equipment label and summarize each group.
pub fn breakdown(runs: &[NormalizedRun<'_>]) -> Vec<CohortSummary> {
    let mut groups: BTreeMap<String, Vec<&NormalizedRun<'_>>> = BTreeMap::new();

    for run in runs {
        let label = run
            .record
            .equipment
            .as_ref()
            .map_or_else(|| UNLABELED.to_string(), |e| e.label().to_string());
        groups.entry(label).or_default().push(run);
    }

    let mut summaries: Vec<CohortSummary> = groups
        .into_iter()
        .map(|(label, members)| summarize(label, &members))
        .collect();

    // BTreeMap iteration already gave lexical label order; a stable sort
    // by descending count keeps that order within equal counts.
    summaries.sort_by(|a, b| b.run_count.cmp(&a.run_count));
    summaries
}

fn summarize(label: String, members: &[&NormalizedRun<'_>]) -> CohortSummary {
    let count = members.len();
    let divisor = Decimal::from(count as u64);

    let mut pace_sum = Decimal::ZERO;
    let mut hr_sum = Decimal::ZERO;
    let mut efficiency_sum = Decimal::ZERO;
    let mut strain_sum = Decimal::ZERO;
    let mut strain_count = 0u64;

    for run in members {
        pace_sum += run.metrics.pace;
        hr_sum += Decimal::from(run.record.avg_heart_rate);
        efficiency_sum += run.metrics.efficiency;
        if let Some(strain) = run.record.strain {
            strain_sum += strain;
            strain_count += 1;
        }
    }

    let mean_strain = if strain_count > 0 {
        Some(strain_sum / Decimal::from(strain_count))
    } else {
        None
    };

    CohortSummary {
        label,
        run_count: count,
        mean_pace: pace_sum / divisor,
        mean_heart_rate: hr_sum / divisor,
        mean_efficiency: efficiency_sum / divisor,
        mean_strain,
    }
}
