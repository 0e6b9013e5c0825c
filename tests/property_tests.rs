use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use runtrend::cohort;
use runtrend::correlation::CorrelationAnalyzer;
use runtrend::drift::trace_drift;
use runtrend::metrics::MetricNormalizer;
use runtrend::models::{Estimate, HrSample, RecoveryRecord, RunRecord};
use runtrend::rolling::RollingAggregator;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .checked_add_days(chrono::Days::new(u64::from(day)))
        .unwrap()
}

/// Tenths keep the generated values exact in Decimal
fn run(day: u32, distance_tenths: u32, duration_tenths: u32, avg_hr: u16) -> RunRecord {
    RunRecord::new(
        date(day),
        Decimal::from(distance_tenths) / Decimal::from(10),
        Decimal::from(duration_tenths) / Decimal::from(10),
        avg_hr,
        avg_hr.saturating_add(20),
    )
    .unwrap()
}

prop_compose! {
    fn arb_run()(day in 0u32..28, distance in 10u32..150, duration in 150u32..1500, hr in 100u16..200) -> RunRecord {
        run(day, distance, duration, hr)
    }
}

proptest! {
    #[test]
    fn prop_correlation_coefficient_is_bounded(
        pairs in prop::collection::vec((0u32..=1000, 150u32..1500, 100u16..200), 3..40)
    ) {
        let runs: Vec<RunRecord> = pairs
            .iter()
            .enumerate()
            .map(|(i, (_, duration, hr))| run(i as u32, 50, *duration, *hr))
            .collect();
        let recovery: Vec<RecoveryRecord> = pairs
            .iter()
            .enumerate()
            .map(|(i, (score, _, _))| {
                RecoveryRecord::new(
                    date(i as u32),
                    Decimal::from(*score) / Decimal::from(10),
                    50,
                    Decimal::from(45),
                )
                .unwrap()
            })
            .collect();

        let series = MetricNormalizer::normalize_series(&runs);
        let analysis = CorrelationAnalyzer::new(3).analyze(&series.runs, &recovery);

        for estimate in [analysis.efficiency, analysis.pace] {
            if let Estimate::Available(correlation) = estimate {
                prop_assert!(correlation.coefficient >= -1.0);
                prop_assert!(correlation.coefficient <= 1.0);
                prop_assert!(correlation.coefficient.is_finite());
            }
        }
    }

    #[test]
    fn prop_wide_window_equals_global_mean(runs in prop::collection::vec(arb_run(), 1..30)) {
        let series = MetricNormalizer::normalize_series(&runs);
        let points = RollingAggregator::new(365).aggregate(&series.runs);

        let last_date = series.runs.iter().map(|r| r.record.date).max().unwrap();
        let last_point = points.iter().find(|p| p.date == last_date).unwrap();

        let global_pace: Decimal = series.runs.iter().map(|r| r.metrics.pace).sum::<Decimal>()
            / Decimal::from(series.runs.len() as u64);

        prop_assert_eq!(last_point.run_count, series.runs.len());
        prop_assert_eq!(last_point.mean_pace, global_pace);
    }

    #[test]
    fn prop_cohort_counts_sum_to_run_count(runs in prop::collection::vec(arb_run(), 0..30)) {
        let series = MetricNormalizer::normalize_series(&runs);
        let summaries = cohort::breakdown(&series.runs);

        let total: usize = summaries.iter().map(|s| s.run_count).sum();
        prop_assert_eq!(total, series.runs.len());
    }

    #[test]
    fn prop_short_traces_never_produce_a_number(
        samples in prop::collection::vec((0u32..10000, 80u16..210), 0..4)
    ) {
        let mut trace: Vec<HrSample> = samples
            .into_iter()
            .map(|(elapsed, hr)| HrSample::new(elapsed, hr))
            .collect();
        trace.sort_by_key(|s| s.elapsed_seconds);
        trace.dedup_by_key(|s| s.elapsed_seconds);

        prop_assert_eq!(trace_drift(&trace), Estimate::InsufficientData);
    }

    #[test]
    fn prop_constant_trace_has_zero_drift(
        len in 4usize..50, hr in 80u16..210
    ) {
        let trace: Vec<HrSample> = (0..len)
            .map(|i| HrSample::new(i as u32 * 30, hr))
            .collect();

        prop_assert_eq!(trace_drift(&trace), Estimate::Available(Decimal::ZERO));
    }
}
