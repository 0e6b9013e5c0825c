use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Structural validation errors raised when constructing records
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Elapsed run time must be a positive number of minutes
    #[error("duration must be positive, got {0}")]
    NonPositiveDuration(Decimal),

    /// Device-reported max HR can never be below the average
    #[error("max heart rate {max} is below average heart rate {avg}")]
    MaxBelowAverage { max: u16, avg: u16 },

    /// Strain is a non-negative load score
    #[error("strain must be non-negative, got {0}")]
    NegativeStrain(Decimal),

    /// Recovery score is a 0-100 readiness percentage
    #[error("recovery score {0} is outside 0-100")]
    RecoveryScoreOutOfRange(Decimal),

    /// HRV is measured in milliseconds and cannot be negative
    #[error("hrv must be non-negative, got {0}")]
    NegativeHrv(Decimal),

    /// Resting heart rate of zero means no reading was taken
    #[error("resting heart rate must be positive")]
    NonPositiveRestingHr,

    /// Trace samples must be ordered by strictly increasing elapsed time
    #[error("heart rate trace elapsed times must be strictly increasing")]
    NonMonotonicTrace,
}

/// Running equipment label.
///
/// The known set covers the shoes in rotation; anything else is carried
/// through as `Other` so new shoes group correctly without a code change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Equipment {
    Alphafly,
    EvoSl,
    Cloudmonster,
    ZoomFly,
    Other(String),
}

impl Equipment {
    /// Canonical lowercase label used for grouping and CSV storage
    pub fn label(&self) -> &str {
        match self {
            Equipment::Alphafly => "alphafly",
            Equipment::EvoSl => "evosl",
            Equipment::Cloudmonster => "cloudmonster",
            Equipment::ZoomFly => "zoomfly",
            Equipment::Other(name) => name.as_str(),
        }
    }
}

impl fmt::Display for Equipment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl From<String> for Equipment {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "alphafly" => Equipment::Alphafly,
            "evosl" => Equipment::EvoSl,
            "cloudmonster" => Equipment::Cloudmonster,
            "zoomfly" => Equipment::ZoomFly,
            _ => Equipment::Other(value),
        }
    }
}

impl From<Equipment> for String {
    fn from(value: Equipment) -> Self {
        value.label().to_string()
    }
}

impl std::str::FromStr for Equipment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Equipment::from(s.to_string()))
    }
}

/// Single heart-rate sample within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HrSample {
    /// Seconds elapsed since the start of the run
    pub elapsed_seconds: u32,

    /// Heart rate in beats per minute
    pub heart_rate: u16,
}

impl HrSample {
    pub fn new(elapsed_seconds: u32, heart_rate: u16) -> Self {
        HrSample {
            elapsed_seconds,
            heart_rate,
        }
    }
}

/// One logged run, immutable once constructed.
///
/// Distance and duration come from the manual log; heart-rate fields and
/// strain come from the matched device workout. `heart_rate_trace` is only
/// present when the device export includes intra-run samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Calendar date of the run
    pub date: NaiveDate,

    /// Distance in miles (unit is fixed across the whole dataset)
    pub distance: Decimal,

    /// Elapsed time in minutes
    pub duration: Decimal,

    /// Average heart rate in bpm
    pub avg_heart_rate: u16,

    /// Maximum heart rate in bpm, never below the average
    pub max_heart_rate: u16,

    /// Device-reported strain score, absent when no workout was matched
    pub strain: Option<Decimal>,

    /// Shoe label, absent for runs logged without one
    pub equipment: Option<Equipment>,

    /// Intra-run heart-rate samples, strictly increasing elapsed time
    pub heart_rate_trace: Option<Vec<HrSample>>,
}

impl RunRecord {
    /// Construct a run, enforcing the structural invariants.
    ///
    /// Metric validity (positive distance, positive average HR) is
    /// deliberately NOT checked here: such records are excluded with an
    /// audit note by the metric normalizer instead of rejected at
    /// construction, so data-quality loss stays visible downstream.
    pub fn new(
        date: NaiveDate,
        distance: Decimal,
        duration: Decimal,
        avg_heart_rate: u16,
        max_heart_rate: u16,
    ) -> Result<Self, ValidationError> {
        if duration <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveDuration(duration));
        }
        if max_heart_rate < avg_heart_rate {
            return Err(ValidationError::MaxBelowAverage {
                max: max_heart_rate,
                avg: avg_heart_rate,
            });
        }

        Ok(RunRecord {
            date,
            distance,
            duration,
            avg_heart_rate,
            max_heart_rate,
            strain: None,
            equipment: None,
            heart_rate_trace: None,
        })
    }

    /// Attach a device strain score
    pub fn with_strain(mut self, strain: Decimal) -> Result<Self, ValidationError> {
        if strain < Decimal::ZERO {
            return Err(ValidationError::NegativeStrain(strain));
        }
        self.strain = Some(strain);
        Ok(self)
    }

    /// Attach a shoe label
    pub fn with_equipment(mut self, equipment: Equipment) -> Self {
        self.equipment = Some(equipment);
        self
    }

    /// Attach an intra-run heart-rate trace.
    ///
    /// Elapsed times must be strictly increasing; sample count is not
    /// checked here since short traces are valid records, the drift
    /// detector just reports insufficient data for them.
    pub fn with_trace(mut self, trace: Vec<HrSample>) -> Result<Self, ValidationError> {
        let monotonic = trace
            .windows(2)
            .all(|pair| pair[0].elapsed_seconds < pair[1].elapsed_seconds);
        if !monotonic {
            return Err(ValidationError::NonMonotonicTrace);
        }
        self.heart_rate_trace = Some(trace);
        Ok(self)
    }
}

/// One daily recovery reading from the wearable, immutable once constructed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryRecord {
    /// Calendar date of the reading
    pub date: NaiveDate,

    /// Readiness score in [0, 100]
    pub recovery_score: Decimal,

    /// Overnight resting heart rate in bpm
    pub resting_heart_rate: u16,

    /// Heart-rate variability (RMSSD) in milliseconds
    pub hrv: Decimal,
}

impl RecoveryRecord {
    pub fn new(
        date: NaiveDate,
        recovery_score: Decimal,
        resting_heart_rate: u16,
        hrv: Decimal,
    ) -> Result<Self, ValidationError> {
        if recovery_score < Decimal::ZERO || recovery_score > Decimal::from(100) {
            return Err(ValidationError::RecoveryScoreOutOfRange(recovery_score));
        }
        if resting_heart_rate == 0 {
            return Err(ValidationError::NonPositiveRestingHr);
        }
        if hrv < Decimal::ZERO {
            return Err(ValidationError::NegativeHrv(hrv));
        }

        Ok(RecoveryRecord {
            date,
            recovery_score,
            resting_heart_rate,
            hrv,
        })
    }
}

/// Result of a computation that may not have enough data behind it.
///
/// Distinct from both an error (nothing went wrong) and a numeric zero
/// (which would falsely read as a neutral measurement).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Estimate<T> {
    /// The computation ran and produced a value
    Available(T),
    /// Below the minimum data threshold; no value exists
    InsufficientData,
}

impl<T> Estimate<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Estimate::Available(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Estimate::Available(value) => Some(value),
            Estimate::InsufficientData => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Estimate::Available(value) => Some(value),
            Estimate::InsufficientData => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Estimate<U> {
        match self {
            Estimate::Available(value) => Estimate::Available(f(value)),
            Estimate::InsufficientData => Estimate::InsufficientData,
        }
    }
}

impl<T> From<Option<T>> for Estimate<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Estimate::Available(value),
            None => Estimate::InsufficientData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_run_record_construction() {
        let run = RunRecord::new(date(2024, 1, 1), dec!(5.0), dec!(40.0), 150, 172).unwrap();
        assert_eq!(run.distance, dec!(5.0));
        assert_eq!(run.strain, None);
        assert_eq!(run.equipment, None);
        assert_eq!(run.heart_rate_trace, None);
    }

    #[test]
    fn test_run_record_rejects_max_below_avg() {
        let result = RunRecord::new(date(2024, 1, 1), dec!(5.0), dec!(40.0), 160, 150);
        assert_eq!(
            result.unwrap_err(),
            ValidationError::MaxBelowAverage { max: 150, avg: 160 }
        );
    }

    #[test]
    fn test_run_record_rejects_non_positive_duration() {
        let result = RunRecord::new(date(2024, 1, 1), dec!(5.0), dec!(0), 150, 172);
        assert!(matches!(
            result,
            Err(ValidationError::NonPositiveDuration(_))
        ));
    }

    #[test]
    fn test_run_record_allows_zero_distance() {
        // Metric validity is the normalizer's job, not the constructor's
        let run = RunRecord::new(date(2024, 1, 1), dec!(0), dec!(40.0), 150, 172);
        assert!(run.is_ok());
    }

    #[test]
    fn test_run_record_rejects_negative_strain() {
        let run = RunRecord::new(date(2024, 1, 1), dec!(5.0), dec!(40.0), 150, 172).unwrap();
        assert!(matches!(
            run.with_strain(dec!(-1.0)),
            Err(ValidationError::NegativeStrain(_))
        ));
    }

    #[test]
    fn test_run_record_rejects_unordered_trace() {
        let run = RunRecord::new(date(2024, 1, 1), dec!(5.0), dec!(40.0), 150, 172).unwrap();
        let trace = vec![
            HrSample::new(0, 140),
            HrSample::new(300, 142),
            HrSample::new(300, 144),
        ];
        assert_eq!(
            run.with_trace(trace).unwrap_err(),
            ValidationError::NonMonotonicTrace
        );
    }

    #[test]
    fn test_recovery_record_score_bounds() {
        assert!(RecoveryRecord::new(date(2024, 1, 1), dec!(0), 52, dec!(48.0)).is_ok());
        assert!(RecoveryRecord::new(date(2024, 1, 1), dec!(100), 52, dec!(48.0)).is_ok());
        assert!(matches!(
            RecoveryRecord::new(date(2024, 1, 1), dec!(100.1), 52, dec!(48.0)),
            Err(ValidationError::RecoveryScoreOutOfRange(_))
        ));
    }

    #[test]
    fn test_equipment_parsing_round_trip() {
        assert_eq!(Equipment::from("Alphafly".to_string()), Equipment::Alphafly);
        assert_eq!(Equipment::from("zoomfly".to_string()), Equipment::ZoomFly);
        assert_eq!(
            Equipment::from("trackspikes".to_string()),
            Equipment::Other("trackspikes".to_string())
        );
        assert_eq!(Equipment::Cloudmonster.label(), "cloudmonster");
    }

    #[test]
    fn test_estimate_distinguishes_zero_from_missing() {
        let zero: Estimate<Decimal> = Estimate::Available(Decimal::ZERO);
        let missing: Estimate<Decimal> = Estimate::InsufficientData;
        assert!(zero.is_available());
        assert!(!missing.is_available());
        assert_ne!(zero, missing);
    }
}
