//! CSV loading and appending for the tabular series files
//!
//! `runs.csv` columns: `date, distance_miles, time_minutes, avg_hr,
//! max_hr, strain, shoes` (strain and shoes may be empty). `recovery.csv`
//! columns: `date, recovery_score, hrv, resting_hr`. Dates are ISO
//! `YYYY-MM-DD`. Heart-rate traces never appear in CSV; the JSON loader
//! is the only source of those.

use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;

use super::{Loaded, RunSource};
use crate::error::ImportError;
use crate::models::{Equipment, RecoveryRecord, RunRecord};

const RUN_COLUMNS: [&str; 7] = [
    "date",
    "distance_miles",
    "time_minutes",
    "avg_hr",
    "max_hr",
    "strain",
    "shoes",
];

const RECOVERY_COLUMNS: [&str; 4] = ["date", "recovery_score", "hrv", "resting_hr"];

/// Serde shape of one runs.csv row
#[derive(Debug, Serialize, Deserialize)]
struct RunRow {
    date: NaiveDate,
    distance_miles: Decimal,
    time_minutes: Decimal,
    avg_hr: u16,
    max_hr: u16,
    strain: Option<Decimal>,
    shoes: Option<String>,
}

impl RunRow {
    fn into_record(self) -> Result<RunRecord, crate::models::ValidationError> {
        let mut record = RunRecord::new(
            self.date,
            self.distance_miles,
            self.time_minutes,
            self.avg_hr,
            self.max_hr,
        )?;
        if let Some(strain) = self.strain {
            record = record.with_strain(strain)?;
        }
        if let Some(shoes) = self.shoes.filter(|s| !s.is_empty()) {
            record = record.with_equipment(Equipment::from(shoes));
        }
        Ok(record)
    }

    fn from_record(record: &RunRecord) -> Self {
        RunRow {
            date: record.date,
            distance_miles: record.distance,
            time_minutes: record.duration,
            avg_hr: record.avg_heart_rate,
            max_hr: record.max_heart_rate,
            strain: record.strain,
            shoes: record.equipment.as_ref().map(|e| e.label().to_string()),
        }
    }
}

/// Serde shape of one recovery.csv row
#[derive(Debug, Serialize, Deserialize)]
struct RecoveryRow {
    date: NaiveDate,
    recovery_score: Decimal,
    hrv: Decimal,
    resting_hr: u16,
}

/// The run series in its CSV form
pub struct CsvRunSource;

impl RunSource for CsvRunSource {
    fn can_load(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
    }

    fn load(&self, path: &Path) -> Result<Loaded<RunRecord>, ImportError> {
        load_runs(path)
    }

    fn format_name(&self) -> &'static str {
        "csv"
    }
}

/// Load and validate `runs.csv`, sorting ascending by date.
pub fn load_runs(path: &Path) -> Result<Loaded<RunRecord>, ImportError> {
    if !path.exists() {
        return Err(ImportError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    check_columns(&mut reader, &RUN_COLUMNS, path)?;

    let mut records = Vec::new();
    let mut skipped_rows = 0usize;

    for (row_number, row) in reader.deserialize::<RunRow>().enumerate() {
        match row
            .map_err(ImportError::from)
            .and_then(|row| row.into_record().map_err(ImportError::from))
        {
            Ok(record) => records.push(record),
            Err(reason) => {
                tracing::warn!(row = row_number + 2, %reason, "skipping runs.csv row");
                skipped_rows += 1;
            }
        }
    }

    records.sort_by_key(|record| record.date);
    Ok(Loaded {
        records,
        skipped_rows,
    })
}

/// Load and validate `recovery.csv`, sorting ascending by date and
/// keeping the last row when a date repeats (the series invariant allows
/// at most one reading per day).
pub fn load_recovery(path: &Path) -> Result<Loaded<RecoveryRecord>, ImportError> {
    if !path.exists() {
        return Err(ImportError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    check_columns(&mut reader, &RECOVERY_COLUMNS, path)?;

    let mut by_date = std::collections::BTreeMap::new();
    let mut skipped_rows = 0usize;

    for (row_number, row) in reader.deserialize::<RecoveryRow>().enumerate() {
        let parsed = row.map_err(ImportError::from).and_then(|row| {
            RecoveryRecord::new(row.date, row.recovery_score, row.resting_hr, row.hrv)
                .map_err(ImportError::from)
        });
        match parsed {
            Ok(record) => {
                by_date.insert(record.date, record);
            }
            Err(reason) => {
                tracing::warn!(row = row_number + 2, %reason, "skipping recovery.csv row");
                skipped_rows += 1;
            }
        }
    }

    Ok(Loaded {
        records: by_date.into_values().collect(),
        skipped_rows,
    })
}

/// Append one run to `runs.csv`, writing the header for a new file.
pub fn append_run(path: &Path, record: &RunRecord) -> Result<(), ImportError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let write_header = !path.exists();

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = WriterBuilder::new().has_headers(write_header).from_writer(file);

    writer.serialize(RunRow::from_record(record))?;
    writer.flush()?;
    Ok(())
}

fn check_columns(
    reader: &mut csv::Reader<std::fs::File>,
    expected: &[&str],
    path: &Path,
) -> Result<(), ImportError> {
    let headers = reader.headers()?.clone();
    for column in expected {
        if !headers.iter().any(|h| h == *column) {
            return Err(ImportError::MissingColumn {
                column: (*column).to_string(),
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_runs_parses_and_sorts() {
        let file = write_csv(
            "date,distance_miles,time_minutes,avg_hr,max_hr,strain,shoes\n\
             2024-01-03,5.0,44.0,160,178,14.1,evosl\n\
             2024-01-01,5.0,40.0,150,172,12.5,alphafly\n",
        );

        let loaded = load_runs(file.path()).unwrap();
        assert_eq!(loaded.skipped_rows, 0);
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(
            loaded.records[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(loaded.records[0].equipment, Some(Equipment::Alphafly));
        assert_eq!(loaded.records[1].strain, Some(dec!(14.1)));
    }

    #[test]
    fn test_load_runs_tolerates_empty_optionals() {
        let file = write_csv(
            "date,distance_miles,time_minutes,avg_hr,max_hr,strain,shoes\n\
             2024-01-01,5.0,40.0,150,172,,\n",
        );

        let loaded = load_runs(file.path()).unwrap();
        assert_eq!(loaded.records[0].strain, None);
        assert_eq!(loaded.records[0].equipment, None);
    }

    #[test]
    fn test_load_runs_skips_bad_rows_and_counts() {
        let file = write_csv(
            "date,distance_miles,time_minutes,avg_hr,max_hr,strain,shoes\n\
             2024-01-01,5.0,40.0,150,172,,\n\
             not-a-date,5.0,40.0,150,172,,\n\
             2024-01-02,5.0,40.0,180,150,,\n",
        );

        // Row 2 fails parsing, row 3 fails max >= avg validation
        let loaded = load_runs(file.path()).unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.skipped_rows, 2);
    }

    #[test]
    fn test_load_runs_missing_column_fails_fast() {
        let file = write_csv("date,distance_miles,time_minutes,avg_hr\n2024-01-01,5,40,150\n");
        assert!(matches!(
            load_runs(file.path()),
            Err(ImportError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_load_recovery_dedupes_dates_last_wins() {
        let file = write_csv(
            "date,recovery_score,hrv,resting_hr\n\
             2024-01-01,60,45.0,52\n\
             2024-01-01,75,50.0,50\n",
        );

        let loaded = load_recovery(file.path()).unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].recovery_score, dec!(75));
    }

    #[test]
    fn test_append_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.csv");

        let record = RunRecord::new(
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            dec!(6.2),
            dec!(48.5),
            152,
            171,
        )
        .unwrap()
        .with_strain(dec!(13.4))
        .unwrap()
        .with_equipment(Equipment::Alphafly);

        append_run(&path, &record).unwrap();
        append_run(&path, &record).unwrap();

        let loaded = load_runs(&path).unwrap();
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.records[0], record);
    }

    #[test]
    fn test_missing_file_is_explicit() {
        assert!(matches!(
            load_runs(Path::new("/nonexistent/runs.csv")),
            Err(ImportError::FileNotFound { .. })
        ));
    }
}
