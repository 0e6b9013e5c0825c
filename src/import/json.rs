//! JSON loading for full run records
//!
//! The JSON export is an array of complete run records and is the only
//! input that carries heart-rate traces. Records are re-validated after
//! deserialization so a hand-edited file cannot smuggle in rows the
//! constructors would have rejected.

use std::fs;
use std::path::Path;

use super::{Loaded, RunSource};
use crate::error::ImportError;
use crate::models::{RunRecord, ValidationError};

/// The run series in its JSON form
pub struct JsonRunSource;

impl RunSource for JsonRunSource {
    fn can_load(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    }

    fn load(&self, path: &Path) -> Result<Loaded<RunRecord>, ImportError> {
        load_runs(path)
    }

    fn format_name(&self) -> &'static str {
        "json"
    }
}

/// Load and validate a JSON run file, sorting ascending by date.
pub fn load_runs(path: &Path) -> Result<Loaded<RunRecord>, ImportError> {
    if !path.exists() {
        return Err(ImportError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let contents = fs::read_to_string(path)?;
    let raw: Vec<RunRecord> = serde_json::from_str(&contents)?;

    let mut records = Vec::with_capacity(raw.len());
    let mut skipped_rows = 0usize;

    for (position, record) in raw.into_iter().enumerate() {
        match revalidate(record) {
            Ok(record) => records.push(record),
            Err(reason) => {
                tracing::warn!(position, %reason, "skipping JSON run record");
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

/// Re-run the constructor checks on a deserialized record.
fn revalidate(record: RunRecord) -> Result<RunRecord, ValidationError> {
    let mut rebuilt = RunRecord::new(
        record.date,
        record.distance,
        record.duration,
        record.avg_heart_rate,
        record.max_heart_rate,
    )?;
    if let Some(strain) = record.strain {
        rebuilt = rebuilt.with_strain(strain)?;
    }
    if let Some(equipment) = record.equipment {
        rebuilt = rebuilt.with_equipment(equipment);
    }
    if let Some(trace) = record.heart_rate_trace {
        rebuilt = rebuilt.with_trace(trace)?;
    }
    Ok(rebuilt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_json(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_runs_with_trace() {
        let file = write_json(
            r#"[{
                "date": "2024-01-02",
                "distance": "5.0",
                "duration": "40.0",
                "avg_heart_rate": 150,
                "max_heart_rate": 172,
                "strain": "12.5",
                "equipment": "alphafly",
                "heart_rate_trace": [
                    {"elapsed_seconds": 0, "heart_rate": 140},
                    {"elapsed_seconds": 300, "heart_rate": 142},
                    {"elapsed_seconds": 600, "heart_rate": 145},
                    {"elapsed_seconds": 900, "heart_rate": 147}
                ]
            }]"#,
        );

        let loaded = load_runs(file.path()).unwrap();
        assert_eq!(loaded.skipped_rows, 0);
        let trace = loaded.records[0].heart_rate_trace.as_ref().unwrap();
        assert_eq!(trace.len(), 4);
    }

    #[test]
    fn test_invalid_record_is_skipped() {
        // Second record has max HR below avg and must not survive
        let file = write_json(
            r#"[
                {"date": "2024-01-01", "distance": "5.0", "duration": "40.0",
                 "avg_heart_rate": 150, "max_heart_rate": 172,
                 "strain": null, "equipment": null, "heart_rate_trace": null},
                {"date": "2024-01-02", "distance": "5.0", "duration": "40.0",
                 "avg_heart_rate": 180, "max_heart_rate": 150,
                 "strain": null, "equipment": null, "heart_rate_trace": null}
            ]"#,
        );

        let loaded = load_runs(file.path()).unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.skipped_rows, 1);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let file = write_json("{not json");
        assert!(matches!(
            load_runs(file.path()),
            Err(ImportError::Json(_))
        ));
    }
}
