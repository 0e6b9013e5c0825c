//! Data file loading for the two input series
//!
//! The external collaborator that talks to the wearable API persists two
//! tabular files, `runs.csv` and `recovery.csv`; heart-rate traces only
//! exist in the richer JSON export. Loaders here turn those files into
//! sorted, structurally validated record series. Rows that fail
//! validation are skipped with a logged warning and counted, never
//! aborting the whole load.

use std::path::Path;

use crate::error::ImportError;
use crate::models::RunRecord;

pub mod csv;
pub mod json;

/// A loaded series plus the number of rows dropped along the way
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    /// Records in ascending date order
    pub records: Vec<T>,

    /// Rows skipped because they failed parsing or validation
    pub skipped_rows: usize,
}

/// A file format the run series can be read from
pub trait RunSource {
    /// Check whether this source handles the given file
    fn can_load(&self, path: &Path) -> bool;

    /// Load and validate the run series from the file
    fn load(&self, path: &Path) -> Result<Loaded<RunRecord>, ImportError>;

    /// Format name for log messages
    fn format_name(&self) -> &'static str;
}

/// Load the run series, picking the format from the file extension.
pub fn load_runs(path: &Path) -> Result<Loaded<RunRecord>, ImportError> {
    let sources: [&dyn RunSource; 2] = [&csv::CsvRunSource, &json::JsonRunSource];

    for source in sources {
        if source.can_load(path) {
            tracing::debug!(path = %path.display(), format = source.format_name(), "loading runs");
            return source.load(path);
        }
    }

    Err(ImportError::UnsupportedFormat {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_dispatch_by_extension() {
        let mut csv_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(csv_file, "date,distance_miles,time_minutes,avg_hr,max_hr,strain,shoes").unwrap();
        writeln!(csv_file, "2024-01-01,5.0,40.0,150,172,12.5,alphafly").unwrap();

        let loaded = load_runs(csv_file.path()).unwrap();
        assert_eq!(loaded.records.len(), 1);

        let mut json_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(json_file, "[]").unwrap();
        let loaded = load_runs(json_file.path()).unwrap();
        assert!(loaded.records.is_empty());
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let file = NamedTempFile::new().unwrap();
        assert!(load_runs(file.path()).is_err());
    }
}
