//! Application configuration
//!
//! TOML config file holding the data-file locations, the injectable
//! engine parameters, and logging preferences. Lives at
//! `<config_dir>/runtrend/config.toml`; a missing file means defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::EngineConfig;
use crate::error::{Result, RunTrendError};
use crate::logging::LogConfig;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Where the series files live
    pub data: DataSettings,

    /// Engine parameters (windows, smoothing, pair threshold)
    pub engine: EngineConfig,

    /// Logging preferences
    pub logging: LogConfig,
}

/// Data file locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSettings {
    /// Directory the series files live in
    pub data_dir: PathBuf,

    /// Run series file name inside `data_dir`
    pub runs_file: String,

    /// Recovery series file name inside `data_dir`
    pub recovery_file: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .map(|dir| dir.join("runtrend"))
            .unwrap_or_else(|| PathBuf::from("data"));
        DataSettings {
            data_dir,
            runs_file: "runs.csv".to_string(),
            recovery_file: "recovery.csv".to_string(),
        }
    }
}

impl DataSettings {
    pub fn runs_path(&self) -> PathBuf {
        self.data_dir.join(&self.runs_file)
    }

    pub fn recovery_path(&self) -> PathBuf {
        self.data_dir.join(&self.recovery_file)
    }
}

impl AppConfig {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("runtrend").join("config.toml"))
    }

    /// Load from the given path, or from the default location; a missing
    /// file yields defaults. Engine parameters are validated here so a
    /// bad config fails before any analysis starts.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path(),
        };

        let config = match path {
            Some(ref path) if path.exists() => {
                let contents = fs::read_to_string(path)?;
                toml::from_str(&contents)
                    .map_err(|e| RunTrendError::Configuration(e.to_string()))?
            }
            _ => AppConfig::default(),
        };

        config
            .engine
            .validate()
            .map_err(|e| RunTrendError::Configuration(e.to_string()))?;
        Ok(config)
    }

    /// Write the configuration to disk, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| RunTrendError::Configuration(e.to_string()))?;
        fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.engine.validate().is_ok());
        assert_eq!(config.data.runs_file, "runs.csv");
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.engine.short_window_days = 14;

        config.save(&path).unwrap();
        let loaded = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let loaded = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded, AppConfig::default());
    }

    #[test]
    fn test_invalid_engine_settings_fail_fast() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AppConfig::default();
        config.engine.long_window_days = 0;
        fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        assert!(matches!(
            AppConfig::load(Some(&path)),
            Err(RunTrendError::Configuration(_))
        ));
    }
}
