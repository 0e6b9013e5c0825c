// Library interface for the runtrend modules
// The binary and the integration tests both go through this surface

pub mod briefing;
pub mod cohort;
pub mod config;
pub mod correlation;
pub mod drift;
pub mod engine;
pub mod error;
pub mod import;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod report;
pub mod rolling;

// Re-export commonly used types for convenience
pub use briefing::{Briefing, BriefingEngine, ReadinessStatus};
pub use config::AppConfig;
pub use engine::{EngineConfig, EngineError, TrendEngine, TrendReport};
pub use error::{Result, RunTrendError};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use models::{Equipment, Estimate, HrSample, RecoveryRecord, RunRecord};
