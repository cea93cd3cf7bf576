// Tue Jan 13 2026 - Alex

use crate::orchestrator::FailurePolicy;
use crate::table::KeyConflictPolicy;
use crate::utils::LoggingUtils;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Engine-level settings shared by every run of a controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub worker_threads: usize,
    pub failure_policy: FailurePolicy,
    pub key_conflict_policy: KeyConflictPolicy,
    pub enable_progress_bars: bool,
    pub enable_verbose_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_threads: num_cpus::get(),
            failure_policy: FailurePolicy::Abort,
            key_conflict_policy: KeyConflictPolicy::Reject,
            enable_progress_bars: true,
            enable_verbose_output: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_key_conflict_policy(mut self, policy: KeyConflictPolicy) -> Self {
        self.key_conflict_policy = policy;
        self
    }

    pub fn with_progress_bars(mut self, enabled: bool) -> Self {
        self.enable_progress_bars = enabled;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.enable_verbose_output = verbose;
        self
    }

    /// Level for `verbosity` repeated `-v` flags. Verbose output counts as one.
    pub fn log_level(&self, verbosity: usize) -> LevelFilter {
        LoggingUtils::level_from_verbosity(verbosity.max(usize::from(self.enable_verbose_output)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_threads == 0 {
            return Err(ConfigError::Invalid("worker_threads must be greater than 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_use_defaults() {
        let config: Config = serde_json::from_str(r#"{"failure_policy": "merge_available"}"#).unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::MergeAvailable);
        assert_eq!(config.key_conflict_policy, KeyConflictPolicy::Reject);
        assert_eq!(config.worker_threads, num_cpus::get());
        assert!(config.enable_progress_bars);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let config = Config::new().with_worker_threads(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        assert!(Config::new().validate().is_ok());
    }

    #[test]
    fn test_log_level_follows_verbosity() {
        assert_eq!(Config::new().log_level(0), LevelFilter::Info);
        assert_eq!(Config::new().with_verbose(true).log_level(0), LevelFilter::Debug);
        assert_eq!(Config::new().with_verbose(true).log_level(2), LevelFilter::Trace);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"worker_threads": 3, "key_conflict_policy": "last_wins"}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.worker_threads, 3);
        assert_eq!(config.key_conflict_policy, KeyConflictPolicy::LastWins);

        fs::write(&path, r#"{"worker_threads": 0}"#).unwrap();
        assert!(Config::load(&path).is_err());
    }
}
