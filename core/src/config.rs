//! config.rs
//! Aggregator configuration. Every field has a default, so an empty JSON
//! object is a valid config.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_MAX_AGE, DEFAULT_MAX_DEVICES, DEFAULT_REAP_INTERVAL, DEFAULT_SANITY_CEILING,
    MAX_DEVICES_LIMIT,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregatorConfig {
    /// Inactivity timeout before the reaper evicts a device.
    pub max_age_secs: u64,
    /// Period of the background reaper cycle.
    pub reap_interval_ms: u64,
    /// Stored totals above this are discarded on load.
    pub sanity_ceiling: u64,
    /// Registry capacity.
    pub max_devices: usize,
    /// Durable counter file.
    /// - `None` → in-memory store (nothing survives a restart).
    pub store_path: Option<PathBuf>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_age_secs: DEFAULT_MAX_AGE.as_secs(),
            reap_interval_ms: DEFAULT_REAP_INTERVAL.as_millis() as u64,
            sanity_ceiling: DEFAULT_SANITY_CEILING,
            max_devices: DEFAULT_MAX_DEVICES,
            store_path: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("config read error: {0}")]
    Io(#[from] std::io::Error),
}

impl AggregatorConfig {
    pub fn with_store_path(path: impl Into<PathBuf>) -> Self {
        Self { store_path: Some(path.into()), ..Default::default() }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_age_secs == 0 {
            return Err(ConfigError::Invalid { field: "max_age_secs", reason: "must be > 0".into() });
        }
        if self.reap_interval_ms == 0 {
            return Err(ConfigError::Invalid { field: "reap_interval_ms", reason: "must be > 0".into() });
        }
        if self.sanity_ceiling == 0 {
            return Err(ConfigError::Invalid { field: "sanity_ceiling", reason: "must be > 0".into() });
        }
        if self.max_devices == 0 {
            return Err(ConfigError::Invalid { field: "max_devices", reason: "must be > 0".into() });
        }
        if self.max_devices > MAX_DEVICES_LIMIT {
            return Err(ConfigError::Invalid {
                field: "max_devices",
                reason: format!("must be <= {MAX_DEVICES_LIMIT}"),
            });
        }
        Ok(())
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_millis(self.reap_interval_ms)
    }
}
