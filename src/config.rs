//! Configuration loading
//!
//! Settings come from a JSON file in the platform config directory
//! (`~/.config/wxlookup/config.json` on Linux), then the
//! `OPENWEATHER_API_KEY` environment variable, then command-line flags.
//! Every field has a default, so a missing file is fine.

use chrono::Duration;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;
use thiserror::Error;

use crate::location::geo::IP_LOCATE_URL;
use crate::weather::client::OPENWEATHER_BASE_URL;
use crate::weather::{Language, Units};

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

const CONFIG_FILE: &str = "config.json";

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("No API key configured; set OPENWEATHER_API_KEY or pass --api-key")]
    MissingApiKey,

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
}

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub units: Units,
    pub language: Language,
    /// How long fetched data stays fresh
    pub cache_ttl_secs: u64,
    /// Maximum entries per cache
    pub cache_capacity: usize,
    /// Watch mode re-fetch interval
    pub refresh_interval_secs: u64,
    /// Upper bound on a single API call
    pub fetch_timeout_secs: u64,
    pub base_url: String,
    pub geo_base_url: String,
    pub ip_locate_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            units: Units::Metric,
            language: Language::English,
            cache_ttl_secs: 60,
            cache_capacity: 100,
            refresh_interval_secs: 300,
            fetch_timeout_secs: 10,
            base_url: OPENWEATHER_BASE_URL.to_string(),
            geo_base_url: OPENWEATHER_BASE_URL.to_string(),
            ip_locate_url: IP_LOCATE_URL.to_string(),
        }
    }
}

impl Config {
    /// Platform config file location, if a home directory can be found
    pub fn default_path() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "wxlookup")?;
        Some(project_dirs.config_dir().join(CONFIG_FILE))
    }

    /// Loads `path`, or the platform default when `path` is `None`
    ///
    /// A missing file yields defaults. An unreadable or malformed file is an
    /// error. The API key environment variable is applied on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path(),
        };

        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            config.apply_api_key(Some(key));
        }

        Ok(config)
    }

    /// Parses a config file without consulting the environment
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Overrides the API key when `key` is a non-blank value
    pub fn apply_api_key(&mut self, key: Option<String>) {
        if let Some(key) = key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()) {
            self.api_key = Some(key);
        }
    }

    /// Checks that the settings can drive a lookup
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingApiKey);
        }
        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::NotPositive("cache_ttl_secs"));
        }
        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::NotPositive("refresh_interval_secs"));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::NotPositive("fetch_timeout_secs"));
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::NotPositive("cache_capacity"));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        // chrono caps durations at i64::MAX milliseconds
        let secs = self.cache_ttl_secs.min(i64::MAX as u64 / 1000) as i64;
        Duration::seconds(secs)
    }

    pub fn refresh_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.refresh_interval_secs)
    }

    pub fn fetch_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.fetch_timeout_secs)
    }
}
