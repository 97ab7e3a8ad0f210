//! Engine configuration.
//!
//! Values come from `Default`, a JSON file, or `AIREADY_*` environment
//! variables layered over the defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, ScanError};

pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_MAX_REDIRECTS: usize = 5;
pub const DEFAULT_CRITICAL_WEIGHT_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-fetch timeout for well-known files.
    pub fetch_timeout_ms: u64,
    pub max_redirects: usize,
    pub user_agent: String,
    /// Upper bound on pages scanned at the same time.
    pub max_concurrent_pages: usize,
    /// Failed indicators weighted above this are reported as critical.
    pub critical_weight_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: format!("aiready/{}", env!("CARGO_PKG_VERSION")),
            max_concurrent_pages: num_cpus::get() * 2,
            critical_weight_threshold: DEFAULT_CRITICAL_WEIGHT_THRESHOLD,
        }
    }
}

impl EngineConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Load a config from a JSON file. Missing fields fall back to defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ScanError::config(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| ScanError::config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with any `AIREADY_*` variables set in the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup("AIREADY_FETCH_TIMEOUT_MS") {
            config.fetch_timeout_ms = parse_var("AIREADY_FETCH_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("AIREADY_MAX_REDIRECTS") {
            config.max_redirects = parse_var("AIREADY_MAX_REDIRECTS", &v)?;
        }
        if let Some(v) = lookup("AIREADY_USER_AGENT") {
            config.user_agent = v;
        }
        if let Some(v) = lookup("AIREADY_MAX_CONCURRENT_PAGES") {
            config.max_concurrent_pages = parse_var("AIREADY_MAX_CONCURRENT_PAGES", &v)?;
        }
        if let Some(v) = lookup("AIREADY_CRITICAL_WEIGHT_THRESHOLD") {
            config.critical_weight_threshold =
                parse_var("AIREADY_CRITICAL_WEIGHT_THRESHOLD", &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fetch_timeout_ms == 0 {
            return Err(ScanError::config("fetch_timeout_ms must be greater than zero"));
        }
        if self.max_concurrent_pages == 0 {
            return Err(ScanError::config(
                "max_concurrent_pages must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ScanError::config(format!("{} has invalid value '{}'", key, value)))
}
