//! Configuration for the loader, collector and report sink.
//!
//! The programmatic `Default`s are the normal path; embedding shells that
//! carry a settings file can deserialize a `[loader]`/`[report]` TOML table
//! instead. Every field has a serde default so partial tables work.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Deployment environment, selects the report sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

/// Retry and timeout policy for asset loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Failure count at which a URL becomes terminally `Failed`.
    /// One initial attempt plus `max_retries - 1` retries.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Linear backoff base: the retry after failure `k` waits `k * retry_delay_ms`.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// How long a single attempt waits for the host's load/error signal.
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,
    /// Substring patterns marking a URL as critical. Exhaustion of a
    /// critical asset surfaces the user-visible fallback notice.
    #[serde(default = "default_critical_patterns")]
    pub critical_patterns: Vec<String>,
}

impl LoaderConfig {
    /// Whether `url` matches any configured critical pattern.
    pub fn is_critical(&self, url: &str) -> bool {
        self.critical_patterns.iter().any(|p| url.contains(p.as_str()))
    }
}

/// Report sink configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub environment: Environment,
    /// Analytics endpoint, resolved against the page origin when relative.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Interval for the periodic background report. Zero disables it.
    #[serde(default = "default_report_interval_secs")]
    pub report_interval_secs: u64,
}

/// Top-level configuration for a [`crate::PageGuard`] service.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GuardConfig {
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

impl GuardConfig {
    /// Parse a TOML configuration string. Missing tables and fields fall
    /// back to their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            load_timeout_ms: default_load_timeout_ms(),
            critical_patterns: default_critical_patterns(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            endpoint: default_endpoint(),
            report_interval_secs: default_report_interval_secs(),
        }
    }
}

// Default functions
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    1000
}
fn default_load_timeout_ms() -> u64 {
    10_000
}
fn default_critical_patterns() -> Vec<String> {
    vec![
        "react-core".to_string(),
        "runtime".to_string(),
        "main".to_string(),
    ]
}
fn default_endpoint() -> String {
    "/api/analytics/performance".to_string()
}
fn default_report_interval_secs() -> u64 {
    30
}
