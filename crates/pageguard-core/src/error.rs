//! Core error types for pageguard-core.
//!
//! Resource-loading errors never escape the loader's public entry points
//! (`preload_critical_assets` always resolves Ok); these types exist so the
//! retry path can distinguish timeouts from reported load failures, and so
//! embedders that call `load_asset` directly get a typed reason.

use thiserror::Error;

use crate::vitals::ObserverFamily;

/// Errors from a single asset load attempt.
///
/// Both variants are transient from the loader's point of view: the retry
/// path treats a timeout exactly like a reported load failure.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// No load/error signal arrived within the configured timeout.
    #[error("Timed out loading {url} after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    /// The host reported a load failure (network, 404, CORS).
    #[error("Failed to load {url}: {reason}")]
    Load { url: String, reason: String },
}

/// Errors from performance-observer registration.
#[derive(Error, Debug)]
pub enum ObserverError {
    /// The environment does not expose this observer family. Caught at
    /// registration time; the corresponding metric stays absent for the
    /// session.
    #[error("Performance observer '{0}' is not supported in this environment")]
    Unsupported(ObserverFamily),
}

/// Errors from delivering a metrics report. Always swallowed by the
/// reporter; surfaced only at debug level.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Analytics endpoint rejected report: HTTP {status}")]
    Rejected { status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid analytics endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Umbrella error type for pageguard-core.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Loader error: {0}")]
    Loader(#[from] LoaderError),

    #[error("Observer error: {0}")]
    Observer(#[from] ObserverError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
