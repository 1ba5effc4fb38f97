//! Application settings loaded from `config.toml`.
//!
//! Every field has a default so a missing file section falls back to sensible
//! values. The remote bearer token is deliberately not part of this file; it is
//! read from `SYNC_ID_TOKEN` right before the remote client is built.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::{path::Path, time::Duration};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Local store URL; `DATABASE_URL` overrides it
    #[serde(default)]
    pub database_url: Option<String>,
    /// Remote document store settings
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Retry policy for sync jobs
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Remote document store location
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Base URL of the document API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Project that owns the database
    #[serde(default)]
    pub project_id: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// How many times a retryable job is re-run and how long to wait in between
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay between attempts in milliseconds
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_base_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_backoff_ms() -> u64 {
    2_000
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            project_id: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl RemoteConfig {
    /// Request timeout as a `Duration`
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RetryConfig {
    /// Delay between attempts as a `Duration`
    #[must_use]
    pub const fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Parses configuration from TOML text
///
/// # Errors
/// Returns `Error::Config` if the TOML syntax is invalid or a field has the wrong type.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns an error if the file cannot be read or its contents cannot be parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Loads configuration from `path` if it exists, otherwise returns the defaults.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    if path.as_ref().exists() {
        load_config(path)
    } else {
        tracing::info!(
            "No configuration at {}, using defaults",
            path.as_ref().display()
        );
        Ok(AppConfig::default())
    }
}
