//! Dashboard client settings.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{
    DEFAULT_API_URL, DEFAULT_MAX_FETCH_RETRIES, DEFAULT_MAX_MEDIA_BYTES,
    DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_THROTTLE_INTERVAL_MS,
};
use crate::panels::RetryPolicy;

/// Settings shared by every panel of the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardSettings {
    /// Base URL of the backend, without the `/api` suffix.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Minimum spacing between calls to the same endpoint in milliseconds.
    #[serde(default = "default_throttle_interval")]
    pub throttle_interval_ms: u64,

    /// Automatic retries after a failed settings fetch.
    #[serde(default = "default_max_fetch_retries")]
    pub max_fetch_retries: u32,

    /// Backoff unit in milliseconds; retry `n` waits `base * 2^(n+1)`.
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,

    /// Largest accepted media attachment in bytes.
    #[serde(default = "default_max_media_bytes")]
    pub max_media_bytes: usize,

    /// Default log filter, used when neither `RUST_LOG` nor `--log-level`
    /// is given.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_owned()
}

fn default_throttle_interval() -> u64 {
    DEFAULT_THROTTLE_INTERVAL_MS
}

fn default_max_fetch_retries() -> u32 {
    DEFAULT_MAX_FETCH_RETRIES
}

fn default_retry_base_delay() -> u64 {
    DEFAULT_RETRY_BASE_DELAY_MS
}

fn default_max_media_bytes() -> usize {
    DEFAULT_MAX_MEDIA_BYTES
}

fn default_log_level() -> String {
    "info".to_owned()
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            throttle_interval_ms: default_throttle_interval(),
            max_fetch_retries: default_max_fetch_retries(),
            retry_base_delay_ms: default_retry_base_delay(),
            max_media_bytes: default_max_media_bytes(),
            log_level: default_log_level(),
        }
    }
}

impl DashboardSettings {
    /// Creates settings from environment variables, falling back to defaults
    /// for anything unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Creates settings from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("ROBOMOD_API_URL").map_or_else(default_api_url, |url| {
            url.trim_end_matches('/').to_owned()
        });
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(api_url));
        }

        Ok(Self {
            api_url,
            throttle_interval_ms: parse_var(
                &lookup,
                "THROTTLE_INTERVAL_MS",
                default_throttle_interval(),
            )?,
            max_fetch_retries: parse_var(
                &lookup,
                "MAX_FETCH_RETRIES",
                default_max_fetch_retries(),
            )?,
            retry_base_delay_ms: parse_var(
                &lookup,
                "RETRY_BASE_DELAY_MS",
                default_retry_base_delay(),
            )?,
            max_media_bytes: parse_var(&lookup, "MAX_MEDIA_BYTES", default_max_media_bytes())?,
            log_level: lookup("LOG_LEVEL")
                .filter(|level| !level.trim().is_empty())
                .unwrap_or_else(default_log_level),
        })
    }

    /// Spacing enforced by each panel's request throttle.
    #[must_use]
    pub const fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_interval_ms)
    }

    /// Retry policy for the initial settings fetch of every panel.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_fetch_retries,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value: raw }),
        None => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: '{value}' (expected a non-negative integer)")]
    InvalidNumber { name: &'static str, value: String },

    #[error("Invalid backend URL '{0}' (must start with http:// or https://)")]
    InvalidUrl(String),
}
