//! Configuration module for the dashboard client.
//!
//! Handles loading of backend, throttle and retry settings from the
//! environment.

mod settings;

pub use settings::{ConfigError, DashboardSettings};

/// Default base URL of the RoboMod backend.
pub const DEFAULT_API_URL: &str = "https://robomod.dablietech.club";

/// Minimum spacing between two calls to the same endpoint, in milliseconds.
pub const DEFAULT_THROTTLE_INTERVAL_MS: u64 = 1100;

/// Number of automatic retries after the initial settings fetch fails.
pub const DEFAULT_MAX_FETCH_RETRIES: u32 = 3;

/// Base unit of the exponential backoff, in milliseconds.
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;

/// Largest media attachment accepted by the schedule form (1 MiB).
pub const DEFAULT_MAX_MEDIA_BYTES: usize = 1024 * 1024;
