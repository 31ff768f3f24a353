//! Settings fetch/retry loop.
//!
//! Every panel loads its settings through the same state machine:
//! 1. `Idle` → `Loading`, fetch once
//! 2. Success → `Loaded`, retry counter and permanent flag cleared
//! 3. Retryable failure → `Failed`, wait `base * 2^(retry_count+1)`,
//!    bump the counter and go back to 2 while under `max_retries`
//! 4. Retries exhausted, or a non-retryable failure → permanent flag set;
//!    only a manual retry restarts the sequence

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::ApiError;

/// Errors surfaced by settings panels.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Settings have not been loaded yet")]
    NotLoaded,

    #[error("Loading failed permanently after {attempts} attempts; use retry")]
    PermanentFailure { attempts: u32 },

    #[error("Media file is too large: {size} bytes (limit is {limit} bytes)")]
    MediaTooLarge { size: usize, limit: usize },

    #[error("Message text cannot be empty")]
    EmptyMessage,

    #[error("Cannot read media file {0}")]
    Media(String),
}

/// Bounded automatic retry policy for the initial fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Automatic retries after the first failed attempt.
    pub max_retries: u32,

    /// Backoff unit; retry `n` (0-based) waits `base_delay * 2^(n+1)`.
    pub base_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay before the retry that follows `retry_count` earlier retries.
    #[must_use]
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry_count.saturating_add(1));
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Load state of a panel's settings record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    /// Last attempt failed; holds the user-visible error text.
    Failed(String),
}

/// Drives the fetch/retry state machine for one settings record.
#[derive(Debug)]
pub struct SettingsLoader<T> {
    state: LoadState<T>,

    /// Automatic retries made in the current sequence.
    retry_count: u32,

    /// Set once automatic retries have stopped.
    permanent_failure: bool,

    /// Total fetches made over the loader's lifetime.
    attempts: u32,

    policy: RetryPolicy,
}

impl<T> SettingsLoader<T> {
    /// Creates an idle loader.
    #[must_use]
    pub const fn new(policy: RetryPolicy) -> Self {
        Self {
            state: LoadState::Idle,
            retry_count: 0,
            permanent_failure: false,
            attempts: 0,
            policy,
        }
    }

    /// Runs the bounded fetch/retry sequence.
    ///
    /// Returns the loaded settings, or the error of the last attempt. Once
    /// the loader has failed permanently, returns
    /// [`PanelError::PermanentFailure`] without fetching; call
    /// [`Self::retry`] instead. Dropping the future cancels any pending
    /// backoff and the in-flight request.
    pub async fn load<F, Fut>(&mut self, mut fetch: F) -> Result<&T, PanelError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if self.permanent_failure {
            return Err(PanelError::PermanentFailure {
                attempts: self.retry_count + 1,
            });
        }

        loop {
            self.state = LoadState::Loading;
            self.attempts += 1;

            match fetch().await {
                Ok(value) => {
                    if self.retry_count > 0 {
                        info!("Settings loaded after {} retries", self.retry_count);
                    }
                    self.retry_count = 0;
                    self.permanent_failure = false;
                    self.state = LoadState::Loaded(value);
                    return self.require();
                }
                Err(err) => {
                    self.state = LoadState::Failed(err.to_string());

                    if !err.is_retryable() {
                        warn!("Settings fetch failed, not retrying: {}", err);
                        self.permanent_failure = true;
                        return Err(err.into());
                    }

                    if self.retry_count >= self.policy.max_retries {
                        warn!(
                            "Settings fetch failed after {} attempts, giving up: {}",
                            self.retry_count + 1,
                            err
                        );
                        self.permanent_failure = true;
                        return Err(err.into());
                    }

                    let delay = self.policy.delay_for(self.retry_count);
                    warn!(
                        "Settings fetch failed ({}), retry {}/{} in {:?}",
                        err,
                        self.retry_count + 1,
                        self.policy.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    self.retry_count += 1;
                }
            }
        }
    }

    /// Manual retry: clears the counter and permanent flag, then reruns the
    /// bounded sequence from the start.
    pub async fn retry<F, Fut>(&mut self, fetch: F) -> Result<&T, PanelError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        debug!("Manual retry requested");
        self.reset_retries();
        self.load(fetch).await
    }

    /// Clears the retry counter and permanent-failure flag.
    pub fn reset_retries(&mut self) {
        self.retry_count = 0;
        self.permanent_failure = false;
    }

    /// Stores a value confirmed by the server.
    pub fn replace(&mut self, value: T) {
        self.state = LoadState::Loaded(value);
    }

    /// Returns the loaded settings, if any.
    #[must_use]
    pub const fn settings(&self) -> Option<&T> {
        match &self.state {
            LoadState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// Mutable access to the loaded settings, if any.
    pub fn settings_mut(&mut self) -> Option<&mut T> {
        match &mut self.state {
            LoadState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the loaded settings or [`PanelError::NotLoaded`].
    pub fn require(&self) -> Result<&T, PanelError> {
        self.settings().ok_or(PanelError::NotLoaded)
    }

    #[must_use]
    pub const fn state(&self) -> &LoadState<T> {
        &self.state
    }

    /// The error text of the last failed attempt, while failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    #[must_use]
    pub const fn is_permanently_failed(&self) -> bool {
        self.permanent_failure
    }

    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }
}
