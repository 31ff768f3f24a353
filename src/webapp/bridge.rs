//! The host-injected Mini App bridge and the auth context derived from it.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::InitData;

/// Errors raised when the host session context is absent or incomplete.
///
/// These are never retryable: repeating a request cannot conjure a session.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Telegram WebApp bridge is not available")]
    MissingBridge,

    #[error("Telegram initData is missing")]
    MissingInitData,

    #[error("Telegram user id is missing")]
    MissingUserId,

    #[error("Telegram user id is not numeric: '{0}'")]
    InvalidUserId(String),

    #[error("Failed to read bridge snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse bridge snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The user object exposed by `initDataUnsafe.user`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebAppUser {
    pub id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
}

/// Unverified view of the session data, as the host hands it out.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InitDataUnsafe {
    #[serde(default)]
    pub user: Option<WebAppUser>,
}

/// Snapshot of the `Telegram.WebApp` object injected by the host client.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MiniAppBridge {
    /// Opaque signed session string.
    #[serde(default)]
    pub init_data: String,

    #[serde(default)]
    pub init_data_unsafe: InitDataUnsafe,

    /// Host color tokens, passed through untouched.
    #[serde(default)]
    pub theme_params: HashMap<String, String>,
}

impl MiniAppBridge {
    /// Loads a bridge snapshot from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, BridgeError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Builds a bridge from `TG_INIT_DATA` and optional `TG_USER_ID`.
    ///
    /// Returns `None` when `TG_INIT_DATA` is unset, i.e. no host is present.
    ///
    /// # Errors
    ///
    /// Returns an error if `TG_USER_ID` is set but not numeric.
    pub fn from_env() -> Result<Option<Self>, BridgeError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Self::from_env`] with an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if `TG_USER_ID` is set but not numeric.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, BridgeError> {
        let Some(init_data) = lookup("TG_INIT_DATA") else {
            return Ok(None);
        };

        let user = lookup("TG_USER_ID")
            .map(|raw| {
                raw.trim()
                    .parse::<i64>()
                    .map(|id| WebAppUser {
                        id: Some(id),
                        ..WebAppUser::default()
                    })
                    .map_err(|_| BridgeError::InvalidUserId(raw))
            })
            .transpose()?;

        Ok(Some(Self {
            init_data,
            init_data_unsafe: InitDataUnsafe { user },
            theme_params: HashMap::new(),
        }))
    }

    /// The user id from `initDataUnsafe`, falling back to the `user` field
    /// encoded inside `initData`.
    #[must_use]
    pub fn user_id(&self) -> Option<i64> {
        self.init_data_unsafe
            .user
            .as_ref()
            .and_then(|u| u.id)
            .or_else(|| {
                InitData::parse(&self.init_data)
                    .and_then(|data| data.user_id())
                    .inspect_err(|e| debug!("No user id in initData: {}", e))
                    .ok()
            })
    }
}

/// Credentials attached to every backend request.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// The signed `initData`, sent as the bearer token.
    pub init_data: String,

    /// Numeric Telegram id of the moderator.
    pub user_id: i64,
}

impl AuthContext {
    /// Creates an auth context directly.
    #[must_use]
    pub const fn new(init_data: String, user_id: i64) -> Self {
        Self { init_data, user_id }
    }

    /// Derives the auth context from the host bridge, failing closed when the
    /// bridge or any required field is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the bridge, `initData` or user id is missing.
    pub fn from_bridge(bridge: Option<&MiniAppBridge>) -> Result<Self, BridgeError> {
        let bridge = bridge.ok_or(BridgeError::MissingBridge)?;
        if bridge.init_data.trim().is_empty() {
            return Err(BridgeError::MissingInitData);
        }
        let user_id = bridge.user_id().ok_or(BridgeError::MissingUserId)?;
        Ok(Self::new(bridge.init_data.clone(), user_id))
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}
