//! Parsing and signature verification of Mini App `initData` strings.
//!
//! Telegram signs `initData` with HMAC-SHA256. The secret key is
//! `HMAC_SHA256(key = "WebAppData", msg = bot_token)` and the signed message
//! is every `key=value` pair except `hash`, sorted by key and joined by `\n`.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Errors produced while parsing or verifying `initData`.
#[derive(Debug, Error)]
pub enum InitDataError {
    #[error("initData is empty")]
    Empty,

    #[error("Malformed initData pair: '{0}'")]
    MalformedPair(String),

    #[error("Missing '{0}' parameter in initData")]
    MissingField(&'static str),

    #[error("Invalid user JSON in initData: {0}")]
    InvalidUser(#[from] serde_json::Error),

    #[error("User object in initData has no numeric id")]
    MissingUserId,

    #[error("Invalid auth_date: '{0}'")]
    InvalidAuthDate(String),

    #[error("initData signature mismatch, data may be tampered")]
    InvalidSignature,

    #[error("initData is too old ({age_secs} seconds)")]
    Expired { age_secs: u64 },
}

/// A decoded `initData` query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitData {
    params: BTreeMap<String, String>,
}

impl InitData {
    /// Parses a raw `initData` query string, URL-decoding every value.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is empty or a pair cannot be decoded.
    pub fn parse(raw: &str) -> Result<Self, InitDataError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(InitDataError::Empty);
        }

        let mut params = BTreeMap::new();
        for pair in raw.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| InitDataError::MalformedPair(pair.to_owned()))?;
            let value = urlencoding::decode(value)
                .map_err(|_| InitDataError::MalformedPair(pair.to_owned()))?;
            params.insert(key.to_owned(), value.into_owned());
        }

        Ok(Self { params })
    }

    /// Returns a decoded parameter by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Extracts the numeric id from the `user` JSON parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if `user` is missing, malformed or has no id.
    pub fn user_id(&self) -> Result<i64, InitDataError> {
        let user = self.get("user").ok_or(InitDataError::MissingField("user"))?;
        let user: serde_json::Value = serde_json::from_str(user)?;
        user.get("id")
            .and_then(serde_json::Value::as_i64)
            .ok_or(InitDataError::MissingUserId)
    }

    /// Returns `auth_date` as Unix seconds, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an integer.
    pub fn auth_date(&self) -> Result<Option<u64>, InitDataError> {
        self.get("auth_date")
            .map(|raw| {
                raw.parse()
                    .map_err(|_| InitDataError::InvalidAuthDate(raw.to_owned()))
            })
            .transpose()
    }

    /// The string Telegram signs: sorted `key=value` lines without `hash`.
    #[must_use]
    pub fn data_check_string(&self) -> String {
        self.params
            .iter()
            .filter(|(key, _)| key.as_str() != "hash")
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Computes the expected hex signature for the given bot token.
    #[must_use]
    pub fn expected_hash(&self, bot_token: &str) -> String {
        let mut secret = HmacSha256::new_from_slice(b"WebAppData")
            .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
        secret.update(bot_token.as_bytes());
        let secret = secret.finalize().into_bytes();

        let mut mac = HmacSha256::new_from_slice(&secret)
            .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
        mac.update(self.data_check_string().as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Verifies the signature and, when `max_age` is given, the freshness.
    ///
    /// # Errors
    ///
    /// Returns an error if the hash is missing or wrong, or the data is older
    /// than `max_age`.
    pub fn verify(&self, bot_token: &str, max_age: Option<Duration>) -> Result<(), InitDataError> {
        let received = self.get("hash").ok_or(InitDataError::MissingField("hash"))?;
        if !received.eq_ignore_ascii_case(&self.expected_hash(bot_token)) {
            return Err(InitDataError::InvalidSignature);
        }

        if let (Some(max_age), Some(auth_date)) = (max_age, self.auth_date()?) {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs();
            let age_secs = now.saturating_sub(auth_date);
            if age_secs > max_age.as_secs() {
                return Err(InitDataError::Expired { age_secs });
            }
        }

        Ok(())
    }
}
