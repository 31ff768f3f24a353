//! HTTP client for the RoboMod settings backend.

use std::fmt;

use reqwest::multipart::Form;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::webapp::{AuthContext, BridgeError};

/// Errors that can occur while talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing Telegram context: {0}")]
    MissingContext(#[from] BridgeError),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{endpoint} returned HTTP {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("{endpoint} rejected the request: {message}")]
    Rejected { endpoint: String, message: String },

    #[error("Invalid response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        source: serde_json::Error,
    },
}

impl ApiError {
    /// Whether repeating the same request could succeed.
    ///
    /// A missing host context never fixes itself; everything else is treated
    /// as transient.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::MissingContext(_))
    }
}

/// Acknowledgement body returned by mutation endpoints.
#[derive(Debug, Default, Deserialize)]
struct Acknowledgement {
    #[serde(default)]
    success: Option<bool>,

    #[serde(default)]
    error: Option<String>,

    #[serde(default)]
    message: Option<String>,
}

/// Request body carrying the user id next to the payload fields.
#[derive(Serialize)]
struct WithUser<'a, T: ?Sized> {
    user_id: i64,

    #[serde(flatten)]
    payload: &'a T,
}

/// Authenticated client for the dashboard backend.
///
/// Cheap to clone; every panel holds its own copy.
#[derive(Clone)]
pub struct DashboardClient {
    http: reqwest::Client,
    base_url: String,
    auth: Option<AuthContext>,
}

impl DashboardClient {
    /// Creates a client for `base_url` (without the `/api` suffix).
    ///
    /// With `auth == None` every call fails fast with
    /// [`ApiError::MissingContext`] and nothing is sent.
    #[must_use]
    pub fn new(base_url: impl Into<String>, auth: Option<AuthContext>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url, auth)
    }

    /// Creates a client on top of an existing reqwest client.
    #[must_use]
    pub fn with_http(
        http: reqwest::Client,
        base_url: impl Into<String>,
        auth: Option<AuthContext>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            http,
            base_url,
            auth,
        }
    }

    /// Returns the credentials, or the error explaining their absence.
    pub fn auth(&self) -> Result<&AuthContext, ApiError> {
        self.auth
            .as_ref()
            .ok_or(ApiError::MissingContext(BridgeError::MissingBridge))
    }

    /// Returns the backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// `GET /api/{endpoint}?user_id=...`, decoding the JSON body.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let auth = self.auth()?;
        debug!("GET {}", endpoint);

        let request = self
            .http
            .get(self.url(endpoint))
            .query(&[("user_id", auth.user_id)]);
        let response = send(request, auth).await?;
        read_json(endpoint, response).await
    }

    /// `POST /api/{endpoint}` for mutations answered with an acknowledgement.
    ///
    /// An empty body counts as success; `{"success": false}` is a rejection.
    pub async fn post_ack<B>(&self, endpoint: &str, payload: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let response = self.post_raw(endpoint, payload).await?;
        let body = read_body(endpoint, response).await?;
        if body.trim().is_empty() {
            return Ok(());
        }

        let ack: Acknowledgement = serde_json::from_str(&body).unwrap_or_default();
        if ack.success == Some(false) {
            return Err(ApiError::Rejected {
                endpoint: endpoint.to_owned(),
                message: ack
                    .error
                    .or(ack.message)
                    .unwrap_or_else(|| "no reason given".to_owned()),
            });
        }
        Ok(())
    }

    /// `POST /api/{endpoint}` with a multipart form; `user_id` is added to
    /// the form automatically.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        form: Form,
    ) -> Result<T, ApiError> {
        let auth = self.auth()?;
        debug!("POST {} (multipart)", endpoint);

        let form = form.text("user_id", auth.user_id.to_string());
        let request = self.http.post(self.url(endpoint)).multipart(form);
        let response = send(request, auth).await?;
        read_json(endpoint, response).await
    }

    async fn post_raw<B>(&self, endpoint: &str, payload: &B) -> Result<Response, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let auth = self.auth()?;
        debug!("POST {}", endpoint);

        let body = WithUser {
            user_id: auth.user_id,
            payload,
        };
        let request = self.http.post(self.url(endpoint)).json(&body);
        send(request, auth).await
    }
}

impl fmt::Debug for DashboardClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashboardClient")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

async fn send(request: RequestBuilder, auth: &AuthContext) -> Result<Response, ApiError> {
    Ok(request.bearer_auth(&auth.init_data).send().await?)
}

async fn read_body(endpoint: &str, response: Response) -> Result<String, ApiError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ApiError::Status {
            endpoint: endpoint.to_owned(),
            status: status.as_u16(),
            message: error_message(&body),
        });
    }

    Ok(body)
}

async fn read_json<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T, ApiError> {
    let body = read_body(endpoint, response).await?;
    serde_json::from_str(&body).map_err(|source| ApiError::Decode {
        endpoint: endpoint.to_owned(),
        source,
    })
}

/// Extracts a human-readable reason from an error body.
fn error_message(body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["error", "detail", "message"]
                .iter()
                .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(str::to_owned))
        });

    from_json.unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            "empty response".to_owned()
        } else {
            truncate_for_log(trimmed, 120)
        }
    })
}

/// Truncates a string for logging purposes.
pub(crate) fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::MessageSettings;

    fn client(server: &MockServer) -> DashboardClient {
        DashboardClient::new(
            server.uri(),
            Some(AuthContext::new("query_id=1&hash=ff".to_owned(), 42)),
        )
    }

    #[tokio::test]
    async fn test_get_sends_bearer_and_user_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/get_faq_settings"))
            .and(query_param("user_id", "42"))
            .and(header("authorization", "Bearer query_id=1&hash=ff"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"enabled": true, "message": "Hi"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let settings: MessageSettings = client(&server).get("get_faq_settings").await.unwrap();
        assert!(settings.enabled);
        assert_eq!(settings.message, "Hi");
    }

    #[tokio::test]
    async fn test_post_ack_flattens_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/toggle_faq"))
            .and(body_json(serde_json::json!({"user_id": 42, "enabled": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .post_ack("toggle_faq", &serde_json::json!({"enabled": false}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_post_ack_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/set_faq_message"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        assert!(
            client(&server)
                .post_ack("set_faq_message", &serde_json::json!({"message": "x"}))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_post_ack_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": false, "error": "not a moderator"})),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .post_ack("toggle_greeting", &serde_json::json!({"enabled": true}))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Rejected { ref message, .. } if message == "not a moderator"));
    }

    #[tokio::test]
    async fn test_status_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({"detail": "invalid initData"})))
            .mount(&server)
            .await;

        let err = client(&server)
            .get::<MessageSettings>("get_goodbye_settings")
            .await
            .unwrap_err();
        match err {
            ApiError::Status { status, message, .. } => {
                assert_eq!(status, 403);
                assert_eq!(message, "invalid initData");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(client(&server).auth().is_ok());
    }

    #[tokio::test]
    async fn test_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client(&server)
            .get::<MessageSettings>("get_faq_settings")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_missing_context_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = DashboardClient::new(server.uri(), None);
        let err = client.get::<MessageSettings>("get_faq_settings").await.unwrap_err();
        assert!(matches!(err, ApiError::MissingContext(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(error_message(r#"{"error": "nope"}"#), "nope");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message(""), "empty response");
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("Hello", 10), "Hello");
        assert_eq!(truncate_for_log("Hello, World!", 5), "Hello...");
    }
}
