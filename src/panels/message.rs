//! Toggle-and-message panels: FAQ, greeting, goodbye and schedule.

use std::fmt;

use serde::Serialize;
use tracing::info;

use super::loader::{PanelError, SettingsLoader};
use crate::api::{truncate_for_log, DashboardClient, MessageSettings, RequestThrottle};
use crate::config::DashboardSettings;

/// Which bot behavior a [`MessagePanel`] manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePanelKind {
    Faq,
    Greeting,
    Goodbye,
    Schedule,
}

impl MessagePanelKind {
    const fn slug(self) -> &'static str {
        match self {
            Self::Faq => "faq",
            Self::Greeting => "greeting",
            Self::Goodbye => "goodbye",
            Self::Schedule => "schedule",
        }
    }

    /// Human-readable panel title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Faq => "FAQ",
            Self::Greeting => "Greeting",
            Self::Goodbye => "Goodbye",
            Self::Schedule => "Schedule",
        }
    }

    /// e.g. `get_faq_settings`
    #[must_use]
    pub fn read_endpoint(self) -> String {
        format!("get_{}_settings", self.slug())
    }

    /// e.g. `toggle_faq`
    #[must_use]
    pub fn toggle_endpoint(self) -> String {
        format!("toggle_{}", self.slug())
    }

    /// e.g. `set_faq_message`
    #[must_use]
    pub fn message_endpoint(self) -> String {
        format!("set_{}_message", self.slug())
    }
}

impl fmt::Display for MessagePanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Serialize)]
struct TogglePayload {
    enabled: bool,
}

#[derive(Serialize)]
struct MessagePayload<'a> {
    message: &'a str,
}

/// Panel managing one `{enabled, message}` settings record.
///
/// Mutations are applied locally only after the backend acknowledges them.
#[derive(Debug)]
pub struct MessagePanel {
    kind: MessagePanelKind,
    client: DashboardClient,
    throttle: RequestThrottle,
    loader: SettingsLoader<MessageSettings>,
}

impl MessagePanel {
    /// Creates an unloaded panel.
    #[must_use]
    pub fn new(kind: MessagePanelKind, client: DashboardClient, settings: &DashboardSettings) -> Self {
        Self {
            kind,
            client,
            throttle: RequestThrottle::new(settings.throttle_interval()),
            loader: SettingsLoader::new(settings.retry_policy()),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> MessagePanelKind {
        self.kind
    }

    /// Fetches the settings with bounded automatic retries.
    pub async fn load(&mut self) -> Result<&MessageSettings, PanelError> {
        let endpoint = self.kind.read_endpoint();
        let (client, throttle) = (&self.client, &self.throttle);
        let endpoint = endpoint.as_str();

        self.loader
            .load(move || throttle.run(endpoint, move || client.get(endpoint)))
            .await
    }

    /// Manual retry after a permanent failure.
    pub async fn retry(&mut self) -> Result<&MessageSettings, PanelError> {
        self.loader.reset_retries();
        self.load().await
    }

    /// Switches the behavior on or off.
    pub async fn set_enabled(&mut self, enabled: bool) -> Result<(), PanelError> {
        self.client.auth()?;
        self.loader.require()?;

        let endpoint = self.kind.toggle_endpoint();
        let payload = TogglePayload { enabled };
        let client = &self.client;
        self.throttle
            .run(&endpoint, || client.post_ack(&endpoint, &payload))
            .await?;

        if let Some(settings) = self.loader.settings_mut() {
            settings.enabled = enabled;
        }
        info!("{} {}", self.kind, if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    /// Replaces the message text.
    pub async fn set_message(&mut self, message: &str) -> Result<(), PanelError> {
        self.client.auth()?;
        self.loader.require()?;

        let endpoint = self.kind.message_endpoint();
        let payload = MessagePayload { message };
        let client = &self.client;
        self.throttle
            .run(&endpoint, || client.post_ack(&endpoint, &payload))
            .await?;

        if let Some(settings) = self.loader.settings_mut() {
            message.clone_into(&mut settings.message);
        }
        info!(
            "{} message updated: \"{}\"",
            self.kind,
            truncate_for_log(message, 30)
        );
        Ok(())
    }

    #[must_use]
    pub const fn settings(&self) -> Option<&MessageSettings> {
        self.loader.settings()
    }

    #[must_use]
    pub const fn loader(&self) -> &SettingsLoader<MessageSettings> {
        &self.loader
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::ApiError;
    use crate::panels::test_support::{auth, fast_settings};

    async fn mount_faq(server: &MockServer, enabled: bool, message: &str) {
        Mock::given(method("GET"))
            .and(path("/api/get_faq_settings"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"enabled": enabled, "message": message})),
            )
            .mount(server)
            .await;
    }

    fn panel(server: &MockServer, kind: MessagePanelKind) -> MessagePanel {
        let client = DashboardClient::new(server.uri(), Some(auth()));
        MessagePanel::new(kind, client, &fast_settings())
    }

    #[test]
    fn test_endpoint_names() {
        assert_eq!(MessagePanelKind::Faq.read_endpoint(), "get_faq_settings");
        assert_eq!(MessagePanelKind::Greeting.toggle_endpoint(), "toggle_greeting");
        assert_eq!(MessagePanelKind::Goodbye.message_endpoint(), "set_goodbye_message");
        assert_eq!(MessagePanelKind::Schedule.read_endpoint(), "get_schedule_settings");
    }

    #[tokio::test]
    async fn test_load_faq_settings() {
        let server = MockServer::start().await;
        mount_faq(&server, true, "Ask us anything").await;

        let mut faq = panel(&server, MessagePanelKind::Faq);
        let settings = faq.load().await.unwrap();

        assert!(settings.enabled);
        assert_eq!(settings.message, "Ask us anything");
    }

    #[tokio::test]
    async fn test_toggle_applied_after_ack() {
        let server = MockServer::start().await;
        mount_faq(&server, true, "Ask us anything").await;
        Mock::given(method("POST"))
            .and(path("/api/toggle_faq"))
            .and(body_json(serde_json::json!({"user_id": 42, "enabled": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let mut faq = panel(&server, MessagePanelKind::Faq);
        faq.load().await.unwrap();
        faq.set_enabled(false).await.unwrap();

        assert!(!faq.settings().unwrap().enabled);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_local_state() {
        let server = MockServer::start().await;
        mount_faq(&server, true, "Ask us anything").await;
        Mock::given(method("POST"))
            .and(path("/api/set_faq_message"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let mut faq = panel(&server, MessagePanelKind::Faq);
        faq.load().await.unwrap();
        let err = faq.set_message("New text").await.unwrap_err();

        assert!(matches!(err, PanelError::Api(ApiError::Status { status: 500, .. })));
        assert_eq!(faq.settings().unwrap().message, "Ask us anything");
    }

    #[tokio::test]
    async fn test_set_message_on_greeting() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/get_greeting_settings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"enabled": false, "message": ""})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/set_greeting_message"))
            .and(body_json(serde_json::json!({"user_id": 42, "message": "Welcome!"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut greeting = panel(&server, MessagePanelKind::Greeting);
        greeting.load().await.unwrap();
        greeting.set_message("Welcome!").await.unwrap();

        assert_eq!(greeting.settings().unwrap().message, "Welcome!");
    }

    #[tokio::test]
    async fn test_toggle_without_auth_sends_nothing() {
        let server = MockServer::start().await;
        for verb in ["GET", "POST"] {
            Mock::given(method(verb))
                .respond_with(ResponseTemplate::new(200))
                .expect(0)
                .mount(&server)
                .await;
        }

        let client = DashboardClient::new(server.uri(), None);
        let mut faq = MessagePanel::new(MessagePanelKind::Faq, client, &fast_settings());
        let err = faq.set_enabled(true).await.unwrap_err();

        assert!(matches!(err, PanelError::Api(ApiError::MissingContext(_))));
    }

    #[tokio::test]
    async fn test_toggle_before_load() {
        let server = MockServer::start().await;
        let mut goodbye = panel(&server, MessagePanelKind::Goodbye);
        assert!(matches!(
            goodbye.set_enabled(true).await,
            Err(PanelError::NotLoaded)
        ));
    }

    #[tokio::test]
    async fn test_load_retries_then_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/get_goodbye_settings"))
            .respond_with(ResponseTemplate::new(503))
            .expect(4)
            .mount(&server)
            .await;

        let mut goodbye = panel(&server, MessagePanelKind::Goodbye);
        assert!(goodbye.load().await.is_err());
        assert!(goodbye.loader().is_permanently_failed());
        assert_eq!(goodbye.loader().attempts(), 4);
    }
}
