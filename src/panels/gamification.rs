//! Gamification point values panel.

use tracing::info;

use super::loader::{PanelError, SettingsLoader};
use crate::api::{DashboardClient, GamificationField, GamificationSettings, RequestThrottle};
use crate::config::DashboardSettings;

/// Both reads and writes go to the same path; the throttle keys differ so
/// that a save never waits on a recent read.
const SETTINGS_PATH: &str = "gamification/settings";
const READ_KEY: &str = "get_gamification_settings";
const SAVE_KEY: &str = "update_gamification_settings";

#[derive(Debug)]
pub struct GamificationPanel {
    client: DashboardClient,
    throttle: RequestThrottle,
    loader: SettingsLoader<GamificationSettings>,
}

impl GamificationPanel {
    #[must_use]
    pub fn new(client: DashboardClient, settings: &DashboardSettings) -> Self {
        Self {
            client,
            throttle: RequestThrottle::new(settings.throttle_interval()),
            loader: SettingsLoader::new(settings.retry_policy()),
        }
    }

    pub async fn load(&mut self) -> Result<&GamificationSettings, PanelError> {
        let (client, throttle) = (&self.client, &self.throttle);
        self.loader
            .load(move || throttle.run(READ_KEY, move || client.get(SETTINGS_PATH)))
            .await
    }

    pub async fn retry(&mut self) -> Result<&GamificationSettings, PanelError> {
        self.loader.reset_retries();
        self.load().await
    }

    /// Submits the whole record; the local copy changes only on success.
    pub async fn save(&mut self, settings: GamificationSettings) -> Result<(), PanelError> {
        self.client.auth()?;
        self.loader.require()?;

        let client = &self.client;
        self.throttle
            .run(SAVE_KEY, || client.post_ack(SETTINGS_PATH, &settings))
            .await?;

        info!("Gamification settings saved");
        self.loader.replace(settings);
        Ok(())
    }

    pub async fn set_enabled(&mut self, enabled: bool) -> Result<(), PanelError> {
        self.client.auth()?;
        let mut settings = self.loader.require()?.clone();
        settings.enabled = enabled;
        self.save(settings).await
    }

    pub async fn set_field(&mut self, field: GamificationField, value: u32) -> Result<(), PanelError> {
        self.client.auth()?;
        let mut settings = self.loader.require()?.clone();
        field.apply(&mut settings, value);
        self.save(settings).await
    }

    #[must_use]
    pub const fn settings(&self) -> Option<&GamificationSettings> {
        self.loader.settings()
    }

    #[must_use]
    pub const fn loader(&self) -> &SettingsLoader<GamificationSettings> {
        &self.loader
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::panels::test_support::{auth, fast_settings};

    async fn loaded_panel(server: &MockServer) -> GamificationPanel {
        Mock::given(method("GET"))
            .and(path("/api/gamification/settings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "enabled": true,
                "points_per_message": 2,
                "daily_bonus": 10
            })))
            .mount(server)
            .await;

        let client = DashboardClient::new(server.uri(), Some(auth()));
        let mut panel = GamificationPanel::new(client, &fast_settings());
        panel.load().await.unwrap();
        panel
    }

    #[tokio::test]
    async fn test_load_fills_defaults() {
        let server = MockServer::start().await;
        let panel = loaded_panel(&server).await;

        let settings = panel.settings().unwrap();
        assert_eq!(settings.points_per_message, 2);
        assert_eq!(settings.daily_bonus, 10);
        assert_eq!(settings.level_up_threshold, 100);
    }

    #[tokio::test]
    async fn test_set_field_saved() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/gamification/settings"))
            .and(body_partial_json(serde_json::json!({"user_id": 42, "points_per_reaction": 5})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let mut panel = loaded_panel(&server).await;
        panel
            .set_field(GamificationField::PointsPerReaction, 5)
            .await
            .unwrap();

        assert_eq!(panel.settings().unwrap().points_per_reaction, 5);
    }

    #[tokio::test]
    async fn test_failed_save_leaves_settings() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/gamification/settings"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({"error": "invalid value"})))
            .mount(&server)
            .await;

        let mut panel = loaded_panel(&server).await;
        let err = panel.set_enabled(false).await.unwrap_err();

        assert!(err.to_string().contains("invalid value"));
        assert!(panel.settings().unwrap().enabled);
    }
}
