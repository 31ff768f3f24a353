//! Moderation rules panel.
//!
//! Edits are applied to the local record before the backend confirms them,
//! and rolled back if the save fails.

use tracing::{info, warn};

use super::loader::{PanelError, SettingsLoader};
use crate::api::{DashboardClient, ModerationRule, ModerationSettings, RequestThrottle, WarnAction};
use crate::config::DashboardSettings;

const READ_ENDPOINT: &str = "get_moderation_settings";
const UPDATE_ENDPOINT: &str = "update_moderation_settings";

#[derive(Debug)]
pub struct ModerationPanel {
    client: DashboardClient,
    throttle: RequestThrottle,
    loader: SettingsLoader<ModerationSettings>,
}

impl ModerationPanel {
    #[must_use]
    pub fn new(client: DashboardClient, settings: &DashboardSettings) -> Self {
        Self {
            client,
            throttle: RequestThrottle::new(settings.throttle_interval()),
            loader: SettingsLoader::new(settings.retry_policy()),
        }
    }

    pub async fn load(&mut self) -> Result<&ModerationSettings, PanelError> {
        let (client, throttle) = (&self.client, &self.throttle);
        self.loader
            .load(move || throttle.run(READ_ENDPOINT, move || client.get(READ_ENDPOINT)))
            .await
    }

    pub async fn retry(&mut self) -> Result<&ModerationSettings, PanelError> {
        self.loader.reset_retries();
        self.load().await
    }

    /// Switches a single rule on or off.
    pub async fn toggle_rule(&mut self, rule: ModerationRule, enabled: bool) -> Result<(), PanelError> {
        self.update(|settings| settings.set_rule(rule, enabled)).await?;
        info!("Moderation rule {} set to {}", rule, enabled);
        Ok(())
    }

    pub async fn set_max_warnings(&mut self, max_warnings: u32) -> Result<(), PanelError> {
        self.update(|settings| settings.max_warnings = max_warnings).await
    }

    pub async fn set_flood_limit(&mut self, flood_limit: u32) -> Result<(), PanelError> {
        self.update(|settings| settings.flood_limit = flood_limit).await
    }

    pub async fn set_warn_action(&mut self, action: WarnAction) -> Result<(), PanelError> {
        self.update(|settings| settings.warn_action = action).await
    }

    /// Replaces the banned word list; words are trimmed, lowercased and
    /// deduplicated.
    pub async fn set_banned_words(&mut self, words: Vec<String>) -> Result<(), PanelError> {
        let mut words: Vec<String> = words
            .into_iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        words.sort();
        words.dedup();

        self.update(move |settings| settings.banned_words = words).await
    }

    /// Applies `edit` locally, submits the whole record and restores the
    /// previous record if the submission fails.
    pub async fn update(
        &mut self,
        edit: impl FnOnce(&mut ModerationSettings),
    ) -> Result<(), PanelError> {
        self.client.auth()?;
        let previous = self.loader.require()?.clone();

        let mut next = previous.clone();
        edit(&mut next);
        self.loader.replace(next.clone());

        let client = &self.client;
        let result = self
            .throttle
            .run(UPDATE_ENDPOINT, || client.post_ack(UPDATE_ENDPOINT, &next))
            .await;

        if let Err(err) = result {
            warn!("Moderation update failed, rolling back: {}", err);
            self.loader.replace(previous);
            return Err(err.into());
        }
        Ok(())
    }

    #[must_use]
    pub const fn settings(&self) -> Option<&ModerationSettings> {
        self.loader.settings()
    }

    #[must_use]
    pub const fn loader(&self) -> &SettingsLoader<ModerationSettings> {
        &self.loader
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::panels::test_support::{auth, fast_settings};

    async fn loaded_panel(server: &MockServer) -> ModerationPanel {
        Mock::given(method("GET"))
            .and(path("/api/get_moderation_settings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "anti_spam": true,
                "anti_link": false,
                "banned_words": ["scam"],
                "max_warnings": 3
            })))
            .mount(server)
            .await;

        let client = DashboardClient::new(server.uri(), Some(auth()));
        let mut panel = ModerationPanel::new(client, &fast_settings());
        panel.load().await.unwrap();
        panel
    }

    #[tokio::test]
    async fn test_toggle_rule_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/update_moderation_settings"))
            .and(body_partial_json(serde_json::json!({"user_id": 42, "anti_link": true, "anti_spam": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let mut panel = loaded_panel(&server).await;
        panel.toggle_rule(ModerationRule::AntiLink, true).await.unwrap();

        assert!(panel.settings().unwrap().anti_link);
    }

    #[tokio::test]
    async fn test_toggle_rule_rolls_back_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/update_moderation_settings"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let mut panel = loaded_panel(&server).await;
        let result = panel.toggle_rule(ModerationRule::AntiSpam, false).await;

        assert!(result.is_err());
        assert!(panel.settings().unwrap().anti_spam);
    }

    #[tokio::test]
    async fn test_banned_words_normalized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/update_moderation_settings"))
            .and(body_partial_json(serde_json::json!({"banned_words": ["casino", "spam"]})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut panel = loaded_panel(&server).await;
        panel
            .set_banned_words(vec![" Spam ".to_owned(), "casino".to_owned(), "spam".to_owned(), String::new()])
            .await
            .unwrap();

        assert_eq!(panel.settings().unwrap().banned_words, vec!["casino", "spam"]);
    }

    #[tokio::test]
    async fn test_update_requires_loaded_settings() {
        let server = MockServer::start().await;
        let client = DashboardClient::new(server.uri(), Some(auth()));
        let mut panel = ModerationPanel::new(client, &fast_settings());

        assert!(matches!(
            panel.set_max_warnings(5).await,
            Err(PanelError::NotLoaded)
        ));
    }
}
