//! Scheduled messages panel.

use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use super::loader::{PanelError, SettingsLoader};
use super::message::{MessagePanel, MessagePanelKind};
use crate::api::{
    truncate_for_log, ApiError, DashboardClient, MessageSettings, NewScheduledMessage, RequestThrottle,
    ScheduledMessage,
};
use crate::config::DashboardSettings;

const LIST_ENDPOINT: &str = "scheduled_messages";
const ADD_ENDPOINT: &str = "add_scheduled_message";

/// Schedule feature: its toggle/message settings plus the queue of
/// scheduled messages.
#[derive(Debug)]
pub struct SchedulePanel {
    settings: MessagePanel,
    client: DashboardClient,
    throttle: RequestThrottle,
    messages: SettingsLoader<Vec<ScheduledMessage>>,
    max_media_bytes: usize,
}

impl SchedulePanel {
    #[must_use]
    pub fn new(client: DashboardClient, settings: &DashboardSettings) -> Self {
        Self {
            settings: MessagePanel::new(MessagePanelKind::Schedule, client.clone(), settings),
            client,
            throttle: RequestThrottle::new(settings.throttle_interval()),
            messages: SettingsLoader::new(settings.retry_policy()),
            max_media_bytes: settings.max_media_bytes,
        }
    }

    /// The `{enabled, message}` settings of the schedule feature.
    pub fn settings_panel(&mut self) -> &mut MessagePanel {
        &mut self.settings
    }

    #[must_use]
    pub const fn settings(&self) -> Option<&MessageSettings> {
        self.settings.settings()
    }

    /// Fetches the scheduled message queue with bounded retries.
    pub async fn load_messages(&mut self) -> Result<&[ScheduledMessage], PanelError> {
        let (client, throttle) = (&self.client, &self.throttle);
        let messages = self
            .messages
            .load(move || throttle.run(LIST_ENDPOINT, move || client.get(LIST_ENDPOINT)))
            .await?;
        Ok(messages.as_slice())
    }

    pub async fn retry_messages(&mut self) -> Result<&[ScheduledMessage], PanelError> {
        self.messages.reset_retries();
        self.load_messages().await
    }

    /// Checks the form locally; nothing is sent.
    pub fn validate(&self, new: &NewScheduledMessage) -> Result<(), PanelError> {
        if new.message.trim().is_empty() && new.media.is_none() {
            return Err(PanelError::EmptyMessage);
        }
        if let Some(media) = &new.media
            && media.len() > self.max_media_bytes
        {
            return Err(PanelError::MediaTooLarge {
                size: media.len(),
                limit: self.max_media_bytes,
            });
        }
        Ok(())
    }

    /// Uploads a new scheduled message and appends the backend's copy to the
    /// local queue.
    pub async fn add(&mut self, new: NewScheduledMessage) -> Result<ScheduledMessage, PanelError> {
        self.validate(&new)?;
        self.client.auth()?;

        debug!(
            "Scheduling \"{}\" for {}",
            truncate_for_log(&new.message, 30),
            new.send_time
        );
        let form = build_form(new)?;
        let client = &self.client;
        let created: ScheduledMessage = self
            .throttle
            .run(ADD_ENDPOINT, move || client.post_multipart(ADD_ENDPOINT, form))
            .await?;

        info!("Scheduled message {} for {}", created.id, created.send_time);
        if let Some(queue) = self.messages.settings_mut() {
            queue.push(created.clone());
        }
        Ok(created)
    }

    #[must_use]
    pub fn messages(&self) -> Option<&[ScheduledMessage]> {
        self.messages.settings().map(Vec::as_slice)
    }

    #[must_use]
    pub const fn loader(&self) -> &SettingsLoader<Vec<ScheduledMessage>> {
        &self.messages
    }

    #[must_use]
    pub const fn max_media_bytes(&self) -> usize {
        self.max_media_bytes
    }
}

fn build_form(new: NewScheduledMessage) -> Result<Form, ApiError> {
    let mut form = Form::new()
        .text("message", new.message)
        .text("send_time", new.send_time.to_rfc3339());

    if let Some(minutes) = new.repeat_interval_minutes {
        form = form.text("repeat_interval_minutes", minutes.to_string());
    }

    if let Some(media) = new.media {
        let part = Part::bytes(media.bytes)
            .file_name(media.file_name)
            .mime_str(&media.content_type)?;
        form = form.part("media", part);
    }

    Ok(form)
}
