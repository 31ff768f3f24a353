//! Command handler implementation.

use std::path::Path;

use tracing::{debug, info};

use super::types::{
    CommandResult, DashboardCommand, GamificationAction, MessageAction, ModerationAction,
    ScheduleAction,
};
use crate::api::{
    GamificationField, GamificationSettings, MediaAttachment, MessageSettings, ModerationRule,
    ModerationSettings, NewScheduledMessage, ScheduledMessage, truncate_for_log,
};
use crate::panels::{Dashboard, MessagePanelKind, PanelError};

/// Runs dashboard commands against the settings panels.
pub struct CommandHandler {
    dashboard: Dashboard,
}

impl CommandHandler {
    #[must_use]
    pub const fn new(dashboard: Dashboard) -> Self {
        Self { dashboard }
    }

    #[must_use]
    pub const fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    /// Executes a parsed command. Every panel command loads its panel first
    /// so the output always reflects what the backend acknowledged.
    pub async fn execute(&mut self, command: DashboardCommand) -> CommandResult {
        debug!("Handling command: {:?}", command);

        let result = match command {
            DashboardCommand::Status => Ok(self.handle_status().await),
            DashboardCommand::Chat => self.handle_chat().await,
            DashboardCommand::Faq { action } => {
                self.handle_message(MessagePanelKind::Faq, action).await
            }
            DashboardCommand::Greeting { action } => {
                self.handle_message(MessagePanelKind::Greeting, action).await
            }
            DashboardCommand::Goodbye { action } => {
                self.handle_message(MessagePanelKind::Goodbye, action).await
            }
            DashboardCommand::ScheduleSettings { action } => {
                self.handle_message(MessagePanelKind::Schedule, action).await
            }
            DashboardCommand::Moderation { action } => self.handle_moderation(action).await,
            DashboardCommand::Gamification { action } => self.handle_gamification(action).await,
            DashboardCommand::Schedule { action } => self.handle_schedule(action).await,
        };

        let result = result.unwrap_or_else(|e| CommandResult::error(format!("✗ {e}")));
        info!("Command result: success={}", result.success);
        result
    }

    async fn handle_status(&mut self) -> CommandResult {
        let chat = match self.dashboard.moderator_chat().await {
            Ok(chat) => format_chat(chat.title.as_deref(), chat.chat_id),
            Err(e) => format!("unavailable ({e})"),
        };

        let loads = self.dashboard.load_all().await;
        let mut lines = vec![format!("Chat: {chat}")];
        let mut all_loaded = true;

        for load in &loads {
            match &load.result {
                Ok(()) => lines.push(format!("✓ {}: {}", load.panel, self.panel_summary(load.panel))),
                Err(e) => {
                    all_loaded = false;
                    lines.push(format!("✗ {}: {e}", load.panel));
                }
            }
        }

        if all_loaded {
            CommandResult::success(lines.join("\n"))
        } else {
            CommandResult::error(lines.join("\n"))
        }
    }

    fn panel_summary(&self, panel: &str) -> String {
        let dashboard = &self.dashboard;
        let message = |settings: Option<&MessageSettings>| {
            settings.map_or_else(|| "not loaded".to_owned(), |s| switch_label(s.enabled).to_owned())
        };

        match panel {
            "FAQ" => message(dashboard.faq.settings()),
            "Greeting" => message(dashboard.greeting.settings()),
            "Goodbye" => message(dashboard.goodbye.settings()),
            "Moderation" => dashboard.moderation.settings().map_or_else(
                || "not loaded".to_owned(),
                |s| {
                    let active = ModerationRule::ALL.iter().filter(|&&r| s.rule(r)).count();
                    format!("{active}/{} rules active", ModerationRule::ALL.len())
                },
            ),
            "Gamification" => dashboard
                .gamification
                .settings()
                .map_or_else(|| "not loaded".to_owned(), |s| switch_label(s.enabled).to_owned()),
            "Schedule" => {
                let queued = dashboard.schedule.messages().map_or(0, <[ScheduledMessage]>::len);
                let enabled = dashboard
                    .schedule
                    .settings()
                    .map_or("not loaded", |s| switch_label(s.enabled));
                format!("{enabled}, {queued} queued")
            }
            _ => String::new(),
        }
    }

    async fn handle_chat(&mut self) -> Result<CommandResult, PanelError> {
        let chat = self.dashboard.moderator_chat().await?;
        Ok(CommandResult::success(format!(
            "Moderating: {}",
            format_chat(chat.title.as_deref(), chat.chat_id)
        )))
    }

    async fn handle_message(
        &mut self,
        kind: MessagePanelKind,
        action: MessageAction,
    ) -> Result<CommandResult, PanelError> {
        let panel = self.dashboard.message_panel(kind);
        panel.load().await?;

        let done = match action {
            MessageAction::Show => None,
            MessageAction::Enable => {
                panel.set_enabled(true).await?;
                Some(format!("✓ {kind} enabled"))
            }
            MessageAction::Disable => {
                panel.set_enabled(false).await?;
                Some(format!("✓ {kind} disabled"))
            }
            MessageAction::SetMessage { text } => {
                panel.set_message(&text.join(" ")).await?;
                Some(format!("✓ {kind} message updated"))
            }
        };

        let body = format_message_settings(kind, panel.loader().require()?);
        Ok(CommandResult::success(with_header(done, body)))
    }

    async fn handle_moderation(&mut self, action: ModerationAction) -> Result<CommandResult, PanelError> {
        let panel = &mut self.dashboard.moderation;
        panel.load().await?;

        let done = match action {
            ModerationAction::Show => None,
            ModerationAction::Toggle { rule, enabled } => {
                panel.toggle_rule(rule, enabled).await?;
                Some(format!("✓ {rule} {}", switch_label(enabled)))
            }
            ModerationAction::MaxWarnings { count } => {
                panel.set_max_warnings(count).await?;
                Some(format!("✓ Max warnings set to {count}"))
            }
            ModerationAction::FloodLimit { count } => {
                panel.set_flood_limit(count).await?;
                Some(format!("✓ Flood limit set to {count}"))
            }
            ModerationAction::WarnAction { action } => {
                panel.set_warn_action(action).await?;
                Some(format!("✓ Warn action set to {action}"))
            }
            ModerationAction::BannedWords { words } => {
                panel.set_banned_words(words).await?;
                Some("✓ Banned words updated".to_owned())
            }
        };

        let body = format_moderation(panel.loader().require()?);
        Ok(CommandResult::success(with_header(done, body)))
    }

    async fn handle_gamification(
        &mut self,
        action: GamificationAction,
    ) -> Result<CommandResult, PanelError> {
        let panel = &mut self.dashboard.gamification;
        panel.load().await?;

        let done = match action {
            GamificationAction::Show => None,
            GamificationAction::Enable => {
                panel.set_enabled(true).await?;
                Some("✓ Gamification enabled".to_owned())
            }
            GamificationAction::Disable => {
                panel.set_enabled(false).await?;
                Some("✓ Gamification disabled".to_owned())
            }
            GamificationAction::Set { field, value } => {
                panel.set_field(field, value).await?;
                Some(format!("✓ {field} set to {value}"))
            }
        };

        let body = format_gamification(panel.loader().require()?);
        Ok(CommandResult::success(with_header(done, body)))
    }

    async fn handle_schedule(&mut self, action: ScheduleAction) -> Result<CommandResult, PanelError> {
        let panel = &mut self.dashboard.schedule;

        match action {
            ScheduleAction::List => {
                let messages = panel.load_messages().await?;
                Ok(CommandResult::success(format_schedule(messages)))
            }
            ScheduleAction::Add {
                message,
                at,
                repeat,
                media,
            } => {
                // The queue is not loaded here; the upload does not depend on it.
                let media = match media {
                    Some(path) => Some(read_media(&path, panel.max_media_bytes()).await?),
                    None => None,
                };
                let created = panel
                    .add(NewScheduledMessage {
                        message,
                        send_time: at,
                        repeat_interval_minutes: repeat,
                        media,
                    })
                    .await?;

                Ok(CommandResult::success(format!(
                    "✓ Scheduled message added\n{}",
                    format_scheduled(&created)
                )))
            }
        }
    }
}

/// Reads a media file for upload, refusing files over `limit` bytes without
/// reading them.
async fn read_media(path: &Path, limit: usize) -> Result<MediaAttachment, PanelError> {
    let io_error = |e: std::io::Error| PanelError::Media(format!("{}: {e}", path.display()));

    let size = tokio::fs::metadata(path).await.map_err(io_error)?.len();
    let size = usize::try_from(size).unwrap_or(usize::MAX);
    if size > limit {
        return Err(PanelError::MediaTooLarge { size, limit });
    }

    let bytes = tokio::fs::read(path).await.map_err(io_error)?;
    let file_name = path
        .file_name()
        .map_or_else(|| "media".to_owned(), |n| n.to_string_lossy().into_owned());

    Ok(MediaAttachment::new(file_name, guess_content_type(path), bytes))
}

fn guess_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

const fn switch_label(enabled: bool) -> &'static str {
    if enabled { "ON" } else { "OFF" }
}

fn with_header(header: Option<String>, body: String) -> String {
    match header {
        Some(header) => format!("{header}\n{body}"),
        None => body,
    }
}

fn format_chat(title: Option<&str>, chat_id: Option<i64>) -> String {
    match (title, chat_id) {
        (Some(title), Some(id)) => format!("{title} ({id})"),
        (Some(title), None) => title.to_owned(),
        (None, Some(id)) => id.to_string(),
        (None, None) => "none".to_owned(),
    }
}

fn format_message_settings(kind: MessagePanelKind, settings: &MessageSettings) -> String {
    let message = if settings.message.is_empty() {
        "(empty)".to_owned()
    } else {
        format!("\"{}\"", settings.message)
    };

    format!(
        "{kind}: {}\n\
         Message: {message}",
        switch_label(settings.enabled)
    )
}

fn format_moderation(settings: &ModerationSettings) -> String {
    let mut lines = vec!["Moderation rules:".to_owned()];
    for rule in ModerationRule::ALL {
        lines.push(format!("  {rule}: {}", switch_label(settings.rule(rule))));
    }

    let banned = if settings.banned_words.is_empty() {
        "(none)".to_owned()
    } else {
        settings.banned_words.join(", ")
    };
    lines.push(format!("Max warnings: {}", settings.max_warnings));
    lines.push(format!("Flood limit: {}", settings.flood_limit));
    lines.push(format!("Warn action: {}", settings.warn_action));
    lines.push(format!("Banned words: {banned}"));
    lines.join("\n")
}

fn format_gamification(settings: &GamificationSettings) -> String {
    let mut lines = vec![format!("Gamification: {}", switch_label(settings.enabled))];
    for field in GamificationField::ALL {
        let value = match field {
            GamificationField::PointsPerMessage => settings.points_per_message,
            GamificationField::PointsPerReaction => settings.points_per_reaction,
            GamificationField::PointsPerInvite => settings.points_per_invite,
            GamificationField::DailyBonus => settings.daily_bonus,
            GamificationField::LevelUpThreshold => settings.level_up_threshold,
        };
        lines.push(format!("  {field}: {value}"));
    }
    lines.join("\n")
}

fn format_scheduled(message: &ScheduledMessage) -> String {
    let repeat = message
        .repeat_interval_minutes
        .map(|minutes| format!(" (every {})", format_interval(minutes)))
        .unwrap_or_default();
    let media = if message.media_url.is_some() { " +media" } else { "" };

    format!(
        "[{}] {} \"{}\"{repeat}{media}",
        message.id,
        message.send_time.format("%Y-%m-%d %H:%M UTC"),
        truncate_for_log(&message.message, 40)
    )
}

fn format_schedule(messages: &[ScheduledMessage]) -> String {
    if messages.is_empty() {
        return "No scheduled messages.".to_owned();
    }

    let mut lines = vec!["Scheduled messages:".to_owned()];
    lines.extend(messages.iter().map(|m| format!("  {}", format_scheduled(m))));
    lines.join("\n")
}

/// Formats a repeat interval in minutes for display.
fn format_interval(minutes: u32) -> String {
    if minutes >= 1440 && minutes % 1440 == 0 {
        format!("{}d", minutes / 1440)
    } else if minutes >= 60 && minutes % 60 == 0 {
        format!("{}h", minutes / 60)
    } else {
        format!("{minutes}m")
    }
}
