//! Settings records exchanged with the backend.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Settings shared by the FAQ, greeting, goodbye and schedule panels.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub message: String,
}

/// Action applied once a member reaches the warning limit.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WarnAction {
    #[default]
    Mute,
    Kick,
    Ban,
}

impl fmt::Display for WarnAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mute => "mute",
            Self::Kick => "kick",
            Self::Ban => "ban",
        };
        f.write_str(name)
    }
}

impl FromStr for WarnAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mute" => Ok(Self::Mute),
            "kick" => Ok(Self::Kick),
            "ban" => Ok(Self::Ban),
            other => Err(format!("unknown warn action '{other}' (expected mute, kick or ban)")),
        }
    }
}

/// Moderation rules applied by the bot in the moderated chat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModerationSettings {
    #[serde(default)]
    pub anti_spam: bool,

    #[serde(default)]
    pub anti_link: bool,

    #[serde(default)]
    pub anti_flood: bool,

    #[serde(default)]
    pub anti_forward: bool,

    #[serde(default)]
    pub profanity_filter: bool,

    #[serde(default)]
    pub captcha: bool,

    #[serde(default)]
    pub banned_words: Vec<String>,

    /// Warnings before `warn_action` is applied.
    #[serde(default = "default_max_warnings")]
    pub max_warnings: u32,

    /// Messages per minute before a member counts as flooding.
    #[serde(default = "default_flood_limit")]
    pub flood_limit: u32,

    #[serde(default)]
    pub warn_action: WarnAction,
}

fn default_max_warnings() -> u32 {
    3
}

fn default_flood_limit() -> u32 {
    5
}

impl Default for ModerationSettings {
    fn default() -> Self {
        Self {
            anti_spam: false,
            anti_link: false,
            anti_flood: false,
            anti_forward: false,
            profanity_filter: false,
            captcha: false,
            banned_words: Vec::new(),
            max_warnings: default_max_warnings(),
            flood_limit: default_flood_limit(),
            warn_action: WarnAction::default(),
        }
    }
}

impl ModerationSettings {
    /// Returns whether `rule` is switched on.
    #[must_use]
    pub const fn rule(&self, rule: ModerationRule) -> bool {
        match rule {
            ModerationRule::AntiSpam => self.anti_spam,
            ModerationRule::AntiLink => self.anti_link,
            ModerationRule::AntiFlood => self.anti_flood,
            ModerationRule::AntiForward => self.anti_forward,
            ModerationRule::ProfanityFilter => self.profanity_filter,
            ModerationRule::Captcha => self.captcha,
        }
    }

    /// Switches `rule` on or off.
    pub fn set_rule(&mut self, rule: ModerationRule, enabled: bool) {
        let flag = match rule {
            ModerationRule::AntiSpam => &mut self.anti_spam,
            ModerationRule::AntiLink => &mut self.anti_link,
            ModerationRule::AntiFlood => &mut self.anti_flood,
            ModerationRule::AntiForward => &mut self.anti_forward,
            ModerationRule::ProfanityFilter => &mut self.profanity_filter,
            ModerationRule::Captcha => &mut self.captcha,
        };
        *flag = enabled;
    }
}

/// A boolean moderation rule that can be toggled on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationRule {
    AntiSpam,
    AntiLink,
    AntiFlood,
    AntiForward,
    ProfanityFilter,
    Captcha,
}

impl ModerationRule {
    /// Every rule, in display order.
    pub const ALL: [Self; 6] = [
        Self::AntiSpam,
        Self::AntiLink,
        Self::AntiFlood,
        Self::AntiForward,
        Self::ProfanityFilter,
        Self::Captcha,
    ];

    /// Field name used on the wire and on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AntiSpam => "anti_spam",
            Self::AntiLink => "anti_link",
            Self::AntiFlood => "anti_flood",
            Self::AntiForward => "anti_forward",
            Self::ProfanityFilter => "profanity_filter",
            Self::Captcha => "captcha",
        }
    }
}

impl fmt::Display for ModerationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModerationRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|rule| rule.name() == normalized)
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|r| r.name()).collect();
                format!("unknown rule '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

/// Point values used by the gamification engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GamificationSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_points_per_message")]
    pub points_per_message: u32,

    #[serde(default)]
    pub points_per_reaction: u32,

    #[serde(default)]
    pub points_per_invite: u32,

    #[serde(default)]
    pub daily_bonus: u32,

    #[serde(default = "default_level_up_threshold")]
    pub level_up_threshold: u32,
}

fn default_points_per_message() -> u32 {
    1
}

fn default_level_up_threshold() -> u32 {
    100
}

impl Default for GamificationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            points_per_message: default_points_per_message(),
            points_per_reaction: 0,
            points_per_invite: 0,
            daily_bonus: 0,
            level_up_threshold: default_level_up_threshold(),
        }
    }
}

/// A numeric gamification field that can be set from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamificationField {
    PointsPerMessage,
    PointsPerReaction,
    PointsPerInvite,
    DailyBonus,
    LevelUpThreshold,
}

impl GamificationField {
    pub const ALL: [Self; 5] = [
        Self::PointsPerMessage,
        Self::PointsPerReaction,
        Self::PointsPerInvite,
        Self::DailyBonus,
        Self::LevelUpThreshold,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PointsPerMessage => "points_per_message",
            Self::PointsPerReaction => "points_per_reaction",
            Self::PointsPerInvite => "points_per_invite",
            Self::DailyBonus => "daily_bonus",
            Self::LevelUpThreshold => "level_up_threshold",
        }
    }

    /// Writes `value` into the matching field of `settings`.
    pub fn apply(self, settings: &mut GamificationSettings, value: u32) {
        match self {
            Self::PointsPerMessage => settings.points_per_message = value,
            Self::PointsPerReaction => settings.points_per_reaction = value,
            Self::PointsPerInvite => settings.points_per_invite = value,
            Self::DailyBonus => settings.daily_bonus = value,
            Self::LevelUpThreshold => settings.level_up_threshold = value,
        }
    }
}

impl fmt::Display for GamificationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GamificationField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|field| field.name() == normalized)
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|f| f.name()).collect();
                format!("unknown field '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

/// A message queued for later delivery by the bot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduledMessage {
    pub id: i64,

    #[serde(default)]
    pub message: String,

    pub send_time: DateTime<Utc>,

    /// Repeat period; `None` for one-off messages.
    #[serde(default)]
    pub repeat_interval_minutes: Option<u32>,

    #[serde(default)]
    pub media_url: Option<String>,
}

/// File attached to a scheduled message.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl MediaAttachment {
    #[must_use]
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for MediaAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaAttachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Form contents for a new scheduled message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScheduledMessage {
    pub message: String,
    pub send_time: DateTime<Utc>,
    pub repeat_interval_minutes: Option<u32>,
    pub media: Option<MediaAttachment>,
}

/// The chat the current user moderates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModeratorChat {
    #[serde(default)]
    pub chat_id: Option<i64>,

    #[serde(default)]
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_settings_missing_fields() {
        let settings: MessageSettings = serde_json::from_str(r#"{"enabled": true}"#).unwrap();
        assert!(settings.enabled);
        assert_eq!(settings.message, "");
    }

    #[test]
    fn test_moderation_defaults_and_unknown_fields() {
        let settings: ModerationSettings =
            serde_json::from_str(r#"{"anti_link": true, "chat_id": 5, "warn_action": "ban"}"#)
                .unwrap();
        assert!(settings.anti_link);
        assert!(!settings.anti_spam);
        assert_eq!(settings.max_warnings, 3);
        assert_eq!(settings.warn_action, WarnAction::Ban);
    }

    #[test]
    fn test_rule_roundtrip_through_setter() {
        let mut settings = ModerationSettings::default();
        for rule in ModerationRule::ALL {
            settings.set_rule(rule, true);
            assert!(settings.rule(rule), "{rule} should be on");
        }
    }

    #[test]
    fn test_rule_parse() {
        assert_eq!("anti-spam".parse::<ModerationRule>(), Ok(ModerationRule::AntiSpam));
        assert_eq!("CAPTCHA".parse::<ModerationRule>(), Ok(ModerationRule::Captcha));
        assert!("anti_everything".parse::<ModerationRule>().is_err());
    }

    #[test]
    fn test_gamification_field_apply() {
        let mut settings = GamificationSettings::default();
        let field: GamificationField = "daily-bonus".parse().unwrap();
        field.apply(&mut settings, 25);
        assert_eq!(settings.daily_bonus, 25);
    }

    #[test]
    fn test_scheduled_message_parse() {
        let msg: ScheduledMessage = serde_json::from_str(
            r#"{"id": 7, "message": "Daily standup", "send_time": "2026-10-18T09:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(msg.id, 7);
        assert_eq!(msg.repeat_interval_minutes, None);
        assert_eq!(msg.send_time.to_rfc3339(), "2026-10-18T09:00:00+00:00");
    }
}
