//! Command types and definitions.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Subcommand};

use crate::api::{GamificationField, ModerationRule, WarnAction};

/// Available dashboard commands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum DashboardCommand {
    /// Load every panel and show a summary.
    Status,

    /// Show the chat you moderate.
    Chat,

    /// FAQ auto-response settings.
    Faq {
        #[command(subcommand)]
        action: MessageAction,
    },

    /// Greeting sent to new members.
    Greeting {
        #[command(subcommand)]
        action: MessageAction,
    },

    /// Goodbye sent when members leave.
    Goodbye {
        #[command(subcommand)]
        action: MessageAction,
    },

    /// Schedule feature toggle and default message.
    #[command(name = "schedule-settings")]
    ScheduleSettings {
        #[command(subcommand)]
        action: MessageAction,
    },

    /// Moderation rules.
    Moderation {
        #[command(subcommand)]
        action: ModerationAction,
    },

    /// Gamification point values.
    Gamification {
        #[command(subcommand)]
        action: GamificationAction,
    },

    /// Scheduled messages.
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },
}

/// Actions on a toggle-and-message panel.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum MessageAction {
    /// Show the current settings.
    Show,

    /// Turn the feature on.
    Enable,

    /// Turn the feature off.
    Disable,

    /// Replace the message text.
    #[command(visible_alias = "set")]
    SetMessage {
        /// New message text.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
}

/// Actions on the moderation panel.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ModerationAction {
    /// Show the current rules.
    Show,

    /// Switch a single rule on or off.
    Toggle {
        /// Rule name, e.g. `anti_spam`.
        rule: ModerationRule,

        /// on/off, yes/no, true/false.
        #[arg(value_parser = BoolishValueParser::new(), action = ArgAction::Set)]
        enabled: bool,
    },

    /// Warnings before the warn action is applied.
    MaxWarnings { count: u32 },

    /// Messages per minute before a member counts as flooding.
    FloodLimit { count: u32 },

    /// What happens at the warning limit: mute, kick or ban.
    WarnAction { action: WarnAction },

    /// Replace the banned word list (no words clears it).
    BannedWords { words: Vec<String> },
}

/// Actions on the gamification panel.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum GamificationAction {
    /// Show the current point values.
    Show,

    /// Turn gamification on.
    Enable,

    /// Turn gamification off.
    Disable,

    /// Set a point value, e.g. `set daily_bonus 10`.
    Set { field: GamificationField, value: u32 },
}

/// Actions on the scheduled message queue.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ScheduleAction {
    /// List scheduled messages.
    #[command(visible_alias = "ls")]
    List,

    /// Schedule a new message.
    Add {
        /// Message text.
        #[arg(short, long)]
        message: String,

        /// Send time (RFC 3339, e.g. 2026-10-20T09:00:00Z).
        #[arg(long)]
        at: DateTime<Utc>,

        /// Repeat every N minutes.
        #[arg(long)]
        repeat: Option<u32>,

        /// Image, video or document to attach (max 1 MiB).
        #[arg(long)]
        media: Option<PathBuf>,
    },
}

/// Result of command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command was successful.
    pub success: bool,

    /// Response message to show the user.
    pub message: String,
}

impl CommandResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Creates an error result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::*;

    #[derive(Parser, Debug)]
    struct Cli {
        #[command(subcommand)]
        command: DashboardCommand,
    }

    fn parse(args: &[&str]) -> Option<DashboardCommand> {
        let argv = std::iter::once("robomod").chain(args.iter().copied());
        Cli::try_parse_from(argv).ok().map(|cli| cli.command)
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse(&["status"]), Some(DashboardCommand::Status));
    }

    #[test]
    fn test_parse_faq_set_message() {
        assert_eq!(
            parse(&["faq", "set-message", "Ask", "us", "anything"]),
            Some(DashboardCommand::Faq {
                action: MessageAction::SetMessage {
                    text: vec!["Ask".to_owned(), "us".to_owned(), "anything".to_owned()],
                },
            })
        );
    }

    #[test]
    fn test_parse_set_message_requires_text() {
        assert_eq!(parse(&["greeting", "set-message"]), None);
    }

    #[test]
    fn test_parse_moderation_toggle() {
        assert_eq!(
            parse(&["moderation", "toggle", "anti-link", "off"]),
            Some(DashboardCommand::Moderation {
                action: ModerationAction::Toggle {
                    rule: ModerationRule::AntiLink,
                    enabled: false,
                },
            })
        );
        assert_eq!(
            parse(&["moderation", "toggle", "captcha", "yes"]),
            Some(DashboardCommand::Moderation {
                action: ModerationAction::Toggle {
                    rule: ModerationRule::Captcha,
                    enabled: true,
                },
            })
        );
        assert_eq!(parse(&["moderation", "toggle", "anti_gravity", "on"]), None);
        assert_eq!(parse(&["moderation", "toggle", "anti_spam"]), None);
    }

    #[test]
    fn test_parse_gamification_set() {
        assert_eq!(
            parse(&["gamification", "set", "daily_bonus", "10"]),
            Some(DashboardCommand::Gamification {
                action: GamificationAction::Set {
                    field: GamificationField::DailyBonus,
                    value: 10,
                },
            })
        );
    }

    #[test]
    fn test_parse_schedule_add() {
        let command = parse(&[
            "schedule",
            "add",
            "--message",
            "Standup",
            "--at",
            "2026-10-20T09:00:00Z",
            "--repeat",
            "1440",
        ])
        .unwrap();

        match command {
            DashboardCommand::Schedule {
                action: ScheduleAction::Add { message, at, repeat, media },
            } => {
                assert_eq!(message, "Standup");
                assert_eq!(at.to_rfc3339(), "2026-10-20T09:00:00+00:00");
                assert_eq!(repeat, Some(1440));
                assert!(media.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
