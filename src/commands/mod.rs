//! Command handling module.
//!
//! Maps command-line subcommands onto dashboard panel operations and
//! renders their results.

mod handler;
mod types;

pub use handler::CommandHandler;
pub use types::{
    CommandResult, DashboardCommand, GamificationAction, MessageAction, ModerationAction,
    ScheduleAction,
};
