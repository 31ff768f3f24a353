//! Backend access layer.
//!
//! Provides the authenticated HTTP client for the RoboMod settings API,
//! the records it exchanges and the per-endpoint request throttle.

mod client;
mod throttle;
mod types;

pub(crate) use client::truncate_for_log;
pub use client::{ApiError, DashboardClient};
pub use throttle::RequestThrottle;
pub use types::{
    GamificationField, GamificationSettings, MediaAttachment, MessageSettings, ModerationRule,
    ModerationSettings, ModeratorChat, NewScheduledMessage, ScheduledMessage, WarnAction,
};
