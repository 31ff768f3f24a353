//! Settings panels.
//!
//! Each panel owns a copy of the backend client, its own request throttle
//! and a [`SettingsLoader`] that runs the bounded fetch/retry sequence.

mod dashboard;
mod gamification;
mod loader;
mod message;
mod moderation;
mod schedule;

pub use dashboard::{Dashboard, PanelLoad};
pub use gamification::GamificationPanel;
pub use loader::{LoadState, PanelError, RetryPolicy, SettingsLoader};
pub use message::{MessagePanel, MessagePanelKind};
pub use moderation::ModerationPanel;
pub use schedule::SchedulePanel;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::DashboardSettings;
    use crate::webapp::AuthContext;

    pub fn auth() -> AuthContext {
        AuthContext::new("query_id=1&hash=ff".to_owned(), 42)
    }

    /// Production limits with millisecond timings.
    pub fn fast_settings() -> DashboardSettings {
        DashboardSettings {
            throttle_interval_ms: 5,
            retry_base_delay_ms: 2,
            ..DashboardSettings::default()
        }
    }
}
