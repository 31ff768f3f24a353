//! All settings panels of one moderator session.

use super::gamification::GamificationPanel;
use super::loader::{PanelError, SettingsLoader};
use super::message::{MessagePanel, MessagePanelKind};
use super::moderation::ModerationPanel;
use super::schedule::SchedulePanel;
use crate::api::{DashboardClient, ModeratorChat, RequestThrottle};
use crate::config::DashboardSettings;

const CHAT_ENDPOINT: &str = "get_moderator_chat";

/// Outcome of loading one panel during [`Dashboard::load_all`].
#[derive(Debug)]
pub struct PanelLoad {
    pub panel: &'static str,
    pub result: Result<(), PanelError>,
}

/// The full dashboard: every panel shares the client but owns its throttle
/// and retry state.
#[derive(Debug)]
pub struct Dashboard {
    client: DashboardClient,
    chat_throttle: RequestThrottle,
    chat: SettingsLoader<ModeratorChat>,
    pub faq: MessagePanel,
    pub greeting: MessagePanel,
    pub goodbye: MessagePanel,
    pub moderation: ModerationPanel,
    pub gamification: GamificationPanel,
    pub schedule: SchedulePanel,
}

impl Dashboard {
    #[must_use]
    pub fn new(client: DashboardClient, settings: &DashboardSettings) -> Self {
        let message_panel = |kind| MessagePanel::new(kind, client.clone(), settings);
        Self {
            faq: message_panel(MessagePanelKind::Faq),
            greeting: message_panel(MessagePanelKind::Greeting),
            goodbye: message_panel(MessagePanelKind::Goodbye),
            moderation: ModerationPanel::new(client.clone(), settings),
            gamification: GamificationPanel::new(client.clone(), settings),
            schedule: SchedulePanel::new(client.clone(), settings),
            chat_throttle: RequestThrottle::new(settings.throttle_interval()),
            chat: SettingsLoader::new(settings.retry_policy()),
            client,
        }
    }

    /// Looks up the chat the current user moderates.
    pub async fn moderator_chat(&mut self) -> Result<&ModeratorChat, PanelError> {
        if self.chat.settings().is_none() {
            let (client, throttle) = (&self.client, &self.chat_throttle);
            self.chat
                .load(move || throttle.run(CHAT_ENDPOINT, move || client.get(CHAT_ENDPOINT)))
                .await?;
        }
        self.chat.require()
    }

    /// Returns the toggle-and-message panel of the given kind.
    pub fn message_panel(&mut self, kind: MessagePanelKind) -> &mut MessagePanel {
        match kind {
            MessagePanelKind::Faq => &mut self.faq,
            MessagePanelKind::Greeting => &mut self.greeting,
            MessagePanelKind::Goodbye => &mut self.goodbye,
            MessagePanelKind::Schedule => self.schedule.settings_panel(),
        }
    }

    /// Loads every panel concurrently. Each panel runs its own retry
    /// sequence, so one failing endpoint does not hold up the others.
    pub async fn load_all(&mut self) -> Vec<PanelLoad> {
        let schedule = &mut self.schedule;
        let (faq, greeting, goodbye, moderation, gamification, schedule_settings) = tokio::join!(
            self.faq.load(),
            self.greeting.load(),
            self.goodbye.load(),
            self.moderation.load(),
            self.gamification.load(),
            async {
                let settings = schedule.settings_panel().load().await.map(|_| ());
                let messages = schedule.load_messages().await.map(|_| ());
                settings.and(messages)
            },
        );

        vec![
            PanelLoad { panel: "FAQ", result: faq.map(|_| ()) },
            PanelLoad { panel: "Greeting", result: greeting.map(|_| ()) },
            PanelLoad { panel: "Goodbye", result: goodbye.map(|_| ()) },
            PanelLoad { panel: "Moderation", result: moderation.map(|_| ()) },
            PanelLoad { panel: "Gamification", result: gamification.map(|_| ()) },
            PanelLoad { panel: "Schedule", result: schedule_settings },
        ]
    }

    #[must_use]
    pub const fn client(&self) -> &DashboardClient {
        &self.client
    }
}
