//! RoboMod Dashboard - Main Entry Point
//!
//! Command-line front end for the moderator settings dashboard. Each run
//! authenticates with the Telegram Mini App initData, performs one command
//! against the dashboard backend and prints the result.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use robomod_dashboard::api::DashboardClient;
use robomod_dashboard::commands::{CommandHandler, DashboardCommand};
use robomod_dashboard::config::DashboardSettings;
use robomod_dashboard::panels::Dashboard;
use robomod_dashboard::webapp::{AuthContext, MiniAppBridge};

/// Moderator settings dashboard for the RoboMod Telegram bot.
#[derive(Parser, Debug)]
#[command(name = "robomod")]
#[command(about = "Manage RoboMod moderation, greetings and schedules from the terminal")]
#[command(version)]
struct Args {
    /// Mini App bridge JSON (`initData`, `initDataUnsafe`). Falls back to
    /// `TG_INIT_DATA` / `TG_USER_ID` when omitted.
    #[arg(short, long)]
    bridge: Option<PathBuf>,

    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error). Defaults to `LOG_LEVEL`.
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: DashboardCommand,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let env_loaded = dotenvy::from_filename(&args.env_file);

    let settings = DashboardSettings::from_env()
        .context("Failed to load dashboard settings from environment")?;

    init_logging(args.log_level.as_deref().unwrap_or(&settings.log_level));

    if let Err(e) = env_loaded {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let bridge = match &args.bridge {
        Some(path) => Some(
            MiniAppBridge::load_from_file(path)
                .with_context(|| format!("Failed to load bridge file {}", path.display()))?,
        ),
        None => MiniAppBridge::from_env().context("Failed to read Mini App context from environment")?,
    };

    let auth = AuthContext::from_bridge(bridge.as_ref())
        .context("Not running inside a Telegram Mini App session")?;

    info!("Authenticated as user {} against {}", auth.user_id, settings.api_url);

    let client = DashboardClient::new(settings.api_url.clone(), Some(auth));
    let mut handler = CommandHandler::new(Dashboard::new(client, &settings));

    let result = handler.execute(args.command).await;
    if result.success {
        println!("{}", result.message);
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{}", result.message);
        Ok(ExitCode::FAILURE)
    }
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_moderation_toggle_args() {
        let args = Args::try_parse_from(["robomod", "moderation", "toggle", "anti-flood", "off"]).unwrap();
        assert!(args.log_level.is_none());
        assert!(matches!(
            args.command,
            DashboardCommand::Moderation {
                action: robomod_dashboard::commands::ModerationAction::Toggle { enabled: false, .. }
            }
        ));
    }
}
