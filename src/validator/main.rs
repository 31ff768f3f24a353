//! Standalone validator for Telegram Mini App `initData`.
//!
//! Checks that an `initData` string (or a bridge JSON file carrying one) is
//! well-formed, signed by the given bot token and fresh enough, the same
//! check the dashboard backend performs on every request.

use std::process::ExitCode;
use std::time::Duration;

use chrono::DateTime;
use clap::Parser;

use robomod_dashboard::webapp::{InitData, MiniAppBridge};

/// Mini App `initData` validator.
#[derive(Parser, Debug)]
#[command(name = "validate_init_data")]
#[command(about = "Validates Telegram Mini App initData signatures")]
#[command(version)]
struct Args {
    /// Raw `initData` query string.
    #[arg(short, long, conflicts_with = "bridge")]
    init_data: Option<String>,

    /// Bridge JSON file containing `initData`.
    #[arg(short, long)]
    bridge: Option<String>,

    /// Bot token the data was signed for. Without it only the structure
    /// is checked.
    #[arg(short = 't', long, env = "BOT_TOKEN", hide_env_values = true)]
    bot_token: Option<String>,

    /// Reject data older than this many seconds (0 disables the check).
    #[arg(long, default_value_t = 86_400)]
    max_age_secs: u64,

    /// Print every decoded field.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let raw = match (&args.init_data, &args.bridge) {
        (Some(raw), _) => raw.clone(),
        (None, Some(path)) => match MiniAppBridge::load_from_file(path) {
            Ok(bridge) => bridge.init_data,
            Err(e) => {
                eprintln!("✗ Failed to load bridge file: {e}");
                return ExitCode::FAILURE;
            }
        },
        (None, None) => match std::env::var("TG_INIT_DATA") {
            Ok(raw) => raw,
            Err(_) => {
                eprintln!("✗ No initData given (use --init-data, --bridge or TG_INIT_DATA)");
                return ExitCode::FAILURE;
            }
        },
    };

    validate(&raw, args.bot_token.as_deref(), args.max_age_secs, args.verbose)
}

fn validate(raw: &str, bot_token: Option<&str>, max_age_secs: u64, verbose: bool) -> ExitCode {
    let init_data = match InitData::parse(raw) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("✗ Failed to parse initData: {e}");
            return ExitCode::FAILURE;
        }
    };

    match init_data.user_id() {
        Ok(id) => println!("User id:   {id}"),
        Err(e) => println!("User id:   ✗ {e}"),
    }

    match init_data.auth_date() {
        Ok(Some(secs)) => {
            let issued = i64::try_from(secs)
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .map_or_else(|| secs.to_string(), |at| at.to_rfc3339());
            println!("Issued at: {issued}");
        }
        Ok(None) => println!("Issued at: (no auth_date)"),
        Err(e) => println!("Issued at: ✗ {e}"),
    }

    if verbose {
        println!("\nData-check string:");
        for line in init_data.data_check_string().lines() {
            println!("  {}", truncate(line, 80));
        }
    }

    println!();

    let Some(bot_token) = bot_token else {
        println!("⚠ No bot token given; signature not checked");
        return ExitCode::SUCCESS;
    };

    let max_age = (max_age_secs > 0).then(|| Duration::from_secs(max_age_secs));
    match init_data.verify(bot_token, max_age) {
        Ok(()) => {
            println!("✓ Signature is valid");
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("✗ Validation failed: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Truncates a string for display.
fn truncate(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", chars[..max_len].iter().collect::<String>())
    }
}
