//! Referral Bot - Main Entry Point
//!
//! A Telegram group bot that counts the members each user adds and hands
//! out a reward link every time a user completes a cycle.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use referral_bot::config::{ReferralSettings, TelegramConfig};
use referral_bot::events::EventHandler;
use referral_bot::notify::EphemeralDispatcher;
use referral_bot::referral::CounterStore;
use referral_bot::scheduler::TimerService;
use referral_bot::telegram::{TelegramBot, TelegramError};

/// Telegram group bot that rewards members for inviting others.
#[derive(Parser, Debug)]
#[command(name = "referral_bot")]
#[command(about = "Count invited group members and hand out rewards")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Validate the configuration, print it and exit.
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let tg_config = TelegramConfig::from_env()
        .context("Failed to load Telegram configuration from environment")?;
    let settings =
        ReferralSettings::from_env().context("Failed to load referral settings from environment")?;

    info!(
        "Group {}: reward every {} added members, messages live {}s",
        settings.allowed_group_id, settings.members_per_reward, settings.message_lifetime_secs
    );

    if args.check_config {
        return print_config(&tg_config, &settings);
    }

    let bot = TelegramBot::connect(&tg_config)
        .await
        .context("Failed to connect to Telegram")?;
    bot.sign_in(&tg_config)
        .await
        .context("Failed to sign in as bot")?;

    let bot = Arc::new(bot);
    let dispatcher = EphemeralDispatcher::new(
        Arc::clone(&bot),
        TimerService::new(Arc::clone(&bot)),
        settings.message_lifetime(),
    );
    let store = Arc::new(CounterStore::new());
    let handler = Arc::new(EventHandler::new(&settings, Arc::clone(&store), dispatcher));

    info!("Bot is running. Use Ctrl+C to stop.");

    let mut failures = 0;
    let outcome = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break Ok(());
            }
            event = bot.next_event() => {
                match event {
                    Ok(Some(event)) => {
                        failures = 0;
                        debug!("Update in chat {}", event.chat());
                        let handler = Arc::clone(&handler);
                        tokio::spawn(async move {
                            handler.handle(event).await;
                        });
                    }
                    Ok(None) => failures = 0,
                    Err(e) => {
                        failures += 1;
                        let Some(delay) = retry_delay(failures, &e) else {
                            error!("Update stream failed {} times in a row: {}", failures, e);
                            break Err(e);
                        };
                        warn!("Update stream error, retrying in {:?}: {}", delay, e);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    };

    info!("Shutting down ({} users tracked)...", store.tracked_users());
    bot.disconnect();

    outcome.context("Lost the Telegram update stream")
}

/// Consecutive stream errors tolerated before giving up.
const MAX_STREAM_FAILURES: u32 = 5;

/// Delay before polling again after the `failures`-th error in a row.
///
/// Returns `None` once the stream should be considered dead.
fn retry_delay(failures: u32, error: &TelegramError) -> Option<Duration> {
    if failures >= MAX_STREAM_FAILURES {
        return None;
    }
    Some(match error {
        TelegramError::FloodWait(seconds) => Duration::from_secs(u64::from(*seconds)),
        _ => Duration::from_secs(1 << failures.min(4)),
    })
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Prints the loaded configuration without secrets.
fn print_config(tg_config: &TelegramConfig, settings: &ReferralSettings) -> Result<()> {
    let summary = json!({
        "telegram": tg_config,
        "referral": settings,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    println!("\n✓ Configuration is valid");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_backs_off() {
        let e = TelegramError::Connection("reset".to_owned());
        assert_eq!(retry_delay(1, &e), Some(Duration::from_secs(2)));
        assert_eq!(retry_delay(2, &e), Some(Duration::from_secs(4)));
        assert_eq!(retry_delay(4, &e), Some(Duration::from_secs(16)));
    }

    #[test]
    fn test_retry_delay_honors_flood_wait() {
        assert_eq!(
            retry_delay(1, &TelegramError::FloodWait(42)),
            Some(Duration::from_secs(42))
        );
    }

    #[test]
    fn test_retry_delay_gives_up() {
        let e = TelegramError::Invocation("AUTH_KEY_UNREGISTERED".to_owned());
        assert_eq!(retry_delay(MAX_STREAM_FAILURES, &e), None);
        assert_eq!(retry_delay(MAX_STREAM_FAILURES + 1, &e), None);
    }
}
