//! Configuration module for the referral bot.
//!
//! Handles loading and validation of the Telegram credentials and the
//! referral settings. Everything is read once at startup.

mod settings;

pub use settings::{ConfigError, ReferralSettings, TelegramConfig};

/// Callback payload carried by the "check my progress" button.
pub const CHECK_COUNT_PAYLOAD: &str = "check_count";
