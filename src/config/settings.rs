//! Application settings and Telegram configuration.

use std::num::NonZeroU64;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::ChatId;

/// Telegram API configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Telegram API ID (obtain from <https://my.telegram.org>).
    pub api_id: i32,

    /// Telegram API hash (obtain from <https://my.telegram.org>).
    #[serde(skip_serializing)]
    pub api_hash: String,

    /// Bot token issued by `@BotFather`.
    #[serde(skip_serializing)]
    pub bot_token: String,

    /// Path to the session file.
    #[serde(default = "default_session_path")]
    pub session_path: PathBuf,
}

fn default_session_path() -> PathBuf {
    PathBuf::from("bot.session")
}

impl TelegramConfig {
    /// Creates configuration from environment variables.
    ///
    /// Expects `TG_API_ID`, `TG_API_HASH` and `BOT_TOKEN` to be set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_id: i32 = lookup("TG_API_ID")
            .ok_or(ConfigError::MissingEnvVar("TG_API_ID"))?
            .trim()
            .parse()
            .ok()
            .filter(|id| *id > 0)
            .ok_or(ConfigError::InvalidApiId)?;

        let api_hash = lookup("TG_API_HASH").ok_or(ConfigError::MissingEnvVar("TG_API_HASH"))?;

        let bot_token = lookup("BOT_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingEnvVar("BOT_TOKEN"))?;

        let session_path = lookup("TG_SESSION_PATH").map_or_else(default_session_path, PathBuf::from);

        Ok(Self {
            api_id,
            api_hash,
            bot_token,
            session_path,
        })
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_id", &self.api_id)
            .field("session_path", &self.session_path)
            .finish_non_exhaustive()
    }
}

/// Referral and reward settings, fixed for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralSettings {
    /// The only group the bot reacts in.
    pub allowed_group_id: ChatId,

    /// Members a user has to add to earn one reward.
    pub members_per_reward: NonZeroU64,

    /// Lifetime of every ephemeral bot message, in seconds.
    pub message_lifetime_secs: u64,

    /// Link where a reward is claimed.
    pub reward_url: String,

    /// Human name of the reward used in messages.
    #[serde(default = "default_reward_name")]
    pub reward_name: String,
}

fn default_reward_name() -> String {
    "free plagiarism report".to_owned()
}

impl ReferralSettings {
    /// Loads settings from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let allowed_group_id = lookup("ALLOWED_GROUP_ID")
            .ok_or(ConfigError::MissingEnvVar("ALLOWED_GROUP_ID"))?
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id != 0)
            .map(ChatId)
            .ok_or(ConfigError::InvalidGroupId)?;

        // The lowercase spelling is what older deployments set.
        let members_per_reward = lookup("MEMBER_NEED_TO_ADD")
            .or_else(|| lookup("member_need_to_add"))
            .ok_or(ConfigError::MissingEnvVar("MEMBER_NEED_TO_ADD"))?
            .trim()
            .parse::<u64>()
            .ok()
            .and_then(NonZeroU64::new)
            .ok_or(ConfigError::InvalidThreshold)?;

        let message_lifetime_secs = lookup("MSG_DELETE_TIME")
            .ok_or(ConfigError::MissingEnvVar("MSG_DELETE_TIME"))?
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidDeleteTime)?;

        let reward_url = lookup("BOT_URL")
            .map(|u| u.trim().to_owned())
            .ok_or(ConfigError::MissingEnvVar("BOT_URL"))?;
        if !is_supported_link(&reward_url) {
            return Err(ConfigError::InvalidRewardUrl(reward_url));
        }

        let reward_name = lookup("REWARD_NAME")
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(default_reward_name);

        Ok(Self {
            allowed_group_id,
            members_per_reward,
            message_lifetime_secs,
            reward_url,
            reward_name,
        })
    }

    /// Lifetime of ephemeral messages.
    #[must_use]
    pub const fn message_lifetime(&self) -> Duration {
        Duration::from_secs(self.message_lifetime_secs)
    }
}

fn is_supported_link(url: &str) -> bool {
    ["https://", "http://", "tg://"]
        .iter()
        .any(|scheme| url.len() > scheme.len() && url.starts_with(scheme))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid API ID format (must be a positive integer)")]
    InvalidApiId,

    #[error("ALLOWED_GROUP_ID must be a non-zero chat id")]
    InvalidGroupId,

    #[error("MEMBER_NEED_TO_ADD must be a positive integer")]
    InvalidThreshold,

    #[error("MSG_DELETE_TIME must be a whole number of seconds")]
    InvalidDeleteTime,

    #[error("BOT_URL is not a http(s) or tg:// link: {0}")]
    InvalidRewardUrl(String),
}
