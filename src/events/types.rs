//! Inbound event types and command parsing.

use std::fmt;

use crate::types::{ChatId, MessageHandle, Participant, QueryId, UserId};

/// Commands the bot answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    /// Show how many members the issuer has added.
    Count,

    /// Explain how to earn a reward.
    Add,
}

impl BotCommand {
    /// Parses a command from message text.
    ///
    /// Accepts `/count` and `/count@bot_username`. Commands addressed to a
    /// different bot are rejected, as is anything that is not a command.
    #[must_use]
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let text = text.trim();
        let word = text.strip_prefix('/')?.split_whitespace().next()?;

        let (name, target) = match word.split_once('@') {
            Some((name, target)) => (name, Some(target)),
            None => (word, None),
        };

        if let Some(target) = target {
            let ours = bot_username.is_some_and(|me| me.eq_ignore_ascii_case(target));
            if !ours {
                return None;
            }
        }

        match name.to_lowercase().as_str() {
            "count" => Some(Self::Count),
            "add" => Some(Self::Add),
            _ => None,
        }
    }

    /// Returns the command name without the slash.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Add => "add",
        }
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.name())
    }
}

/// New members appeared in a chat.
#[derive(Debug, Clone)]
pub struct MembershipChanged {
    pub chat: ChatId,
    /// The user who performed the join or the add.
    pub actor: Option<Participant>,
    pub joined: Vec<UserId>,
}

/// A recognised command was sent.
#[derive(Debug, Clone)]
pub struct CommandIssued {
    pub chat: ChatId,
    pub issuer: Participant,
    pub command: BotCommand,
    /// The message carrying the command.
    pub message: MessageHandle,
}

/// An inline button was pressed.
#[derive(Debug, Clone)]
pub struct ButtonPressed {
    pub chat: ChatId,
    pub presser: Participant,
    pub payload: String,
    pub query: QueryId,
}

/// Every event the bot reacts to.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    MembershipChanged(MembershipChanged),
    Command(CommandIssued),
    ButtonPressed(ButtonPressed),
}

impl InboundEvent {
    /// Chat the event happened in.
    #[must_use]
    pub const fn chat(&self) -> ChatId {
        match self {
            Self::MembershipChanged(e) => e.chat,
            Self::Command(e) => e.chat,
            Self::ButtonPressed(e) => e.chat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        assert_eq!(BotCommand::parse("/count", None), Some(BotCommand::Count));
        assert_eq!(BotCommand::parse("/add", None), Some(BotCommand::Add));
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(BotCommand::parse("/COUNT", None), Some(BotCommand::Count));
        assert_eq!(BotCommand::parse("/Add", None), Some(BotCommand::Add));
    }

    #[test]
    fn test_parse_with_extra_whitespace_and_args() {
        assert_eq!(BotCommand::parse("  /count  please ", None), Some(BotCommand::Count));
    }

    #[test]
    fn test_parse_addressed_to_us() {
        assert_eq!(
            BotCommand::parse("/count@ReferralBot", Some("referralbot")),
            Some(BotCommand::Count)
        );
    }

    #[test]
    fn test_parse_addressed_to_other_bot() {
        assert_eq!(BotCommand::parse("/count@OtherBot", Some("ReferralBot")), None);
        assert_eq!(BotCommand::parse("/count@OtherBot", None), None);
    }

    #[test]
    fn test_parse_rejects_non_commands() {
        assert_eq!(BotCommand::parse("count", None), None);
        assert_eq!(BotCommand::parse("/", None), None);
        assert_eq!(BotCommand::parse("/start", None), None);
        assert_eq!(BotCommand::parse("", None), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(BotCommand::Count.to_string(), "/count");
    }
}
