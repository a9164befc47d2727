//! Identity types shared by the referral core and the Telegram adapter.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a group participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

/// Chat identifier in Bot API notation (`-100…` for supergroups).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

/// Identifier of a message inside its chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i32);

/// Identifier of a pending button press, used to answer it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message that can later be deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageHandle {
    pub chat: ChatId,
    pub message: MessageId,
}

impl MessageHandle {
    #[must_use]
    pub const fn new(chat: ChatId, message: MessageId) -> Self {
        Self { chat, message }
    }
}

impl fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.chat.0, self.message.0)
    }
}

/// A user as seen in an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: UserId,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

impl Participant {
    /// Creates a participant with no name information.
    #[must_use]
    pub const fn anonymous(id: UserId) -> Self {
        Self {
            id,
            username: None,
            first_name: None,
        }
    }

    /// Name used after `@` in notifications.
    ///
    /// Falls back to the first name, then to `Anonymous`.
    #[must_use]
    pub fn mention_name(&self) -> &str {
        self.username
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.first_name.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or("Anonymous")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mention_prefers_username() {
        let user = Participant {
            id: UserId(1),
            username: Some("alice".to_owned()),
            first_name: Some("Alice".to_owned()),
        };
        assert_eq!(user.mention_name(), "alice");
    }

    #[test]
    fn test_mention_falls_back() {
        let mut user = Participant::anonymous(UserId(2));
        assert_eq!(user.mention_name(), "Anonymous");

        user.first_name = Some("Bob".to_owned());
        assert_eq!(user.mention_name(), "Bob");

        user.username = Some(String::new());
        assert_eq!(user.mention_name(), "Bob");
    }

    #[test]
    fn test_handle_display() {
        let handle = MessageHandle::new(ChatId(-100_123), MessageId(42));
        assert_eq!(handle.to_string(), "-100123/42");
    }
}
