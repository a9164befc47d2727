//! Mapping raw Telegram objects onto bot events.

use grammers_tl_types as tl;

use crate::types::{ChatId, UserId};

/// Offset Bot API adds to channel and supergroup ids (`-100…`).
const CHANNEL_ID_OFFSET: i64 = -1_000_000_000_000;

/// Converts an MTProto peer into a Bot API style chat id.
#[must_use]
pub fn chat_id(peer: &tl::enums::Peer) -> ChatId {
    match peer {
        tl::enums::Peer::User(user) => ChatId(user.user_id),
        tl::enums::Peer::Chat(chat) => ChatId(-chat.chat_id),
        tl::enums::Peer::Channel(channel) => ChatId(CHANNEL_ID_OFFSET - channel.channel_id),
    }
}

/// Returns the user behind a peer, if it is a user.
#[must_use]
pub fn user_id(peer: &tl::enums::Peer) -> Option<UserId> {
    match peer {
        tl::enums::Peer::User(user) => Some(UserId(user.user_id)),
        tl::enums::Peer::Chat(_) | tl::enums::Peer::Channel(_) => None,
    }
}

/// Lists the users that joined through a service message action.
///
/// Joins by link or by approved request are made by the actor themselves.
/// Returns `None` for actions that are not joins.
#[must_use]
pub fn joined_members(
    action: &tl::enums::MessageAction,
    actor: Option<UserId>,
) -> Option<Vec<UserId>> {
    match action {
        tl::enums::MessageAction::ChatAddUser(add) => {
            Some(add.users.iter().copied().map(UserId).collect())
        }
        tl::enums::MessageAction::ChatJoinedByLink(_)
        | tl::enums::MessageAction::ChatJoinedByRequest => Some(actor.into_iter().collect()),
        _ => None,
    }
}
