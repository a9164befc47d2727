//! Telegram client wrapper module.
//!
//! Connects as a bot over `MTProto`, converts updates into bot events and
//! carries outbound messages back to Telegram.

mod client;
mod updates;

pub use client::{TelegramBot, TelegramError};
pub use updates::{chat_id, joined_members, user_id};
