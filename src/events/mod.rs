//! Inbound event handling.
//!
//! The Telegram adapter turns updates into [`InboundEvent`]s; the
//! [`EventHandler`] reacts to them.

mod handler;
mod types;

pub use handler::{EventHandler, MembershipOutcome, ProgressReport};
pub use types::{BotCommand, ButtonPressed, CommandIssued, InboundEvent, MembershipChanged};
