//! Outbound notifications.
//!
//! Builds message contents and sends them through a [`Messenger`]. Every
//! message sent through the [`EphemeralDispatcher`] is deleted again after
//! the configured lifetime.

mod dispatcher;
mod messages;
#[cfg(test)]
pub(crate) mod testing;

pub use dispatcher::{DeliveryError, EphemeralDispatcher, Messenger};
pub use messages::{Control, Notification, NotificationKind, Templates};
