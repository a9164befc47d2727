//! Sending notifications that clean up after themselves.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use super::Notification;
use crate::scheduler::{DeletionScheduler, ScheduledDeletion};
use crate::telegram::TelegramError;
use crate::types::{ChatId, MessageHandle, QueryId};

/// Failure of an outbound call. Never retried.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("No known route to chat {0}")]
    UnknownChat(ChatId),

    #[error("Message {0} is not tracked")]
    UnknownMessage(MessageHandle),

    #[error(transparent)]
    Telegram(#[from] TelegramError),
}

/// Outbound side of the messaging layer.
pub trait Messenger: Send + Sync + 'static {
    /// Sends a message to a chat.
    fn send_message(
        &self,
        chat: ChatId,
        notification: &Notification,
    ) -> impl Future<Output = Result<MessageHandle, DeliveryError>> + Send;

    /// Answers a button press with a transient pop-up.
    fn answer_button_press(
        &self,
        query: QueryId,
        text: &str,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;

    /// Deletes a message.
    fn delete_message(
        &self,
        handle: MessageHandle,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;

    /// Drops any state kept for a message that will never be deleted.
    fn forget_message(&self, handle: MessageHandle);
}

/// Sends notifications and schedules their deletion.
pub struct EphemeralDispatcher<M, S> {
    messenger: Arc<M>,
    scheduler: S,
    lifetime: Duration,
}

impl<M: Messenger, S: DeletionScheduler> EphemeralDispatcher<M, S> {
    #[must_use]
    pub const fn new(messenger: Arc<M>, scheduler: S, lifetime: Duration) -> Self {
        Self {
            messenger,
            scheduler,
            lifetime,
        }
    }

    /// Sends a notification and schedules its deletion after the lifetime.
    ///
    /// Returns `None` if the send failed; nothing is scheduled then.
    pub async fn send(&self, chat: ChatId, notification: &Notification) -> Option<MessageHandle> {
        match self.messenger.send_message(chat, notification).await {
            Ok(handle) => {
                debug!("Sent {:?} notification as {}", notification.kind, handle);
                self.scheduler.schedule_deletion(handle, self.lifetime);
                Some(handle)
            }
            Err(e) => {
                warn!("Failed to send {:?} notification to {}: {}", notification.kind, chat, e);
                None
            }
        }
    }

    /// Schedules deletion of a message the bot did not send itself.
    pub fn retract_later(&self, handle: MessageHandle) -> ScheduledDeletion {
        self.scheduler.schedule_deletion(handle, self.lifetime)
    }

    /// Releases a message the bot will leave alone.
    pub fn release(&self, handle: MessageHandle) {
        self.messenger.forget_message(handle);
    }

    /// Answers a button press. Pop-ups vanish on their own and are not scheduled.
    ///
    /// An empty `text` only stops the client's loading indicator.
    pub async fn popup(&self, query: QueryId, text: &str) {
        if let Err(e) = self.messenger.answer_button_press(query, text).await {
            warn!("Failed to answer button press {:?}: {}", query, e);
        }
    }

    #[must_use]
    pub const fn lifetime(&self) -> Duration {
        self.lifetime
    }
}

impl<M, S> std::fmt::Debug for EphemeralDispatcher<M, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralDispatcher")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}
