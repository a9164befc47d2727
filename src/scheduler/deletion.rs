//! Deferred message deletion.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::notify::Messenger;
use crate::types::MessageHandle;

/// A deletion that has been handed to a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDeletion {
    pub handle: MessageHandle,
    pub delay: Duration,
    /// Wall-clock time the deletion is due.
    pub fire_at: DateTime<Utc>,
}

impl PendingDeletion {
    /// Creates a deletion due `delay` from now.
    #[must_use]
    pub fn after(handle: MessageHandle, delay: Duration) -> Self {
        let fire_at = chrono::Duration::from_std(delay)
            .ok()
            .and_then(|d| Utc::now().checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            handle,
            delay,
            fire_at,
        }
    }
}

/// Handle to a scheduled deletion.
///
/// Dropping it does not cancel the deletion.
#[derive(Debug)]
pub struct ScheduledDeletion {
    pending: PendingDeletion,
    task: Option<AbortHandle>,
}

impl ScheduledDeletion {
    /// Wraps a deletion that has no task to abort.
    #[must_use]
    pub const fn detached(pending: PendingDeletion) -> Self {
        Self {
            pending,
            task: None,
        }
    }

    #[must_use]
    pub const fn pending(&self) -> &PendingDeletion {
        &self.pending
    }

    /// Cancels the deletion if it has not fired yet.
    pub fn cancel(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    /// Returns whether the timer task has finished or was cancelled.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(AbortHandle::is_finished)
    }
}

/// Accepts messages to be deleted after a delay.
pub trait DeletionScheduler: Send + Sync {
    fn schedule_deletion(&self, handle: MessageHandle, delay: Duration) -> ScheduledDeletion;
}

/// Schedules deletions as tokio timer tasks.
///
/// Must be used from within a tokio runtime.
pub struct TimerService<M> {
    messenger: Arc<M>,
}

impl<M> TimerService<M> {
    #[must_use]
    pub const fn new(messenger: Arc<M>) -> Self {
        Self { messenger }
    }
}

impl<M: Messenger> DeletionScheduler for TimerService<M> {
    fn schedule_deletion(&self, handle: MessageHandle, delay: Duration) -> ScheduledDeletion {
        let pending = PendingDeletion::after(handle, delay);
        let messenger = Arc::clone(&self.messenger);

        debug!("Deletion of {} scheduled for {}", handle, pending.fire_at);

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match messenger.delete_message(handle).await {
                Ok(()) => debug!("Deleted message {}", handle),
                Err(e) => warn!("Failed to delete message {}: {}", handle, e),
            }
        });

        ScheduledDeletion {
            pending,
            task: Some(task.abort_handle()),
        }
    }
}

impl<M> std::fmt::Debug for TimerService<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerService").finish_non_exhaustive()
    }
}
