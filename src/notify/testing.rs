//! Recording fakes for the outbound side.

use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{DeliveryError, Messenger, Notification};
use crate::scheduler::{DeletionScheduler, PendingDeletion, ScheduledDeletion};
use crate::types::{ChatId, MessageHandle, MessageId, QueryId};

/// Messenger that records every call and hands out increasing message ids.
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    next_id: AtomicI32,
    sent: Mutex<Vec<(MessageHandle, Notification)>>,
    popups: Mutex<Vec<(QueryId, String)>>,
    deleted: Mutex<Vec<MessageHandle>>,
    forgotten: Mutex<Vec<MessageHandle>>,
    delete_attempts: AtomicUsize,
    fail_sends: bool,
    fail_deletes: bool,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_sends() -> Self {
        Self {
            fail_sends: true,
            ..Self::default()
        }
    }

    pub fn failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(MessageHandle, Notification)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn popups(&self) -> Vec<(QueryId, String)> {
        self.popups.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<MessageHandle> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn forgotten(&self) -> Vec<MessageHandle> {
        self.forgotten.lock().unwrap().clone()
    }

    pub fn delete_attempts(&self) -> usize {
        self.delete_attempts.load(Ordering::SeqCst)
    }
}

impl Messenger for RecordingMessenger {
    async fn send_message(
        &self,
        chat: ChatId,
        notification: &Notification,
    ) -> Result<MessageHandle, DeliveryError> {
        if self.fail_sends {
            return Err(DeliveryError::UnknownChat(chat));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1000;
        let handle = MessageHandle::new(chat, MessageId(id));
        self.sent.lock().unwrap().push((handle, notification.clone()));
        Ok(handle)
    }

    async fn answer_button_press(&self, query: QueryId, text: &str) -> Result<(), DeliveryError> {
        self.popups.lock().unwrap().push((query, text.to_owned()));
        Ok(())
    }

    async fn delete_message(&self, handle: MessageHandle) -> Result<(), DeliveryError> {
        self.delete_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes {
            return Err(DeliveryError::UnknownMessage(handle));
        }
        self.deleted.lock().unwrap().push(handle);
        Ok(())
    }

    fn forget_message(&self, handle: MessageHandle) {
        self.forgotten.lock().unwrap().push(handle);
    }
}

/// Scheduler that only records what it was asked to delete.
#[derive(Debug, Clone, Default)]
pub struct RecordingScheduler {
    scheduled: Arc<Mutex<Vec<(MessageHandle, Duration)>>>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduled(&self) -> Vec<(MessageHandle, Duration)> {
        self.scheduled.lock().unwrap().clone()
    }
}

impl DeletionScheduler for RecordingScheduler {
    fn schedule_deletion(&self, handle: MessageHandle, delay: Duration) -> ScheduledDeletion {
        self.scheduled.lock().unwrap().push((handle, delay));
        ScheduledDeletion::detached(PendingDeletion::after(handle, delay))
    }
}
