//! Timer service for retracting ephemeral messages.
//!
//! Deletions are fire-and-forget timer tasks. Each one is returned as a
//! [`ScheduledDeletion`] that can still be cancelled before it fires.

mod deletion;

pub use deletion::{DeletionScheduler, PendingDeletion, ScheduledDeletion, TimerService};
