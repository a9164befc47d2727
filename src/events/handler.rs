//! Event handler implementation.
//!
//! Routes each inbound event to its handler:
//! - membership changes update the counter of the user who added people
//! - `/count` and the progress button report progress without touching state
//! - `/add` explains how to earn a reward

use std::num::NonZeroU64;
use std::sync::Arc;

use tracing::{debug, info};

use super::types::{BotCommand, ButtonPressed, CommandIssued, InboundEvent, MembershipChanged};
use crate::config::{CHECK_COUNT_PAYLOAD, ReferralSettings};
use crate::notify::{EphemeralDispatcher, Messenger, Notification, NotificationKind, Templates};
use crate::referral::{CounterStore, ProgressSnapshot, evaluate};
use crate::scheduler::DeletionScheduler;
use crate::types::{ChatId, Participant, UserId};

/// Read-only answer to a progress query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressReport {
    /// The user has not added anyone.
    NoMembersYet,

    /// The total sits on a cycle boundary, so the claim path is offered.
    ///
    /// This also holds long after the boundary was reached; there is no
    /// record of a reward having been claimed.
    RewardReady { total: u64 },

    /// Part way through a cycle.
    InProgress(ProgressSnapshot),
}

/// What a membership event did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipOutcome {
    /// The actor joined on their own and was welcomed.
    pub self_joined: bool,

    /// Members counted for the actor.
    pub invited: u64,

    /// Actor's total after counting, if anything was counted.
    pub total: Option<u64>,

    /// Notification sent about the actor's progress.
    pub notified: Option<NotificationKind>,
}

/// Handles inbound events for the authorized group.
pub struct EventHandler<M, S> {
    allowed_group: ChatId,
    threshold: NonZeroU64,
    store: Arc<CounterStore>,
    templates: Templates,
    dispatcher: EphemeralDispatcher<M, S>,
}

impl<M: Messenger, S: DeletionScheduler> EventHandler<M, S> {
    /// Creates a new event handler.
    #[must_use]
    pub fn new(
        settings: &ReferralSettings,
        store: Arc<CounterStore>,
        dispatcher: EphemeralDispatcher<M, S>,
    ) -> Self {
        Self {
            allowed_group: settings.allowed_group_id,
            threshold: settings.members_per_reward,
            store,
            templates: Templates::new(settings),
            dispatcher,
        }
    }

    /// Dispatches one event to its handler.
    pub async fn handle(&self, event: InboundEvent) {
        match event {
            InboundEvent::MembershipChanged(event) => {
                self.on_membership(event).await;
            }
            InboundEvent::Command(event) => self.on_command(event).await,
            InboundEvent::ButtonPressed(event) => self.on_button(event).await,
        }
    }

    /// Counts invited members and notifies the actor.
    ///
    /// Events from other chats and events without an actor or without
    /// joined members are ignored.
    pub async fn on_membership(&self, event: MembershipChanged) -> MembershipOutcome {
        let mut outcome = MembershipOutcome::default();

        if event.chat != self.allowed_group {
            debug!("Ignoring membership change in chat {}", event.chat);
            return outcome;
        }
        let Some(actor) = event.actor else {
            debug!("Ignoring membership change without an actor");
            return outcome;
        };
        if event.joined.is_empty() {
            return outcome;
        }

        let mut total = None;
        for joined in &event.joined {
            if *joined == actor.id {
                outcome.self_joined = true;
            } else {
                total = Some(self.store.increment(actor.id));
                outcome.invited += 1;
            }
        }

        if outcome.self_joined {
            info!("User {} joined the group", actor.id);
            let welcome = self.templates.welcome(actor.mention_name());
            self.dispatcher.send(event.chat, &welcome).await;
        }

        let Some(total) = total else {
            return outcome;
        };
        outcome.total = Some(total);

        let snapshot = evaluate(total, self.threshold);
        info!(
            "User {} added {} member(s), total {} ({}/{} in cycle)",
            actor.id,
            outcome.invited,
            total,
            snapshot.cycle_progress,
            self.threshold
        );

        let notification = if snapshot.just_completed_cycle {
            info!("User {} completed a reward cycle", actor.id);
            self.templates.reward_ready(actor.mention_name())
        } else {
            self.templates.progress(actor.mention_name(), snapshot)
        };
        outcome.notified = Some(notification.kind);
        self.dispatcher.send(event.chat, &notification).await;

        outcome
    }

    /// Handles `/count` and `/add` in the authorized group.
    pub async fn on_command(&self, event: CommandIssued) {
        if event.chat != self.allowed_group {
            debug!("Ignoring {} in chat {}", event.command, event.chat);
            self.dispatcher.release(event.message);
            return;
        }

        debug!("Handling {} from {}", event.command, event.issuer.id);
        self.dispatcher.retract_later(event.message);

        let notification = match event.command {
            BotCommand::Count => self.progress_notification(&event.issuer),
            BotCommand::Add => self.templates.add_members(event.issuer.mention_name()),
        };
        self.dispatcher.send(event.chat, &notification).await;
    }

    /// Answers the progress button with a pop-up.
    ///
    /// Unknown payloads get an empty answer so the button stops loading.
    pub async fn on_button(&self, event: ButtonPressed) {
        if event.payload != CHECK_COUNT_PAYLOAD {
            debug!("Ignoring unknown button payload {:?}", event.payload);
            self.dispatcher.popup(event.query, "").await;
            return;
        }

        let text = match self.progress_report(event.presser.id) {
            ProgressReport::NoMembersYet => self.templates.popup_no_members_yet(),
            ProgressReport::RewardReady { .. } => self.templates.popup_reward_ready(),
            ProgressReport::InProgress(snapshot) => self.templates.popup_progress(snapshot),
        };
        self.dispatcher.popup(event.query, &text).await;
    }

    /// Computes a user's progress without modifying anything.
    #[must_use]
    pub fn progress_report(&self, user: UserId) -> ProgressReport {
        let total = self.store.get(user);
        if total == 0 {
            return ProgressReport::NoMembersYet;
        }

        let snapshot = evaluate(total, self.threshold);
        if snapshot.cycle_progress == 0 {
            ProgressReport::RewardReady { total }
        } else {
            ProgressReport::InProgress(snapshot)
        }
    }

    fn progress_notification(&self, user: &Participant) -> Notification {
        let name = user.mention_name();
        match self.progress_report(user.id) {
            ProgressReport::NoMembersYet => self.templates.no_members_yet(name),
            ProgressReport::RewardReady { .. } => self.templates.reward_ready(name),
            ProgressReport::InProgress(snapshot) => self.templates.progress(name, snapshot),
        }
    }

    /// Gets a reference to the counter store.
    #[must_use]
    pub fn store(&self) -> &CounterStore {
        &self.store
    }
}

impl<M, S> std::fmt::Debug for EventHandler<M, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHandler")
            .field("allowed_group", &self.allowed_group)
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}
