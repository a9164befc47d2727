//! Reward cycle arithmetic.

use std::num::NonZeroU64;

use serde::Serialize;

/// Progress of a user within the current reward cycle.
///
/// Derived from the raw count every time, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    /// Members added since the last completed cycle.
    pub cycle_progress: u64,

    /// Members still needed for the next reward.
    pub remaining: u64,

    /// The total sits exactly on a completed cycle.
    pub just_completed_cycle: bool,
}

/// Evaluates a raw count against the reward threshold.
///
/// A total of zero has not completed a cycle. The function cannot tell a
/// fresh crossing from a later re-read of the same total; callers that care
/// must only react right after an increment.
#[must_use]
pub const fn evaluate(total: u64, threshold: NonZeroU64) -> ProgressSnapshot {
    let threshold = threshold.get();
    let cycle_progress = total % threshold;
    ProgressSnapshot {
        cycle_progress,
        remaining: threshold - cycle_progress,
        just_completed_cycle: cycle_progress == 0 && total > 0,
    }
}
