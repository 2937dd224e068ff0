//! Deferred action scheduling
//!
//! At most one future transition is outstanding at a time: either an
//! auto-advance to the next speaker or the expiry of a time-boxed turn.
//! Nothing here runs on its own. The scheduler polls [`DeferredActions::take_due`]
//! from `tick()`, which the daemon drives under the same lock as every other
//! command, so a fired action is serialized like any caller's command.

use speakq_util::{MonotonicInstant, ParticipantId};
use std::time::Duration;
use tracing::debug;

/// A transition scheduled for later
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredAction {
    /// Start whoever is next in line, if nobody is speaking by then
    AutoAdvance,
    /// End this participant's turn, if they are still the current speaker
    TimeBoxExpiry { speaker: ParticipantId },
}

impl DeferredAction {
    pub fn is_auto_advance(&self) -> bool {
        matches!(self, DeferredAction::AutoAdvance)
    }
}

/// The outstanding action with its timing
#[derive(Debug, Clone)]
pub struct PendingAction {
    pub action: DeferredAction,
    pub scheduled_at: MonotonicInstant,
    pub delay: Duration,
}

impl PendingAction {
    /// `None` when the delay runs past what the clock can represent
    pub fn due_at(&self) -> Option<MonotonicInstant> {
        self.scheduled_at.checked_add(self.delay)
    }

    /// An action whose deadline cannot be represented never becomes due
    pub fn is_due(&self, now: MonotonicInstant) -> bool {
        self.due_at().is_some_and(|due| now >= due)
    }

    pub fn remaining(&self, now: MonotonicInstant) -> Duration {
        self.delay
            .saturating_sub(now.duration_since(self.scheduled_at))
    }
}

/// Holder for zero or one scheduled action
#[derive(Debug, Default)]
pub struct DeferredActions {
    pending: Option<PendingAction>,
}

impl DeferredActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` to fire `delay` after `now`, replacing anything pending
    pub fn schedule(&mut self, delay: Duration, action: DeferredAction, now: MonotonicInstant) {
        if let Some(replaced) = self.pending.take() {
            debug!(action = ?replaced.action, "Replacing pending deferred action");
        }

        debug!(action = ?action, delay_ms = delay.as_millis() as u64, "Deferred action scheduled");

        self.pending = Some(PendingAction {
            action,
            scheduled_at: now,
            delay,
        });
    }

    /// Drop whatever is pending. Safe to call when nothing is.
    pub fn cancel(&mut self) -> Option<PendingAction> {
        let cancelled = self.pending.take();
        if let Some(p) = &cancelled {
            debug!(action = ?p.action, "Deferred action cancelled");
        }
        cancelled
    }

    /// Drop the pending action only if it matches
    pub fn cancel_if(&mut self, predicate: impl FnOnce(&DeferredAction) -> bool) -> Option<PendingAction> {
        match &self.pending {
            Some(p) if predicate(&p.action) => self.cancel(),
            _ => None,
        }
    }

    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending action becomes due
    pub fn next_due(&self) -> Option<MonotonicInstant> {
        self.pending.as_ref().and_then(PendingAction::due_at)
    }

    /// Whole seconds until the pending action fires, rounded up; 0 if none
    pub fn remaining_seconds(&self, now: MonotonicInstant) -> u64 {
        match &self.pending {
            Some(p) => {
                let remaining = p.remaining(now);
                remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
            }
            None => 0,
        }
    }

    /// Remove and return the pending action if it is due
    pub fn take_due(&mut self, now: MonotonicInstant) -> Option<DeferredAction> {
        if self.pending.as_ref().is_some_and(|p| p.is_due(now)) {
            self.pending.take().map(|p| p.action)
        } else {
            None
        }
    }
}
