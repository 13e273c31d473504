//! Mood state machine.
//!
//! Holds the single current presentational state and arbitrates which signal
//! wins when several arrive close together. The transition rules live in a
//! pure function; [`MoodController`] adds the message selection around it.

use tracing::debug;

use crate::models::{
    MoodSignal, MoodState, RevertReason, StateMessage, error_message_for_count,
    random_success_phrase,
};

/// Computes the next mood state for a signal.
///
/// Total over all `(state, signal)` pairs. Diagnostics-driven transitions
/// never interrupt an active transient state; every other signal applies
/// unconditionally, including late revert-timer expiries (matching the
/// product behavior of independent per-source timers).
#[must_use]
pub const fn transition(current: MoodState, signal: &MoodSignal) -> MoodState {
    match *signal {
        MoodSignal::DiagnosticsChanged { error_count } => {
            if current.is_transient() {
                current
            } else if error_count > 0 {
                MoodState::Error { count: error_count }
            } else {
                MoodState::Idle
            }
        }
        MoodSignal::CommitDetected => MoodState::Success,
        MoodSignal::LongFunctionDetected => MoodState::LengthyWarning,
        MoodSignal::TimerExpired(RevertReason::Success { error_count })
        | MoodSignal::FeedUnlocked { error_count } => {
            if error_count > 0 {
                MoodState::Error { count: error_count }
            } else {
                MoodState::Idle
            }
        }
        // Reverts to idle without re-checking the error count.
        MoodSignal::TimerExpired(RevertReason::LengthyWarning) => MoodState::Idle,
        MoodSignal::FeedLocked => MoodState::Locked,
    }
}

/// Owns the current mood and renders transitions into state messages.
#[derive(Debug)]
pub struct MoodController {
    current: MoodState,
}

impl MoodController {
    /// Creates a controller starting at `Idle`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: MoodState::Idle,
        }
    }

    /// The current mood state.
    #[must_use]
    pub const fn current(&self) -> MoodState {
        self.current
    }

    /// Applies a signal; returns the outbound message, or `None` when the
    /// signal was suppressed by an active transient state.
    pub fn apply(&mut self, signal: &MoodSignal) -> Option<StateMessage> {
        if matches!(signal, MoodSignal::DiagnosticsChanged { .. }) && self.current.is_transient() {
            debug!(
                current = self.current.as_str(),
                "diagnostics change suppressed by transient state"
            );
            return None;
        }

        let next = transition(self.current, signal);
        debug!(
            from = self.current.as_str(),
            to = next.as_str(),
            ?signal,
            "mood transition"
        );
        self.current = next;

        let message = match next {
            MoodState::Error { count } => Some(error_message_for_count(count).to_string()),
            MoodState::Success => Some(random_success_phrase().to_string()),
            _ => None,
        };
        Some(StateMessage::new(next, message))
    }

    /// Resets to `Idle` without emitting anything. Used at shutdown.
    pub const fn reset(&mut self) {
        self.current = MoodState::Idle;
    }
}

impl Default for MoodController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_diagnostics_win() {
        let mut controller = MoodController::new();
        controller.apply(&MoodSignal::DiagnosticsChanged { error_count: 3 });
        let msg = controller
            .apply(&MoodSignal::DiagnosticsChanged { error_count: 1 })
            .expect("not suppressed");
        assert_eq!(controller.current(), MoodState::Error { count: 1 });
        assert_eq!(msg.error_count, 1);

        controller.apply(&MoodSignal::DiagnosticsChanged { error_count: 0 });
        assert_eq!(controller.current(), MoodState::Idle);
    }

    #[test]
    fn test_transients_shrug_off_diagnostics() {
        for transient in [
            MoodSignal::CommitDetected,
            MoodSignal::LongFunctionDetected,
            MoodSignal::FeedLocked,
        ] {
            let mut controller = MoodController::new();
            controller.apply(&transient);
            let before = controller.current();
            assert!(before.is_transient());

            assert!(
                controller
                    .apply(&MoodSignal::DiagnosticsChanged { error_count: 7 })
                    .is_none()
            );
            assert_eq!(controller.current(), before);
        }
    }

    #[test]
    fn test_success_revert_rechecks_errors() {
        let mut controller = MoodController::new();
        controller.apply(&MoodSignal::CommitDetected);
        assert_eq!(controller.current(), MoodState::Success);

        let msg = controller
            .apply(&MoodSignal::TimerExpired(RevertReason::Success {
                error_count: 2,
            }))
            .expect("revert emits");
        assert_eq!(controller.current(), MoodState::Error { count: 2 });
        assert!(msg.message.is_some());
    }

    #[test]
    fn test_warning_revert_is_unconditional() {
        let mut controller = MoodController::new();
        controller.apply(&MoodSignal::LongFunctionDetected);
        assert_eq!(controller.current(), MoodState::LengthyWarning);

        // Reverts to idle even though the revert path never asks about
        // the workspace error count.
        controller.apply(&MoodSignal::TimerExpired(RevertReason::LengthyWarning));
        assert_eq!(controller.current(), MoodState::Idle);
    }

    #[test]
    fn test_success_message_is_a_phrase() {
        let mut controller = MoodController::new();
        let msg = controller
            .apply(&MoodSignal::CommitDetected)
            .expect("emitted");
        assert!(msg.message.is_some());
        assert_eq!(msg.state, MoodState::Success);
    }

    #[test]
    fn test_unlock_resolves_by_live_count() {
        let mut controller = MoodController::new();
        controller.apply(&MoodSignal::FeedLocked);
        assert_eq!(controller.current(), MoodState::Locked);

        controller.apply(&MoodSignal::FeedUnlocked { error_count: 0 });
        assert_eq!(controller.current(), MoodState::Idle);
    }

    #[test]
    fn test_error_message_follows_tier_table() {
        let mut controller = MoodController::new();
        let msg = controller
            .apply(&MoodSignal::DiagnosticsChanged { error_count: 5 })
            .expect("emitted");
        assert_eq!(msg.message.as_deref(), Some(error_message_for_count(5)));
    }
}
