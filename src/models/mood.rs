//! Mood state and signal types.

use serde::Serialize;

/// The single presentational state driving the rendered character.
///
/// Exactly one variant is current at any time. `Success`, `LengthyWarning`,
/// and `Locked` are transient: a bounded lifetime enforced by a revert timer
/// or, for `Locked`, the feed unlock path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MoodState {
    /// Nothing noteworthy is happening.
    Idle,
    /// The workspace has error-severity diagnostics.
    Error {
        /// Workspace-wide error count.
        count: u32,
    },
    /// A fresh commit was just detected.
    Success,
    /// A function exceeding the length threshold was found.
    LengthyWarning,
    /// The content feed session is locked out.
    Locked,
}

impl MoodState {
    /// Returns the state name as used in outbound messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Error { .. } => "error",
            Self::Success => "success",
            Self::LengthyWarning => "lengthyWarning",
            Self::Locked => "locked",
        }
    }

    /// Whether this state has a bounded lifetime.
    ///
    /// Transient states are never interrupted by diagnostics-driven
    /// transitions; they end only via their own timer or the unlock path.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Success | Self::LengthyWarning | Self::Locked)
    }

    /// The workspace error count carried by this state, if any.
    #[must_use]
    pub const fn error_count(&self) -> u32 {
        match self {
            Self::Error { count } => *count,
            _ => 0,
        }
    }
}

/// Why a transient-state revert timer was armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertReason {
    /// The 5 s celebratory window after a commit elapsed. Resolves to
    /// `Error` if the workspace still has errors, otherwise `Idle`.
    Success {
        /// Workspace error count sampled at expiry time.
        error_count: u32,
    },
    /// The 3 s long-function warning window elapsed. Resolves to `Idle`
    /// unconditionally, without re-checking the error count. The asymmetry
    /// with `Success` matches observed product behavior.
    LengthyWarning,
}

/// An incoming signal the mood state machine arbitrates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoodSignal {
    /// The workspace-wide error count was recomputed.
    DiagnosticsChanged {
        /// New workspace error count.
        error_count: u32,
    },
    /// A repository's HEAD moved to a new commit.
    CommitDetected,
    /// The sentinel found a function over the length threshold.
    LongFunctionDetected,
    /// A transient-state revert timer fired.
    TimerExpired(RevertReason),
    /// The content feed session just locked.
    FeedLocked,
    /// The content feed session just unlocked.
    FeedUnlocked {
        /// Workspace error count sampled at unlock time.
        error_count: u32,
    },
}

/// Visual intensity factors for the error state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorIntensity {
    /// Character scale factor in `[1.0, 2.0]`.
    pub scale: f32,
    /// Color saturation factor in `[1.0, 5.0]`.
    pub saturation: f32,
}

/// Derives the visual intensity for an error count.
///
/// Linear in the count, saturating at five errors:
/// `t = (min(n, 5) - 1) / 4`, `scale = 1 + t`, `saturation = 1 + 4t`.
/// Counts of zero or one both map to the baseline `(1.0, 1.0)`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn error_intensity(count: u32) -> ErrorIntensity {
    let t = count.min(5).saturating_sub(1) as f32 / 4.0;
    ErrorIntensity {
        scale: 1.0 + t,
        saturation: 1.0 + 4.0 * t,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_states() {
        assert!(!MoodState::Idle.is_transient());
        assert!(!MoodState::Error { count: 3 }.is_transient());
        assert!(MoodState::Success.is_transient());
        assert!(MoodState::LengthyWarning.is_transient());
        assert!(MoodState::Locked.is_transient());
    }

    #[test]
    fn test_intensity_endpoints_and_saturation() {
        assert!((error_intensity(1).scale - 1.0).abs() < f32::EPSILON);
        assert!((error_intensity(1).saturation - 1.0).abs() < f32::EPSILON);
        assert!((error_intensity(5).scale - 2.0).abs() < f32::EPSILON);
        assert!((error_intensity(5).saturation - 5.0).abs() < f32::EPSILON);
        // Clamped above five.
        assert!((error_intensity(10).scale - 2.0).abs() < f32::EPSILON);
        assert!((error_intensity(10).saturation - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_intensity_monotone() {
        let mut previous = 0.0_f32;
        for count in 1..=10 {
            let scale = error_intensity(count).scale;
            assert!(scale >= previous, "scale regressed at count {count}");
            previous = scale;
        }
    }

    #[test]
    fn test_state_serializes_with_kind_tag() {
        let json = serde_json::to_value(MoodState::Error { count: 2 }).expect("serialize");
        assert_eq!(json["kind"], "error");
        assert_eq!(json["count"], 2);

        let json = serde_json::to_value(MoodState::LengthyWarning).expect("serialize");
        assert_eq!(json["kind"], "lengthyWarning");
    }
}
