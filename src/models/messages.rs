//! Outbound messages for the presentation surface.
//!
//! Every message is fully formed before dispatch; the rendering surface
//! never has to fill in defaults or guard against missing fields.

use serde::Serialize;

use super::feed::ContentItem;
use super::mood::{MoodState, error_intensity};

/// A mood-state change, including the visual intensity contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateMessage {
    /// The new mood state.
    pub state: MoodState,
    /// Optional accompanying message (tier message, success phrase).
    pub message: Option<String>,
    /// Workspace error count at the time of the transition.
    pub error_count: u32,
    /// Character scale factor derived from the error count.
    pub scale: f32,
    /// Color saturation factor derived from the error count.
    pub saturation: f32,
}

impl StateMessage {
    /// Builds a state message, deriving intensity from the state's count.
    #[must_use]
    pub fn new(state: MoodState, message: Option<String>) -> Self {
        let error_count = state.error_count();
        let intensity = error_intensity(error_count);
        Self {
            state,
            message,
            error_count,
            scale: intensity.scale,
            saturation: intensity.saturation,
        }
    }
}

/// A speech-bubble message shown next to the character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBubbleMessage {
    /// Bubble text.
    pub text: String,
    /// How long the bubble stays visible, in milliseconds.
    pub duration_ms: u64,
}

/// A served content item plus the session budget left.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItemMessage {
    /// The served item.
    pub item: ContentItem,
    /// Items the session will still serve before locking.
    pub items_remaining_this_session: u32,
}

/// Lock countdown notice, sent on lock and once per second until unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockStateMessage {
    /// Milliseconds until the lock expires.
    pub remaining_ms: u64,
}

impl LockStateMessage {
    /// Formats the remaining time as `m:ss` for display.
    #[must_use]
    pub fn formatted(&self) -> String {
        let total_seconds = self.remaining_ms.div_ceil(1000);
        format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_message_derives_intensity() {
        let msg = StateMessage::new(MoodState::Error { count: 3 }, None);
        assert_eq!(msg.error_count, 3);
        assert!((msg.scale - 1.5).abs() < f32::EPSILON);
        assert!((msg.saturation - 3.0).abs() < f32::EPSILON);

        let msg = StateMessage::new(MoodState::Idle, None);
        assert_eq!(msg.error_count, 0);
        assert!((msg.scale - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_lock_message_formatting() {
        assert_eq!(LockStateMessage { remaining_ms: 1_500_000 }.formatted(), "25:00");
        assert_eq!(LockStateMessage { remaining_ms: 61_000 }.formatted(), "1:01");
        assert_eq!(LockStateMessage { remaining_ms: 999 }.formatted(), "0:01");
        assert_eq!(LockStateMessage { remaining_ms: 0 }.formatted(), "0:00");
    }
}
