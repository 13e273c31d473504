//! Data models for moodmate.
//!
//! This module contains all the core data structures used throughout the system.

mod feed;
mod messages;
mod mood;
mod tiers;

pub use feed::{ContentItem, FeedItemWire, FeedResponse};
pub use messages::{ChatBubbleMessage, ContentItemMessage, LockStateMessage, StateMessage};
pub use mood::{ErrorIntensity, MoodSignal, MoodState, RevertReason, error_intensity};
pub use tiers::{
    ERROR_TIERS, ErrorTier, complaint_for, error_message_for_count, random_success_phrase,
};
