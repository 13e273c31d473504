//! # Moodmate
//!
//! Mood-state aggregation engine for animated editor companions.
//!
//! Moodmate turns the noisy, asynchronous signals of a developer's workspace
//! (compile errors, commits, suspiciously long functions, a rate-limited
//! content feed) into one coherent presentational state for an on-screen
//! character rendered by the host editor.
//!
//! ## Features
//!
//! - Single-owner state machine with debounce, cooldown, and auto-expiry
//! - Per-repository commit detection with burst-safe revert timers
//! - Heuristic long-function sentinel behind a narrow `scan` interface
//! - Quota-and-lockout gate over an external content feed
//! - Host-agnostic: the editor integrates through a handful of traits
//!
//! ## Example
//!
//! ```rust,ignore
//! use moodmate::{CompanionEngine, HostEvent, MoodmateConfig};
//!
//! let handle = CompanionEngine::spawn(config, providers, sink, fetcher);
//! handle.send(HostEvent::CharacterClicked)?;
//! handle.shutdown().await;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod feed;
pub mod git;
pub mod host;
pub mod models;
pub mod mood;
pub mod observability;
pub mod sentinel;
pub mod timers;

// Re-exports for convenience
pub use config::{FeedConfig, MoodmateConfig, Timings};
pub use engine::{CompanionEngine, EngineHandle, HostProviders};
pub use feed::FeedFetcher;
pub use host::{
    DiagnosticsProvider, DocumentId, HostEvent, PresentationSink, RepositorySnapshot,
    WorkspaceTextProvider,
};
pub use models::{ContentItem, MoodSignal, MoodState, StateMessage};

/// Error type for moodmate operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed configuration values, empty tier tables |
/// | `OperationFailed` | Config file I/O fails, engine channel is closed |
/// | `FeedUnavailable` | Content feed fetch fails or returns a malformed body |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A configuration value is out of range (e.g., zero quota)
    /// - A tier table is empty or not monotonically increasing
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - The configuration file cannot be read or parsed
    /// - A host event is sent after the engine has shut down
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The content feed could not be reached or understood.
    ///
    /// Raised when:
    /// - The HTTP request to the feed endpoint fails
    /// - The endpoint returns a non-success status
    /// - The response body does not match the expected shape
    ///
    /// Never fatal: the feed session simply stays empty until the next
    /// request triggers another attempt.
    #[error("content feed unavailable: {cause}")]
    FeedUnavailable {
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for moodmate operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("test error".to_string());
        assert_eq!(err.to_string(), "invalid input: test error");

        let err = Error::OperationFailed {
            operation: "test".to_string(),
            cause: "failed".to_string(),
        };
        assert_eq!(err.to_string(), "operation 'test' failed: failed");

        let err = Error::FeedUnavailable {
            cause: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "content feed unavailable: connection refused"
        );
    }
}
