//! Code-length sentinel.
//!
//! Debounced watcher over the active document that complains about
//! functions exceeding a line threshold. The debounce (quiet window after a
//! burst of edits) and the cooldown (minimum gap between complaints) are
//! independent: an edit storm triggers at most one scan, and back-to-back
//! scans produce at most one complaint per cooldown window.

mod scanner;

pub use scanner::{FunctionSpan, scan};

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::host::DocumentId;
use crate::models::ChatBubbleMessage;
use crate::models::complaint_for;

/// Debounce, cooldown, and complaint pipeline over the heuristic scanner.
#[derive(Debug)]
pub struct Sentinel {
    threshold: usize,
    cooldown: Duration,
    bubble_duration: Duration,
    last_complaint: Option<Instant>,
    active_document: Option<DocumentId>,
}

impl Sentinel {
    /// Creates a sentinel.
    ///
    /// `threshold` is the line count a function must strictly exceed to
    /// qualify; `cooldown` is the minimum gap between complaints;
    /// `bubble_duration` is how long each complaint stays on screen.
    #[must_use]
    pub const fn new(threshold: usize, cooldown: Duration, bubble_duration: Duration) -> Self {
        Self {
            threshold,
            cooldown,
            bubble_duration,
            last_complaint: None,
            active_document: None,
        }
    }

    /// Records the active document (possibly none).
    pub fn set_active_document(&mut self, document: Option<DocumentId>) {
        self.active_document = document;
    }

    /// The document the sentinel currently watches.
    #[must_use]
    pub const fn active_document(&self) -> Option<&DocumentId> {
        self.active_document.as_ref()
    }

    /// Whether a change to `document` should restart the debounce window.
    #[must_use]
    pub fn concerns(&self, document: &DocumentId) -> bool {
        self.active_document.as_ref() == Some(document)
    }

    /// Scans the given text and produces a complaint if warranted.
    ///
    /// Returns `None` when no function exceeds the threshold, or when the
    /// cooldown since the last complaint has not elapsed. A `Some` return
    /// means the caller should show the bubble and drive the mood machine
    /// with a long-function signal.
    pub fn inspect(&mut self, text: &str, now: Instant) -> Option<ChatBubbleMessage> {
        let spans = scan(text);
        let mut offenders: Vec<&FunctionSpan> = spans
            .iter()
            .filter(|span| span.lines > self.threshold)
            .collect();
        if offenders.is_empty() {
            return None;
        }

        if let Some(last) = self.last_complaint {
            if now.duration_since(last) < self.cooldown {
                debug!(offenders = offenders.len(), "complaint suppressed by cooldown");
                return None;
            }
        }
        self.last_complaint = Some(now);

        offenders.sort_by(|a, b| b.lines.cmp(&a.lines));
        let longest = offenders[0];
        debug!(
            name = %longest.name,
            lines = longest.lines,
            offenders = offenders.len(),
            "long function detected"
        );

        Some(ChatBubbleMessage {
            text: complaint_for(&longest.name, longest.lines, offenders.len()),
            duration_ms: u64::try_from(self.bubble_duration.as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// Forgets the complaint history. Used at shutdown.
    pub fn reset(&mut self) {
        self.last_complaint = None;
        self.active_document = None;
    }
}
