//! Diagnostics aggregation.
//!
//! Reduces the host's per-document error collections to one workspace-wide
//! count. The count is recomputed in full on every diagnostics event rather
//! than maintained incrementally: recomputation is cheap relative to event
//! frequency, and full recomputation cannot drift.

use tracing::debug;

use crate::host::{DiagnosticsProvider, DocumentId};

/// Aggregates diagnostics into a single workspace error count.
#[derive(Debug, Default)]
pub struct DiagnosticsAggregator {
    last_count: Option<u32>,
}

impl DiagnosticsAggregator {
    /// Creates an aggregator.
    #[must_use]
    pub const fn new() -> Self {
        Self { last_count: None }
    }

    /// Recomputes the workspace error count after a diagnostics event.
    ///
    /// `changed` is the batch of documents the host reported; it only feeds
    /// logging, the count itself always comes from the full diagnostic set.
    pub fn recompute<D: DiagnosticsProvider>(
        &mut self,
        provider: &D,
        changed: &[DocumentId],
    ) -> u32 {
        for document in changed {
            debug!(
                document = %document,
                errors = provider.error_count(document),
                "diagnostics changed"
            );
        }

        let count = provider.workspace_error_count();
        if self.last_count != Some(count) {
            debug!(
                previous = self.last_count,
                current = count,
                "workspace error count moved"
            );
        }
        self.last_count = Some(count);
        count
    }

    /// The most recently computed count, if any event has arrived yet.
    #[must_use]
    pub const fn last_count(&self) -> Option<u32> {
        self.last_count
    }
}
