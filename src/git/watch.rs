//! Per-repository HEAD tracking and commit detection.

use std::collections::HashMap;

use tracing::debug;

use crate::host::RepositorySnapshot;

/// Tracks the last known HEAD commit per repository identity.
///
/// A commit is detected only when a previously recorded identifier exists
/// and the newly observed one is present and different. First observation of
/// a repository therefore never detects a commit; this prevents a false
/// celebration on startup and repository discovery.
#[derive(Debug, Default)]
pub struct RepositoryWatch {
    heads: HashMap<String, Option<String>>,
}

impl RepositoryWatch {
    /// Creates an empty watch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a repository, recording its current HEAD.
    ///
    /// Never detects a commit, even if the repository was tracked before
    /// with a different HEAD (re-opening resets the baseline, as the host
    /// delivers a fresh handle).
    pub fn track(&mut self, repository: &RepositorySnapshot) {
        debug!(repository = %repository.id, head = ?repository.head_commit, "tracking repository");
        self.heads
            .insert(repository.id.clone(), repository.head_commit.clone());
    }

    /// Processes a repository state change; returns whether a new commit
    /// was detected.
    ///
    /// The recorded identifier is unconditionally overwritten with the
    /// latest observed value, including transitions to and from absent.
    pub fn observe(&mut self, repository: &RepositorySnapshot) -> bool {
        let previous = self
            .heads
            .insert(repository.id.clone(), repository.head_commit.clone());

        let detected = match (previous, &repository.head_commit) {
            (Some(Some(old)), Some(new)) => old != *new,
            // Untracked repository, or either side absent.
            _ => false,
        };
        if detected {
            debug!(
                repository = %repository.id,
                head = ?repository.head_commit,
                "commit detected"
            );
        }
        detected
    }

    /// Reconciles against the full current repository set.
    ///
    /// Starts tracking repositories not seen before and forgets ones that
    /// disappeared. Returns the identities that were purged so their
    /// pending timers can be cancelled.
    pub fn sync(&mut self, current: &[RepositorySnapshot]) -> Vec<String> {
        let purged: Vec<String> = self
            .heads
            .keys()
            .filter(|id| !current.iter().any(|repo| repo.id == **id))
            .cloned()
            .collect();
        for id in &purged {
            debug!(repository = %id, "repository gone, purging");
            self.heads.remove(id);
        }

        for repository in current {
            if !self.heads.contains_key(&repository.id) {
                self.track(repository);
            }
        }
        purged
    }

    /// Whether a repository is currently tracked.
    #[must_use]
    pub fn is_tracked(&self, id: &str) -> bool {
        self.heads.contains_key(id)
    }

    /// Number of tracked repositories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heads.len()
    }

    /// Whether no repositories are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    /// Forgets all repositories.
    pub fn clear(&mut self) {
        self.heads.clear();
    }
}
