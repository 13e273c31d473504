//! Content feed gate.
//!
//! Rate-limits an external content feed: items are served from a cached
//! batch until a per-session quota is reached, then the session locks for a
//! fixed duration. Unlocking happens through a background timer or a lazy
//! expiry check on the next request, whichever comes first; both paths are
//! idempotent and refresh the cached batch exactly once.
//!
//! The gate itself does no I/O. Fetches go through the [`FeedFetcher`]
//! trait so the engine can run them off the event loop and tests can skip
//! the network entirely.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::FeedConfig;
use crate::models::{ContentItem, FeedResponse};

/// Fetches a batch of content items from the external feed.
pub trait FeedFetcher: Send + Sync + 'static {
    /// Fetches up to `batch_size` items. A single attempt, no retries.
    fn fetch(
        &self,
        batch_size: usize,
    ) -> impl Future<Output = crate::Result<Vec<ContentItem>>> + Send;
}

/// [`FeedFetcher`] over HTTP, hitting the configured endpoint.
#[derive(Debug, Clone)]
pub struct HttpFeedFetcher {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpFeedFetcher {
    /// Creates a fetcher for the configured endpoint.
    #[must_use]
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            client: reqwest::Client::new(),
        }
    }
}

impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, batch_size: usize) -> crate::Result<Vec<ContentItem>> {
        let url = format!("{}/{batch_size}", self.endpoint);
        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "feed request failed");
            crate::Error::FeedUnavailable {
                cause: e.to_string(),
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(url = %url, status = %status, "feed returned error status");
            return Err(crate::Error::FeedUnavailable {
                cause: format!("status {status}"),
            });
        }

        // A body of the wrong shape is a fetch failure like any other.
        let body: FeedResponse =
            response
                .json()
                .await
                .map_err(|e| crate::Error::FeedUnavailable {
                    cause: e.to_string(),
                })?;
        Ok(body.memes.into_iter().map(ContentItem::from).collect())
    }
}

/// Outcome of a single item request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServeOutcome {
    /// The session is locked; no item, report the remaining duration.
    Locked {
        /// Time until the lock expires.
        remaining: Duration,
    },
    /// The cache is exhausted and no fetch is running; the caller should
    /// start one and retry when the batch arrives.
    NeedsFetch,
    /// The cache is exhausted but a fetch is already in flight.
    AwaitingFetch,
    /// An item was served.
    Served {
        /// The item.
        item: ContentItem,
        /// Serves left before the session locks (zero when `locked_for`).
        remaining_serves: u32,
        /// Set when this serve reached the quota and locked the session.
        locked_for: Option<Duration>,
    },
}

/// Result of [`FeedGate::request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestResult {
    /// Whether this request lazily unlocked an expired lock.
    pub unlocked: bool,
    /// What happened to the request itself.
    pub outcome: ServeOutcome,
}

/// Report from ingesting a fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// Servable items now cached.
    pub cached: usize,
    /// Whether the one-time fetch warning should be surfaced now.
    pub warn_now: bool,
}

/// Quota-and-lockout state machine over a cached item batch.
#[derive(Debug)]
pub struct FeedGate {
    quota: u32,
    lock_duration: Duration,
    cached_items: Vec<ContentItem>,
    cursor: usize,
    items_served_this_session: u32,
    lock_expiry: Option<Instant>,
    fetch_in_flight: bool,
    pending_requests: u32,
    warned: bool,
}

impl FeedGate {
    /// Creates a gate with the given quota and lock duration.
    #[must_use]
    pub const fn new(quota: u32, lock_duration: Duration) -> Self {
        Self {
            quota,
            lock_duration,
            cached_items: Vec::new(),
            cursor: 0,
            items_served_this_session: 0,
            lock_expiry: None,
            fetch_in_flight: false,
            pending_requests: 0,
            warned: false,
        }
    }

    /// Requests the next item.
    ///
    /// Performs the lazy lock-expiry check first; a request against an
    /// expired lock unlocks (idempotently with the background timer) before
    /// being considered.
    pub fn request(&mut self, now: Instant) -> RequestResult {
        let mut unlocked = false;
        if let Some(expiry) = self.lock_expiry {
            if now < expiry {
                return RequestResult {
                    unlocked: false,
                    outcome: ServeOutcome::Locked {
                        remaining: expiry - now,
                    },
                };
            }
            self.unlock();
            unlocked = true;
        }

        let outcome = if self.cursor >= self.cached_items.len() {
            if self.fetch_in_flight {
                ServeOutcome::AwaitingFetch
            } else {
                ServeOutcome::NeedsFetch
            }
        } else {
            self.serve(now)
        };

        RequestResult { unlocked, outcome }
    }

    /// Marks a fetch as started. The engine calls this exactly when it
    /// spawns the fetch task.
    pub const fn begin_fetch(&mut self) {
        self.fetch_in_flight = true;
    }

    /// Whether a fetch is currently outstanding.
    #[must_use]
    pub const fn fetch_in_flight(&self) -> bool {
        self.fetch_in_flight
    }

    /// Records a request that could not be served yet because the batch is
    /// still being fetched; it will be replayed on ingestion.
    pub const fn defer_request(&mut self) {
        self.pending_requests += 1;
    }

    /// Takes the requests deferred while a fetch was outstanding.
    pub const fn take_deferred(&mut self) -> u32 {
        let pending = self.pending_requests;
        self.pending_requests = 0;
        pending
    }

    /// Ingests a fetch result, filtering flagged items permanently.
    pub fn ingest(&mut self, result: crate::Result<Vec<ContentItem>>) -> IngestReport {
        self.fetch_in_flight = false;
        match result {
            Ok(items) => {
                self.cached_items = items.into_iter().filter(ContentItem::servable).collect();
                self.cursor = 0;
                debug!(cached = self.cached_items.len(), "feed batch cached");
                IngestReport {
                    cached: self.cached_items.len(),
                    warn_now: false,
                }
            }
            Err(e) => {
                warn!(error = %e, "feed fetch failed; session stays empty");
                // Deferred requests cannot be satisfied; drop them.
                self.pending_requests = 0;
                let warn_now = !self.warned;
                self.warned = true;
                IngestReport {
                    cached: 0,
                    warn_now,
                }
            }
        }
    }

    /// Handles the background unlock deadline. Idempotent with the lazy
    /// check in [`Self::request`]: returns `true` only for the call that
    /// actually performs the unlock transition.
    pub fn on_unlock_deadline(&mut self, now: Instant) -> bool {
        match self.lock_expiry {
            Some(expiry) if now >= expiry => {
                self.unlock();
                true
            }
            _ => false,
        }
    }

    /// Time remaining on the lock, if the session is locked.
    #[must_use]
    pub fn remaining_lock(&self, now: Instant) -> Option<Duration> {
        self.lock_expiry
            .map(|expiry| expiry.saturating_duration_since(now))
    }

    /// Whether the session is locked (by expiry bookkeeping alone; the
    /// lazy check in [`Self::request`] is authoritative).
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.lock_expiry.is_some()
    }

    /// Items served since the last lock cycle completed.
    #[must_use]
    pub const fn items_served(&self) -> u32 {
        self.items_served_this_session
    }

    /// Clears all session state. Used at shutdown.
    pub fn reset(&mut self) {
        self.cached_items.clear();
        self.cursor = 0;
        self.items_served_this_session = 0;
        self.lock_expiry = None;
        self.fetch_in_flight = false;
        self.pending_requests = 0;
    }

    fn serve(&mut self, now: Instant) -> ServeOutcome {
        let item = self.cached_items[self.cursor].clone();
        self.cursor += 1;
        self.items_served_this_session += 1;

        let remaining_serves = self.quota.saturating_sub(self.items_served_this_session);
        let locked_for = if self.items_served_this_session >= self.quota {
            self.lock_expiry = Some(now + self.lock_duration);
            self.items_served_this_session = 0;
            debug!(lock_secs = self.lock_duration.as_secs(), "quota reached, session locked");
            Some(self.lock_duration)
        } else {
            None
        };

        ServeOutcome::Served {
            item,
            remaining_serves,
            locked_for,
        }
    }

    fn unlock(&mut self) {
        self.lock_expiry = None;
        // Drop the stale batch so the refreshed one starts the new session.
        self.cached_items.clear();
        self.cursor = 0;
        debug!("feed session unlocked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, sensitive: bool, spoiler: bool) -> ContentItem {
        ContentItem {
            url: format!("https://example.com/{title}.png"),
            title: title.to_string(),
            source_label: "testsource".to_string(),
            score: 1,
            is_sensitive: sensitive,
            is_spoiler: spoiler,
        }
    }

    fn batch(count: usize) -> Vec<ContentItem> {
        (0..count).map(|i| item(&format!("item{i}"), false, false)).collect()
    }

    fn gate_with_batch(quota: u32, count: usize) -> FeedGate {
        let mut gate = FeedGate::new(quota, Duration::from_secs(1500));
        gate.ingest(Ok(batch(count)));
        gate
    }

    #[tokio::test(start_paused = true)]
    async fn test_flagged_items_never_served() {
        let mut gate = FeedGate::new(10, Duration::from_secs(1500));
        gate.ingest(Ok(vec![
            item("ok1", false, false),
            item("sensitive", true, false),
            item("spoiler", false, true),
            item("ok2", false, false),
        ]));

        let mut served = Vec::new();
        while let ServeOutcome::Served { item, .. } = gate.request(Instant::now()).outcome {
            served.push(item.title);
        }
        assert_eq!(served, vec!["ok1".to_string(), "ok2".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_served_outcome_compares_wholesale() {
        let mut gate = gate_with_batch(10, 2);
        let outcome = gate.request(Instant::now()).outcome;
        assert_eq!(
            outcome,
            ServeOutcome::Served {
                item: item("item0", false, false),
                remaining_serves: 9,
                locked_for: None,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_locks_eleventh_request() {
        let mut gate = gate_with_batch(10, 40);
        let now = Instant::now();

        for n in 0..10 {
            match gate.request(now).outcome {
                ServeOutcome::Served {
                    remaining_serves,
                    locked_for,
                    ..
                } => {
                    assert_eq!(remaining_serves, 10 - n - 1);
                    assert_eq!(locked_for.is_some(), n == 9);
                }
                other => panic!("request {n} unexpectedly returned {other:?}"),
            }
        }

        match gate.request(now).outcome {
            ServeOutcome::Locked { remaining } => {
                assert!(remaining > Duration::ZERO);
                assert_eq!(remaining, Duration::from_secs(1500));
            }
            other => panic!("expected lock, got {other:?}"),
        }
        // Served count was reset when the lock was taken.
        assert_eq!(gate.items_served(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lazy_unlock_after_expiry() {
        let mut gate = gate_with_batch(2, 10);
        let start = Instant::now();
        gate.request(start);
        gate.request(start);
        assert!(gate.is_locked());

        // Lock still holding just before expiry.
        let early = gate.request(start + Duration::from_secs(1499));
        assert!(!early.unlocked);
        assert!(matches!(early.outcome, ServeOutcome::Locked { .. }));

        // Past expiry: the request itself unlocks, cache is stale so the
        // caller is told to refresh.
        let late = gate.request(start + Duration::from_secs(1500));
        assert!(late.unlocked);
        assert_eq!(late.outcome, ServeOutcome::NeedsFetch);
        assert_eq!(gate.items_served(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlock_paths_are_idempotent() {
        let mut gate = gate_with_batch(1, 5);
        let start = Instant::now();
        gate.request(start);
        assert!(gate.is_locked());

        let deadline = start + Duration::from_secs(1500);
        assert!(gate.on_unlock_deadline(deadline));
        // Second path arrives late: no second transition.
        assert!(!gate.on_unlock_deadline(deadline));
        assert!(!gate.request(deadline).unlocked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_warns_once() {
        let mut gate = FeedGate::new(10, Duration::from_secs(1500));
        let first = gate.ingest(Err(crate::Error::FeedUnavailable {
            cause: "offline".to_string(),
        }));
        assert!(first.warn_now);

        let second = gate.ingest(Err(crate::Error::FeedUnavailable {
            cause: "still offline".to_string(),
        }));
        assert!(!second.warn_now);

        // Failure leaves the session empty; the next request asks for a
        // fresh attempt rather than giving up for good.
        assert_eq!(
            gate.request(Instant::now()).outcome,
            ServeOutcome::NeedsFetch
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_cache_defers_while_fetching() {
        let mut gate = FeedGate::new(10, Duration::from_secs(1500));
        assert_eq!(gate.request(Instant::now()).outcome, ServeOutcome::NeedsFetch);
        gate.begin_fetch();
        gate.defer_request();

        assert_eq!(
            gate.request(Instant::now()).outcome,
            ServeOutcome::AwaitingFetch
        );
        gate.defer_request();

        gate.ingest(Ok(batch(3)));
        assert_eq!(gate.take_deferred(), 2);
        assert!(matches!(
            gate.request(Instant::now()).outcome,
            ServeOutcome::Served { .. }
        ));
    }
}
