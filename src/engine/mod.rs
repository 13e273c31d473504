//! Companion engine.
//!
//! The single-instance context object the redesign calls for: constructed
//! once at startup, it owns every piece of mutable state (current mood,
//! repository head map, feed session, timers) and mutates it from exactly
//! one task. Host events, timer fires, and fetch completions all funnel
//! into that task through channels, so no locking discipline is needed,
//! only ordering.
//!
//! Host events are processed strictly in delivery order. An outstanding
//! feed fetch never blocks the loop; its completion interleaves like any
//! other event.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::MoodmateConfig;
use crate::diagnostics::DiagnosticsAggregator;
use crate::feed::{FeedFetcher, FeedGate, ServeOutcome};
use crate::git::RepositoryWatch;
use crate::host::{
    DiagnosticsProvider, HostEvent, PresentationSink, RepositorySnapshot, WorkspaceTextProvider,
};
use crate::models::{
    ContentItem, ContentItemMessage, LockStateMessage, MoodSignal, RevertReason, StateMessage,
};
use crate::mood::MoodController;
use crate::sentinel::Sentinel;
use crate::timers::{TimerFire, TimerRegistry};

/// Cadence of the lock countdown notice.
const LOCK_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Shown once per session when the feed cannot be reached.
const FEED_WARNING: &str = "Could not fetch the content feed. Check your internet connection.";

/// Timer identities. One live timer per key; commit reverts are keyed per
/// repository so one repository's burst never disturbs another's.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TimerKey {
    CommitRevert(String),
    WarningRevert,
    SentinelDebounce,
    FeedUnlock,
    FeedTick,
}

/// Everything the engine consumes, unified onto one mailbox.
enum EngineEvent {
    Host(HostEvent),
    FeedBatch(crate::Result<Vec<ContentItem>>),
    Shutdown,
}

/// The host-facing read providers, bundled for construction.
pub struct HostProviders<D, W> {
    /// Diagnostics access.
    pub diagnostics: D,
    /// Document text access.
    pub text: W,
}

/// Handle to a running engine.
///
/// Dropping the handle without calling [`EngineHandle::shutdown`] also
/// stops the engine (the mailbox closes), but shutdown additionally waits
/// for disposal to finish, guaranteeing no message reaches the sink
/// afterwards.
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<EngineEvent>,
    task: JoinHandle<()>,
}

impl EngineHandle {
    /// Delivers a host event to the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine has already shut down.
    pub fn send(&self, event: HostEvent) -> crate::Result<()> {
        self.tx
            .send(EngineEvent::Host(event))
            .map_err(|_| crate::Error::OperationFailed {
                operation: "send_host_event".to_string(),
                cause: "engine has shut down".to_string(),
            })
    }

    /// Shuts the engine down: cancels every outstanding timer across all
    /// components, clears per-repository and per-session state, and waits
    /// for the event loop to finish.
    pub async fn shutdown(self) {
        let _ = self.tx.send(EngineEvent::Shutdown);
        let _ = self.task.await;
    }
}

/// The state-and-notification aggregation core.
pub struct CompanionEngine<D, W, S, F> {
    config: MoodmateConfig,
    diagnostics_provider: D,
    text_provider: W,
    sink: S,
    fetcher: Arc<F>,
    mood: MoodController,
    aggregator: DiagnosticsAggregator,
    watch: RepositoryWatch,
    sentinel: Sentinel,
    gate: FeedGate,
    timers: TimerRegistry<TimerKey>,
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl<D, W, S, F> CompanionEngine<D, W, S, F>
where
    D: DiagnosticsProvider,
    W: WorkspaceTextProvider,
    S: PresentationSink,
    F: FeedFetcher,
{
    /// Spawns the engine task and returns its handle.
    ///
    /// Must be called within a tokio runtime. The engine prefetches the
    /// first content batch and, if an editor is already active, arms the
    /// sentinel's debounce window right away.
    pub fn spawn(
        config: MoodmateConfig,
        providers: HostProviders<D, W>,
        sink: S,
        fetcher: F,
    ) -> EngineHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();

        let engine = Self {
            sentinel: Sentinel::new(
                config.long_function_threshold,
                config.timings.complaint_cooldown,
                config.timings.bubble_duration,
            ),
            gate: FeedGate::new(config.feed.quota, config.feed.lock_duration),
            config,
            diagnostics_provider: providers.diagnostics,
            text_provider: providers.text,
            sink,
            fetcher: Arc::new(fetcher),
            mood: MoodController::new(),
            aggregator: DiagnosticsAggregator::new(),
            watch: RepositoryWatch::new(),
            timers: TimerRegistry::new(timer_tx),
            tx: tx.clone(),
        };

        let task = tokio::spawn(engine.run(rx, timer_rx));
        EngineHandle { tx, task }
    }

    async fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<EngineEvent>,
        mut timer_rx: mpsc::UnboundedReceiver<TimerFire<TimerKey>>,
    ) {
        info!("companion engine started");
        self.startup();

        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Some(EngineEvent::Host(host_event)) => self.on_host_event(host_event),
                    Some(EngineEvent::FeedBatch(result)) => self.on_feed_batch(result),
                    Some(EngineEvent::Shutdown) | None => break,
                },
                Some(fire) = timer_rx.recv() => self.on_timer(fire),
            }
        }

        self.dispose();
    }

    fn startup(&mut self) {
        let active = self.text_provider.active_document();
        if active.is_some() {
            self.timers
                .arm(TimerKey::SentinelDebounce, self.config.timings.sentinel_debounce);
        }
        self.sentinel.set_active_document(active);

        // Prefetch the first batch so the first click serves immediately.
        self.start_fetch();
    }

    fn on_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::DiagnosticsChanged { documents } => {
                let error_count = self
                    .aggregator
                    .recompute(&self.diagnostics_provider, &documents);
                self.drive_mood(&MoodSignal::DiagnosticsChanged { error_count });
            }
            HostEvent::DocumentChanged { document } => {
                if self.sentinel.concerns(&document) {
                    self.timers
                        .arm(TimerKey::SentinelDebounce, self.config.timings.sentinel_debounce);
                }
            }
            HostEvent::ActiveEditorChanged { document } => {
                if document.is_some() {
                    self.timers
                        .arm(TimerKey::SentinelDebounce, self.config.timings.sentinel_debounce);
                }
                self.sentinel.set_active_document(document);
            }
            HostEvent::RepositoryChanged { repository } => self.on_repository_changed(&repository),
            HostEvent::RepositoryOpened { repository } => self.watch.track(&repository),
            HostEvent::WorkspaceFoldersChanged { repositories } => {
                for id in self.watch.sync(&repositories) {
                    self.timers.cancel(&TimerKey::CommitRevert(id));
                }
            }
            HostEvent::CharacterClicked => self.on_character_clicked(),
        }
    }

    fn on_repository_changed(&mut self, repository: &RepositorySnapshot) {
        if !self.watch.observe(repository) {
            return;
        }
        self.drive_mood(&MoodSignal::CommitDetected);
        // A burst of commits keeps pushing the revert window out; the
        // revert fires once, after the last commit.
        self.timers.arm(
            TimerKey::CommitRevert(repository.id.clone()),
            self.config.timings.success_revert,
        );
    }

    fn on_character_clicked(&mut self) {
        let now = Instant::now();
        let result = self.gate.request(now);
        if result.unlocked {
            self.after_unlock();
        }
        match result.outcome {
            ServeOutcome::Locked { remaining } => {
                self.sink.lock_state(LockStateMessage {
                    remaining_ms: duration_ms(remaining),
                });
            }
            ServeOutcome::NeedsFetch => {
                self.start_fetch();
                self.gate.defer_request();
            }
            ServeOutcome::AwaitingFetch => self.gate.defer_request(),
            ServeOutcome::Served {
                item,
                remaining_serves,
                locked_for,
            } => self.deliver_item(item, remaining_serves, locked_for),
        }
    }

    fn on_feed_batch(&mut self, result: crate::Result<Vec<ContentItem>>) {
        let report = self.gate.ingest(result);
        if report.warn_now {
            self.sink.warn(FEED_WARNING);
        }

        // Replay clicks that arrived while the fetch was outstanding.
        let deferred = self.gate.take_deferred();
        for _ in 0..deferred {
            let now = Instant::now();
            let result = self.gate.request(now);
            if result.unlocked {
                self.after_unlock();
            }
            match result.outcome {
                ServeOutcome::Served {
                    item,
                    remaining_serves,
                    locked_for,
                } => self.deliver_item(item, remaining_serves, locked_for),
                ServeOutcome::Locked { remaining } => {
                    self.sink.lock_state(LockStateMessage {
                        remaining_ms: duration_ms(remaining),
                    });
                    break;
                }
                // One attempt per request; the remaining clicks lapse.
                ServeOutcome::NeedsFetch | ServeOutcome::AwaitingFetch => break,
            }
        }
    }

    fn deliver_item(
        &mut self,
        item: ContentItem,
        remaining_serves: u32,
        locked_for: Option<Duration>,
    ) {
        self.sink.content_item(ContentItemMessage {
            item,
            items_remaining_this_session: remaining_serves,
        });

        if let Some(lock_duration) = locked_for {
            debug!(lock_secs = lock_duration.as_secs(), "feed quota reached");
            self.drive_mood(&MoodSignal::FeedLocked);
            self.sink.lock_state(LockStateMessage {
                remaining_ms: duration_ms(lock_duration),
            });
            self.timers.arm(TimerKey::FeedUnlock, lock_duration);
            self.timers.arm_repeating(TimerKey::FeedTick, LOCK_TICK_PERIOD);
        }
    }

    fn on_timer(&mut self, fire: TimerFire<TimerKey>) {
        if !self.timers.accept(&fire) {
            // Superseded or cancelled while the fire was in flight.
            return;
        }

        match fire.key {
            TimerKey::CommitRevert(_) => {
                let error_count = self.diagnostics_provider.workspace_error_count();
                self.drive_mood(&MoodSignal::TimerExpired(RevertReason::Success {
                    error_count,
                }));
            }
            TimerKey::WarningRevert => {
                self.drive_mood(&MoodSignal::TimerExpired(RevertReason::LengthyWarning));
            }
            TimerKey::SentinelDebounce => self.run_sentinel_scan(),
            TimerKey::FeedUnlock => {
                if self.gate.on_unlock_deadline(Instant::now()) {
                    self.after_unlock();
                }
            }
            TimerKey::FeedTick => self.on_lock_tick(),
        }
    }

    fn on_lock_tick(&mut self) {
        let now = Instant::now();
        match self.gate.remaining_lock(now) {
            Some(remaining) if remaining > Duration::ZERO => {
                self.sink.lock_state(LockStateMessage {
                    remaining_ms: duration_ms(remaining),
                });
            }
            Some(_) => {
                // The countdown outran the unlock timer; unlock here.
                if self.gate.on_unlock_deadline(now) {
                    self.after_unlock();
                }
            }
            None => {
                self.timers.cancel(&TimerKey::FeedTick);
            }
        }
    }

    fn after_unlock(&mut self) {
        self.timers.cancel(&TimerKey::FeedUnlock);
        self.timers.cancel(&TimerKey::FeedTick);
        self.sink.unlocked();
        let error_count = self.diagnostics_provider.workspace_error_count();
        self.drive_mood(&MoodSignal::FeedUnlocked { error_count });
        // Eager refresh so the next session starts with fresh content.
        self.start_fetch();
    }

    fn run_sentinel_scan(&mut self) {
        let Some(document) = self.sentinel.active_document().cloned() else {
            return;
        };
        let Some(text) = self.text_provider.document_text(&document) else {
            debug!(document = %document, "active document has no text, skipping scan");
            return;
        };

        if let Some(bubble) = self.sentinel.inspect(&text, Instant::now()) {
            self.sink.chat_bubble(bubble);
            self.drive_mood(&MoodSignal::LongFunctionDetected);
            self.timers
                .arm(TimerKey::WarningRevert, self.config.timings.warning_revert);
        }
    }

    fn start_fetch(&mut self) {
        if self.gate.fetch_in_flight() {
            return;
        }
        self.gate.begin_fetch();

        let fetcher = Arc::clone(&self.fetcher);
        let batch_size = self.config.feed.batch_size;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = fetcher.fetch(batch_size).await;
            if tx.send(EngineEvent::FeedBatch(result)).is_err() {
                warn!("feed batch arrived after engine shutdown, discarding");
            }
        });
    }

    fn drive_mood(&mut self, signal: &MoodSignal) {
        if let Some(message) = self.mood.apply(signal) {
            self.emit_state(message);
        }
    }

    fn emit_state(&self, message: StateMessage) {
        self.sink.state_changed(message);
    }

    fn dispose(&mut self) {
        self.timers.cancel_all();
        self.watch.clear();
        self.gate.reset();
        self.sentinel.reset();
        self.mood.reset();
        info!("companion engine disposed");
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis() as u64
}
