//! Keyed, cancellable timers.
//!
//! The whole system schedules its temporal behavior (debounce windows,
//! transient-state reverts, lock countdowns) through a [`TimerRegistry`]:
//! at most one live timer per key, re-arming cancels the predecessor, and
//! shutdown cancels everything at once.
//!
//! Fires are delivered through an mpsc channel rather than invoked inline,
//! so all state mutation stays on the single engine task. A fire that was
//! already in flight when its key was re-armed or cancelled is rejected by
//! [`TimerRegistry::accept`] via a per-arm generation counter.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A timer expiry notice, sent by the spawned timer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerFire<K> {
    /// The key the timer was armed under.
    pub key: K,
    /// Generation of the arming; stale fires fail [`TimerRegistry::accept`].
    pub generation: u64,
}

struct TimerEntry {
    generation: u64,
    repeating: bool,
    handle: JoinHandle<()>,
}

/// Registry of keyed one-shot and repeating timers.
///
/// Invariant: at most one live timer per key. Arming a key that already has
/// a live timer aborts the previous one; cancelling a timer that has already
/// fired is a no-op.
pub struct TimerRegistry<K> {
    entries: HashMap<K, TimerEntry>,
    next_generation: u64,
    tx: mpsc::UnboundedSender<TimerFire<K>>,
}

impl<K> TimerRegistry<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    /// Creates a registry that reports fires on `tx`.
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<TimerFire<K>>) -> Self {
        Self {
            entries: HashMap::new(),
            next_generation: 0,
            tx,
        }
    }

    /// Arms a one-shot timer, replacing any live timer under the same key.
    pub fn arm(&mut self, key: K, delay: Duration) {
        let generation = self.bump();
        let tx = self.tx.clone();
        let fire_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver may be gone during shutdown; nothing to do then.
            let _ = tx.send(TimerFire {
                key: fire_key,
                generation,
            });
        });
        self.install(key, generation, false, handle);
    }

    /// Arms a repeating timer firing every `period` until cancelled.
    pub fn arm_repeating(&mut self, key: K, period: Duration) {
        let generation = self.bump();
        let tx = self.tx.clone();
        let fire_key = key.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                if tx
                    .send(TimerFire {
                        key: fire_key.clone(),
                        generation,
                    })
                    .is_err()
                {
                    break;
                }
            }
        });
        self.install(key, generation, true, handle);
    }

    /// Cancels the timer under `key`. Returns whether one was live.
    pub fn cancel(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some_and(|entry| {
            entry.handle.abort();
            true
        })
    }

    /// Cancels every live timer.
    pub fn cancel_all(&mut self) {
        for (_, entry) in self.entries.drain() {
            entry.handle.abort();
        }
    }

    /// Validates an incoming fire against the current arming.
    ///
    /// Returns `true` exactly when the fire belongs to the timer currently
    /// installed under its key. One-shot entries are retired on acceptance;
    /// repeating entries stay installed. Stale fires (the key was re-armed
    /// or cancelled after the fire was sent) return `false` and must be
    /// dropped by the caller.
    pub fn accept(&mut self, fire: &TimerFire<K>) -> bool {
        match self.entries.get(&fire.key) {
            Some(entry) if entry.generation == fire.generation => {
                if !entry.repeating {
                    self.entries.remove(&fire.key);
                }
                true
            }
            _ => false,
        }
    }

    /// Number of live timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no timers are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn bump(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    fn install(&mut self, key: K, generation: u64, repeating: bool, handle: JoinHandle<()>) {
        if let Some(previous) = self.entries.insert(
            key,
            TimerEntry {
                generation,
                repeating,
                handle,
            },
        ) {
            previous.handle.abort();
        }
    }
}

impl<K> Drop for TimerRegistry<K> {
    fn drop(&mut self) {
        for entry in self.entries.values() {
            entry.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_fires_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut registry = TimerRegistry::new(tx);
        registry.arm("revert", Duration::from_millis(100));

        advance(Duration::from_millis(100)).await;
        let fire = rx.recv().await.expect("fire");
        assert!(registry.accept(&fire));
        assert!(registry.is_empty());

        // Cancelling after the fire is a no-op, not an error.
        assert!(!registry.cancel(&"revert"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_supersedes_previous() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut registry = TimerRegistry::new(tx);
        registry.arm("debounce", Duration::from_millis(100));
        advance(Duration::from_millis(50)).await;
        registry.arm("debounce", Duration::from_millis(100));

        // The original deadline passes with no accepted fire.
        advance(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());

        advance(Duration::from_millis(50)).await;
        let fire = rx.recv().await.expect("second arming fires");
        assert!(registry.accept(&fire));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_fire_rejected_after_rearm() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut registry = TimerRegistry::new(tx);
        registry.arm("k", Duration::from_millis(10));
        advance(Duration::from_millis(10)).await;
        let stale = rx.recv().await.expect("fire");

        // Re-arm before the fire is processed; the fire is now stale.
        registry.arm("k", Duration::from_millis(10));
        assert!(!registry.accept(&stale));

        advance(Duration::from_millis(10)).await;
        let fresh = rx.recv().await.expect("fresh fire");
        assert!(registry.accept(&fresh));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_independent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut registry = TimerRegistry::new(tx);
        registry.arm("a", Duration::from_millis(100));
        registry.arm("b", Duration::from_millis(200));
        registry.cancel(&"a");

        advance(Duration::from_millis(200)).await;
        let fire = rx.recv().await.expect("fire");
        assert_eq!(fire.key, "b");
        assert!(registry.accept(&fire));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeating_fires_until_cancelled() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut registry = TimerRegistry::new(tx);
        registry.arm_repeating("tick", Duration::from_secs(1));

        for _ in 0..3 {
            advance(Duration::from_secs(1)).await;
            let fire = rx.recv().await.expect("tick");
            assert!(registry.accept(&fire));
        }
        assert_eq!(registry.len(), 1);

        registry.cancel(&"tick");
        advance(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_silences_everything() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut registry = TimerRegistry::new(tx);
        registry.arm("a", Duration::from_millis(10));
        registry.arm("b", Duration::from_millis(20));
        registry.arm_repeating("c", Duration::from_millis(5));
        registry.cancel_all();
        assert!(registry.is_empty());

        advance(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }
}
