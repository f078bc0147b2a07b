use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Local, NaiveDate};
use serde_json::Value;

use super::record::LegacyRecord;
use crate::models::{now_millis, AppState};
use crate::storage::{LegacyKey, WriteKind, APP_STATE_KEY};
use crate::store::StateStore;

/// Outcome of one hydration batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HydrationReport {
    /// Known-key records whose patch function ran.
    pub applied: usize,
    /// Writes to keys the bridge doesn't know.
    pub ignored: usize,
    /// Writes whose value couldn't be decoded.
    pub failed: usize,
    /// True if AppState was persisted as a result.
    pub changed: bool,
}

/// Pending legacy writes, latest value per key, in first-enqueue order.
#[derive(Debug, Default)]
struct HydrationQueue {
    pending: Vec<(String, Value)>,
}

impl HydrationQueue {
    fn push(&mut self, key: &str, value: Value) {
        match self.pending.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.pending.push((key.to_string(), value)),
        }
    }
}

/// Clears the running flag when a batch ends, however it ends.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Folds legacy key writes into the canonical AppState.
///
/// Writes made in the same scheduling turn are coalesced into one batch that
/// runs on a spawned task. A batch persists AppState at most once, and only
/// if a patch actually changed something.
#[derive(Debug)]
pub struct HydrationBridge {
    store: Arc<StateStore>,
    queue: Mutex<HydrationQueue>,
    scheduled: AtomicBool,
    running: AtomicBool,
}

impl HydrationBridge {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self {
            store,
            queue: Mutex::new(HydrationQueue::default()),
            scheduled: AtomicBool::new(false),
            running: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    fn lock_queue(&self) -> MutexGuard<'_, HydrationQueue> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of keys waiting for the next batch.
    pub fn pending(&self) -> usize {
        self.lock_queue().pending.len()
    }

    /// Reads a legacy key, logging and hiding storage errors.
    pub fn read_legacy(&self, key: &str) -> Option<Value> {
        match self.store.storage().get_item(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read legacy key '{}': {}", key, e);
                None
            }
        }
    }

    /// Persists a legacy key and queues it for hydration.
    ///
    /// Never fails: a storage error is logged and the value is still
    /// hydrated into the in-memory state. The canonical key is refused; it
    /// is only ever written through the store.
    pub fn write_legacy(self: &Arc<Self>, key: &str, value: Value) {
        if key == APP_STATE_KEY {
            tracing::warn!("Refusing legacy write to canonical key '{}'", key);
            return;
        }

        let storage = self.store.storage();
        let kind = match storage.set_item(key, &value) {
            Ok(kind) => kind,
            Err(e) => {
                tracing::warn!("Failed to persist legacy key '{}': {}", key, e);
                storage.classify(key)
            }
        };

        if kind == (WriteKind::Legacy { hydrate: true }) {
            self.lock_queue().push(key, value);
            self.schedule();
        }
    }

    /// Schedules one deferred batch unless one is already pending.
    ///
    /// Outside a tokio runtime there is nothing to defer to, so the batch
    /// runs inline.
    fn schedule(self: &Arc<Self>) {
        if self.scheduled.swap(true, Ordering::SeqCst) {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let bridge = Arc::clone(self);
                handle.spawn(async move { bridge.run_scheduled() });
            }
            Err(_) => Arc::clone(self).run_scheduled(),
        }
    }

    fn run_scheduled(self: Arc<Self>) {
        self.scheduled.store(false, Ordering::SeqCst);
        let report = self.flush();
        if report != HydrationReport::default() {
            tracing::debug!(
                applied = report.applied,
                ignored = report.ignored,
                failed = report.failed,
                changed = report.changed,
                "Hydration batch finished"
            );
        }

        if self.pending() > 0 && !self.running.load(Ordering::SeqCst) {
            self.schedule();
        }
    }

    /// Drains the queue and applies every pending write now.
    ///
    /// A flush started while another is running returns an empty report;
    /// the queued writes are picked up by the next batch.
    pub fn flush(&self) -> HydrationReport {
        let mut report = HydrationReport::default();

        if self.running.swap(true, Ordering::SeqCst) {
            return report;
        }
        let _running = RunningGuard(&self.running);

        let batch = std::mem::take(&mut self.lock_queue().pending);
        if batch.is_empty() {
            return report;
        }

        // Patched under the store lock so a concurrent update can't be lost.
        let now = now_millis();
        let stored = self.store.try_update(|state| {
            for (key, value) in batch {
                match LegacyRecord::parse(&key, value) {
                    Ok(Some(record)) => {
                        report.applied += 1;
                        if record.apply(state, now) {
                            report.changed = true;
                        }
                    }
                    Ok(None) => {
                        report.ignored += 1;
                        tracing::debug!("Ignoring write to unknown legacy key '{}'", key);
                    }
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!("Skipping legacy write: {}", e);
                    }
                }
            }
            report.changed
        });
        debug_assert_eq!(stored.is_some(), report.changed);

        report
    }

    /// Writes `state` down into every legacy key without hydrating it back.
    pub fn mirror_to_legacy(&self, state: &AppState) {
        self.mirror_to_legacy_for(state, Local::now().date_naive());
    }

    fn mirror_to_legacy_for(&self, state: &AppState, today: NaiveDate) {
        let storage = self.store.storage();
        let _scope = storage.flags().suppress_hydration();

        for key in LegacyKey::ALL {
            let record = LegacyRecord::from_state(key, state, today);
            if let Err(e) = storage.set_item(key.as_str(), &record.to_value()) {
                tracing::warn!("Failed to mirror legacy key '{}': {}", key, e);
            }
        }
    }
}
