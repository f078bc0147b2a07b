//! Canonical state store.
//!
//! Owns the single AppState for the user. Readers get a cloned snapshot;
//! writers hand back a full replacement, so nobody ever observes a partially
//! written state.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;

use crate::events::StateEvent;
use crate::models::{now_millis, AppState};
use crate::storage::{Storage, APP_STATE_KEY};

#[derive(Debug)]
pub struct StateStore {
    storage: Arc<Storage>,
    state: Mutex<AppState>,
}

impl StateStore {
    /// Opens the store, loading the persisted AppState.
    ///
    /// A missing or unreadable record is replaced by the new-user default,
    /// which is persisted immediately.
    pub fn open(storage: Arc<Storage>) -> Self {
        let loaded = match storage.get_item(APP_STATE_KEY) {
            Ok(Some(value)) => match serde_json::from_value::<AppState>(value) {
                Ok(state) => Some(state),
                Err(e) => {
                    tracing::warn!("Discarding unreadable app state: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to load app state: {}", e);
                None
            }
        };

        let fresh = loaded.is_none();
        let mut state = loaded.unwrap_or_else(Self::create_new_user_state);
        state.normalize();

        let store = Self {
            storage,
            state: Mutex::new(state),
        };

        if fresh {
            tracing::debug!("No app state on disk, created new user state");
            let initial = store.get();
            store.set(initial);
        }

        store
    }

    /// The default state for a user with no history.
    pub fn create_new_user_state() -> AppState {
        AppState::new_user()
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.storage.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a snapshot of the current state.
    pub fn get(&self) -> AppState {
        self.lock().clone()
    }

    pub fn updated_at(&self) -> i64 {
        self.lock().updated_at
    }

    /// Replaces the state and persists it.
    ///
    /// If the caller did not advance `updated_at` past the current value it
    /// is stamped with `max(now, current + 1)`. Returns the stored state.
    pub fn set(&self, next: AppState) -> AppState {
        let mut current = self.lock();
        self.commit(&mut current, next)
    }

    /// Applies `f` to a copy of the current state and stores the result.
    pub fn update<F>(&self, f: F) -> AppState
    where
        F: FnOnce(&mut AppState),
    {
        let mut current = self.lock();
        let mut next = current.clone();
        f(&mut next);
        self.commit(&mut current, next)
    }

    /// Like [`update`](Self::update), but `f` reports whether it changed
    /// anything. Nothing is stored or announced when it returns false.
    pub fn try_update<F>(&self, f: F) -> Option<AppState>
    where
        F: FnOnce(&mut AppState) -> bool,
    {
        let mut current = self.lock();
        let mut next = current.clone();
        if !f(&mut next) {
            return None;
        }
        Some(self.commit(&mut current, next))
    }

    /// Stores `next` only if the state is still at `expected_updated_at`.
    ///
    /// Returns `None` when another write landed in between.
    pub fn set_if_unchanged(&self, expected_updated_at: i64, next: AppState) -> Option<AppState> {
        let mut current = self.lock();
        if current.updated_at != expected_updated_at {
            return None;
        }
        Some(self.commit(&mut current, next))
    }

    fn commit(&self, current: &mut AppState, mut next: AppState) -> AppState {
        if next.updated_at <= current.updated_at {
            next.updated_at = now_millis().max(current.updated_at + 1);
        }
        *current = next.clone();

        self.persist(&next);
        self.storage.emit(StateEvent::Changed {
            updated_at: next.updated_at,
        });

        next
    }

    fn persist(&self, state: &AppState) {
        let _scope = self.storage.flags().writing_app_state();
        if let Err(e) = self.storage.set_item(APP_STATE_KEY, &state.to_value()) {
            tracing::warn!("Failed to persist app state: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NutritionTargets, Workout, WorkoutPlan};
    use crate::storage::LocalStorage;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> StateStore {
        let storage = Arc::new(Storage::new(LocalStorage::new(dir.path().to_path_buf())));
        StateStore::open(storage)
    }

    #[test]
    fn test_open_creates_and_persists_new_user_state() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let state = store.get();
        assert_eq!(state.nutrition.targets, NutritionTargets::standard());
        assert!(state.updated_at > 0);
        assert!(store.storage().local().exists(APP_STATE_KEY));
    }

    #[test]
    fn test_set_is_visible_after_reopen() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let mut state = store.get();
        state.plan = Some(WorkoutPlan::new(vec![Workout::new("a", "Push")]));
        let stored = store.set(state);

        let reopened = open_store(&temp);
        assert_eq!(reopened.get(), stored);
    }

    #[test]
    fn test_updated_at_strictly_increases() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let mut last = store.updated_at();
        for _ in 0..5 {
            let stored = store.set(store.get());
            assert!(stored.updated_at > last);
            last = stored.updated_at;
        }
    }

    #[test]
    fn test_caller_stamp_is_kept_when_newer() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let mut state = store.get();
        state.updated_at = store.updated_at() + 10_000;
        let expected = state.updated_at;

        assert_eq!(store.set(state).updated_at, expected);
    }

    #[test]
    fn test_update_applies_closure() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let before = store.updated_at();

        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let stored = store.update(|s| s.bodyweight.upsert(day, 80.0, 1));

        assert_eq!(stored.bodyweight.entries.len(), 1);
        assert!(stored.updated_at > before);
        assert_eq!(store.get(), stored);
    }

    #[test]
    fn test_try_update_skips_unchanged() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let before = store.get();
        let mut rx = store.subscribe();

        assert!(store.try_update(|_| false).is_none());
        assert_eq!(store.get(), before);
        assert!(rx.try_recv().is_err());

        let stored = store.try_update(|s| {
            s.progression.xp = 7;
            true
        });
        assert_eq!(stored.unwrap().progression.xp, 7);
        assert!(store.updated_at() > before.updated_at);
    }

    #[test]
    fn test_set_if_unchanged_refuses_after_intervening_write() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let seen = store.updated_at();

        store.update(|s| s.progression.xp = 10);

        let mut stale = store.get();
        stale.progression.xp = 0;
        assert!(store.set_if_unchanged(seen, stale.clone()).is_none());
        assert_eq!(store.get().progression.xp, 10);

        let current = store.updated_at();
        let stored = store.set_if_unchanged(current, stale).unwrap();
        assert_eq!(stored.progression.xp, 0);
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(open_store(&temp));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        store.update(|s| s.progression.xp += 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get().progression.xp, 100);
    }

    #[test]
    fn test_set_raises_both_notifications() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let mut rx = store.subscribe();

        let stored = store.set(store.get());

        assert_eq!(
            rx.try_recv().unwrap(),
            StateEvent::Persisted {
                key: APP_STATE_KEY.to_string()
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            StateEvent::Changed {
                updated_at: stored.updated_at
            }
        );
    }

    #[test]
    fn test_corrupt_record_falls_back_to_default() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("app_state.json"), b"[1, 2").unwrap();

        let store = open_store(&temp);
        assert_eq!(
            store.get().nutrition.targets,
            NutritionTargets::standard()
        );
    }

    #[test]
    fn test_persistence_failure_keeps_in_memory_state() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let storage = Arc::new(Storage::new(LocalStorage::new(blocker)));

        let store = StateStore::open(storage);
        let stored = store.update(|s| s.progression.xp = 42);

        assert_eq!(store.get().progression.xp, 42);
        assert_eq!(store.get(), stored);
    }
}
