use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::connectivity::Connectivity;
use super::error::RemoteError;
use super::merge::merge;
use super::remote::RemoteStore;
use super::status::{SyncOutcome, SyncStatus};
use crate::events::StateEvent;
use crate::hydration::HydrationBridge;
use crate::models::{now_millis, AppState};
use crate::store::StateStore;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(2);
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// Timing knobs for the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// Quiet period before a debounced sync fires.
    pub debounce: Duration,
    /// Minimum time between the starts of two attempts.
    pub cooldown: Duration,
}

impl SyncSettings {
    pub fn from_millis(debounce_ms: u64, cooldown_ms: u64) -> Self {
        Self {
            debounce: Duration::from_millis(debounce_ms),
            cooldown: Duration::from_millis(cooldown_ms),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

/// Receives the intermediate statuses of a debounced sync.
pub type StatusCallback = Arc<dyn Fn(SyncStatus) + Send + Sync>;

/// Holds the in-flight slot for one attempt.
///
/// The slot stores the owning attempt's generation (0 when free). Dropping
/// the guard frees the slot only if it still belongs to this attempt, so an
/// attempt overtaken by a forced sync can't release the newer one's slot.
struct InFlightGuard<'a> {
    slot: &'a AtomicU64,
    generation: u64,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(slot: &'a AtomicU64, generations: &AtomicU64) -> Option<Self> {
        let generation = generations.fetch_add(1, Ordering::SeqCst) + 1;
        slot.compare_exchange(0, generation, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        Some(Self { slot, generation })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let _ = self.slot.compare_exchange(
            self.generation,
            0,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }
}

/// Reconciles the local AppState with the account's remote document.
///
/// One engine per session. Attempts are serialized by an in-flight flag and
/// spaced by a cooldown; nothing here retries on its own.
pub struct SyncEngine {
    bridge: Arc<HydrationBridge>,
    remote: Option<Arc<dyn RemoteStore>>,
    connectivity: Arc<dyn Connectivity>,
    settings: SyncSettings,
    in_flight: AtomicU64,
    generations: AtomicU64,
    last_sync_start: Mutex<Option<Instant>>,
    debounce_timer: Mutex<Option<JoinHandle<()>>>,
    status: Mutex<SyncStatus>,
}

impl SyncEngine {
    pub fn new(
        bridge: Arc<HydrationBridge>,
        remote: Option<Arc<dyn RemoteStore>>,
        connectivity: Arc<dyn Connectivity>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            bridge,
            remote,
            connectivity,
            settings,
            in_flight: AtomicU64::new(0),
            generations: AtomicU64::new(0),
            last_sync_start: Mutex::new(None),
            debounce_timer: Mutex::new(None),
            status: Mutex::new(SyncStatus::Idle),
        }
    }

    fn store(&self) -> &Arc<StateStore> {
        self.bridge.store()
    }

    pub fn settings(&self) -> SyncSettings {
        self.settings
    }

    /// The status of the most recent attempt.
    pub fn status(&self) -> SyncStatus {
        *self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_status(&self, status: SyncStatus) {
        *self.status.lock().unwrap_or_else(|e| e.into_inner()) = status;
    }

    fn report(&self, status: SyncStatus, on_status: Option<&StatusCallback>) {
        self.set_status(status);
        if let Some(callback) = on_status {
            callback(status);
        }
    }

    fn lock_last_start(&self) -> MutexGuard<'_, Option<Instant>> {
        self.last_sync_start.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.debounce_timer.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn cooling_down(&self) -> bool {
        self.lock_last_start()
            .is_some_and(|started| started.elapsed() < self.settings.cooldown)
    }

    /// Runs one sync attempt now.
    ///
    /// Never fails: every problem is reported through the returned status.
    pub async fn sync_state(&self, account_id: Option<&str>) -> SyncOutcome {
        let outcome = self.attempt(account_id).await;
        self.set_status(outcome.status);

        match outcome.status {
            SyncStatus::Error => tracing::warn!("Sync failed: {}", outcome.message),
            SyncStatus::Synced => tracing::info!("Sync finished: {}", outcome.message),
            status => tracing::debug!(%status, "{}", outcome.message),
        }
        outcome
    }

    async fn attempt(&self, account_id: Option<&str>) -> SyncOutcome {
        let Some(account_id) = account_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return SyncOutcome::new(SyncStatus::Idle, "No account signed in");
        };
        let Some(remote) = self.remote.as_deref() else {
            return SyncOutcome::new(SyncStatus::Offline, "Sync backend not configured");
        };
        if !self.connectivity.is_online() {
            return SyncOutcome::new(SyncStatus::Offline, "Device is offline");
        }

        let Some(_in_flight) = InFlightGuard::acquire(&self.in_flight, &self.generations) else {
            return SyncOutcome::new(SyncStatus::Pending, "Sync already in progress");
        };
        if self.cooling_down() {
            return SyncOutcome::new(SyncStatus::Pending, "Sync ran recently, try again shortly");
        }
        *self.lock_last_start() = Some(Instant::now());
        self.set_status(SyncStatus::Syncing);

        match self.reconcile(account_id, remote).await {
            Ok(outcome) => outcome,
            Err(e) => SyncOutcome::new(SyncStatus::Error, e.to_string()),
        }
    }

    async fn reconcile(
        &self,
        account_id: &str,
        remote: &dyn RemoteStore,
    ) -> Result<SyncOutcome, RemoteError> {
        let local = self.store().get();

        let fetched = remote.fetch(account_id).await?;
        if self.store().updated_at() != local.updated_at {
            return Ok(superseded());
        }

        let Some(remote_state) = fetched else {
            return self.first_sync(account_id, remote, &local).await;
        };

        if local.updated_at > remote_state.updated_at {
            remote.push(account_id, &local).await?;
            return Ok(SyncOutcome::new(SyncStatus::Synced, "Pushed local changes"));
        }
        if local.updated_at == remote_state.updated_at {
            return Ok(SyncOutcome::new(SyncStatus::Synced, "Already up to date"));
        }

        let result = merge(&remote_state, &local);
        let mut merged = result.state.clone();
        merged.normalize();
        let reshaped = merged != result.state;

        if result.restored_any() || reshaped {
            merged.updated_at = now_millis().max(remote_state.updated_at + 1);
            remote.push(account_id, &merged).await?;
        }
        if self.apply_locally(local.updated_at, merged).is_none() {
            return Ok(superseded());
        }

        let message = if !result.restored_any() {
            "Pulled remote changes".to_string()
        } else {
            let domains: Vec<&str> = result.restored.iter().map(|d| d.as_str()).collect();
            format!("Pulled remote changes, restored {}", domains.join(", "))
        };
        Ok(SyncOutcome::new(SyncStatus::Synced, message))
    }

    async fn first_sync(
        &self,
        account_id: &str,
        remote: &dyn RemoteStore,
        local: &AppState,
    ) -> Result<SyncOutcome, RemoteError> {
        if local.has_significant_data() {
            remote.push(account_id, local).await?;
            return Ok(SyncOutcome::new(
                SyncStatus::Synced,
                "Uploaded local data to new account",
            ));
        }

        let Some(seeded) = self.apply_locally(local.updated_at, seed_state(local)) else {
            return Ok(superseded());
        };
        remote.push(account_id, &seeded).await?;
        Ok(SyncOutcome::new(SyncStatus::Synced, "Created account state"))
    }

    /// Stores a state that came from the remote side.
    ///
    /// Skipped when local state moved past `expected_updated_at` during the
    /// round trip; that newer write has its own sync coming. The write is
    /// excluded from autosync so applying a pull never schedules another
    /// sync, and the legacy keys are refreshed to match.
    fn apply_locally(&self, expected_updated_at: i64, state: AppState) -> Option<AppState> {
        let _quiet = self.store().storage().flags().suppress_autosync();
        let stored = self.store().set_if_unchanged(expected_updated_at, state)?;
        self.bridge.mirror_to_legacy(&stored);
        Some(stored)
    }

    /// Schedules a sync after the debounce period.
    ///
    /// A call while a timer is pending replaces it. Once the timer fires the
    /// attempt runs to completion even if another call arrives. Must be called
    /// from within a tokio runtime; otherwise it only logs.
    pub fn debounced_sync(
        self: &Arc<Self>,
        account_id: Option<String>,
        on_status: Option<StatusCallback>,
    ) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!("Debounced sync requested outside a runtime, skipping");
                return;
            }
        };

        self.report(SyncStatus::Pending, on_status.as_ref());

        let engine = Arc::clone(self);
        let delay = self.settings.debounce;
        let timer = handle.spawn(async move {
            tokio::time::sleep(delay).await;
            // Detach so a later debounce call can't abort a running attempt.
            tokio::spawn(async move {
                engine.report(SyncStatus::Syncing, on_status.as_ref());
                let outcome = engine.sync_state(account_id.as_deref()).await;
                if let Some(callback) = &on_status {
                    callback(outcome.status);
                }
            });
        });

        if let Some(previous) = self.lock_timer().replace(timer) {
            previous.abort();
        }
    }

    /// Cancels any pending debounce, clears both guards and syncs now.
    pub async fn force_sync(&self, account_id: Option<&str>) -> SyncOutcome {
        if let Some(timer) = self.lock_timer().take() {
            timer.abort();
        }
        *self.lock_last_start() = None;
        self.in_flight.store(0, Ordering::SeqCst);

        self.sync_state(account_id).await
    }

    /// Triggers a debounced sync after every AppState persist.
    ///
    /// Persists made while applying a pulled state are excluded upstream, so
    /// a sync never schedules itself. Abort the returned handle to stop.
    pub fn spawn_autosync(self: &Arc<Self>, account_id: String) -> JoinHandle<()> {
        let mut events = self.store().subscribe();
        let engine = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(StateEvent::Persisted { .. }) => {
                        engine.debounced_sync(Some(account_id.clone()), None);
                    }
                    Ok(StateEvent::Changed { .. }) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Autosync listener lagged");
                        engine.debounced_sync(Some(account_id.clone()), None);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

fn superseded() -> SyncOutcome {
    SyncOutcome::new(SyncStatus::Pending, "Local state changed during sync")
}

/// A new-user state carrying over whatever setup the local copy has.
fn seed_state(local: &AppState) -> AppState {
    let mut fresh = StateStore::create_new_user_state();
    if local.plan.is_some() {
        fresh.plan = local.plan.clone();
    }
    if local.nutrition.diet_plan.is_some() {
        fresh.nutrition.diet_plan = local.nutrition.diet_plan.clone();
    }
    if !local.nutrition.targets.is_empty() {
        fresh.nutrition.targets = local.nutrition.targets;
    }
    if !local.nutrition.daily_logs.is_empty() {
        fresh.nutrition.daily_logs = local.nutrition.daily_logs.clone();
    }
    fresh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        NutritionTargets, PlannedExercise, Workout, WorkoutCompletion, WorkoutPlan,
    };
    use crate::storage::{LocalStorage, Storage};
    use crate::sync::{MemoryRemoteStore, NetworkStatus};
    use chrono::{NaiveDate, TimeZone, Utc};
    use serde_json::json;
    use tempfile::TempDir;

    const ACCOUNT: &str = "acct-1";

    struct Harness {
        engine: Arc<SyncEngine>,
        bridge: Arc<HydrationBridge>,
        remote: Arc<MemoryRemoteStore>,
        network: NetworkStatus,
        _temp: TempDir,
    }

    impl Harness {
        fn store(&self) -> &Arc<StateStore> {
            self.bridge.store()
        }
    }

    fn harness_with(remote: MemoryRemoteStore, settings: SyncSettings) -> Harness {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(Storage::new(LocalStorage::new(temp.path().to_path_buf())));
        let store = Arc::new(StateStore::open(storage));
        let bridge = Arc::new(HydrationBridge::new(store));
        let remote = Arc::new(remote);
        let network = NetworkStatus::online();
        let engine = Arc::new(SyncEngine::new(
            Arc::clone(&bridge),
            Some(remote.clone() as Arc<dyn RemoteStore>),
            Arc::new(network.clone()),
            settings,
        ));
        Harness {
            engine,
            bridge,
            remote,
            network,
            _temp: temp,
        }
    }

    fn no_cooldown() -> SyncSettings {
        SyncSettings {
            debounce: DEFAULT_DEBOUNCE,
            cooldown: Duration::ZERO,
        }
    }

    fn harness() -> Harness {
        harness_with(MemoryRemoteStore::new(), no_cooldown())
    }

    fn push_plan() -> WorkoutPlan {
        WorkoutPlan::new(vec![Workout::new("push", "Push Day")
            .with_exercises(vec![PlannedExercise::new("Bench Press")])])
    }

    /// Compares two states ignoring their timestamps.
    fn same_content(a: &AppState, b: &AppState) -> bool {
        let mut a = a.clone();
        let mut b = b.clone();
        a.updated_at = 0;
        b.updated_at = 0;
        a == b
    }

    #[tokio::test]
    async fn test_preconditions_short_circuit() {
        let h = harness();

        assert_eq!(h.engine.sync_state(None).await.status, SyncStatus::Idle);
        assert_eq!(h.engine.sync_state(Some("  ")).await.status, SyncStatus::Idle);

        h.network.set_online(false);
        let outcome = h.engine.sync_state(Some(ACCOUNT)).await;
        assert_eq!(outcome.status, SyncStatus::Offline);
        assert_eq!(h.remote.fetch_count(), 0);

        h.network.set_online(true);
        assert_eq!(
            h.engine.sync_state(Some(ACCOUNT)).await.status,
            SyncStatus::Synced
        );
    }

    #[tokio::test]
    async fn test_unconfigured_backend_is_offline() {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(Storage::new(LocalStorage::new(temp.path().to_path_buf())));
        let bridge = Arc::new(HydrationBridge::new(Arc::new(StateStore::open(storage))));
        let engine = SyncEngine::new(
            bridge,
            None,
            Arc::new(NetworkStatus::online()),
            SyncSettings::default(),
        );

        let outcome = engine.sync_state(Some(ACCOUNT)).await;
        assert_eq!(outcome.status, SyncStatus::Offline);
        assert_eq!(engine.status(), SyncStatus::Offline);
    }

    #[tokio::test]
    async fn test_first_sync_without_data_seeds_default_state() {
        let h = harness();

        let outcome = h.engine.sync_state(Some(ACCOUNT)).await;
        assert_eq!(outcome.status, SyncStatus::Synced);

        let remote = h.remote.document(ACCOUNT).unwrap();
        assert!(same_content(&remote, &StateStore::create_new_user_state()));
        assert_eq!(remote, h.store().get());
    }

    #[tokio::test]
    async fn test_first_sync_keeps_local_targets() {
        let h = harness();
        h.store().update(|s| {
            s.nutrition.targets = NutritionTargets::new(1600.0, 130.0, 150.0, 50.0);
        });

        h.engine.sync_state(Some(ACCOUNT)).await;

        let remote = h.remote.document(ACCOUNT).unwrap();
        assert_eq!(remote.nutrition.targets.kcal, 1600.0);
    }

    #[tokio::test]
    async fn test_first_sync_with_history_pushes_local_verbatim() {
        let h = harness();
        let local = h.store().update(|s| {
            s.workout_history.push(WorkoutCompletion::new(
                "push",
                Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap(),
            ));
            s.progression.xp = 40;
        });

        h.engine.sync_state(Some(ACCOUNT)).await;

        assert_eq!(h.remote.document(ACCOUNT), Some(local.clone()));
        assert_eq!(h.store().get(), local);
    }

    #[tokio::test]
    async fn test_local_newer_pushes() {
        let h = harness();
        let mut stale = AppState::new_user();
        stale.updated_at = 1;
        h.remote.insert(ACCOUNT, stale);

        let local = h.store().update(|s| s.progression.level = 4);
        let outcome = h.engine.sync_state(Some(ACCOUNT)).await;

        assert_eq!(outcome.status, SyncStatus::Synced);
        assert_eq!(h.remote.document(ACCOUNT), Some(local));
    }

    #[tokio::test]
    async fn test_remote_newer_replaces_local_and_mirrors_legacy_keys() {
        let h = harness();
        let mut newer = AppState::new_user();
        newer.progression.xp = 777;
        newer.updated_at = h.store().updated_at() + 1_000;
        h.remote.insert(ACCOUNT, newer.clone());
        let mut events = h.store().subscribe();

        h.engine.sync_state(Some(ACCOUNT)).await;

        assert_eq!(h.store().get(), newer);
        assert_eq!(h.remote.push_count(), 0);
        assert_eq!(h.bridge.read_legacy("profile").unwrap()["xp"], 777);
        assert_eq!(h.bridge.pending(), 0);

        let mut persisted = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, StateEvent::Persisted { .. }) {
                persisted += 1;
            }
        }
        assert_eq!(persisted, 0);
    }

    #[tokio::test]
    async fn test_offline_edit_survives_empty_remote_and_restores_plan() {
        let h = harness();

        // Offline: plan and a weigh-in, each persisted.
        h.network.set_online(false);
        h.store().update(|s| s.plan = Some(push_plan()));
        h.bridge.write_legacy(
            "weight_history",
            json!([{"date": "2024-03-01", "weight": 81.5}]),
        );
        h.bridge.flush();
        let local = h.store().get();
        assert_eq!(
            h.engine.sync_state(Some(ACCOUNT)).await.status,
            SyncStatus::Offline
        );

        // Meanwhile another device wrote an empty, newer document.
        let mut empty = AppState::default();
        empty.updated_at = local.updated_at + 5_000;
        h.remote.insert(ACCOUNT, empty.clone());

        h.network.set_online(true);
        let outcome = h.engine.sync_state(Some(ACCOUNT)).await;
        assert_eq!(outcome.status, SyncStatus::Synced);

        let remote = h.remote.document(ACCOUNT).unwrap();
        let stored = h.store().get();
        assert_eq!(remote, stored);
        assert!(remote.updated_at > empty.updated_at);
        assert_eq!(remote.plan, Some(push_plan()));
        assert_eq!(
            remote.bodyweight.latest().map(|e| (e.date, e.weight)),
            Some((NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 81.5))
        );
        assert_eq!(remote.nutrition.targets, NutritionTargets::standard());
    }

    #[tokio::test]
    async fn test_second_sync_is_a_no_op() {
        let h = harness();
        h.store().update(|s| s.plan = Some(push_plan()));
        let mut older = AppState::default();
        older.updated_at = 1;
        h.remote.insert(ACCOUNT, older);

        h.engine.sync_state(Some(ACCOUNT)).await;
        let local_after_first = h.store().get();
        let remote_after_first = h.remote.document(ACCOUNT);
        let pushes = h.remote.push_count();

        let outcome = h.engine.sync_state(Some(ACCOUNT)).await;
        assert_eq!(outcome.status, SyncStatus::Synced);
        assert_eq!(h.store().get(), local_after_first);
        assert_eq!(h.remote.document(ACCOUNT), remote_after_first);
        assert_eq!(h.remote.push_count(), pushes);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_sync_returns_pending_without_fetching() {
        let h = harness_with(
            MemoryRemoteStore::with_latency(Duration::from_secs(1)),
            no_cooldown(),
        );

        let engine = Arc::clone(&h.engine);
        let first = tokio::spawn(async move { engine.sync_state(Some(ACCOUNT)).await });
        tokio::task::yield_now().await;

        let second = h.engine.sync_state(Some(ACCOUNT)).await;
        assert_eq!(second.status, SyncStatus::Pending);
        assert_eq!(h.remote.fetch_count(), 1);

        assert_eq!(first.await.unwrap().status, SyncStatus::Synced);
        assert_eq!(h.remote.fetch_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_blocks_until_elapsed() {
        let h = harness_with(MemoryRemoteStore::new(), SyncSettings::default());

        assert_eq!(
            h.engine.sync_state(Some(ACCOUNT)).await.status,
            SyncStatus::Synced
        );
        assert_eq!(
            h.engine.sync_state(Some(ACCOUNT)).await.status,
            SyncStatus::Pending
        );
        assert_eq!(h.remote.fetch_count(), 1);

        tokio::time::advance(DEFAULT_COOLDOWN).await;
        assert_eq!(
            h.engine.sync_state(Some(ACCOUNT)).await.status,
            SyncStatus::Synced
        );
        assert_eq!(h.remote.fetch_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_sync_bypasses_cooldown() {
        let h = harness_with(MemoryRemoteStore::new(), SyncSettings::default());

        h.engine.sync_state(Some(ACCOUNT)).await;
        let outcome = h.engine.force_sync(Some(ACCOUNT)).await;

        assert_eq!(outcome.status, SyncStatus::Synced);
        assert_eq!(h.remote.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_remote_failure_reports_error_and_releases_guard() {
        let h = harness();
        h.remote.set_failing(true);

        let outcome = h.engine.sync_state(Some(ACCOUNT)).await;
        assert_eq!(outcome.status, SyncStatus::Error);
        assert!(outcome.message.contains("injected failure"));
        assert_eq!(h.engine.status(), SyncStatus::Error);

        h.remote.set_failing(false);
        assert_eq!(
            h.engine.sync_state(Some(ACCOUNT)).await.status,
            SyncStatus::Synced
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_coalesces_bursts() {
        let h = harness();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let callback: StatusCallback = Arc::new(move |status| {
            recorder.lock().unwrap().push(status);
        });

        for _ in 0..3 {
            h.engine
                .debounced_sync(Some(ACCOUNT.to_string()), Some(callback.clone()));
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        assert_eq!(h.remote.fetch_count(), 0);

        tokio::time::sleep(DEFAULT_DEBOUNCE).await;
        assert_eq!(h.remote.fetch_count(), 1);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                SyncStatus::Pending,
                SyncStatus::Pending,
                SyncStatus::Pending,
                SyncStatus::Syncing,
                SyncStatus::Synced,
            ]
        );
        assert_eq!(h.engine.status(), SyncStatus::Synced);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_sync_cancels_pending_debounce() {
        let h = harness();

        h.engine.debounced_sync(Some(ACCOUNT.to_string()), None);
        h.engine.force_sync(Some(ACCOUNT)).await;
        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;

        assert_eq!(h.remote.fetch_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_autosync_follows_persists_but_not_pulls() {
        let h = harness();
        let listener = h.engine.spawn_autosync(ACCOUNT.to_string());
        tokio::task::yield_now().await;

        let local = h.store().update(|s| {
            s.plan = Some(push_plan());
            s.progression.streak_days = 3;
        });
        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;
        assert_eq!(h.remote.fetch_count(), 1);
        assert_eq!(h.remote.document(ACCOUNT), Some(local.clone()));

        // A newer remote copy is pulled; applying it must not loop back.
        let mut newer = local.clone();
        newer.progression.streak_days = 9;
        newer.updated_at = local.updated_at + 1_000;
        h.remote.insert(ACCOUNT, newer.clone());
        h.engine.force_sync(Some(ACCOUNT)).await;
        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;

        assert_eq!(h.store().get(), newer);
        assert_eq!(h.remote.fetch_count(), 2);
        listener.abort();
    }

    #[tokio::test]
    async fn test_remote_plan_and_offline_weigh_in_both_survive() {
        let h = harness();

        h.network.set_online(false);
        h.bridge.write_legacy(
            "weight_history",
            json!([{"date": "2024-03-01", "weight": 81.5}]),
        );
        h.bridge.flush();
        let local = h.store().get();
        assert!(local.plan.is_none());

        // Another device set up a plan and saved later.
        let mut planned = AppState::new_user();
        planned.plan = Some(push_plan());
        planned.updated_at = local.updated_at + 5_000;
        h.remote.insert(ACCOUNT, planned.clone());

        h.network.set_online(true);
        let outcome = h.engine.sync_state(Some(ACCOUNT)).await;
        assert_eq!(outcome.status, SyncStatus::Synced);

        let pushed = h.remote.document(ACCOUNT).unwrap();
        assert_eq!(h.store().get(), pushed);
        assert!(pushed.updated_at > planned.updated_at);
        assert_eq!(pushed.plan, Some(push_plan()));
        assert_eq!(
            pushed.bodyweight.latest().map(|e| (e.date, e.weight)),
            Some((NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 81.5))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_during_fetch_is_not_overwritten() {
        let h = harness_with(
            MemoryRemoteStore::with_latency(Duration::from_secs(1)),
            no_cooldown(),
        );
        let local = h.store().get();
        let mut newer = AppState::new_user();
        newer.progression.level = 3;
        newer.updated_at = local.updated_at + 1_000;
        h.remote.insert(ACCOUNT, newer.clone());

        let engine = Arc::clone(&h.engine);
        let sync = tokio::spawn(async move { engine.sync_state(Some(ACCOUNT)).await });
        tokio::task::yield_now().await;
        assert_eq!(h.remote.fetch_count(), 1);

        h.store().update(|s| s.progression.xp = 4242);

        let outcome = sync.await.unwrap();
        assert_eq!(outcome.status, SyncStatus::Pending);
        assert_eq!(h.store().get().progression.xp, 4242);
        assert_eq!(h.remote.push_count(), 0);
        assert_eq!(h.remote.document(ACCOUNT), Some(newer));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overtaken_attempt_keeps_forced_attempt_in_flight() {
        let h = harness_with(
            MemoryRemoteStore::with_latency(Duration::from_secs(1)),
            no_cooldown(),
        );
        h.store().update(|s| s.plan = Some(push_plan()));

        // Fetch and push take a second each, so this runs until t=2s.
        let engine = Arc::clone(&h.engine);
        let first = tokio::spawn(async move { engine.sync_state(Some(ACCOUNT)).await });
        tokio::time::sleep(Duration::from_millis(500)).await;

        // Runs from t=0.5s to t=2.5s.
        let engine = Arc::clone(&h.engine);
        let forced = tokio::spawn(async move { engine.force_sync(Some(ACCOUNT)).await });
        tokio::time::sleep(Duration::from_millis(1_700)).await;

        assert!(first.is_finished());
        let third = h.engine.sync_state(Some(ACCOUNT)).await;
        assert_eq!(third.status, SyncStatus::Pending);
        assert_eq!(h.remote.fetch_count(), 2);

        assert_eq!(forced.await.unwrap().status, SyncStatus::Synced);
        assert_eq!(first.await.unwrap().status, SyncStatus::Synced);
    }
}
