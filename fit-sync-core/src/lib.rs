//! Fit Sync Core Library
//!
//! Local-first state for the fitness client: the canonical AppState store,
//! the legacy key hydration bridge and the sync engine.

pub mod events;
pub mod hydration;
pub mod models;
pub mod session;
pub mod storage;
pub mod store;
pub mod sync;

pub use events::StateEvent;
pub use hydration::{HydrationBridge, HydrationError, HydrationReport, LegacyRecord};
pub use models::{
    now_millis, AppState, Bodyweight, DailyLog, DietPlan, FoodEntry, Nutrition,
    NutritionTargets, Progression, Quest, Workout, WorkoutCompletion, WorkoutPlan,
};
pub use session::LocalSession;
pub use storage::{LegacyKey, LocalStorage, Storage, StorageError, APP_STATE_KEY};
pub use store::StateStore;
pub use sync::{
    check_server, merge, Connectivity, HttpRemoteStore, MemoryRemoteStore, NetworkStatus,
    RemoteError, RemoteStore, SyncEngine, SyncOutcome, SyncSettings, SyncStatus,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
