//! One running app's worth of sync state.

use std::path::PathBuf;
use std::sync::Arc;

use crate::hydration::HydrationBridge;
use crate::storage::{LocalStorage, Storage};
use crate::store::StateStore;
use crate::sync::{Connectivity, RemoteStore, SyncEngine, SyncSettings};

/// Wires storage, store, bridge and engine together for one data directory.
///
/// Construct once per process and hand the pieces to whoever needs them.
#[derive(Clone)]
pub struct LocalSession {
    store: Arc<StateStore>,
    bridge: Arc<HydrationBridge>,
    engine: Arc<SyncEngine>,
}

impl LocalSession {
    pub fn open(
        data_dir: impl Into<PathBuf>,
        remote: Option<Arc<dyn RemoteStore>>,
        connectivity: Arc<dyn Connectivity>,
        settings: SyncSettings,
    ) -> Self {
        let storage = Arc::new(Storage::new(LocalStorage::new(data_dir.into())));
        let store = Arc::new(StateStore::open(storage));
        let bridge = Arc::new(HydrationBridge::new(Arc::clone(&store)));
        let engine = Arc::new(SyncEngine::new(
            Arc::clone(&bridge),
            remote,
            connectivity,
            settings,
        ));

        Self {
            store,
            bridge,
            engine,
        }
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn bridge(&self) -> &Arc<HydrationBridge> {
        &self.bridge
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }
}
