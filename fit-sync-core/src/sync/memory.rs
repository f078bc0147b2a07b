use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use futures::future::BoxFuture;

use super::error::RemoteError;
use super::remote::RemoteStore;
use crate::models::AppState;

/// In-process remote store.
///
/// Counts calls and can be made slow or failing, which is what the engine
/// tests need. Also handy for running the CLI without a server.
#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    documents: Mutex<HashMap<String, AppState>>,
    latency: Duration,
    failing: AtomicBool,
    fetches: AtomicUsize,
    pushes: AtomicUsize,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fetch and push sleeps for `latency` before answering.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, AppState>> {
        self.documents.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn insert(&self, account_id: &str, state: AppState) {
        self.lock().insert(account_id.to_string(), state);
    }

    pub fn document(&self, account_id: &str) -> Option<AppState> {
        self.lock().get(account_id).cloned()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn push_count(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }

    async fn delay(&self) -> Result<(), RemoteError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }
}

impl RemoteStore for MemoryRemoteStore {
    fn fetch<'a>(
        &'a self,
        account_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<AppState>, RemoteError>> {
        Box::pin(async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.delay().await?;
            Ok(self.document(account_id))
        })
    }

    fn push<'a>(
        &'a self,
        account_id: &'a str,
        state: &'a AppState,
    ) -> BoxFuture<'a, Result<(), RemoteError>> {
        Box::pin(async move {
            self.pushes.fetch_add(1, Ordering::SeqCst);
            self.delay().await?;
            self.insert(account_id, state.clone());
            Ok(())
        })
    }
}
