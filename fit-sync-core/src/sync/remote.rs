//! The remote per-account document store.

use futures::future::BoxFuture;

use super::error::RemoteError;
use crate::models::AppState;

/// One document per account, fetched and replaced wholesale.
pub trait RemoteStore: Send + Sync {
    /// Fetches the account's document. `Ok(None)` means the account has
    /// never synced.
    fn fetch<'a>(&'a self, account_id: &'a str)
        -> BoxFuture<'a, Result<Option<AppState>, RemoteError>>;

    /// Replaces the account's document.
    fn push<'a>(
        &'a self,
        account_id: &'a str,
        state: &'a AppState,
    ) -> BoxFuture<'a, Result<(), RemoteError>>;
}
