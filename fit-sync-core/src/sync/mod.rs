//! Sync between the local AppState and a remote per-account document.
//!
//! ## Protocol
//!
//! Each account has exactly one remote document, the whole AppState. An
//! attempt fetches it and compares `updatedAt`:
//! 1. No remote document: push local (or a seeded default state)
//! 2. Local newer: push local
//! 3. Remote newer: merge, write back if anything was restored, store locally
//! 4. Equal: nothing to do

mod connectivity;
mod engine;
mod error;
mod http;
mod memory;
mod merge;
mod remote;
mod status;

pub use connectivity::{Connectivity, NetworkStatus};
pub use engine::{
    StatusCallback, SyncEngine, SyncSettings, DEFAULT_COOLDOWN, DEFAULT_DEBOUNCE,
};
pub use error::RemoteError;
pub use http::{build_http_url, check_server, HttpRemoteStore};
pub use memory::MemoryRemoteStore;
pub use merge::{merge, Domain, MergeResult};
pub use remote::RemoteStore;
pub use status::{SyncOutcome, SyncStatus};
