//! Auto-sync around CLI commands.
//!
//! When `auto_sync` is enabled, read commands sync before running and write
//! commands sync after succeeding.

use fit_sync_core::SyncStatus;

use super::{probe, Session};
use crate::config::Config;

/// Syncs if enabled and the server is reachable.
///
/// Failures are reported on stderr and otherwise ignored; the CLI keeps
/// working offline.
pub fn try_auto_sync(config: &Config, session: &Session) {
    if !config.sync.auto_sync || !config.sync.is_configured() {
        return;
    }
    let Some(account) = config.account() else {
        return;
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(_) => return,
    };

    rt.block_on(async {
        if !probe(config, &session.network).await {
            eprintln!("Auto-sync: server unreachable, skipping");
            return;
        }

        let outcome = session.local.engine().sync_state(Some(account)).await;
        match outcome.status {
            SyncStatus::Synced | SyncStatus::Pending => {}
            _ => eprintln!("Auto-sync: {}", outcome),
        }
    });
}
