//! Session setup and sync helpers for CLI commands.

mod auto_sync;

pub use auto_sync::try_auto_sync;

use std::sync::Arc;

use fit_sync_core::{HttpRemoteStore, LocalSession, NetworkStatus, RemoteStore};

use crate::config::Config;

/// A local session plus the connectivity switch its engine reads.
pub struct Session {
    pub local: LocalSession,
    pub network: NetworkStatus,
}

/// Opens the local session for the configured data directory.
///
/// The HTTP remote is attached only when sync is configured; the network
/// starts offline until a reachability probe says otherwise.
pub fn open_session(config: &Config) -> Session {
    let remote = HttpRemoteStore::from_parts(
        config.sync.server_url.as_deref(),
        config.sync.api_key.as_deref(),
    )
    .ok()
    .map(|store| Arc::new(store) as Arc<dyn RemoteStore>);

    tracing::debug!("Opening local state in {}", config.data_dir.value.display());
    let network = NetworkStatus::new(false);
    let local = LocalSession::open(
        config.data_dir.value.clone(),
        remote,
        Arc::new(network.clone()),
        config.sync.settings(),
    );

    Session { local, network }
}

/// Probes the sync server and records the result on `network`.
pub async fn probe(config: &Config, network: &NetworkStatus) -> bool {
    let online = match config.sync.server_url.as_deref() {
        Some(url) => fit_sync_core::check_server(url).await,
        None => false,
    };
    network.set_online(online);
    online
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigSource, ConfigValue, SyncConfig};
    use fit_sync_core::SyncStatus;
    use tempfile::TempDir;

    fn config(dir: &TempDir, sync: SyncConfig) -> Config {
        Config {
            data_dir: ConfigValue::new(dir.path().to_path_buf(), ConfigSource::File),
            account_id: ConfigValue::new(Some("alice".to_string()), ConfigSource::File),
            config_file: None,
            sync,
        }
    }

    #[tokio::test]
    async fn test_unconfigured_session_reports_offline() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(&temp_dir, SyncConfig::default());
        let session = open_session(&config);

        assert!(!probe(&config, &session.network).await);
        let outcome = session.local.engine().sync_state(config.account()).await;
        assert_eq!(outcome.status, SyncStatus::Offline);
        assert!(temp_dir.path().join("app_state.json").exists());
    }

    #[tokio::test]
    async fn test_unreachable_server_reports_offline() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(
            &temp_dir,
            SyncConfig {
                server_url: Some("http://127.0.0.1:1".to_string()),
                api_key: Some("key".to_string()),
                ..SyncConfig::default()
            },
        );
        let session = open_session(&config);

        assert!(!probe(&config, &session.network).await);
        let outcome = session.local.engine().sync_state(config.account()).await;
        assert_eq!(outcome.status, SyncStatus::Offline);
    }
}
