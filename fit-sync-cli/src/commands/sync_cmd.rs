//! Sync CLI commands for synchronizing with the server.

use clap::{Args, Subcommand};

use fit_sync_core::{SyncOutcome, SyncStatus};

use crate::config::Config;
use crate::sync::{probe, Session};

/// Sync with remote server
#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    pub command: Option<SyncSubcommand>,
}

#[derive(Debug, Subcommand)]
pub enum SyncSubcommand {
    /// Show sync configuration and server status
    Status,

    /// Sync now, ignoring the cooldown
    Force,
}

impl SyncCommand {
    pub fn run(&self, config: &Config, session: &Session) -> Result<(), SyncCommandError> {
        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| SyncCommandError::RuntimeError(e.to_string()))?;

        match &self.command {
            None => rt.block_on(self.sync(config, session, false)),
            Some(SyncSubcommand::Force) => rt.block_on(self.sync(config, session, true)),
            Some(SyncSubcommand::Status) => rt.block_on(self.status(config, session)),
        }
    }

    async fn sync(
        &self,
        config: &Config,
        session: &Session,
        force: bool,
    ) -> Result<(), SyncCommandError> {
        if !config.sync.is_configured() {
            return Err(SyncCommandError::NotConfigured);
        }
        let account = config.account().ok_or(SyncCommandError::NoAccount)?;

        println!("Syncing with server...");
        probe(config, &session.network).await;

        let engine = session.local.engine();
        let outcome = if force {
            engine.force_sync(Some(account)).await
        } else {
            engine.sync_state(Some(account)).await
        };

        match outcome.status {
            SyncStatus::Synced => {
                println!("✓ {}", outcome.message);
                Ok(())
            }
            SyncStatus::Pending | SyncStatus::Idle => {
                println!("- {}", outcome.message);
                Ok(())
            }
            _ => Err(SyncCommandError::Failed(outcome)),
        }
    }

    async fn status(&self, config: &Config, session: &Session) -> Result<(), SyncCommandError> {
        println!("Sync Configuration");
        println!("==================");
        println!();

        let server_url = match (&config.sync.server_url, config.sync.is_configured()) {
            (Some(url), true) => url,
            _ => {
                println!("Status: Not configured");
                println!();
                println!("To enable sync, add to your config file:");
                println!();
                println!("  account_id: \"you@example.com\"");
                println!("  sync:");
                println!("    server_url: \"http://localhost:8080\"");
                println!("    api_key: \"...\"");
                println!();
                println!("Or set environment variables:");
                println!("  FIT_ACCOUNT_ID, FIT_SYNC_URL, FIT_SYNC_API_KEY");
                return Ok(());
            }
        };

        println!("Server:    {}", server_url);
        println!("Account:   {}", config.account().unwrap_or("(not set)"));
        println!(
            "Auto-sync: {}",
            if config.sync.auto_sync {
                "enabled"
            } else {
                "disabled"
            }
        );
        println!(
            "Timing:    {} ms debounce, {} ms cooldown",
            config.sync.debounce_ms, config.sync.cooldown_ms
        );
        println!("Local updatedAt: {}", session.local.store().updated_at());
        println!();

        print!("Server status: ");
        if probe(config, &session.network).await {
            println!("✓ reachable");
        } else {
            println!("✗ unreachable");
        }

        Ok(())
    }
}

/// Errors from sync commands
#[derive(Debug)]
pub enum SyncCommandError {
    NotConfigured,
    NoAccount,
    Failed(SyncOutcome),
    RuntimeError(String),
}

impl std::fmt::Display for SyncCommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncCommandError::NotConfigured => write!(
                f,
                "Sync not configured. Add server_url and api_key to config."
            ),
            SyncCommandError::NoAccount => {
                write!(f, "No account configured. Set account_id or FIT_ACCOUNT_ID.")
            }
            SyncCommandError::Failed(outcome) => write!(f, "Sync {}", outcome),
            SyncCommandError::RuntimeError(e) => write!(f, "Runtime error: {}", e),
        }
    }
}

impl std::error::Error for SyncCommandError {}
