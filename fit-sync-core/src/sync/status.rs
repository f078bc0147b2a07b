use serde::Serialize;
use std::fmt;

/// Where the sync engine is in its cycle.
///
/// `Idle -> Pending -> Syncing -> {Synced | Error | Offline}`. `Offline` and
/// `Error` are terminal for an attempt; nothing retries on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Idle,
    Pending,
    Syncing,
    Synced,
    Error,
    Offline,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Idle => "idle",
            SyncStatus::Pending => "pending",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Synced => "synced",
            SyncStatus::Error => "error",
            SyncStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one sync attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub status: SyncStatus,
    pub message: String,
}

impl SyncOutcome {
    pub fn new(status: SyncStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        assert_eq!(SyncStatus::Offline.to_string(), "offline");
        assert_eq!(
            serde_json::to_value(SyncStatus::Synced).unwrap(),
            serde_json::json!("synced")
        );
    }

    #[test]
    fn test_outcome_display() {
        let outcome = SyncOutcome::new(SyncStatus::Error, "Server returned status 500");
        assert_eq!(outcome.to_string(), "error: Server returned status 500");
    }
}
