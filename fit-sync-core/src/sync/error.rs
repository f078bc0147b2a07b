//! Remote store error types.

use thiserror::Error;

/// Errors that can occur while talking to the remote document store.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Sync not configured. Add server_url and api_key to config.")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Server returned status {0}")]
    Status(u16),

    #[error("Invalid remote document: {0}")]
    InvalidDocument(String),

    #[error("Remote store unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RemoteError::InvalidDocument(e.to_string())
        } else {
            RemoteError::Http(e.to_string())
        }
    }
}
