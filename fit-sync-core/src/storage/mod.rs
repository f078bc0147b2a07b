//! Local persistence for AppState and the legacy keys.
//!
//! [`Storage`] is the single write path for every persisted key. It persists
//! the value, classifies the write and raises the sync-relevant
//! [`StateEvent::Persisted`] notification for canonical writes:
//!
//! - a write made inside a `writing_app_state` scope is the canonical
//!   AppState itself: it notifies sync listeners (unless autosync is
//!   suppressed) and is never hydrated;
//! - a raw write of [`APP_STATE_KEY`] outside that scope is never hydrated;
//! - any other write is a legacy write, hydrated unless a
//!   `suppress_hydration` scope is active.

mod flags;
mod keys;
mod local;

pub use flags::{FlagScope, WriteFlags};
pub use keys::{LegacyKey, APP_STATE_KEY};
pub use local::{LocalStorage, StorageError};

use serde_json::Value;
use tokio::sync::broadcast;

use crate::events::{StateEvent, EVENT_CHANNEL_CAPACITY};

/// How a storage write should be treated by the layers above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// The canonical AppState key.
    Canonical,
    /// A legacy key; `hydrate` is false inside a suppressed scope.
    Legacy { hydrate: bool },
}

#[derive(Debug)]
pub struct Storage {
    local: LocalStorage,
    flags: WriteFlags,
    events: broadcast::Sender<StateEvent>,
}

impl Storage {
    pub fn new(local: LocalStorage) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            local,
            flags: WriteFlags::new(),
            events,
        }
    }

    pub fn local(&self) -> &LocalStorage {
        &self.local
    }

    pub fn flags(&self) -> &WriteFlags {
        &self.flags
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.events.subscribe()
    }

    /// Sends an event to current subscribers. Having none is not an error.
    pub(crate) fn emit(&self, event: StateEvent) {
        let _ = self.events.send(event);
    }

    pub fn get_item(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.local.read(key)
    }

    /// Classifies a write of `key` under the currently active scopes.
    pub fn classify(&self, key: &str) -> WriteKind {
        if self.flags.is_writing_app_state() || key == APP_STATE_KEY {
            WriteKind::Canonical
        } else {
            WriteKind::Legacy {
                hydrate: !self.flags.is_hydration_suppressed(),
            }
        }
    }

    /// Persists `value` under `key`.
    ///
    /// The notification for a canonical write is raised even when the disk
    /// write fails: the in-memory state already changed and still needs to
    /// reach the remote.
    pub fn set_item(&self, key: &str, value: &Value) -> Result<WriteKind, StorageError> {
        let result = self.local.write(key, value);
        let kind = self.classify(key);

        if self.flags.is_writing_app_state() && !self.flags.is_autosync_suppressed() {
            self.emit(StateEvent::Persisted {
                key: key.to_string(),
            });
        }

        result.map(|()| kind)
    }
}
