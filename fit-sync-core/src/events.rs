//! Process-wide state notifications.

/// Capacity of the state event channel. Slow receivers lag rather than block
/// writers.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEvent {
    /// AppState was replaced. Views derived from it should refresh.
    Changed { updated_at: i64 },
    /// A canonical AppState write reached storage. Sync listeners react to this.
    Persisted { key: String },
}
