//! Legacy key hydration.
//!
//! Older code paths still write narrow per-feature keys. The bridge folds
//! each such write into AppState so readers of the canonical state stay
//! correct, and can push AppState back down into those keys for readers
//! that haven't moved over yet.

mod bridge;
mod record;

pub use bridge::{HydrationBridge, HydrationReport};
pub use record::{
    CompletionRecord, HydrationError, LegacyRecord, ProfileRecord, TodayLogRecord, WeightReading,
};
