//! Write suppression scopes.
//!
//! Three independent flags steer what a storage write triggers. Each is
//! entered through a guard that restores the previous value when dropped, so
//! scopes nest and are released on early return or panic.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct WriteFlags {
    suppress_hydration: AtomicBool,
    writing_app_state: AtomicBool,
    autosync_suppressed: AtomicBool,
}

impl WriteFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Legacy writes made while the guard lives don't enqueue hydration.
    pub fn suppress_hydration(&self) -> FlagScope<'_> {
        FlagScope::enter(&self.suppress_hydration)
    }

    /// Marks writes made while the guard lives as writes of the canonical
    /// AppState key.
    pub fn writing_app_state(&self) -> FlagScope<'_> {
        FlagScope::enter(&self.writing_app_state)
    }

    /// Storage writes made while the guard lives never wake the sync listener.
    pub fn suppress_autosync(&self) -> FlagScope<'_> {
        FlagScope::enter(&self.autosync_suppressed)
    }

    pub fn is_hydration_suppressed(&self) -> bool {
        self.suppress_hydration.load(Ordering::SeqCst)
    }

    pub fn is_writing_app_state(&self) -> bool {
        self.writing_app_state.load(Ordering::SeqCst)
    }

    pub fn is_autosync_suppressed(&self) -> bool {
        self.autosync_suppressed.load(Ordering::SeqCst)
    }
}

/// Sets a flag for its lifetime.
#[must_use = "the flag is cleared as soon as the scope is dropped"]
#[derive(Debug)]
pub struct FlagScope<'a> {
    flag: &'a AtomicBool,
    previous: bool,
}

impl<'a> FlagScope<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        let previous = flag.swap(true, Ordering::SeqCst);
        Self { flag, previous }
    }
}

impl Drop for FlagScope<'_> {
    fn drop(&mut self) {
        self.flag.store(self.previous, Ordering::SeqCst);
    }
}
