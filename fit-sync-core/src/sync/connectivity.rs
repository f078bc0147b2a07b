use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Answers whether the device currently has a network.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// A shared online/offline switch.
///
/// Clones share the same flag, so whatever watches the network can flip it
/// while the engine holds another handle.
#[derive(Debug, Clone)]
pub struct NetworkStatus {
    online: Arc<AtomicBool>,
}

impl NetworkStatus {
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    pub fn online() -> Self {
        Self::new(true)
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Default for NetworkStatus {
    fn default() -> Self {
        Self::online()
    }
}

impl Connectivity for NetworkStatus {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_flag() {
        let status = NetworkStatus::online();
        let handle = status.clone();
        handle.set_online(false);
        assert!(!status.is_online());
    }
}
