//! Pantry storage capability.
//!
//! Record persistence lives outside this crate. Consumers that need to nudge
//! it (e.g. reload after a scan adds items) receive a `StorageCapability`
//! explicitly; when no storage exists they get [`NoopStorage`].

use std::sync::atomic::{AtomicUsize, Ordering};

pub trait StorageCapability: Send + Sync {
    /// Whether a backing store is present.
    fn available(&self) -> bool;

    /// Ask the store to reload its view of pantry records.
    fn refresh(&self);
}

/// Capability used when no storage is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStorage;

impl StorageCapability for NoopStorage {
    fn available(&self) -> bool {
        false
    }

    fn refresh(&self) {}
}

/// Storage stand-in that counts refresh requests.
#[derive(Debug, Default)]
pub struct CountingStorage {
    refreshes: AtomicUsize,
}

impl CountingStorage {
    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

impl StorageCapability for CountingStorage {
    fn available(&self) -> bool {
        true
    }

    fn refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_storage() {
        let storage = NoopStorage;
        assert!(!storage.available());
        storage.refresh();
    }

    #[test]
    fn test_counting_storage() {
        let storage = CountingStorage::default();
        storage.refresh();
        storage.refresh();
        assert!(storage.available());
        assert_eq!(storage.refresh_count(), 2);
    }
}
