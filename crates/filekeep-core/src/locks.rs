//! Per-name save serialization.
//!
//! Saves of the same logical name run one at a time from fetch to registry
//! update, so the registry always names the version that was written last.
//! Saves of different names never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;

#[derive(Default)]
pub struct NameLocks {
    slots: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

/// Held for the duration of one save. Releases the slot on drop.
pub struct NameGuard<'a> {
    locks: &'a NameLocks,
    name: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl NameLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, name: &str) -> NameGuard<'_> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots.entry(name.to_string()).or_default().clone()
        };
        let guard = slot.lock_owned().await;
        NameGuard {
            locks: self,
            name: name.to_string(),
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().unwrap().len()
    }
}

impl Drop for NameGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut slots = self.locks.slots.lock().unwrap_or_else(|e| e.into_inner());
        // Only the map and no waiter still reference the slot: forget it.
        let idle = slots
            .get(&self.name)
            .is_some_and(|slot| Arc::strong_count(slot) == 1);
        if idle {
            slots.remove(&self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_name_is_exclusive() {
        let locks = NameLocks::new();
        let first = locks.lock("a.bin").await;
        let second = tokio::time::timeout(Duration::from_millis(30), locks.lock("a.bin")).await;
        assert!(second.is_err());
        drop(first);
        let third = tokio::time::timeout(Duration::from_millis(30), locks.lock("a.bin")).await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn test_different_names_do_not_block() {
        let locks = NameLocks::new();
        let _a = locks.lock("a.bin").await;
        let b = tokio::time::timeout(Duration::from_millis(30), locks.lock("b.bin")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_slots_released() {
        let locks = NameLocks::new();
        {
            let _a = locks.lock("a.bin").await;
            assert_eq!(locks.len(), 1);
        }
        assert_eq!(locks.len(), 0);
    }
}
