//! In-process registry of logical name -> resolvable handle.
//!
//! Each backend owns one. It is a cache of the durable store, populated
//! incrementally by saves and in bulk by enumeration; the durable store
//! always wins, so entries are overwritten and never trusted over it.

use std::pin::pin;
use std::sync::Mutex;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use indexmap::IndexMap;

use crate::deadline::bounded;
use crate::error::Result;
use crate::handle::FileHandle;

/// Point-in-time copy of a registry, in insertion order.
pub type RegistrySnapshot = IndexMap<String, FileHandle>;

#[derive(Default)]
pub struct FileRegistry {
    entries: Mutex<RegistrySnapshot>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) the handle for `name`.
    pub fn insert(&self, name: impl Into<String>, handle: FileHandle) {
        self.lock().insert(name.into(), handle);
    }

    pub fn get(&self, name: &str) -> Option<FileHandle> {
        self.lock().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the current mapping. No I/O.
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.lock().clone()
    }

    /// Drain an enumeration sequence into the registry, in yield order.
    ///
    /// Each advance of the sequence is bounded by `step_timeout`. The first
    /// error ends the drain; entries recorded before it stay. Returns the
    /// number of entries recorded.
    pub async fn populate<S>(&self, entries: S, step_timeout: Duration) -> Result<usize>
    where
        S: Stream<Item = Result<(String, FileHandle)>>,
    {
        let mut entries = pin!(entries);
        let mut count = 0;
        while let Some(item) =
            bounded("enumeration step", step_timeout, async { Ok(entries.next().await) }).await?
        {
            let (name, handle) = item?;
            self.insert(name, handle);
            count += 1;
        }
        Ok(count)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistrySnapshot> {
        // A poisoned registry is still a valid cache; keep serving it.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
