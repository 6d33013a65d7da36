//! Storage backend trait: the capability set every facility implements.
//!
//! The router picks one implementation at construction time and forwards
//! to it; nothing downstream inspects which one it got.
//!
//! # Dyn-compatibility
//!
//! Methods return `Pin<Box<dyn Future>>` instead of `impl Future` so that
//! `Arc<dyn StorageBackend>` works. All input references share a single
//! lifetime `'a` so the returned future can borrow from both `&self` and
//! the argument.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::error::Result;
use crate::handle::FileHandle;
use crate::registry::RegistrySnapshot;

/// Boxed, Send future returned by every backend and fetcher method.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Which facility a backend drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Filesystem,
    ObjectStore,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Filesystem => write!(f, "filesystem"),
            BackendKind::ObjectStore => write!(f, "object-store"),
        }
    }
}

pub trait StorageBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Whether the facility is usable here. Probed once per instance.
    fn is_available(&self) -> bool;

    /// Enumerate the durable store into the registry and return a snapshot.
    /// Resolves only once enumeration is complete.
    fn init_enumerate(&self) -> BoxFuture<'_, Result<RegistrySnapshot>>;

    /// Fetch `url`, persist it under its logical name, register and return the handle.
    fn save<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FileHandle>>;

    /// Resolve a stored file by logical name; `NotFound` on a miss.
    fn get<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<FileHandle>>;

    /// Current registry contents. No I/O.
    fn list_cached(&self) -> RegistrySnapshot;
}
