//! Transactional object store backend.
//!
//! Records live as `(name, blob)` rows in a SQLite collection. Handles are
//! materialized blobs: every lookup reads the bytes inside a transaction and
//! wraps them in a fresh `blob:` URL.

mod cursor;
mod schema;

pub use cursor::{Record, open_cursor};
pub use schema::open_db;

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use futures_util::StreamExt;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};

use crate::backend::{BackendKind, BoxFuture, StorageBackend};
use crate::config::{ObjectStoreConfig, TimingConfig};
use crate::deadline::{CancelFlag, bounded, bounded_blocking, bounded_blocking_with};
use crate::error::{Result, StoreError};
use crate::fetch::Fetcher;
use crate::handle::FileHandle;
use crate::locks::NameLocks;
use crate::name::{logical_name, validate_name};
use crate::registry::{FileRegistry, RegistrySnapshot};

pub struct ObjectStoreBackend {
    path: Option<PathBuf>,
    config: ObjectStoreConfig,
    timing: TimingConfig,
    fetcher: Arc<dyn Fetcher>,
    registry: FileRegistry,
    locks: NameLocks,
    available: OnceLock<bool>,
}

impl ObjectStoreBackend {
    /// `config.path` must already be resolved (see `Config::resolve_paths`);
    /// without a path the backend reports itself unavailable.
    pub fn new(
        config: ObjectStoreConfig,
        timing: TimingConfig,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            path: config.path.clone(),
            config,
            timing,
            fetcher,
            registry: FileRegistry::new(),
            locks: NameLocks::new(),
            available: OnceLock::new(),
        }
    }

    async fn open(&self) -> Result<Connection> {
        let path = self.path.clone().ok_or(StoreError::BackendUnavailable)?;
        bounded_blocking("object store open", self.timing.op_timeout(), move |_| {
            Ok(open_db(&path)?)
        })
        .await
    }

    async fn enumerate(&self) -> Result<RegistrySnapshot> {
        let conn = self.open().await?;
        let entries = open_cursor(conn, self.config.cursor_batch)
            .map(|row| row.map(|(name, data)| (name, FileHandle::blob(data))));
        let count = self
            .registry
            .populate(entries, self.timing.op_timeout())
            .await?;
        log::info!("object store enumeration registered {} files", count);
        Ok(self.registry.snapshot())
    }

    async fn save_url(&self, url: &str) -> Result<FileHandle> {
        let name = logical_name(url)?;
        let _guard = self.locks.lock(&name).await;

        let conn = self.open().await?;
        let data = bounded("fetch", self.timing.op_timeout(), self.fetcher.fetch(url)).await?;

        // An interrupted transaction rolls back. The name guard stays held
        // until the put has fully finished, even when the wait times out.
        let interrupt = conn.get_interrupt_handle();
        let key = name.clone();
        let stored = bounded_blocking_with(
            "object store put",
            self.timing.op_timeout(),
            move |cancel| put_then_get(conn, &key, &data, cancel),
            move || interrupt.interrupt(),
        )
        .await?;

        let handle = FileHandle::blob(stored);
        self.registry.insert(name.as_str(), handle.clone());
        log::info!("saved {} to object store as {}", url, name);
        Ok(handle)
    }

    async fn lookup(&self, name: &str) -> Result<FileHandle> {
        validate_name(name)?;
        let conn = self.open().await?;
        let key = name.to_string();
        let found = bounded_blocking("object store get", self.timing.op_timeout(), move |_| {
            read_one(conn, &key)
        })
        .await?;
        let data = found.ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        let handle = FileHandle::blob(data);
        self.registry.insert(name, handle.clone());
        Ok(handle)
    }
}

/// Write `data` under `name` and read it back in the same read-write
/// transaction, so the returned bytes are exactly what was committed.
/// Rolls back instead of committing once `cancel` is raised.
fn put_then_get(
    mut conn: Connection,
    name: &str,
    data: &[u8],
    cancel: &CancelFlag,
) -> Result<Vec<u8>> {
    let txn = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    txn.execute(
        "INSERT OR REPLACE INTO files (name, data) VALUES (?1, ?2)",
        (name, data),
    )?;
    let stored: Vec<u8> =
        txn.query_row("SELECT data FROM files WHERE name = ?1", [name], |row| {
            row.get(0)
        })?;
    cancel.check("object store put")?;
    txn.commit()?;
    Ok(stored)
}

fn read_one(mut conn: Connection, name: &str) -> Result<Option<Vec<u8>>> {
    let txn = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
    let data = txn
        .query_row("SELECT data FROM files WHERE name = ?1", [name], |row| {
            row.get(0)
        })
        .optional()?;
    txn.commit()?;
    Ok(data)
}

impl StorageBackend for ObjectStoreBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::ObjectStore
    }

    fn is_available(&self) -> bool {
        *self.available.get_or_init(|| {
            let available = self.config.enabled
                && self.path.as_deref().is_some_and(schema::probe);
            log::debug!("object store backend available: {}", available);
            available
        })
    }

    fn init_enumerate(&self) -> BoxFuture<'_, Result<RegistrySnapshot>> {
        Box::pin(self.enumerate())
    }

    fn save<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FileHandle>> {
        Box::pin(self.save_url(url))
    }

    fn get<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<FileHandle>> {
        Box::pin(self.lookup(name))
    }

    fn list_cached(&self) -> RegistrySnapshot {
        self.registry.snapshot()
    }
}
