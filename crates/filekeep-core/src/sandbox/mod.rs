//! Sandboxed filesystem backend.
//!
//! Records are regular files directly under a quota-bounded region root; the
//! handle for a record is its on-disk path. Enumeration walks the root with a
//! batched [`DirectoryReader`] until it hands back an empty batch.

mod reader;
mod region;

pub use reader::DirectoryReader;
pub use region::SandboxRegion;

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use crate::backend::{BackendKind, BoxFuture, StorageBackend};
use crate::config::{SandboxConfig, TimingConfig};
use crate::deadline::{bounded, bounded_blocking};
use crate::error::{Result, StoreError};
use crate::fetch::Fetcher;
use crate::handle::FileHandle;
use crate::locks::NameLocks;
use crate::name::{logical_name, validate_name};
use crate::registry::{FileRegistry, RegistrySnapshot};

pub struct SandboxBackend {
    root: Option<PathBuf>,
    config: SandboxConfig,
    timing: TimingConfig,
    fetcher: Arc<dyn Fetcher>,
    registry: FileRegistry,
    locks: NameLocks,
    available: OnceLock<bool>,
}

impl SandboxBackend {
    /// `config.root` must already be resolved (see `Config::resolve_paths`);
    /// without a root the backend reports itself unavailable.
    pub fn new(config: SandboxConfig, timing: TimingConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            root: config.root.clone(),
            config,
            timing,
            fetcher,
            registry: FileRegistry::new(),
            locks: NameLocks::new(),
            available: OnceLock::new(),
        }
    }

    async fn open_region(&self) -> Result<SandboxRegion> {
        let root = self.root.as_deref().ok_or(StoreError::BackendUnavailable)?;
        bounded("sandbox open", self.timing.op_timeout(), async {
            Ok(SandboxRegion::open(root, self.config.quota_bytes).await?)
        })
        .await
    }

    async fn enumerate(&self) -> Result<RegistrySnapshot> {
        let region = self.open_region().await?;
        let reader = bounded("sandbox reader", self.timing.op_timeout(), async {
            Ok(DirectoryReader::open(region.root(), self.config.read_batch).await?)
        })
        .await?;
        let count = self
            .registry
            .populate(reader.into_stream(), self.timing.op_timeout())
            .await?;
        log::info!("sandbox enumeration registered {} files", count);
        Ok(self.registry.snapshot())
    }

    async fn save_url(&self, url: &str) -> Result<FileHandle> {
        let name = logical_name(url)?;
        let _guard = self.locks.lock(&name).await;

        let data = bounded("fetch", self.timing.op_timeout(), self.fetcher.fetch(url)).await?;
        let region = self.open_region().await?;

        // The name guard stays held until the write has fully finished, even
        // when the wait for it times out.
        let store_name = name.clone();
        let path = bounded_blocking("sandbox write", self.timing.op_timeout(), move |cancel| {
            region.store(&store_name, &data, || cancel.is_cancelled())
        })
        .await?;

        let handle = FileHandle::file(path);
        self.registry.insert(name.as_str(), handle.clone());

        // Give the write time to settle before anyone dereferences the handle.
        let settle = self.timing.settle_delay();
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }
        log::info!("saved {} to sandbox as {}", url, name);
        Ok(handle)
    }

    async fn lookup(&self, name: &str) -> Result<FileHandle> {
        validate_name(name)?;
        let region = self.open_region().await?;
        let path = region.path_for(name);
        let is_file = bounded("sandbox lookup", self.timing.op_timeout(), async {
            match tokio::fs::metadata(&path).await {
                Ok(meta) => Ok(meta.is_file()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
        .await?;
        if !is_file {
            return Err(StoreError::NotFound(name.to_string()));
        }
        let handle = FileHandle::file(path);
        self.registry.insert(name, handle.clone());
        Ok(handle)
    }
}

impl StorageBackend for SandboxBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Filesystem
    }

    fn is_available(&self) -> bool {
        *self.available.get_or_init(|| {
            let available = self.config.enabled
                && self.root.as_deref().is_some_and(region::probe);
            log::debug!("sandbox backend available: {}", available);
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
