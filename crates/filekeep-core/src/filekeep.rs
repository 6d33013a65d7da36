//! FileKeep: the single entry point callers use.
//!
//! Delegates to a [`StorageRouter`]; results come back exactly as the
//! selected backend produced them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::future::join_all;

use crate::config::{Config, home_dir};
use crate::error::Result;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::handle::FileHandle;
use crate::registry::RegistrySnapshot;
use crate::router::{BackendSelection, StorageRouter};

pub struct FileKeep {
    home: PathBuf,
    router: StorageRouter,
}

impl FileKeep {
    /// Load configuration from the home directory and wire up the HTTP fetcher.
    ///
    /// Home precedence: `home_override`, then `FILEKEEP_HOME`, then `~/.filekeep`.
    pub fn load(home_override: Option<PathBuf>) -> Result<Self> {
        let home = home_dir(home_override)?;
        std::fs::create_dir_all(&home)?;
        let config = Config::load(&home)?;
        let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
        Ok(Self::from_config(home, &config, fetcher))
    }

    /// Build from an already resolved config and any fetcher.
    pub fn from_config(home: PathBuf, config: &Config, fetcher: Arc<dyn Fetcher>) -> Self {
        Self::with_router(home, StorageRouter::from_config(config, fetcher))
    }

    pub fn with_router(home: PathBuf, router: StorageRouter) -> Self {
        Self { home, router }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn selection(&self) -> BackendSelection {
        self.router.selection()
    }

    /// Enumerate the durable store into the registry.
    pub async fn init_enumerate(&self) -> Result<RegistrySnapshot> {
        self.router.init_enumerate().await
    }

    /// Fetch `url` and persist it under its logical name.
    pub async fn save(&self, url: &str) -> Result<FileHandle> {
        self.router.save(url).await
    }

    /// Save several URLs concurrently. Results are in input order.
    pub async fn save_all<S: AsRef<str>>(&self, urls: &[S]) -> Vec<Result<FileHandle>> {
        join_all(urls.iter().map(|url| self.router.save(url.as_ref()))).await
    }

    pub async fn get(&self, name: &str) -> Result<FileHandle> {
        self.router.get(name).await
    }

    /// Resolve `name` and dereference it.
    pub async fn read(&self, name: &str) -> Result<Vec<u8>> {
        let handle = self.get(name).await?;
        Ok(handle.read().await?)
    }

    pub fn list_cached(&self) -> Result<RegistrySnapshot> {
        self.router.list_cached()
    }
}
