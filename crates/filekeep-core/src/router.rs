//! StorageRouter: picks one backend and forwards every operation to it.
//!
//! Candidates are held in fixed priority order; the first available one is
//! selected on first use and that choice is kept for the life of the router,
//! even if availability changes later.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::backend::{BackendKind, StorageBackend};
use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::fetch::Fetcher;
use crate::handle::FileHandle;
use crate::objstore::ObjectStoreBackend;
use crate::registry::RegistrySnapshot;
use crate::sandbox::SandboxBackend;

/// Outcome of backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendSelection {
    Filesystem,
    ObjectStore,
    None,
}

impl From<BackendKind> for BackendSelection {
    fn from(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Filesystem => BackendSelection::Filesystem,
            BackendKind::ObjectStore => BackendSelection::ObjectStore,
        }
    }
}

impl fmt::Display for BackendSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendSelection::Filesystem => write!(f, "{}", BackendKind::Filesystem),
            BackendSelection::ObjectStore => write!(f, "{}", BackendKind::ObjectStore),
            BackendSelection::None => write!(f, "none"),
        }
    }
}

pub struct StorageRouter {
    candidates: Vec<Arc<dyn StorageBackend>>,
    selected: OnceLock<Option<usize>>,
}

impl StorageRouter {
    /// Router over `candidates`, highest priority first.
    pub fn new(candidates: Vec<Arc<dyn StorageBackend>>) -> Self {
        Self {
            candidates,
            selected: OnceLock::new(),
        }
    }

    /// The standard pair: sandboxed filesystem first, then object store.
    pub fn from_config(config: &Config, fetcher: Arc<dyn Fetcher>) -> Self {
        let sandbox = SandboxBackend::new(
            config.sandbox.clone(),
            config.timing.clone(),
            fetcher.clone(),
        );
        let store = ObjectStoreBackend::new(
            config.object_store.clone(),
            config.timing.clone(),
            fetcher,
        );
        Self::new(vec![Arc::new(sandbox), Arc::new(store)])
    }

    /// Which backend serves this router. Resolved once.
    pub fn selection(&self) -> BackendSelection {
        match self.selected_backend() {
            Some(backend) => backend.kind().into(),
            None => BackendSelection::None,
        }
    }

    fn selected_backend(&self) -> Option<&Arc<dyn StorageBackend>> {
        let index = *self.selected.get_or_init(|| {
            let found = self.candidates.iter().position(|b| b.is_available());
            match found {
                Some(i) => log::debug!("selected {} backend", self.candidates[i].kind()),
                None => log::warn!("no storage backend available"),
            }
            found
        });
        index.map(|i| &self.candidates[i])
    }

    fn backend(&self) -> Result<&Arc<dyn StorageBackend>> {
        self.selected_backend().ok_or(StoreError::BackendUnavailable)
    }

    pub async fn init_enumerate(&self) -> Result<RegistrySnapshot> {
        self.backend()?.init_enumerate().await
    }

    pub async fn save(&self, url: &str) -> Result<FileHandle> {
        self.backend()?.save(url).await
    }

    pub async fn get(&self, name: &str) -> Result<FileHandle> {
        self.backend()?.get(name).await
    }

    pub fn list_cached(&self) -> Result<RegistrySnapshot> {
        Ok(self.backend()?.list_cached())
    }
}
