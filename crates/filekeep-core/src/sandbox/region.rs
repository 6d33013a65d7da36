//! The quota-bounded sandbox region: a directory whose regular files are the
//! stored records.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};
use crate::name::RESERVED_PREFIX;
use crate::safe_io::{FileLock, atomic_write};

/// Lock file serializing quota accounting and writes inside a region.
const LOCK_FILE: &str = ".filekeep.lock";

/// Whether a region can live at `root`: the directory exists (or can be
/// created) and is writable.
pub fn probe(root: &Path) -> bool {
    let usable = fs::create_dir_all(root)
        .and_then(|()| fs::metadata(root))
        .map(|meta| meta.is_dir() && !meta.permissions().readonly());
    match usable {
        Ok(usable) => usable,
        Err(e) => {
            log::warn!("sandbox root {} unusable: {}", root.display(), e);
            false
        }
    }
}

#[derive(Debug, Clone)]
pub struct SandboxRegion {
    root: PathBuf,
    quota: u64,
}

impl SandboxRegion {
    /// Open the region, creating its root on first use.
    pub async fn open(root: &Path, quota: u64) -> io::Result<Self> {
        tokio::fs::create_dir_all(root).await?;
        Ok(Self {
            root: root.to_path_buf(),
            quota,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Create or overwrite `name` with `data`. Blocking.
    ///
    /// Fails with `QuotaExceeded` if the region would hold more than its
    /// quota afterwards. The previous version of `name` does not count
    /// against the new write. Once `cancelled` returns true the store gives
    /// up without touching `name`; the check is made up to the final rename.
    pub fn store(
        &self,
        name: &str,
        data: &[u8],
        cancelled: impl Fn() -> bool,
    ) -> Result<PathBuf> {
        let _lock = FileLock::acquire_unless(&self.root.join(LOCK_FILE), &cancelled)?;

        let used = self.usage_excluding(name)?;
        let available = self.quota.saturating_sub(used);
        let requested = data.len() as u64;
        if requested > available {
            return Err(StoreError::QuotaExceeded {
                requested,
                available,
            });
        }

        if cancelled() {
            return Err(StoreError::Task(format!("write of {} cancelled", name)));
        }
        let path = self.path_for(name);
        atomic_write(&path, data)?;
        Ok(path)
    }

    /// Bytes held by stored records other than `name`.
    fn usage_excluding(&self, name: &str) -> io::Result<u64> {
        let mut used = 0;
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if file_name == name || file_name.starts_with(RESERVED_PREFIX) {
                continue;
            }
            let meta = entry.metadata()?;
            if meta.is_file() {
                used += meta.len();
            }
        }
        Ok(used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn never() -> bool {
        false
    }

    #[test]
    fn test_probe_creates_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("a").join("b");
        assert!(probe(&root));
        assert!(root.is_dir());
    }

    #[test]
    fn test_probe_rejects_file_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("file");
        fs::write(&root, b"x").unwrap();
        assert!(!probe(&root));
    }

    #[tokio::test]
    async fn test_store_writes_file() {
        let dir = TempDir::new().unwrap();
        let region = SandboxRegion::open(dir.path(), 1024).await.unwrap();
        let path = region.store("a.bin", b"hello", never).unwrap();
        assert_eq!(path, dir.path().join("a.bin"));
        assert_eq!(fs::read(path).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_store_over_quota_rejected() {
        let dir = TempDir::new().unwrap();
        let region = SandboxRegion::open(dir.path(), 8).await.unwrap();
        region.store("a.bin", b"12345", never).unwrap();
        let err = region.store("b.bin", b"12345", never).unwrap_err();
        assert!(matches!(
            err,
            StoreError::QuotaExceeded {
                requested: 5,
                available: 3
            }
        ));
        assert!(!dir.path().join("b.bin").exists());
    }

    #[tokio::test]
    async fn test_overwrite_does_not_double_count() {
        let dir = TempDir::new().unwrap();
        let region = SandboxRegion::open(dir.path(), 8).await.unwrap();
        region.store("a.bin", b"123456", never).unwrap();
        region.store("a.bin", b"87654321", never).unwrap();
        assert_eq!(fs::read(dir.path().join("a.bin")).unwrap(), b"87654321");
    }

    #[tokio::test]
    async fn test_cancelled_store_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let region = SandboxRegion::open(dir.path(), 1024).await.unwrap();
        let err = region.store("a.bin", b"abc", || true).unwrap_err();
        assert!(matches!(err, StoreError::Task(_)));
        assert!(!dir.path().join("a.bin").exists());
    }

    #[tokio::test]
    async fn test_lock_file_not_counted() {
        let dir = TempDir::new().unwrap();
        let region = SandboxRegion::open(dir.path(), 4).await.unwrap();
        region.store("a.bin", b"12", never).unwrap();
        region.store("b.bin", b"34", never).unwrap();
        assert!(dir.path().join(LOCK_FILE).exists());
    }
}
