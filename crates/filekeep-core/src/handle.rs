//! Resolvable handles issued by the backends.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use url::Url;
use uuid::Uuid;

/// URL scheme prefix for object-store handles.
const BLOB_URL_PREFIX: &str = "blob:filekeep/";

/// Reference to a stored file that can be dereferenced locally.
///
/// Sandbox handles point at the file on disk and stay valid as long as the
/// sandbox region does. Object-store handles carry the bytes materialized at
/// lookup time under a unique `blob:` URL, like an object URL does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileHandle {
    File { path: PathBuf },
    Blob { url: String, data: Arc<[u8]> },
}

impl FileHandle {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        FileHandle::File { path: path.into() }
    }

    /// Materialize bytes under a fresh `blob:` URL.
    pub fn blob(data: Vec<u8>) -> Self {
        FileHandle::Blob {
            url: format!("{}{}", BLOB_URL_PREFIX, Uuid::new_v4()),
            data: data.into(),
        }
    }

    /// Locally dereferenceable URL for this handle.
    ///
    /// Sandbox files become `file://` URLs; a path that cannot be expressed
    /// as one (relative paths) falls back to its display form.
    pub fn url(&self) -> String {
        match self {
            FileHandle::File { path } => Url::from_file_path(path)
                .map(String::from)
                .unwrap_or_else(|_| path.display().to_string()),
            FileHandle::Blob { url, .. } => url.clone(),
        }
    }

    /// On-disk location, for sandbox handles.
    pub fn path(&self) -> Option<&Path> {
        match self {
            FileHandle::File { path } => Some(path),
            FileHandle::Blob { .. } => None,
        }
    }

    /// Read the bytes this handle refers to.
    pub async fn read(&self) -> io::Result<Vec<u8>> {
        match self {
            FileHandle::File { path } => tokio::fs::read(path).await,
            FileHandle::Blob { data, .. } => Ok(data.to_vec()),
        }
    }
}
