//! Safe file I/O utilities: atomic writes and file locking.
//!
//! - [`atomic_write()`] - Write bytes atomically (temp file + rename)
//! - [`FileLock`] - RAII file locking wrapper using fs2
//!
//! The sandbox region uses both: the lock serializes quota accounting across
//! processes sharing a region, the atomic write keeps a reader from ever
//! seeing a half-written file.

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix of in-flight temporary files. Enumeration skips these.
pub const PARTIAL_PREFIX: &str = ".filekeep-partial-";

/// Pause between attempts in [`FileLock::acquire_unless`].
const LOCK_POLL: Duration = Duration::from_millis(10);

/// Temporary sibling used while writing `path`.
fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}{}", PARTIAL_PREFIX, name))
}

/// Atomically write bytes to a file.
///
/// Writes to a temporary sibling with fsync, then renames to the target
/// path. The file is either fully written or unchanged.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created, written, synced,
/// or renamed.
pub fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = partial_path(path);

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)?;

    {
        let mut writer = BufWriter::new(&mut file);
        writer.write_all(contents)?;
        writer.flush()?;
    }

    // Sync to disk before rename
    file.sync_all()?;

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    Ok(())
}

/// RAII file lock using fs2 exclusive locking.
///
/// The lock is acquired when created and released when dropped. Advisory:
/// processes must cooperate by locking the same path.
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Acquire an exclusive lock on the given path, blocking if necessary.
    ///
    /// Creates the lock file if it doesn't exist.
    pub fn acquire(lock_path: &Path) -> io::Result<Self> {
        let file = open_lock_file(lock_path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }

    /// Acquire an exclusive lock, polling instead of blocking.
    ///
    /// Gives up with `ErrorKind::Interrupted` as soon as `cancelled` returns
    /// true while the lock is still held elsewhere.
    pub fn acquire_unless(lock_path: &Path, cancelled: impl Fn() -> bool) -> io::Result<Self> {
        let file = open_lock_file(lock_path)?;
        let contended = fs2::lock_contended_error().kind();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(Self { file }),
                Err(e) if e.kind() == contended => {}
                Err(e) => return Err(e),
            }
            if cancelled() {
                return Err(io::Error::new(ErrorKind::Interrupted, "lock wait cancelled"));
            }
            std::thread::sleep(LOCK_POLL);
        }
    }
}

fn open_lock_file(lock_path: &Path) -> io::Result<File> {
    if let Some(parent) = lock_path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
