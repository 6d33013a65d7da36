//! Batched directory reader over the sandbox root.
//!
//! Mirrors the native reader protocol: ask for the next batch until a batch
//! comes back empty. [`DirectoryReader::into_stream`] flattens that into a
//! finite, single-pass stream of registry entries.

use std::collections::VecDeque;
use std::io;
use std::path::Path;

use futures_util::Stream;
use futures_util::stream;
use tokio::fs::{self, DirEntry, ReadDir};

use crate::error::Result;
use crate::handle::FileHandle;
use crate::name::RESERVED_PREFIX;

pub struct DirectoryReader {
    read_dir: ReadDir,
    batch: usize,
}

impl DirectoryReader {
    pub async fn open(dir: &Path, batch: usize) -> io::Result<Self> {
        Ok(Self {
            read_dir: fs::read_dir(dir).await?,
            batch: batch.max(1),
        })
    }

    /// Next batch of raw entries. An empty batch means the walk is over.
    pub async fn read_entries(&mut self) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::with_capacity(self.batch);
        while entries.len() < self.batch {
            match self.read_dir.next_entry().await? {
                Some(entry) => entries.push(entry),
                None => break,
            }
        }
        Ok(entries)
    }

    /// Regular files only, in the order the directory yields them.
    pub fn into_stream(self) -> impl Stream<Item = Result<(String, FileHandle)>> {
        stream::unfold(
            (self, VecDeque::new()),
            |(mut reader, mut pending)| async move {
                loop {
                    if let Some(entry) = pending.pop_front() {
                        return Some((Ok(entry), (reader, pending)));
                    }
                    let batch = match reader.read_entries().await {
                        Ok(batch) if batch.is_empty() => return None,
                        Ok(batch) => batch,
                        Err(e) => return Some((Err(e.into()), (reader, pending))),
                    };
                    for entry in batch {
                        match file_entry(&entry).await {
                            Ok(Some(found)) => pending.push_back(found),
                            Ok(None) => {}
                            Err(e) => return Some((Err(e.into()), (reader, pending))),
                        }
                    }
                }
            },
        )
    }
}

/// Map a directory entry to a registry entry, skipping subdirectories and
/// the region's own artifacts.
async fn file_entry(entry: &DirEntry) -> io::Result<Option<(String, FileHandle)>> {
    if !entry.file_type().await?.is_file() {
        return Ok(None);
    }
    let Ok(name) = entry.file_name().into_string() else {
        log::warn!("skipping non-UTF-8 sandbox entry {:?}", entry.path());
        return Ok(None);
    };
    if name.starts_with(RESERVED_PREFIX) {
        return Ok(None);
    }
    Ok(Some((name, FileHandle::file(entry.path()))))
}
