//! Result printing: plain `name<TAB>url` lines or JSON.

use filekeep_core::{FileHandle, RegistrySnapshot};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Debug, Serialize, PartialEq)]
pub struct Entry {
    pub name: String,
    pub url: String,
}

impl Entry {
    pub fn new(name: &str, handle: &FileHandle) -> Self {
        Self {
            name: name.to_string(),
            url: handle.url(),
        }
    }
}

pub fn entries(snapshot: &RegistrySnapshot) -> Vec<Entry> {
    snapshot
        .iter()
        .map(|(name, handle)| Entry::new(name, handle))
        .collect()
}

pub struct OutputHandler {
    json: bool,
}

impl OutputHandler {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn emit_entries(&self, out: &mut impl Write, entries: &[Entry]) -> io::Result<()> {
        if self.json {
            serde_json::to_writer_pretty(&mut *out, entries).map_err(io::Error::other)?;
            writeln!(out)
        } else {
            for entry in entries {
                writeln!(out, "{}\t{}", entry.name, entry.url)?;
            }
            Ok(())
        }
    }

    pub fn emit_value(&self, out: &mut impl Write, key: &str, value: &str) -> io::Result<()> {
        if self.json {
            writeln!(out, "{}", serde_json::json!({ key: value }))
        } else {
            writeln!(out, "{}", value)
        }
    }
}
