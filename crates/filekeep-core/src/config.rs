//! Configuration for filekeep.
//!
//! Loaded from `<home>/config.toml`. Every field has a default, so a missing
//! file (or a missing section) is fine; a malformed one is an error.

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, StoreError};

/// Environment variable overriding the home directory.
pub const HOME_ENV: &str = "FILEKEEP_HOME";

/// Default sandbox quota: 500 MiB.
pub const DEFAULT_QUOTA_BYTES: u64 = 500 * 1024 * 1024;

// ============================================================================
// Sections
// ============================================================================

/// Sandboxed filesystem backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub enabled: bool,
    /// Region root. Defaults to `<home>/sandbox`.
    pub root: Option<PathBuf>,
    pub quota_bytes: u64,
    /// Entries handed out per directory-reader batch.
    pub read_batch: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            root: None,
            quota_bytes: DEFAULT_QUOTA_BYTES,
            read_batch: 64,
        }
    }
}

/// Object store backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStoreConfig {
    pub enabled: bool,
    /// Database file. Defaults to `<home>/objects.db`.
    pub path: Option<PathBuf>,
    /// Rows buffered ahead of the consumer during a cursor walk.
    pub cursor_batch: usize,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            cursor_batch: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("filekeep/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Delays and bounds applied around storage suspension points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Pause after a sandbox write before the handle is handed out.
    pub settle_delay_ms: u64,
    /// Upper bound for every open, read batch, cursor step, fetch and write.
    pub op_timeout_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 500,
            op_timeout_secs: 30,
        }
    }
}

impl TimingConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_secs(self.op_timeout_secs)
    }
}

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sandbox: SandboxConfig,
    pub object_store: ObjectStoreConfig,
    pub fetch: FetchConfig,
    pub timing: TimingConfig,
}

impl Config {
    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| StoreError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load `<home>/config.toml` (defaults if absent) and resolve storage paths.
    pub fn load(home: &Path) -> Result<Self> {
        let config_path = home.join("config.toml");
        let config = match std::fs::read_to_string(&config_path) {
            Ok(content) => Self::from_toml(&content)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Config::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(config.resolve_paths(home))
    }

    /// Fill in default storage locations and anchor relative ones at `home`.
    pub fn resolve_paths(mut self, home: &Path) -> Self {
        let anchor = |p: PathBuf| if p.is_relative() { home.join(p) } else { p };
        self.sandbox.root = Some(anchor(
            self.sandbox.root.take().unwrap_or_else(|| PathBuf::from("sandbox")),
        ));
        self.object_store.path = Some(anchor(
            self.object_store
                .path
                .take()
                .unwrap_or_else(|| PathBuf::from("objects.db")),
        ));
        self
    }
}

/// Resolve the home directory.
///
/// Precedence:
/// 1. `home_override` parameter (from --home CLI flag)
/// 2. `FILEKEEP_HOME` environment variable
/// 3. `~/.filekeep` default
pub fn home_dir(home_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = home_override {
        return Ok(path);
    }
    if let Ok(home) = std::env::var(HOME_ENV) {
        return Ok(PathBuf::from(home));
    }
    let home = dirs_next::home_dir().ok_or_else(|| {
        StoreError::Io(std::io::Error::new(
            ErrorKind::NotFound,
            "Home directory not found",
        ))
    })?;
    Ok(home.join(".filekeep"))
}
