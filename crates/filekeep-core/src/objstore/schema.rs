//! Database schema and migration system for the object store.
//!
//! Migrations are append-only: never edit existing entries, only add new
//! ones. `open_db` is the single entry point: it opens the database, enables
//! WAL, and applies any pending migrations, creating the `files` collection
//! on first use.

use rusqlite::{Connection, Result as SqlResult, TransactionBehavior};
use std::path::Path;

/// A single schema migration. Migrations are applied in order and tracked in `schema_meta`.
struct Migration {
    version: u32,
    sql: &'static str,
}

/// Append-only migration list. New entries go at the end.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: "
        CREATE TABLE IF NOT EXISTS files (
            name      TEXT PRIMARY KEY NOT NULL,
            data      BLOB NOT NULL,
            stored_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
    ",
}];

/// Open (or create) the object store database at `path`, enable WAL mode,
/// and apply any pending migrations. Returns the ready-to-use connection.
pub fn open_db(path: &Path) -> SqlResult<Connection> {
    let conn = Connection::open(path)?;

    // WAL mode for concurrent reads + single writer without blocking.
    conn.pragma_update(None, "journal_mode", "wal")?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;

    // Bootstrap the migration-tracking table (idempotent).
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_meta (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    apply_migrations(&conn)?;
    Ok(conn)
}

/// Apply all migrations whose version hasn't been recorded yet.
fn apply_migrations(conn: &Connection) -> SqlResult<()> {
    let max_applied: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_meta",
        [],
        |row| row.get(0),
    )?;

    for m in MIGRATIONS {
        if m.version > max_applied {
            conn.execute_batch(m.sql)?;
            conn.execute("INSERT INTO schema_meta (version) VALUES (?1)", [m.version])?;
        }
    }
    Ok(())
}

/// Whether an object store can live at `path`: the database opens, the
/// collection exists, and both read-only and read-write transactions can
/// be started.
pub fn probe(path: &Path) -> bool {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            log::warn!("object store directory {} unusable: {}", parent.display(), e);
            return false;
        }
    }
    match check_transactions(path) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("object store at {} unusable: {}", path.display(), e);
            false
        }
    }
}

fn check_transactions(path: &Path) -> SqlResult<()> {
    let mut conn = open_db(path)?;
    conn.transaction_with_behavior(TransactionBehavior::Deferred)?
        .rollback()?;
    conn.transaction_with_behavior(TransactionBehavior::Immediate)?
        .rollback()?;
    Ok(())
}
