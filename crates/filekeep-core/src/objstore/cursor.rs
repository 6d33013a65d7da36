//! Forward cursor over the `files` collection.
//!
//! The walk runs inside one read-only transaction on the blocking pool and
//! hands rows over a bounded channel, in key order. The receiving side is a
//! plain stream: single pass, not restartable, and dropping it stops the walk
//! at the next row.

use futures_util::Stream;
use futures_util::stream;
use rusqlite::{Connection, TransactionBehavior};
use tokio::sync::mpsc;

use crate::error::Result;

/// A stored record: logical name and its bytes.
pub type Record = (String, Vec<u8>);

type RowSender = mpsc::Sender<Result<Record>>;

/// Start walking every record; `buffer` rows may be read ahead of the consumer.
pub fn open_cursor(conn: Connection, buffer: usize) -> impl Stream<Item = Result<Record>> {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    tokio::task::spawn_blocking(move || {
        if let Err(e) = walk(conn, &tx) {
            let _ = tx.blocking_send(Err(e.into()));
        }
    });
    stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|row| (row, rx)) })
}

fn walk(mut conn: Connection, tx: &RowSender) -> rusqlite::Result<()> {
    let txn = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
    {
        let mut stmt = txn.prepare("SELECT name, data FROM files ORDER BY name")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let record: Record = (row.get(0)?, row.get(1)?);
            if tx.blocking_send(Ok(record)).is_err() {
                log::debug!("cursor consumer dropped, stopping walk");
                break;
            }
        }
    }
    txn.commit()
}
