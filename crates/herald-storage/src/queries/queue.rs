// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable dispatch queue.
//!
//! Entries move `pending -> processing -> completed`, or back to `pending`
//! on failure until `max_attempts` is reached. A `processing` entry whose
//! lock has expired is claimable again, so a worker that died mid-task does
//! not strand its entry.

use herald_core::HeraldError;
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err};
use crate::models::QueueEntry;

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<QueueEntry> {
    Ok(QueueEntry {
        id: row.get(0)?,
        queue_name: row.get(1)?,
        payload: row.get(2)?,
        status: row.get(3)?,
        attempts: row.get(4)?,
        max_attempts: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        locked_until: row.get(8)?,
    })
}

/// Enqueues a payload. Returns the queue entry id.
pub async fn enqueue(db: &Database, queue_name: &str, payload: &str) -> Result<i64, HeraldError> {
    let queue_name = queue_name.to_string();
    let payload = payload.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<i64> {
            conn.execute(
                "INSERT INTO queue (queue_name, payload) VALUES (?1, ?2)",
                params![queue_name, payload],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Enqueues a payload unless an identical one is still pending or
/// processing in the same queue. Returns the new entry id, or `None` if the
/// payload was already queued.
pub async fn enqueue_unique(
    db: &Database,
    queue_name: &str,
    payload: &str,
) -> Result<Option<i64>, HeraldError> {
    let queue_name = queue_name.to_string();
    let payload = payload.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<i64>> {
            let inserted = conn.execute(
                "INSERT INTO queue (queue_name, payload)
                 SELECT ?1, ?2
                 WHERE NOT EXISTS (
                     SELECT 1 FROM queue
                     WHERE queue_name = ?1 AND payload = ?2
                       AND status IN ('pending', 'processing')
                 )",
                params![queue_name, payload],
            )?;
            Ok((inserted > 0).then(|| conn.last_insert_rowid()))
        })
        .await
        .map_err(map_tr_err)
}

/// Claims the oldest claimable entry of the named queue and locks it for
/// five minutes. Returns `None` if nothing is claimable.
pub async fn dequeue(db: &Database, queue_name: &str) -> Result<Option<QueueEntry>, HeraldError> {
    let queue_name = queue_name.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<QueueEntry>> {
            let tx = conn.transaction()?;
            let entry = tx
                .query_row(
                    "UPDATE queue SET status = 'processing',
                     locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', '+5 minutes'),
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = (
                         SELECT id FROM queue
                         WHERE queue_name = ?1
                           AND (status = 'pending'
                                OR (status = 'processing'
                                    AND locked_until < strftime('%Y-%m-%dT%H:%M:%fZ', 'now')))
                         ORDER BY id ASC
                         LIMIT 1
                     )
                     RETURNING id, queue_name, payload, status, attempts, max_attempts,
                               created_at, updated_at, locked_until",
                    params![queue_name],
                    entry_from_row,
                )
                .optional()?;
            tx.commit()?;
            Ok(entry)
        })
        .await
        .map_err(map_tr_err)
}

/// Marks an entry as completed.
pub async fn ack(db: &Database, id: i64) -> Result<(), HeraldError> {
    db.connection()
        .call(move |conn| -> rusqlite::Result<()> {
            conn.execute(
                "UPDATE queue SET status = 'completed', locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Records a failed attempt.
///
/// Returns true if the entry went back to `pending` for another attempt and
/// false if it is now permanently `failed`.
pub async fn fail(db: &Database, id: i64) -> Result<bool, HeraldError> {
    let status: Option<String> = db
        .connection()
        .call(move |conn| -> rusqlite::Result<Option<String>> {
            conn.query_row(
                "UPDATE queue SET attempts = attempts + 1,
                 status = CASE WHEN attempts + 1 >= max_attempts THEN 'failed' ELSE 'pending' END,
                 locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1
                 RETURNING status",
                params![id],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    match status.as_deref() {
        Some(status) => Ok(status == crate::models::queue_status::PENDING),
        None => Err(HeraldError::Storage {
            source: format!("queue entry {id} not found").into(),
        }),
    }
}

/// Number of entries waiting in the named queue.
pub async fn pending_count(db: &Database, queue_name: &str) -> Result<i64, HeraldError> {
    let queue_name = queue_name.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<i64> {
            conn.query_row(
                "SELECT COUNT(*) FROM queue WHERE queue_name = ?1 AND status = 'pending'",
                params![queue_name],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}
