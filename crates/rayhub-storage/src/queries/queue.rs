// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assignment queues: round-robin selection of the next eligible assignee.
//!
//! Order within a queue is `rank`, then never-assigned entries, then the
//! oldest `last_assigned`, then `id`. Paused entries are never selected.

use rayhub_core::RayhubError;
use rayhub_core::types::{QueueEntry, QueueType};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, enum_col, flatten, is_unique_violation, map_tr_err};

const ENTRY_COLUMNS: &str =
    "id, user_id, queue_type, rank, paused, assignment_count, last_assigned";

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<QueueEntry> {
    Ok(QueueEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        queue_type: enum_col(row, 2)?,
        rank: row.get(3)?,
        paused: row.get(4)?,
        assignment_count: row.get(5)?,
        last_assigned: row.get(6)?,
    })
}

/// One row of an assignment-sheet import: a user and the queues they serve.
#[derive(Debug, Clone)]
pub struct QueueImportRow {
    pub user_id: i64,
    pub queues: Vec<QueueType>,
}

/// Rank given to imported entries: 10 plus the queue's sheet column.
fn import_rank(queue_type: QueueType) -> i64 {
    10 + match queue_type {
        QueueType::Kcc => 0,
        QueueType::Incoming => 1,
        QueueType::Credit => 2,
    }
}

pub(crate) fn pick_next_tx(
    conn: &rusqlite::Connection,
    queue_type: QueueType,
) -> rusqlite::Result<Option<QueueEntry>> {
    conn.query_row(
        &format!(
            "SELECT {ENTRY_COLUMNS} FROM queue_entries
             WHERE queue_type = ?1 AND paused = 0
             ORDER BY rank ASC, last_assigned IS NOT NULL, last_assigned ASC, id ASC
             LIMIT 1"
        ),
        params![queue_type.to_string()],
        row_to_entry,
    )
    .optional()
}

/// Increment the counter and stamp the assignment time. The stamp never
/// moves backwards, even if the clock does.
pub(crate) fn mark_assigned_tx(
    conn: &rusqlite::Connection,
    id: i64,
) -> rusqlite::Result<Option<QueueEntry>> {
    let changed = conn.execute(
        "UPDATE queue_entries
         SET assignment_count = assignment_count + 1,
             last_assigned = max(
                 coalesce(last_assigned, ''),
                 strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
         WHERE id = ?1",
        params![id],
    )?;
    if changed == 0 {
        return Ok(None);
    }
    get_entry_tx(conn, id)
}

fn get_entry_tx(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<QueueEntry>> {
    conn.query_row(
        &format!("SELECT {ENTRY_COLUMNS} FROM queue_entries WHERE id = ?1"),
        params![id],
        row_to_entry,
    )
    .optional()
}

pub(crate) fn find_entry_tx(
    conn: &rusqlite::Connection,
    user_id: i64,
    queue_type: QueueType,
) -> rusqlite::Result<Option<QueueEntry>> {
    conn.query_row(
        &format!(
            "SELECT {ENTRY_COLUMNS} FROM queue_entries WHERE user_id = ?1 AND queue_type = ?2"
        ),
        params![user_id, queue_type.to_string()],
        row_to_entry,
    )
    .optional()
}

/// Peek at the entry `assign_next` would pick. Read-only.
pub async fn get_next(
    db: &Database,
    queue_type: QueueType,
) -> Result<Option<QueueEntry>, RayhubError> {
    db.connection()
        .call(move |conn| pick_next_tx(conn, queue_type))
        .await
        .map_err(map_tr_err)
}

/// Record one assignment against an entry.
pub async fn mark_assigned(db: &Database, id: i64) -> Result<QueueEntry, RayhubError> {
    db.connection()
        .call(move |conn| mark_assigned_tx(conn, id))
        .await
        .map_err(map_tr_err)?
        .ok_or_else(|| RayhubError::not_found("queue entry", id))
}

/// Atomically pick the next eligible entry and mark it assigned.
pub async fn assign_next(db: &Database, queue_type: QueueType) -> Result<QueueEntry, RayhubError> {
    let result = db
        .connection()
        .call(move |conn| -> Result<Result<QueueEntry, RayhubError>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let Some(entry) = pick_next_tx(&tx, queue_type)? else {
                return Ok(Err(RayhubError::NoCandidate {
                    queue: queue_type.to_string(),
                }));
            };
            let marked = mark_assigned_tx(&tx, entry.id)?;
            tx.commit()?;
            Ok(marked.ok_or_else(|| RayhubError::not_found("queue entry", entry.id)))
        })
        .await;
    let entry = flatten(result)?;
    tracing::debug!(queue = %queue_type, user_id = entry.user_id, "queue assignment");
    Ok(entry)
}

/// Add a user to a queue. A user appears at most once per queue.
pub async fn add_entry(
    db: &Database,
    user_id: i64,
    queue_type: QueueType,
    rank: i64,
) -> Result<QueueEntry, RayhubError> {
    let result = db
        .connection()
        .call(move |conn| -> Result<Result<QueueEntry, RayhubError>, rusqlite::Error> {
            match conn.execute(
                "INSERT INTO queue_entries (user_id, queue_type, rank) VALUES (?1, ?2, ?3)",
                params![user_id, queue_type.to_string(), rank],
            ) {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    return Ok(Err(RayhubError::validation(format!(
                        "user {user_id} is already in the {queue_type} queue"
                    ))));
                }
                Err(e) => return Err(e),
            }
            let id = conn.last_insert_rowid();
            Ok(get_entry_tx(conn, id)?.ok_or_else(|| RayhubError::not_found("queue entry", id)))
        })
        .await;
    flatten(result)
}

/// Pause or resume an entry.
pub async fn set_paused(db: &Database, id: i64, paused: bool) -> Result<QueueEntry, RayhubError> {
    db.connection()
        .call(move |conn| -> Result<Option<QueueEntry>, rusqlite::Error> {
            conn.execute(
                "UPDATE queue_entries SET paused = ?1 WHERE id = ?2",
                params![paused, id],
            )?;
            get_entry_tx(conn, id)
        })
        .await
        .map_err(map_tr_err)?
        .ok_or_else(|| RayhubError::not_found("queue entry", id))
}

/// Look up a user's entry in one queue.
pub async fn find_entry(
    db: &Database,
    user_id: i64,
    queue_type: QueueType,
) -> Result<Option<QueueEntry>, RayhubError> {
    db.connection()
        .call(move |conn| find_entry_tx(conn, user_id, queue_type))
        .await
        .map_err(map_tr_err)
}

/// List entries in selection order, optionally restricted to one queue.
pub async fn list_entries(
    db: &Database,
    queue_type: Option<QueueType>,
) -> Result<Vec<QueueEntry>, RayhubError> {
    db.connection()
        .call(move |conn| -> Result<Vec<QueueEntry>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM queue_entries
                 WHERE ?1 IS NULL OR queue_type = ?1
                 ORDER BY queue_type, rank, last_assigned IS NOT NULL, last_assigned, id"
            ))?;
            let rows = stmt.query_map(params![queue_type.map(|q| q.to_string())], row_to_entry)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Replace every queue entry with the given rows. Returns the number created.
pub async fn import_rows(db: &Database, rows: Vec<QueueImportRow>) -> Result<usize, RayhubError> {
    let created = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM queue_entries", [])?;
            let mut created = 0;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR IGNORE INTO queue_entries (user_id, queue_type, rank)
                     VALUES (?1, ?2, ?3)",
                )?;
                for row in &rows {
                    for queue_type in &row.queues {
                        created += stmt.execute(params![
                            row.user_id,
                            queue_type.to_string(),
                            import_rank(*queue_type)
                        ])?;
                    }
                }
            }
            tx.commit()?;
            Ok(created)
        })
        .await
        .map_err(map_tr_err)?;
    tracing::info!(created, "queue entries imported");
    Ok(created)
}
