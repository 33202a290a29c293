// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pool of pre-created Telegram groups.
//!
//! An entry is `free` or `busy`; a busy entry is bound to exactly one
//! project and its discussion channel. Allocation is a single guarded
//! UPDATE, so two callers can never bind the same group.

use rayhub_core::RayhubError;
use rayhub_core::types::{ChatPoolEntry, ChatState};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, enum_col, flatten, is_unique_violation, map_tr_err};

const CHAT_COLUMNS: &str = "id, name, tg_chat_id, state, project_id, channel_id";

fn row_to_chat(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatPoolEntry> {
    Ok(ChatPoolEntry {
        id: row.get(0)?,
        name: row.get(1)?,
        tg_chat_id: row.get(2)?,
        state: enum_col(row, 3)?,
        project_id: row.get(4)?,
        channel_id: row.get(5)?,
    })
}

fn get_chat_tx(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<ChatPoolEntry>> {
    conn.query_row(
        &format!("SELECT {CHAT_COLUMNS} FROM telegram_chats WHERE id = ?1"),
        params![id],
        row_to_chat,
    )
    .optional()
}

/// Bind the first free group (by name, then id) to a project and channel.
///
/// `None` when the pool is exhausted.
pub(crate) fn allocate_tx(
    conn: &rusqlite::Connection,
    project_id: i64,
    channel_id: Option<i64>,
) -> rusqlite::Result<Option<ChatPoolEntry>> {
    conn.query_row(
        &format!(
            "UPDATE telegram_chats
             SET state = 'busy', project_id = ?1, channel_id = ?2
             WHERE id = (
                 SELECT id FROM telegram_chats WHERE state = 'free'
                 ORDER BY name, id LIMIT 1
             ) AND state = 'free'
             RETURNING {CHAT_COLUMNS}"
        ),
        params![project_id, channel_id],
        row_to_chat,
    )
    .optional()
}

/// Register a group in the pool as `free`.
pub async fn seed(db: &Database, name: &str, tg_chat_id: &str) -> Result<ChatPoolEntry, RayhubError> {
    let name = name.to_string();
    let tg_chat_id = tg_chat_id.trim().to_string();
    let result = db
        .connection()
        .call(move |conn| -> Result<Result<ChatPoolEntry, RayhubError>, rusqlite::Error> {
            match conn.execute(
                "INSERT INTO telegram_chats (name, tg_chat_id, state) VALUES (?1, ?2, ?3)",
                params![name, tg_chat_id, ChatState::Free.to_string()],
            ) {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    return Ok(Err(RayhubError::validation(format!(
                        "Telegram chat {tg_chat_id} is already in the pool"
                    ))));
                }
                Err(e) => return Err(e),
            }
            let id = conn.last_insert_rowid();
            Ok(get_chat_tx(conn, id)?.ok_or_else(|| RayhubError::not_found("chat", id)))
        })
        .await;
    flatten(result)
}

/// All pool entries, busy first, then by name.
pub async fn list(db: &Database) -> Result<Vec<ChatPoolEntry>, RayhubError> {
    db.connection()
        .call(|conn| -> Result<Vec<ChatPoolEntry>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CHAT_COLUMNS} FROM telegram_chats ORDER BY state, name, id"
            ))?;
            let rows = stmt.query_map([], row_to_chat)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch one entry.
pub async fn get(db: &Database, id: i64) -> Result<Option<ChatPoolEntry>, RayhubError> {
    db.connection()
        .call(move |conn| get_chat_tx(conn, id))
        .await
        .map_err(map_tr_err)
}

/// Look up an entry by its Telegram chat id.
pub async fn find_by_tg_chat(
    db: &Database,
    tg_chat_id: &str,
) -> Result<Option<ChatPoolEntry>, RayhubError> {
    let tg_chat_id = tg_chat_id.trim().to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {CHAT_COLUMNS} FROM telegram_chats WHERE tg_chat_id = ?1"),
                params![tg_chat_id],
                row_to_chat,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// The busy entry bound to a channel, if any.
pub async fn find_busy_by_channel(
    db: &Database,
    channel_id: i64,
) -> Result<Option<ChatPoolEntry>, RayhubError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {CHAT_COLUMNS} FROM telegram_chats
                     WHERE channel_id = ?1 AND state = 'busy'
                     ORDER BY id LIMIT 1"
                ),
                params![channel_id],
                row_to_chat,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Bind a free group to a project. Fails with `NoFreeChat` when exhausted.
pub async fn allocate(
    db: &Database,
    project_id: i64,
    channel_id: Option<i64>,
) -> Result<ChatPoolEntry, RayhubError> {
    let entry = db
        .connection()
        .call(move |conn| allocate_tx(conn, project_id, channel_id))
        .await
        .map_err(map_tr_err)?
        .ok_or(RayhubError::NoFreeChat)?;
    tracing::info!(chat = %entry.name, tg_chat_id = %entry.tg_chat_id, project_id, "chat allocated");
    Ok(entry)
}

/// Return a group to the pool, clearing its links regardless of state.
pub async fn release(db: &Database, id: i64) -> Result<ChatPoolEntry, RayhubError> {
    let entry = db
        .connection()
        .call(move |conn| -> Result<Option<ChatPoolEntry>, rusqlite::Error> {
            conn.execute(
                "UPDATE telegram_chats SET state = 'free', project_id = NULL, channel_id = NULL
                 WHERE id = ?1",
                params![id],
            )?;
            get_chat_tx(conn, id)
        })
        .await
        .map_err(map_tr_err)?
        .ok_or_else(|| RayhubError::not_found("chat", id))?;
    tracing::info!(chat = %entry.name, "chat released");
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::channels::create_channel;
    use crate::queries::projects::insert_bare_project;
    use rayhub_core::types::ProjectKind;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("t.db").to_str().unwrap())
            .await
            .unwrap();
        (db, dir)
    }

    async fn project(db: &Database, name: &str) -> i64 {
        insert_bare_project(db, name, ProjectKind::Ses).await.unwrap()
    }

    #[tokio::test]
    async fn allocate_picks_first_free_by_name() {
        let (db, _dir) = setup_db().await;
        seed(&db, "Rayton 02", "-1002").await.unwrap();
        seed(&db, "Rayton 01", "-1001").await.unwrap();
        let channel = create_channel(&db, "P1", None).await.unwrap();
        let p1 = project(&db, "P1").await;

        let entry = allocate(&db, p1, Some(channel.id)).await.unwrap();
        assert_eq!(entry.name, "Rayton 01");
        assert_eq!(entry.state, ChatState::Busy);
        assert_eq!(entry.project_id, Some(p1));
        assert_eq!(entry.channel_id, Some(channel.id));

        let bound = find_busy_by_channel(&db, channel.id).await.unwrap().unwrap();
        assert_eq!(bound.id, entry.id);
        let by_tg = find_by_tg_chat(&db, " -1001 ").await.unwrap().unwrap();
        assert_eq!(by_tg.id, entry.id);
    }

    #[tokio::test]
    async fn exhausted_pool_fails() {
        let (db, _dir) = setup_db().await;
        let p = project(&db, "P").await;
        assert!(matches!(
            allocate(&db, p, None).await.unwrap_err(),
            RayhubError::NoFreeChat
        ));

        seed(&db, "Only", "-1").await.unwrap();
        allocate(&db, p, None).await.unwrap();
        let q = project(&db, "Q").await;
        assert!(matches!(
            allocate(&db, q, None).await.unwrap_err(),
            RayhubError::NoFreeChat
        ));
    }

    #[tokio::test]
    async fn release_then_allocate_matches_fresh_allocation() {
        let (db, _dir) = setup_db().await;
        let seeded = seed(&db, "A", "-1").await.unwrap();
        let p = project(&db, "P").await;
        let q = project(&db, "Q").await;

        let first = allocate(&db, p, None).await.unwrap();
        let released = release(&db, first.id).await.unwrap();
        assert_eq!(released, seeded);

        let again = allocate(&db, q, None).await.unwrap();
        assert_eq!(again.id, seeded.id);
        assert_eq!(again.project_id, Some(q));

        // Releasing a free entry is harmless.
        release(&db, again.id).await.unwrap();
        assert_eq!(release(&db, again.id).await.unwrap().state, ChatState::Free);
        assert!(matches!(
            release(&db, 999).await.unwrap_err(),
            RayhubError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn duplicate_chat_id_is_rejected() {
        let (db, _dir) = setup_db().await;
        seed(&db, "A", "-100").await.unwrap();
        let err = seed(&db, "B", "-100").await.unwrap_err();
        assert!(matches!(err, RayhubError::Validation(_)));
        assert_eq!(list(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_allocations_never_share_an_entry() {
        let (db, _dir) = setup_db().await;
        for i in 0..3 {
            seed(&db, &format!("G{i}"), &format!("-{i}")).await.unwrap();
        }
        let mut projects = Vec::new();
        for i in 0..5 {
            projects.push(project(&db, &format!("P{i}")).await);
        }

        let mut handles = Vec::new();
        for p in projects {
            let db = db.clone();
            handles.push(tokio::spawn(async move { allocate(&db, p, None).await }));
        }
        let mut won = Vec::new();
        let mut exhausted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(entry) => won.push(entry.id),
                Err(RayhubError::NoFreeChat) => exhausted += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        won.sort();
        won.dedup();
        assert_eq!(won.len(), 3);
        assert_eq!(exhausted, 2);
    }

    #[tokio::test]
    async fn list_orders_busy_first_then_name() {
        let (db, _dir) = setup_db().await;
        seed(&db, "B", "-2").await.unwrap();
        seed(&db, "A", "-1").await.unwrap();
        seed(&db, "C", "-3").await.unwrap();
        let p = project(&db, "P").await;
        allocate(&db, p, None).await.unwrap();

        let names: Vec<_> = list(&db).await.unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        let states: Vec<_> = list(&db).await.unwrap().into_iter().map(|e| e.state).collect();
        assert_eq!(states, vec![ChatState::Busy, ChatState::Free, ChatState::Free]);
    }
}
