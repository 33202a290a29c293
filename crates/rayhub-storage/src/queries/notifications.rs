// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chatter posts on leads and orders.

use rayhub_core::RayhubError;
use rayhub_core::types::Notification;
use rusqlite::params;

use crate::database::{Database, map_tr_err};

fn row_to_notification(row: &rusqlite::Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        target_model: row.get(1)?,
        target_id: row.get(2)?,
        recipient_id: row.get(3)?,
        body: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Post a message on a record, optionally mentioning a user.
pub async fn notify(
    db: &Database,
    target_model: &str,
    target_id: i64,
    recipient_id: Option<i64>,
    body: &str,
) -> Result<Notification, RayhubError> {
    let target_model = target_model.to_string();
    let body = body.to_string();
    db.connection()
        .call(move |conn| -> Result<Notification, rusqlite::Error> {
            conn.query_row(
                "INSERT INTO notifications (target_model, target_id, recipient_id, body)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING id, target_model, target_id, recipient_id, body, created_at",
                params![target_model, target_id, recipient_id, body],
                row_to_notification,
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Posts on a record, oldest first.
pub async fn list_for(
    db: &Database,
    target_model: &str,
    target_id: i64,
) -> Result<Vec<Notification>, RayhubError> {
    let target_model = target_model.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<Notification>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, target_model, target_id, recipient_id, body, created_at
                 FROM notifications WHERE target_model = ?1 AND target_id = ?2 ORDER BY id",
            )?;
            let rows = stmt.query_map(params![target_model, target_id], row_to_notification)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
