// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Binary files attached to records.

use rayhub_core::RayhubError;
use rayhub_core::types::Attachment;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::NewAttachment;

fn row_to_attachment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Attachment> {
    Ok(Attachment {
        id: row.get(0)?,
        owner_model: row.get(1)?,
        owner_id: row.get(2)?,
        filename: row.get(3)?,
        mimetype: row.get(4)?,
        data: row.get(5)?,
    })
}

pub(crate) fn insert_attachment_tx(
    conn: &rusqlite::Connection,
    owner_model: &str,
    owner_id: i64,
    file: &NewAttachment,
) -> rusqlite::Result<Attachment> {
    conn.execute(
        "INSERT INTO attachments (owner_model, owner_id, filename, mimetype, data)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![owner_model, owner_id, file.filename, file.mimetype, file.data],
    )?;
    Ok(Attachment {
        id: conn.last_insert_rowid(),
        owner_model: owner_model.to_string(),
        owner_id,
        filename: file.filename.clone(),
        mimetype: file.mimetype.clone(),
        data: file.data.clone(),
    })
}

pub(crate) fn list_for_tx(
    conn: &rusqlite::Connection,
    owner_model: &str,
    owner_id: i64,
) -> rusqlite::Result<Vec<Attachment>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_model, owner_id, filename, mimetype, data FROM attachments
         WHERE owner_model = ?1 AND owner_id = ?2 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![owner_model, owner_id], row_to_attachment)?;
    rows.collect()
}

/// Store a file against a record.
pub async fn add_attachment(
    db: &Database,
    owner_model: &str,
    owner_id: i64,
    file: NewAttachment,
) -> Result<Attachment, RayhubError> {
    let owner_model = owner_model.to_string();
    db.connection()
        .call(move |conn| insert_attachment_tx(conn, &owner_model, owner_id, &file))
        .await
        .map_err(map_tr_err)
}

/// Files attached to a record, oldest first.
pub async fn list_for(
    db: &Database,
    owner_model: &str,
    owner_id: i64,
) -> Result<Vec<Attachment>, RayhubError> {
    let owner_model = owner_model.to_string();
    db.connection()
        .call(move |conn| list_for_tx(conn, &owner_model, owner_id))
        .await
        .map_err(map_tr_err)
}
