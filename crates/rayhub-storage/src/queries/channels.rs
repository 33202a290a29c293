// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Internal discussion channels and their messages.

use rayhub_core::RayhubError;
use rayhub_core::types::{Attachment, Channel, ChannelMessage};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, enum_col, map_tr_err};
use crate::models::NewMessage;
use crate::queries::attachments::{insert_attachment_tx, list_for_tx};

/// Owner model used for message attachments.
pub const MESSAGE_MODEL: &str = "channel_message";

const MESSAGE_COLUMNS: &str = "id, channel_id, author, body, kind, origin, created_at";

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChannelMessage> {
    Ok(ChannelMessage {
        id: row.get(0)?,
        channel_id: row.get(1)?,
        author: row.get(2)?,
        body: row.get(3)?,
        kind: enum_col(row, 4)?,
        origin: enum_col(row, 5)?,
        created_at: row.get(6)?,
    })
}

pub(crate) fn insert_channel_tx(
    conn: &rusqlite::Connection,
    name: &str,
    description: Option<&str>,
) -> rusqlite::Result<Channel> {
    conn.execute(
        "INSERT INTO channels (name, description) VALUES (?1, ?2)",
        params![name, description],
    )?;
    Ok(Channel {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        description: description.map(str::to_string),
    })
}

/// Create a channel.
pub async fn create_channel(
    db: &Database,
    name: &str,
    description: Option<&str>,
) -> Result<Channel, RayhubError> {
    let name = name.to_string();
    let description = description.map(str::to_string);
    db.connection()
        .call(move |conn| insert_channel_tx(conn, &name, description.as_deref()))
        .await
        .map_err(map_tr_err)
}

/// Fetch a channel.
pub async fn get_channel(db: &Database, id: i64) -> Result<Option<Channel>, RayhubError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, name, description FROM channels WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Channel {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Store a message and its attachments in one transaction.
pub async fn post_message(
    db: &Database,
    message: NewMessage,
) -> Result<(ChannelMessage, Vec<Attachment>), RayhubError> {
    db.connection()
        .call(move |conn| -> Result<(ChannelMessage, Vec<Attachment>), rusqlite::Error> {
            let tx = conn.transaction()?;
            let stored = tx.query_row(
                &format!(
                    "INSERT INTO channel_messages (channel_id, author, body, kind, origin)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     RETURNING {MESSAGE_COLUMNS}"
                ),
                params![
                    message.channel_id,
                    message.author,
                    message.body,
                    message.kind.to_string(),
                    message.origin.to_string(),
                ],
                row_to_message,
            )?;
            let mut files = Vec::with_capacity(message.attachments.len());
            for file in &message.attachments {
                files.push(insert_attachment_tx(&tx, MESSAGE_MODEL, stored.id, file)?);
            }
            tx.commit()?;
            Ok((stored, files))
        })
        .await
        .map_err(map_tr_err)
}

/// Messages in a channel, oldest first.
pub async fn list_messages(
    db: &Database,
    channel_id: i64,
) -> Result<Vec<ChannelMessage>, RayhubError> {
    db.connection()
        .call(move |conn| -> Result<Vec<ChannelMessage>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM channel_messages WHERE channel_id = ?1 ORDER BY id"
            ))?;
            let rows = stmt.query_map(params![channel_id], row_to_message)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Attachments of one message.
pub async fn message_attachments(
    db: &Database,
    message_id: i64,
) -> Result<Vec<Attachment>, RayhubError> {
    db.connection()
        .call(move |conn| list_for_tx(conn, MESSAGE_MODEL, message_id))
        .await
        .map_err(map_tr_err)
}
