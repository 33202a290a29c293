// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Proposal generation jobs, one per sales order.

use rayhub_core::RayhubError;
use rayhub_core::types::{Attachment, ProposalKind, ProposalRequest, ProposalStatus};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, enum_col, flatten, map_tr_err, opt_enum_col};
use crate::models::NewAttachment;
use crate::queries::attachments::insert_attachment_tx;

/// Owner model used for order attachments and chatter.
pub const ORDER_MODEL: &str = "order";

const PROPOSAL_COLUMNS: &str =
    "order_id, order_name, lead_id, kind, mode, equipment, status, updated_at";

fn row_to_proposal(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProposalRequest> {
    Ok(ProposalRequest {
        order_id: row.get(0)?,
        order_name: row.get(1)?,
        lead_id: row.get(2)?,
        kind: opt_enum_col(row, 3)?,
        mode: row.get(4)?,
        equipment: row.get(5)?,
        status: enum_col(row, 6)?,
        updated_at: row.get(7)?,
    })
}

fn get_tx(conn: &rusqlite::Connection, order_id: i64) -> rusqlite::Result<Option<ProposalRequest>> {
    conn.query_row(
        &format!("SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE order_id = ?1"),
        params![order_id],
        row_to_proposal,
    )
    .optional()
}

/// Register a sales order, or refresh its name and linked lead.
pub async fn upsert_order(
    db: &Database,
    order_id: i64,
    order_name: &str,
    lead_id: Option<i64>,
) -> Result<ProposalRequest, RayhubError> {
    let order_name = order_name.to_string();
    db.connection()
        .call(move |conn| -> Result<ProposalRequest, rusqlite::Error> {
            conn.query_row(
                &format!(
                    "INSERT INTO proposals (order_id, order_name, lead_id, status)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(order_id) DO UPDATE SET
                         order_name = excluded.order_name,
                         lead_id = coalesce(excluded.lead_id, proposals.lead_id)
                     RETURNING {PROPOSAL_COLUMNS}"
                ),
                params![
                    order_id,
                    order_name,
                    lead_id,
                    ProposalStatus::NotGenerated.to_string()
                ],
                row_to_proposal,
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch an order's proposal job.
pub async fn get(db: &Database, order_id: i64) -> Result<Option<ProposalRequest>, RayhubError> {
    db.connection()
        .call(move |conn| get_tx(conn, order_id))
        .await
        .map_err(map_tr_err)
}

/// Record what was sent to the generator and mark the job pending.
pub async fn mark_pending(
    db: &Database,
    order_id: i64,
    kind: ProposalKind,
    mode: Option<&str>,
    equipment: &str,
) -> Result<ProposalRequest, RayhubError> {
    let mode = mode.map(str::to_string);
    let equipment = equipment.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<ProposalRequest>, rusqlite::Error> {
            conn.execute(
                "UPDATE proposals SET kind = ?1, mode = ?2, equipment = ?3, status = ?4,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE order_id = ?5",
                params![
                    kind.to_string(),
                    mode,
                    equipment,
                    ProposalStatus::Pending.to_string(),
                    order_id
                ],
            )?;
            get_tx(conn, order_id)
        })
        .await
        .map_err(map_tr_err)?
        .ok_or_else(|| RayhubError::not_found("order", order_id))
}

/// Attach the generated document and mark the job done, atomically.
pub async fn complete(
    db: &Database,
    order_id: i64,
    document: NewAttachment,
) -> Result<(ProposalRequest, Attachment), RayhubError> {
    let result = db
        .connection()
        .call(
            move |conn| -> Result<Result<(ProposalRequest, Attachment), RayhubError>, rusqlite::Error> {
                let tx = conn.transaction()?;
                let changed = tx.execute(
                    "UPDATE proposals SET status = ?1,
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE order_id = ?2",
                    params![ProposalStatus::Done.to_string(), order_id],
                )?;
                if changed == 0 {
                    return Ok(Err(RayhubError::not_found("order", order_id)));
                }
                let attachment = insert_attachment_tx(&tx, ORDER_MODEL, order_id, &document)?;
                let Some(proposal) = get_tx(&tx, order_id)? else {
                    return Ok(Err(RayhubError::not_found("order", order_id)));
                };
                tx.commit()?;
                Ok(Ok((proposal, attachment)))
            },
        )
        .await;
    flatten(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn lifecycle_none_pending_done() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("t.db").to_str().unwrap())
            .await
            .unwrap();

        let job = upsert_order(&db, 42, "S00042", None).await.unwrap();
        assert_eq!(job.status, ProposalStatus::NotGenerated);
        assert!(job.kind.is_none());

        let pending = mark_pending(&db, 42, ProposalKind::Ses, Some("consumption"), "{}")
            .await
            .unwrap();
        assert_eq!(pending.status, ProposalStatus::Pending);
        assert_eq!(pending.kind, Some(ProposalKind::Ses));
        assert_eq!(pending.mode.as_deref(), Some("consumption"));

        let (done, pdf) = complete(
            &db,
            42,
            NewAttachment {
                filename: "KP.pdf".into(),
                mimetype: "application/pdf".into(),
                data: b"%PDF-1.7".to_vec(),
            },
        )
        .await
        .unwrap();
        assert_eq!(done.status, ProposalStatus::Done);
        assert_eq!(pdf.owner_model, ORDER_MODEL);
        assert_eq!(pdf.owner_id, 42);

        // Renaming keeps the linked lead when none is given.
        let renamed = upsert_order(&db, 42, "S00042-2", None).await.unwrap();
        assert_eq!(renamed.order_name, "S00042-2");
        assert_eq!(renamed.status, ProposalStatus::Done);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("t.db").to_str().unwrap())
            .await
            .unwrap();
        assert!(get(&db, 1).await.unwrap().is_none());
        assert!(matches!(
            mark_pending(&db, 1, ProposalKind::Uze, None, "{}").await.unwrap_err(),
            RayhubError::NotFound { .. }
        ));
        let err = complete(
            &db,
            1,
            NewAttachment {
                filename: "x.pdf".into(),
                mimetype: "application/pdf".into(),
                data: vec![],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RayhubError::NotFound { .. }));
        db.close().await.unwrap();
    }
}
