// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead and opportunity records.

use rayhub_core::RayhubError;
use rayhub_core::types::{Lead, LeadKind};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, enum_col, map_tr_err, opt_enum_col};
use crate::models::NewLead;

/// Column list matching [`row_to_lead`]. The unlinked-person flag is derived
/// from the client record.
pub(crate) const LEAD_COLUMNS: &str = "l.id, l.name, l.kind, l.client_id,
    CASE WHEN c.id IS NOT NULL AND c.is_company = 0 AND c.company_id IS NULL
         THEN 1 ELSE 0 END,
    l.team_id, l.stage_id, l.owner_id, l.last_operator_id, l.source,
    l.project_id, l.project_kind, l.outcome";

pub(crate) fn row_to_lead(row: &rusqlite::Row<'_>) -> rusqlite::Result<Lead> {
    Ok(Lead {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: enum_col(row, 2)?,
        client_id: row.get(3)?,
        client_unlinked_person: row.get(4)?,
        team_id: row.get(5)?,
        stage_id: row.get(6)?,
        owner_id: row.get(7)?,
        last_operator_id: row.get(8)?,
        source: row.get(9)?,
        project_id: row.get(10)?,
        project_kind: opt_enum_col(row, 11)?,
        outcome: opt_enum_col(row, 12)?,
    })
}

pub(crate) fn get_lead_tx(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<Lead>> {
    conn.query_row(
        &format!(
            "SELECT {LEAD_COLUMNS} FROM leads l LEFT JOIN clients c ON c.id = l.client_id
             WHERE l.id = ?1"
        ),
        params![id],
        row_to_lead,
    )
    .optional()
}

pub(crate) fn insert_lead_tx(conn: &rusqlite::Connection, lead: &NewLead) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO leads (name, kind, client_id, team_id, stage_id, owner_id, source)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            lead.name,
            LeadKind::Lead.to_string(),
            lead.client_id,
            lead.team_id,
            lead.stage_id,
            lead.owner_id,
            lead.source,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert a `lead`-kind record.
pub async fn create_lead(db: &Database, lead: NewLead) -> Result<Lead, RayhubError> {
    db.connection()
        .call(move |conn| -> Result<Lead, rusqlite::Error> {
            let id = insert_lead_tx(conn, &lead)?;
            get_lead_tx(conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a lead by id.
pub async fn get_lead(db: &Database, id: i64) -> Result<Option<Lead>, RayhubError> {
    db.connection()
        .call(move |conn| get_lead_tx(conn, id))
        .await
        .map_err(map_tr_err)
}

/// Client ids (from `client_ids`) that already have a lead without an outcome.
pub async fn clients_with_open_leads(
    db: &Database,
    client_ids: &[i64],
) -> Result<Vec<i64>, RayhubError> {
    let client_ids = client_ids.to_vec();
    db.connection()
        .call(move |conn| -> Result<Vec<i64>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT EXISTS(SELECT 1 FROM leads WHERE client_id = ?1 AND outcome IS NULL)",
            )?;
            let mut open = Vec::new();
            for id in client_ids {
                let exists: bool = stmt.query_row(params![id], |row| row.get(0))?;
                if exists {
                    open.push(id);
                }
            }
            Ok(open)
        })
        .await
        .map_err(map_tr_err)
}

/// Insert many leads in one transaction. Returns the new ids in input order.
pub async fn create_leads(db: &Database, leads: Vec<NewLead>) -> Result<Vec<i64>, RayhubError> {
    db.connection()
        .call(move |conn| -> Result<Vec<i64>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let mut ids = Vec::with_capacity(leads.len());
            for lead in &leads {
                ids.push(insert_lead_tx(&tx, lead)?);
            }
            tx.commit()?;
            Ok(ids)
        })
        .await
        .map_err(map_tr_err)
}

/// Leads currently owned by `owner_id`.
pub async fn list_by_owner(db: &Database, owner_id: i64) -> Result<Vec<Lead>, RayhubError> {
    db.connection()
        .call(move |conn| -> Result<Vec<Lead>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {LEAD_COLUMNS} FROM leads l LEFT JOIN clients c ON c.id = l.client_id
                 WHERE l.owner_id = ?1 ORDER BY l.id"
            ))?;
            let rows = stmt.query_map(params![owner_id], row_to_lead)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::users::{create_client, create_user};
    use tempfile::tempdir;

    #[tokio::test]
    async fn unlinked_person_flag_is_derived() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("t.db").to_str().unwrap())
            .await
            .unwrap();

        let acme = create_client(&db, "Acme", true, None).await.unwrap();
        let linked = create_client(&db, "Linked", false, Some(acme.id)).await.unwrap();
        let loner = create_client(&db, "Loner", false, None).await.unwrap();

        for (client, expect_unlinked) in [(acme.id, false), (linked.id, false), (loner.id, true)] {
            let lead = create_lead(
                &db,
                NewLead {
                    name: "L".into(),
                    client_id: Some(client),
                    ..NewLead::default()
                },
            )
            .await
            .unwrap();
            assert_eq!(lead.kind, LeadKind::Lead);
            assert_eq!(lead.client_unlinked_person, expect_unlinked);
        }

        let orphan = create_lead(&db, NewLead { name: "No client".into(), ..NewLead::default() })
            .await
            .unwrap();
        assert!(orphan.client_id.is_none());
        assert!(!orphan.client_unlinked_person);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_leads_and_bulk_insert() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("t.db").to_str().unwrap())
            .await
            .unwrap();
        let op = create_user(&db, "Op", None).await.unwrap();
        let a = create_client(&db, "A", true, None).await.unwrap();
        let b = create_client(&db, "B", true, None).await.unwrap();

        let ids = create_leads(
            &db,
            vec![NewLead {
                name: "A".into(),
                client_id: Some(a.id),
                owner_id: Some(op.id),
                ..NewLead::default()
            }],
        )
        .await
        .unwrap();
        assert_eq!(ids.len(), 1);

        let open = clients_with_open_leads(&db, &[a.id, b.id]).await.unwrap();
        assert_eq!(open, vec![a.id]);
        assert_eq!(list_by_owner(&db, op.id).await.unwrap().len(), 1);

        db.close().await.unwrap();
    }
}
