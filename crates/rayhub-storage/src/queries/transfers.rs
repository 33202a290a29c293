// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hand-off log and the lead transitions that append to it.
//!
//! Each transition runs as a single transaction: lead update, superseding of
//! prior records, the new record, and (for new leads) the queue bookkeeping.

use rayhub_core::RayhubError;
use rayhub_core::types::{
    Direction, LeadKind, Outcome, TransferKind, TransferRecord, TransferState,
};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, enum_col, flatten, map_tr_err, opt_enum_col};
use crate::models::{HandoffToManager, HandoffToOperator};
use crate::queries::leads::get_lead_tx;
use crate::queries::queue::{find_entry_tx, mark_assigned_tx, pick_next_tx};

const TRANSFER_COLUMNS: &str =
    "id, lead_id, operator_id, manager_id, kind, direction, state, notes, created_at";

fn row_to_transfer(row: &rusqlite::Row<'_>) -> rusqlite::Result<TransferRecord> {
    Ok(TransferRecord {
        id: row.get(0)?,
        lead_id: row.get(1)?,
        operator_id: row.get(2)?,
        manager_id: row.get(3)?,
        kind: opt_enum_col(row, 4)?,
        direction: enum_col(row, 5)?,
        state: enum_col(row, 6)?,
        notes: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn get_transfer_tx(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<TransferRecord> {
    conn.query_row(
        &format!("SELECT {TRANSFER_COLUMNS} FROM transfers WHERE id = ?1"),
        params![id],
        row_to_transfer,
    )
}

/// Manager of the most recent operator -> manager hand-off, whatever its state.
fn latest_manager_tx(conn: &rusqlite::Connection, lead_id: i64) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT manager_id FROM transfers
         WHERE lead_id = ?1 AND direction = 'to_manager' AND manager_id IS NOT NULL
         ORDER BY created_at DESC, id DESC LIMIT 1",
        params![lead_id],
        |row| row.get(0),
    )
    .optional()
}

fn supersede_active_tx(conn: &rusqlite::Connection, lead_id: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE transfers SET state = ?1
         WHERE lead_id = ?2 AND direction = ?3 AND state = ?4",
        params![
            TransferState::Returned.to_string(),
            lead_id,
            Direction::ToManager.to_string(),
            TransferState::Active.to_string(),
        ],
    )
}

/// Who would receive the lead if it were handed over now. Read-only.
///
/// New leads get the head of `queue`; old leads their previous manager.
pub async fn suggest_manager(
    db: &Database,
    lead_id: i64,
    kind: TransferKind,
    queue: rayhub_core::types::QueueType,
) -> Result<Option<i64>, RayhubError> {
    db.connection()
        .call(move |conn| -> Result<Option<i64>, rusqlite::Error> {
            match kind {
                TransferKind::New => Ok(pick_next_tx(conn, queue)?.map(|e| e.user_id)),
                TransferKind::Old => latest_manager_tx(conn, lead_id),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Hand a lead from an operator to a sales manager.
pub async fn transfer_to_manager(
    db: &Database,
    req: HandoffToManager,
) -> Result<TransferRecord, RayhubError> {
    let result = db
        .connection()
        .call(move |conn| -> Result<Result<TransferRecord, RayhubError>, rusqlite::Error> {
            let tx = conn.transaction()?;

            if get_lead_tx(&tx, req.lead_id)?.is_none() {
                return Ok(Err(RayhubError::not_found("lead", req.lead_id)));
            }

            let manager_id = match (req.manager_id, req.kind) {
                (Some(id), TransferKind::New) => {
                    if let Some(entry) = find_entry_tx(&tx, id, req.queue)? {
                        mark_assigned_tx(&tx, entry.id)?;
                    }
                    id
                }
                (Some(id), TransferKind::Old) => id,
                (None, TransferKind::New) => {
                    let Some(entry) = pick_next_tx(&tx, req.queue)? else {
                        return Ok(Err(RayhubError::NoCandidate {
                            queue: req.queue.to_string(),
                        }));
                    };
                    mark_assigned_tx(&tx, entry.id)?;
                    entry.user_id
                }
                (None, TransferKind::Old) => match latest_manager_tx(&tx, req.lead_id)? {
                    Some(id) => id,
                    None => {
                        return Ok(Err(RayhubError::validation(format!(
                            "lead {} has no previous manager; choose one explicitly",
                            req.lead_id
                        ))));
                    }
                },
            };

            supersede_active_tx(&tx, req.lead_id)?;

            tx.execute(
                "INSERT INTO transfers (lead_id, operator_id, manager_id, kind, direction, state, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    req.lead_id,
                    req.operator_id,
                    manager_id,
                    req.kind.to_string(),
                    Direction::ToManager.to_string(),
                    TransferState::Active.to_string(),
                    req.notes,
                ],
            )?;
            let id = tx.last_insert_rowid();

            tx.execute(
                "UPDATE leads SET kind = ?1,
                     team_id = coalesce(?2, team_id),
                     stage_id = coalesce(?3, stage_id),
                     owner_id = ?4,
                     last_operator_id = ?5,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?6",
                params![
                    LeadKind::Opportunity.to_string(),
                    req.sales_team_id,
                    req.sales_stage_id,
                    manager_id,
                    req.operator_id,
                    req.lead_id,
                ],
            )?;

            let record = get_transfer_tx(&tx, id)?;
            tx.commit()?;
            Ok(Ok(record))
        })
        .await;
    let record = flatten(result)?;
    tracing::info!(
        lead_id = record.lead_id,
        manager_id = ?record.manager_id,
        operator_id = ?record.operator_id,
        kind = ?record.kind,
        "lead handed to manager"
    );
    Ok(record)
}

/// Return a lead from its manager to the operator pool.
///
/// The operator is the lead's last operator, or the acting user when unknown.
pub async fn return_to_operator(
    db: &Database,
    req: HandoffToOperator,
) -> Result<TransferRecord, RayhubError> {
    let result = db
        .connection()
        .call(move |conn| -> Result<Result<TransferRecord, RayhubError>, rusqlite::Error> {
            let tx = conn.transaction()?;

            let Some(lead) = get_lead_tx(&tx, req.lead_id)? else {
                return Ok(Err(RayhubError::not_found("lead", req.lead_id)));
            };
            let operator_id = lead.last_operator_id.unwrap_or(req.acting_user_id);

            tx.execute(
                "UPDATE leads SET team_id = coalesce(?1, team_id),
                     stage_id = coalesce(?2, stage_id),
                     owner_id = ?3,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?4",
                params![
                    req.operator_team_id,
                    req.operator_stage_id,
                    operator_id,
                    req.lead_id,
                ],
            )?;

            supersede_active_tx(&tx, req.lead_id)?;

            tx.execute(
                "INSERT INTO transfers (lead_id, operator_id, manager_id, direction, state, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    req.lead_id,
                    operator_id,
                    req.acting_user_id,
                    Direction::ToOperator.to_string(),
                    TransferState::Active.to_string(),
                    req.notes,
                ],
            )?;
            let record = get_transfer_tx(&tx, tx.last_insert_rowid())?;
            tx.commit()?;
            Ok(Ok(record))
        })
        .await;
    let record = flatten(result)?;
    tracing::info!(
        lead_id = record.lead_id,
        operator_id = ?record.operator_id,
        "lead returned to operator"
    );
    Ok(record)
}

/// Close the active manager hand-off(s) of a lead with a terminal outcome.
///
/// Returns the number of transfer records updated.
pub async fn record_outcome(
    db: &Database,
    lead_id: i64,
    outcome: Outcome,
) -> Result<usize, RayhubError> {
    let result = db
        .connection()
        .call(move |conn| -> Result<Result<usize, RayhubError>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE leads SET outcome = ?1, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![outcome.to_string(), lead_id],
            )?;
            if changed == 0 {
                return Ok(Err(RayhubError::not_found("lead", lead_id)));
            }
            let closed = tx.execute(
                "UPDATE transfers SET state = ?1
                 WHERE lead_id = ?2 AND direction = ?3 AND state = ?4",
                params![
                    TransferState::from(outcome).to_string(),
                    lead_id,
                    Direction::ToManager.to_string(),
                    TransferState::Active.to_string(),
                ],
            )?;
            tx.commit()?;
            Ok(Ok(closed))
        })
        .await;
    let closed = flatten(result)?;
    tracing::info!(lead_id, %outcome, closed, "lead outcome recorded");
    Ok(closed)
}

/// Full hand-off history of a lead, oldest first.
pub async fn list_for_lead(db: &Database, lead_id: i64) -> Result<Vec<TransferRecord>, RayhubError> {
    db.connection()
        .call(move |conn| -> Result<Vec<TransferRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TRANSFER_COLUMNS} FROM transfers WHERE lead_id = ?1 ORDER BY id"
            ))?;
            let rows = stmt.query_map(params![lead_id], row_to_transfer)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewLead;
    use crate::queries::leads::{create_lead, get_lead};
    use crate::queries::queue::{add_entry, find_entry};
    use crate::queries::users::create_user;
    use rayhub_core::types::QueueType;
    use tempfile::tempdir;

    struct Fixture {
        db: Database,
        _dir: tempfile::TempDir,
        operator: i64,
        m1: i64,
        m2: i64,
        lead: i64,
    }

    async fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("t.db").to_str().unwrap())
            .await
            .unwrap();
        let operator = create_user(&db, "Operator", None).await.unwrap().id;
        let m1 = create_user(&db, "Manager 1", None).await.unwrap().id;
        let m2 = create_user(&db, "Manager 2", None).await.unwrap().id;
        add_entry(&db, m1, QueueType::Kcc, 10).await.unwrap();
        add_entry(&db, m2, QueueType::Kcc, 20).await.unwrap();
        let lead = create_lead(
            &db,
            NewLead {
                name: "Solar farm".into(),
                team_id: Some(1),
                stage_id: Some(1),
                owner_id: Some(operator),
                ..NewLead::default()
            },
        )
        .await
        .unwrap()
        .id;
        Fixture { db, _dir: dir, operator, m1, m2, lead }
    }

    fn handoff(f: &Fixture, kind: TransferKind, manager_id: Option<i64>) -> HandoffToManager {
        HandoffToManager {
            lead_id: f.lead,
            operator_id: f.operator,
            kind,
            manager_id,
            notes: Some("hot".into()),
            queue: QueueType::Kcc,
            sales_team_id: Some(2),
            sales_stage_id: Some(20),
        }
    }

    fn active_to_manager(records: &[TransferRecord]) -> usize {
        records
            .iter()
            .filter(|r| r.direction == Direction::ToManager && r.state == TransferState::Active)
            .count()
    }

    #[tokio::test]
    async fn new_lead_takes_queue_head_and_converts() {
        let f = fixture().await;
        let suggested = suggest_manager(&f.db, f.lead, TransferKind::New, QueueType::Kcc)
            .await
            .unwrap();
        assert_eq!(suggested, Some(f.m1));

        let record = transfer_to_manager(&f.db, handoff(&f, TransferKind::New, None))
            .await
            .unwrap();
        assert_eq!(record.manager_id, Some(f.m1));
        assert_eq!(record.state, TransferState::Active);
        assert_eq!(record.kind, Some(TransferKind::New));

        let lead = get_lead(&f.db, f.lead).await.unwrap().unwrap();
        assert_eq!(lead.kind, LeadKind::Opportunity);
        assert_eq!(lead.owner_id, Some(f.m1));
        assert_eq!(lead.last_operator_id, Some(f.operator));
        assert_eq!(lead.team_id, Some(2));
        assert_eq!(lead.stage_id, Some(20));

        let entry = find_entry(&f.db, f.m1, QueueType::Kcc).await.unwrap().unwrap();
        assert_eq!(entry.assignment_count, 1);
    }

    #[tokio::test]
    async fn explicit_manager_on_new_lead_counts_in_queue() {
        let f = fixture().await;
        transfer_to_manager(&f.db, handoff(&f, TransferKind::New, Some(f.m2)))
            .await
            .unwrap();
        let m2 = find_entry(&f.db, f.m2, QueueType::Kcc).await.unwrap().unwrap();
        let m1 = find_entry(&f.db, f.m1, QueueType::Kcc).await.unwrap().unwrap();
        assert_eq!(m2.assignment_count, 1);
        assert_eq!(m1.assignment_count, 0);
    }

    #[tokio::test]
    async fn old_lead_goes_back_to_previous_manager_without_queue() {
        let f = fixture().await;
        transfer_to_manager(&f.db, handoff(&f, TransferKind::New, Some(f.m2)))
            .await
            .unwrap();
        return_to_operator(
            &f.db,
            HandoffToOperator {
                lead_id: f.lead,
                acting_user_id: f.m2,
                notes: None,
                operator_team_id: Some(1),
                operator_stage_id: Some(5),
            },
        )
        .await
        .unwrap();

        assert_eq!(
            suggest_manager(&f.db, f.lead, TransferKind::Old, QueueType::Kcc)
                .await
                .unwrap(),
            Some(f.m2)
        );
        let record = transfer_to_manager(&f.db, handoff(&f, TransferKind::Old, None))
            .await
            .unwrap();
        assert_eq!(record.manager_id, Some(f.m2));
        let m2 = find_entry(&f.db, f.m2, QueueType::Kcc).await.unwrap().unwrap();
        assert_eq!(m2.assignment_count, 1);
    }

    #[tokio::test]
    async fn old_lead_without_history_is_rejected() {
        let f = fixture().await;
        let err = transfer_to_manager(&f.db, handoff(&f, TransferKind::Old, None))
            .await
            .unwrap_err();
        assert!(matches!(err, RayhubError::Validation(_)));
        assert!(list_for_lead(&f.db, f.lead).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeated_handoff_keeps_one_active_record() {
        let f = fixture().await;
        transfer_to_manager(&f.db, handoff(&f, TransferKind::New, None))
            .await
            .unwrap();
        transfer_to_manager(&f.db, handoff(&f, TransferKind::New, None))
            .await
            .unwrap();
        let records = list_for_lead(&f.db, f.lead).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(active_to_manager(&records), 1);
        assert_eq!(records[0].state, TransferState::Returned);
    }

    #[tokio::test]
    async fn return_flips_active_and_adds_one_to_operator_record() {
        let f = fixture().await;
        transfer_to_manager(&f.db, handoff(&f, TransferKind::New, None))
            .await
            .unwrap();
        let record = return_to_operator(
            &f.db,
            HandoffToOperator {
                lead_id: f.lead,
                acting_user_id: f.m1,
                notes: Some("no budget yet".into()),
                operator_team_id: Some(1),
                operator_stage_id: Some(5),
            },
        )
        .await
        .unwrap();
        assert_eq!(record.direction, Direction::ToOperator);
        assert_eq!(record.operator_id, Some(f.operator));
        assert_eq!(record.manager_id, Some(f.m1));

        let records = list_for_lead(&f.db, f.lead).await.unwrap();
        assert_eq!(active_to_manager(&records), 0);
        let to_operator: Vec<_> = records
            .iter()
            .filter(|r| r.direction == Direction::ToOperator && r.state == TransferState::Active)
            .collect();
        assert_eq!(to_operator.len(), 1);

        let lead = get_lead(&f.db, f.lead).await.unwrap().unwrap();
        assert_eq!(lead.owner_id, Some(f.operator));
        assert_eq!(lead.stage_id, Some(5));
    }

    #[tokio::test]
    async fn return_without_last_operator_uses_acting_user() {
        let f = fixture().await;
        let record = return_to_operator(
            &f.db,
            HandoffToOperator {
                lead_id: f.lead,
                acting_user_id: f.m1,
                notes: None,
                operator_team_id: None,
                operator_stage_id: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(record.operator_id, Some(f.m1));
        let lead = get_lead(&f.db, f.lead).await.unwrap().unwrap();
        assert_eq!(lead.team_id, Some(1));
    }

    #[tokio::test]
    async fn outcome_closes_active_record() {
        let f = fixture().await;
        transfer_to_manager(&f.db, handoff(&f, TransferKind::New, None))
            .await
            .unwrap();
        let closed = record_outcome(&f.db, f.lead, Outcome::Won).await.unwrap();
        assert_eq!(closed, 1);
        let records = list_for_lead(&f.db, f.lead).await.unwrap();
        assert_eq!(records[0].state, TransferState::Won);
        let lead = get_lead(&f.db, f.lead).await.unwrap().unwrap();
        assert_eq!(lead.outcome, Some(Outcome::Won));

        assert!(matches!(
            record_outcome(&f.db, 9999, Outcome::Lost).await.unwrap_err(),
            RayhubError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn empty_queue_leaves_lead_untouched() {
        let f = fixture().await;
        let mut req = handoff(&f, TransferKind::New, None);
        req.queue = QueueType::Credit;
        let err = transfer_to_manager(&f.db, req).await.unwrap_err();
        assert!(matches!(err, RayhubError::NoCandidate { .. }));
        let lead = get_lead(&f.db, f.lead).await.unwrap().unwrap();
        assert_eq!(lead.kind, LeadKind::Lead);
        assert_eq!(lead.owner_id, Some(f.operator));
    }
}
