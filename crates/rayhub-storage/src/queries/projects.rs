// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery projects created from won opportunities.

use rayhub_core::RayhubError;
use rayhub_core::types::{Channel, ChatPoolEntry, Project};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, enum_col, flatten, map_tr_err};
use crate::models::NewProject;
use crate::queries::channels::insert_channel_tx;
use crate::queries::chat_pool::allocate_tx;
use crate::queries::leads::get_lead_tx;

/// Records created together when a project is initiated.
#[derive(Debug, Clone, PartialEq)]
pub struct InitiatedProject {
    pub project: Project,
    pub channel: Channel,
    pub chat: ChatPoolEntry,
}

fn row_to_project(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: enum_col(row, 2)?,
        lead_id: row.get(3)?,
        owner_id: row.get(4)?,
        channel_id: row.get(5)?,
    })
}

/// Create the project, its channel, and bind a pooled chat, all or nothing.
///
/// A lead gets at most one project. An exhausted pool rolls everything back.
pub async fn create_project_with_chat(
    db: &Database,
    new: NewProject,
) -> Result<InitiatedProject, RayhubError> {
    let result = db
        .connection()
        .call(move |conn| -> Result<Result<InitiatedProject, RayhubError>, rusqlite::Error> {
            let tx = conn.transaction()?;

            let Some(lead) = get_lead_tx(&tx, new.lead_id)? else {
                return Ok(Err(RayhubError::not_found("lead", new.lead_id)));
            };
            if lead.project_id.is_some() {
                return Ok(Err(RayhubError::validation(format!(
                    "a project has already been initiated for lead {}",
                    lead.name
                ))));
            }

            let channel = insert_channel_tx(&tx, &new.name, new.channel_description.as_deref())?;

            tx.execute(
                "INSERT INTO projects (name, kind, lead_id, owner_id, channel_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    new.name,
                    new.kind.to_string(),
                    new.lead_id,
                    new.owner_id,
                    channel.id
                ],
            )?;
            let project = Project {
                id: tx.last_insert_rowid(),
                name: new.name.clone(),
                kind: new.kind,
                lead_id: Some(new.lead_id),
                owner_id: new.owner_id,
                channel_id: Some(channel.id),
            };

            let Some(chat) = allocate_tx(&tx, project.id, Some(channel.id))? else {
                return Ok(Err(RayhubError::NoFreeChat));
            };

            tx.execute(
                "UPDATE leads SET project_id = ?1, project_kind = ?2,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?3",
                params![project.id, new.kind.to_string(), new.lead_id],
            )?;

            tx.commit()?;
            Ok(Ok(InitiatedProject {
                project,
                channel,
                chat,
            }))
        })
        .await;
    let initiated = flatten(result)?;
    tracing::info!(
        project_id = initiated.project.id,
        project = %initiated.project.name,
        chat = %initiated.chat.name,
        "project created"
    );
    Ok(initiated)
}

/// Fetch a project.
pub async fn get_project(db: &Database, id: i64) -> Result<Option<Project>, RayhubError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, name, kind, lead_id, owner_id, channel_id FROM projects WHERE id = ?1",
                params![id],
                row_to_project,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Project row with no lead or channel, for pool tests.
#[cfg(test)]
pub(crate) async fn insert_bare_project(
    db: &Database,
    name: &str,
    kind: rayhub_core::types::ProjectKind,
) -> Result<i64, RayhubError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO projects (name, kind) VALUES (?1, ?2)",
                params![name, kind.to_string()],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewLead;
    use crate::queries::chat_pool::{list, seed};
    use crate::queries::leads::{create_lead, get_lead};
    use rayhub_core::types::{ChatState, ProjectKind};
    use tempfile::tempdir;

    async fn setup() -> (Database, tempfile::TempDir, i64) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("t.db").to_str().unwrap())
            .await
            .unwrap();
        let lead = create_lead(
            &db,
            NewLead {
                name: "Factory roof".into(),
                ..NewLead::default()
            },
        )
        .await
        .unwrap();
        (db, dir, lead.id)
    }

    fn new_project(lead_id: i64) -> NewProject {
        NewProject {
            lead_id,
            name: "Factory roof [SES]".into(),
            kind: ProjectKind::Ses,
            owner_id: None,
            channel_description: None,
        }
    }

    #[tokio::test]
    async fn creates_project_channel_and_binds_chat() {
        let (db, _dir, lead) = setup().await;
        seed(&db, "Rayton 01", "-1001").await.unwrap();

        let created = create_project_with_chat(&db, new_project(lead)).await.unwrap();
        assert_eq!(created.channel.name, "Factory roof [SES]");
        assert_eq!(created.project.channel_id, Some(created.channel.id));
        assert_eq!(created.chat.state, ChatState::Busy);
        assert_eq!(created.chat.project_id, Some(created.project.id));
        assert_eq!(created.chat.channel_id, Some(created.channel.id));

        let lead = get_lead(&db, lead).await.unwrap().unwrap();
        assert_eq!(lead.project_id, Some(created.project.id));
        assert_eq!(lead.project_kind, Some(ProjectKind::Ses));
        assert_eq!(
            get_project(&db, created.project.id).await.unwrap(),
            Some(created.project)
        );
    }

    #[tokio::test]
    async fn second_initiation_is_rejected() {
        let (db, _dir, lead) = setup().await;
        seed(&db, "A", "-1").await.unwrap();
        seed(&db, "B", "-2").await.unwrap();
        create_project_with_chat(&db, new_project(lead)).await.unwrap();
        let err = create_project_with_chat(&db, new_project(lead)).await.unwrap_err();
        assert!(matches!(err, RayhubError::Validation(_)));
    }

    #[tokio::test]
    async fn empty_pool_rolls_back_everything() {
        let (db, _dir, lead) = setup().await;
        let err = create_project_with_chat(&db, new_project(lead)).await.unwrap_err();
        assert!(matches!(err, RayhubError::NoFreeChat));

        let lead_row = get_lead(&db, lead).await.unwrap().unwrap();
        assert!(lead_row.project_id.is_none());
        assert!(get_project(&db, 1).await.unwrap().is_none());
        assert!(list(&db).await.unwrap().is_empty());

        // With a chat seeded the same lead can now be initiated.
        seed(&db, "A", "-1").await.unwrap();
        create_project_with_chat(&db, new_project(lead)).await.unwrap();
    }
}
