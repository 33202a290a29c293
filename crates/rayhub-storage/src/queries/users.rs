// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Staff and client records.

use rayhub_core::RayhubError;
use rayhub_core::types::{Client, User};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        telegram_user_id: row.get(2)?,
    })
}

fn row_to_client(row: &rusqlite::Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: row.get(0)?,
        name: row.get(1)?,
        is_company: row.get(2)?,
        company_id: row.get(3)?,
    })
}

/// Insert a user.
pub async fn create_user(
    db: &Database,
    name: &str,
    telegram_user_id: Option<i64>,
) -> Result<User, RayhubError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (name, telegram_user_id) VALUES (?1, ?2)",
                params![name, telegram_user_id],
            )?;
            Ok(User {
                id: conn.last_insert_rowid(),
                name,
                telegram_user_id,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a user by id.
pub async fn get_user(db: &Database, id: i64) -> Result<Option<User>, RayhubError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, name, telegram_user_id FROM users WHERE id = ?1",
                params![id],
                row_to_user,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch several users; unknown ids are skipped.
pub async fn get_users(db: &Database, ids: &[i64]) -> Result<Vec<User>, RayhubError> {
    let ids = ids.to_vec();
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare("SELECT id, name, telegram_user_id FROM users WHERE id = ?1")?;
            let mut users = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(user) = stmt.query_row(params![id], row_to_user).optional()? {
                    users.push(user);
                }
            }
            Ok(users)
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a client. `company_id` links a person to their company.
pub async fn create_client(
    db: &Database,
    name: &str,
    is_company: bool,
    company_id: Option<i64>,
) -> Result<Client, RayhubError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO clients (name, is_company, company_id) VALUES (?1, ?2, ?3)",
                params![name, is_company, company_id],
            )?;
            Ok(Client {
                id: conn.last_insert_rowid(),
                name,
                is_company,
                company_id,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch several clients, preserving the requested order.
pub async fn get_clients(db: &Database, ids: &[i64]) -> Result<Vec<Client>, RayhubError> {
    let ids = ids.to_vec();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, is_company, company_id FROM clients WHERE id = ?1",
            )?;
            let mut clients = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(client) = stmt.query_row(params![id], row_to_client).optional()? {
                    clients.push(client);
                }
            }
            Ok(clients)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn users_and_clients_round_trip() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("t.db").to_str().unwrap())
            .await
            .unwrap();

        let anna = create_user(&db, "Anna", Some(5001)).await.unwrap();
        assert_eq!(get_user(&db, anna.id).await.unwrap(), Some(anna.clone()));
        assert!(get_user(&db, 999).await.unwrap().is_none());
        assert_eq!(get_users(&db, &[999, anna.id]).await.unwrap(), vec![anna]);

        let acme = create_client(&db, "Acme", true, None).await.unwrap();
        let bob = create_client(&db, "Bob", false, Some(acme.id)).await.unwrap();
        let got = get_clients(&db, &[bob.id, acme.id]).await.unwrap();
        assert_eq!(got, vec![bob, acme]);

        db.close().await.unwrap();
    }
}
