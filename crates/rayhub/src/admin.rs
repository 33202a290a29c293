// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue, chat-pool and config administration commands.

use std::path::Path;

use rayhub_config::RayhubConfig;
use rayhub_core::RayhubError;
use rayhub_core::types::{ChatPoolEntry, QueueEntry, QueueType};
use rayhub_storage::Database;
use rayhub_storage::queries::{chat_pool, queue};
use serde::Deserialize;

use crate::{PoolCommand, QueueCommand};

/// One row of a queue import file.
#[derive(Debug, Deserialize)]
struct ImportRow {
    user_id: i64,
    queues: Vec<QueueType>,
}

async fn open(config: &RayhubConfig) -> Result<Database, RayhubError> {
    Database::open_with(&config.storage.database_path, config.storage.wal_mode).await
}

fn print_entries(entries: &[QueueEntry]) {
    if entries.is_empty() {
        println!("no queue entries");
        return;
    }
    println!(
        "{:>5}  {:<9} {:>7} {:>5}  {:<6} {:>6}  last assigned",
        "id", "queue", "user", "rank", "paused", "count"
    );
    for e in entries {
        println!(
            "{:>5}  {:<9} {:>7} {:>5}  {:<6} {:>6}  {}",
            e.id,
            e.queue_type.to_string(),
            e.user_id,
            e.rank,
            if e.paused { "yes" } else { "no" },
            e.assignment_count,
            e.last_assigned.as_deref().unwrap_or("never")
        );
    }
}

fn print_chats(chats: &[ChatPoolEntry]) {
    if chats.is_empty() {
        println!("chat pool is empty");
        return;
    }
    for c in chats {
        let project = c
            .project_id
            .map(|id| format!("project {id}"))
            .unwrap_or_default();
        println!(
            "{:>4}  {:<24} {:<16} {:<5} {}",
            c.id, c.name, c.tg_chat_id, c.state.to_string(), project
        );
    }
}

/// Parse a queue import file.
fn read_import(path: &Path) -> Result<Vec<queue::QueueImportRow>, RayhubError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| RayhubError::Config(format!("cannot read {}: {e}", path.display())))?;
    let rows: Vec<ImportRow> = serde_json::from_str(&content)
        .map_err(|e| RayhubError::validation(format!("invalid import file: {e}")))?;
    Ok(rows
        .into_iter()
        .map(|row| queue::QueueImportRow {
            user_id: row.user_id,
            queues: row.queues,
        })
        .collect())
}

pub async fn run_queue(config: &RayhubConfig, cmd: QueueCommand) -> Result<(), RayhubError> {
    let db = open(config).await?;
    match cmd {
        QueueCommand::List { queue: queue_type } => {
            print_entries(&queue::list_entries(&db, queue_type).await?);
        }
        QueueCommand::Add {
            user_id,
            queue: queue_type,
            rank,
        } => {
            let entry = queue::add_entry(&db, user_id, queue_type, rank).await?;
            println!("added entry {} ({} queue, rank {})", entry.id, entry.queue_type, entry.rank);
        }
        QueueCommand::Pause { entry_id } => {
            queue::set_paused(&db, entry_id, true).await?;
            println!("entry {entry_id} paused");
        }
        QueueCommand::Resume { entry_id } => {
            queue::set_paused(&db, entry_id, false).await?;
            println!("entry {entry_id} resumed");
        }
        QueueCommand::Import { file } => {
            let rows = read_import(&file)?;
            let created = queue::import_rows(&db, rows).await?;
            println!("imported {created} queue entries");
        }
    }
    db.close().await
}

pub async fn run_pool(config: &RayhubConfig, cmd: PoolCommand) -> Result<(), RayhubError> {
    let db = open(config).await?;
    match cmd {
        PoolCommand::List => print_chats(&chat_pool::list(&db).await?),
        PoolCommand::Seed { name, tg_chat_id } => {
            if tg_chat_id.trim().parse::<i64>().is_err() {
                return Err(RayhubError::validation(format!(
                    "Telegram chat id must be numeric, got `{tg_chat_id}`"
                )));
            }
            let entry = chat_pool::seed(&db, name.trim(), tg_chat_id.trim()).await?;
            println!("added {} ({}) to the pool", entry.name, entry.tg_chat_id);
        }
        PoolCommand::Release { id } => {
            let entry = chat_pool::release(&db, id).await?;
            println!("{} is free again", entry.name);
        }
    }
    db.close().await
}

/// Effective configuration as TOML with secrets replaced.
pub fn redacted_toml(config: &RayhubConfig) -> Result<String, RayhubError> {
    let mut config = config.clone();
    if config.telegram.bot_token.is_some() {
        config.telegram.bot_token = Some("[redacted]".to_string());
    }
    if config.gateway.callback_token.is_some() {
        config.gateway.callback_token = Some("[redacted]".to_string());
    }
    toml::to_string_pretty(&config).map_err(|e| RayhubError::Internal(format!("serialize config: {e}")))
}

pub fn show_config(config: &RayhubConfig) -> Result<(), RayhubError> {
    print!("{}", redacted_toml(config)?);
    Ok(())
}
