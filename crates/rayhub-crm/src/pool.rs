// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-pool administration.

use rayhub_core::RayhubError;
use rayhub_core::types::ChatPoolEntry;
use rayhub_storage::queries::chat_pool;
use tracing::info;

use crate::Crm;

impl Crm {
    /// Add a Telegram group to the pool as `free`.
    pub async fn seed_chat(&self, name: &str, tg_chat_id: &str) -> Result<ChatPoolEntry, RayhubError> {
        if name.trim().is_empty() {
            return Err(RayhubError::validation("group name is required"));
        }
        if tg_chat_id.trim().parse::<i64>().is_err() {
            return Err(RayhubError::validation(format!(
                "Telegram chat id must be numeric, got `{tg_chat_id}`"
            )));
        }
        let entry = chat_pool::seed(self.db(), name.trim(), tg_chat_id).await?;
        info!(chat = %entry.name, tg_chat_id = %entry.tg_chat_id, "chat added to pool");
        Ok(entry)
    }

    pub async fn list_chats(&self) -> Result<Vec<ChatPoolEntry>, RayhubError> {
        chat_pool::list(self.db()).await
    }

    /// Return a group to the pool, unlinking its project and channel.
    pub async fn release_chat(&self, id: i64) -> Result<ChatPoolEntry, RayhubError> {
        chat_pool::release(self.db(), id).await
    }
}
