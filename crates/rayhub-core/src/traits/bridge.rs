// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging bridge trait for the external group-chat platform.

use async_trait::async_trait;

use crate::error::RayhubError;
use crate::traits::adapter::PluginAdapter;
use crate::types::OutboundMedia;

/// Discrete, best-effort calls against the messaging platform.
///
/// Every method is one API call; callers log failures and carry on.
/// Chat ids are passed as strings the way they are stored in the pool.
#[async_trait]
pub trait MessagingBridge: PluginAdapter {
    /// Sends an HTML-formatted text message.
    async fn send_text(&self, chat_id: &str, html: &str) -> Result<(), RayhubError>;

    /// Uploads a file with an optional caption.
    async fn send_media(&self, chat_id: &str, media: OutboundMedia) -> Result<(), RayhubError>;

    /// Creates an invite link and returns its URL.
    async fn create_invite_link(
        &self,
        chat_id: &str,
        name: &str,
        member_limit: Option<u32>,
    ) -> Result<String, RayhubError>;

    /// Lifts a ban; a no-op for users who are not banned.
    async fn unban_member(&self, chat_id: &str, user_id: i64) -> Result<(), RayhubError>;

    /// Brings a user into the group.
    async fn add_member(&self, chat_id: &str, user_id: i64) -> Result<(), RayhubError>;

    /// Grants administrator rights.
    async fn promote_admin(&self, chat_id: &str, user_id: i64) -> Result<(), RayhubError>;

    /// Changes the group title.
    async fn rename_group(&self, chat_id: &str, title: &str) -> Result<(), RayhubError>;
}
