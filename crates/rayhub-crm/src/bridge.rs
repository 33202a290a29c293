// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message bridge between project channels and their Telegram groups.
//!
//! Internal comments on a channel bound to a busy group are forwarded to
//! Telegram. Messages arriving from Telegram are stored with origin
//! `telegram` and are never forwarded back.

use rayhub_core::RayhubError;
use rayhub_core::types::{
    Attachment, ChannelMessage, MediaKind, MessageKind, MessageOrigin, OutboundMedia,
};
use rayhub_storage::queries::{channels, chat_pool};
use rayhub_storage::{NewAttachment, NewMessage};
use rayhub_telegram::html::{forwarded_text, html_to_telegram, inbound_body, truncate_caption};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::Crm;

/// A comment posted in a channel by a staff member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub channel_id: i64,
    pub author: String,
    /// HTML body.
    pub body: String,
    pub attachments: Vec<NewAttachment>,
}

/// Inbound bridge post from the Telegram side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundPost {
    pub tg_chat_id: String,
    pub body: String,
    #[serde(default)]
    pub from_name: String,
    #[serde(default)]
    pub api_key: String,
}

impl Crm {
    /// Store an internal comment and forward it to the bound group.
    pub async fn post_comment(&self, comment: Comment) -> Result<ChannelMessage, RayhubError> {
        if comment.body.trim().is_empty() && comment.attachments.is_empty() {
            return Err(RayhubError::validation("message is empty"));
        }
        let (message, attachments) = channels::post_message(
            self.db(),
            NewMessage {
                channel_id: comment.channel_id,
                author: comment.author,
                body: comment.body,
                kind: MessageKind::Comment,
                origin: MessageOrigin::Internal,
                attachments: comment.attachments,
            },
        )
        .await?;

        self.forward_to_telegram(&message, attachments).await;
        Ok(message)
    }

    /// Forward a stored message. Only internal comments on a channel with a
    /// busy group are sent; errors are logged.
    async fn forward_to_telegram(&self, message: &ChannelMessage, attachments: Vec<Attachment>) {
        if message.kind != MessageKind::Comment || message.origin != MessageOrigin::Internal {
            return;
        }
        let Some(bridge) = self.bridge.as_ref() else {
            return;
        };
        let chat = match chat_pool::find_busy_by_channel(self.db(), message.channel_id).await {
            Ok(Some(chat)) => chat,
            Ok(None) => {
                debug!(channel_id = message.channel_id, "channel has no Telegram group");
                return;
            }
            Err(e) => {
                warn!(error = %e, channel_id = message.channel_id, "chat lookup failed");
                return;
            }
        };

        let body = html_to_telegram(&message.body);
        let text = forwarded_text(&message.author, &body);

        if attachments.is_empty() {
            if body.is_empty() {
                return;
            }
            if let Err(e) = bridge.send_text(&chat.tg_chat_id, &text).await {
                warn!(error = %e, chat = %chat.name, "failed to forward message");
            }
            return;
        }

        for (idx, attachment) in attachments.into_iter().enumerate() {
            let media = OutboundMedia {
                kind: MediaKind::from_mimetype(&attachment.mimetype),
                filename: attachment.filename,
                mimetype: attachment.mimetype,
                data: attachment.data,
                caption: (idx == 0).then(|| truncate_caption(&text)),
            };
            let filename = media.filename.clone();
            if let Err(e) = bridge.send_media(&chat.tg_chat_id, media).await {
                warn!(error = %e, chat = %chat.name, filename = %filename, "failed to forward attachment");
            }
        }
    }

    /// Store a message relayed from a Telegram group.
    ///
    /// The key must equal the configured bot token.
    pub async fn receive_from_telegram(&self, post: InboundPost) -> Result<ChannelMessage, RayhubError> {
        let token = self
            .config()
            .telegram
            .bot_token
            .as_deref()
            .filter(|t| !t.is_empty());
        if token != Some(post.api_key.as_str()) {
            warn!(tg_chat_id = %post.tg_chat_id, "inbound bridge post with invalid key");
            return Err(RayhubError::Unauthorized);
        }

        let tg_chat_id = post.tg_chat_id.trim();
        if tg_chat_id.is_empty() || post.body.trim().is_empty() {
            return Err(RayhubError::validation("tg_chat_id and body are required"));
        }

        let channel_id = chat_pool::find_by_tg_chat(self.db(), tg_chat_id)
            .await?
            .and_then(|chat| chat.channel_id)
            .ok_or_else(|| RayhubError::not_found("chat mapping", tg_chat_id))?;

        let author = match post.from_name.trim() {
            "" => "TG".to_string(),
            name => name.to_string(),
        };
        let (message, _) = channels::post_message(
            self.db(),
            NewMessage {
                channel_id,
                author,
                body: inbound_body(&post.from_name, &post.body),
                kind: MessageKind::Comment,
                origin: MessageOrigin::Telegram,
                attachments: Vec::new(),
            },
        )
        .await?;
        info!(channel_id, message_id = message.id, "stored message from Telegram");
        Ok(message)
    }
}
