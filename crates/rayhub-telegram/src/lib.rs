// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram group bridge for Rayhub.
//!
//! Implements [`MessagingBridge`] for the Telegram Bot API via teloxide:
//! HTML messages, media uploads, invite links and the member management
//! calls used when a pooled group is bound to a project.

pub mod html;
pub mod media;

use async_trait::async_trait;
use rayhub_config::model::TelegramConfig;
use rayhub_core::error::RayhubError;
use rayhub_core::traits::{MessagingBridge, PluginAdapter};
use rayhub_core::types::{AdapterType, HealthStatus, OutboundMedia};
use teloxide::prelude::*;
use teloxide::types::{ParseMode, UserId};
use tracing::{debug, info};

/// Telegram implementation of [`MessagingBridge`].
pub struct TelegramBridge {
    bot: Bot,
}

impl TelegramBridge {
    /// Creates a bridge from configuration.
    ///
    /// Requires `telegram.bot_token` to be set and non-empty.
    pub fn new(config: &TelegramConfig) -> Result<Self, RayhubError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            RayhubError::Config("telegram.bot_token is required for the Telegram bridge".into())
        })?;

        if token.trim().is_empty() {
            return Err(RayhubError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let mut bot = Bot::new(token);
        if let Some(api_url) = config.api_url.as_deref() {
            let url = reqwest::Url::parse(api_url).map_err(|e| {
                RayhubError::Config(format!("telegram.api_url is not a valid URL: {e}"))
            })?;
            bot = bot.set_api_url(url);
        }

        Ok(Self { bot })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

/// Wraps a Bot API failure.
pub(crate) fn api_error(op: &str, e: teloxide::RequestError) -> RayhubError {
    RayhubError::External {
        service: "telegram",
        message: format!("{op} failed: {e}"),
        source: Some(Box::new(e)),
    }
}

/// Parses a stored chat id (e.g. `-1003883870898`).
pub fn parse_chat_id(chat_id: &str) -> Result<ChatId, RayhubError> {
    chat_id
        .trim()
        .parse::<i64>()
        .map(ChatId)
        .map_err(|e| RayhubError::validation(format!("invalid Telegram chat id `{chat_id}`: {e}")))
}

fn parse_user_id(user_id: i64) -> Result<UserId, RayhubError> {
    u64::try_from(user_id)
        .map(UserId)
        .map_err(|_| RayhubError::validation(format!("invalid Telegram user id {user_id}")))
}

#[async_trait]
impl PluginAdapter for TelegramBridge {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Messaging
    }

    async fn health_check(&self) -> Result<HealthStatus, RayhubError> {
        // getMe validates the token.
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), RayhubError> {
        debug!("Telegram bridge shutting down");
        Ok(())
    }
}

#[async_trait]
impl MessagingBridge for TelegramBridge {
    async fn send_text(&self, chat_id: &str, html: &str) -> Result<(), RayhubError> {
        let chat_id = parse_chat_id(chat_id)?;
        self.bot
            .send_message(chat_id, html)
            .parse_mode(ParseMode::Html)
            .await
            .map_err(|e| api_error("sendMessage", e))?;
        Ok(())
    }

    async fn send_media(&self, chat_id: &str, media: OutboundMedia) -> Result<(), RayhubError> {
        let chat_id = parse_chat_id(chat_id)?;
        media::send_media(&self.bot, chat_id, media).await
    }

    async fn create_invite_link(
        &self,
        chat_id: &str,
        name: &str,
        member_limit: Option<u32>,
    ) -> Result<String, RayhubError> {
        let chat_id = parse_chat_id(chat_id)?;
        let mut req = self.bot.create_chat_invite_link(chat_id);
        if !name.is_empty() {
            // Telegram caps invite link names at 32 characters.
            req = req.name(name.chars().take(32).collect::<String>());
        }
        if let Some(limit) = member_limit {
            req = req.member_limit(limit);
        }
        let link = req
            .await
            .map_err(|e| api_error("createChatInviteLink", e))?;
        Ok(link.invite_link)
    }

    async fn unban_member(&self, chat_id: &str, user_id: i64) -> Result<(), RayhubError> {
        let chat_id = parse_chat_id(chat_id)?;
        let user = parse_user_id(user_id)?;
        self.bot
            .unban_chat_member(chat_id, user)
            .only_if_banned(true)
            .await
            .map_err(|e| api_error("unbanChatMember", e))?;
        Ok(())
    }

    async fn add_member(&self, chat_id: &str, user_id: i64) -> Result<(), RayhubError> {
        // Bots cannot add users directly: send a single-use invite link to
        // the user's private chat instead. Fails if the user never started
        // the bot.
        let link = self
            .create_invite_link(chat_id, "rayhub member", Some(1))
            .await?;
        let private = ChatId(user_id);
        let text = format!(
            "You have been added to a project group. Join: {}",
            html::escape_html(&link)
        );
        self.bot
            .send_message(private, text)
            .parse_mode(ParseMode::Html)
            .await
            .map_err(|e| api_error("sendMessage", e))?;
        info!(chat_id, user_id, "sent group invite link to member");
        Ok(())
    }

    async fn promote_admin(&self, chat_id: &str, user_id: i64) -> Result<(), RayhubError> {
        let chat_id = parse_chat_id(chat_id)?;
        let user = parse_user_id(user_id)?;
        self.bot
            .promote_chat_member(chat_id, user)
            .can_manage_chat(true)
            .can_change_info(true)
            .can_delete_messages(true)
            .can_invite_users(true)
            .can_restrict_members(true)
            .can_pin_messages(true)
            .await
            .map_err(|e| api_error("promoteChatMember", e))?;
        Ok(())
    }

    async fn rename_group(&self, chat_id: &str, title: &str) -> Result<(), RayhubError> {
        let chat_id = parse_chat_id(chat_id)?;
        // Group titles are limited to 128 characters.
        let title: String = title.chars().take(128).collect();
        self.bot
            .set_chat_title(chat_id, title)
            .await
            .map_err(|e| api_error("setChatTitle", e))?;
        Ok(())
    }
}
