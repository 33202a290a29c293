// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock messaging bridge for deterministic testing.
//!
//! `MockBridge` implements `MessagingBridge` and captures every outbound
//! call for assertion in tests. Individual operations can be made to fail.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use rayhub_core::RayhubError;
use rayhub_core::traits::{MessagingBridge, PluginAdapter};
use rayhub_core::types::{AdapterType, HealthStatus, OutboundMedia};

/// One captured bridge call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCall {
    Text { chat_id: String, html: String },
    Media { chat_id: String, media: OutboundMedia },
    InviteLink { chat_id: String, name: String, member_limit: Option<u32> },
    Unban { chat_id: String, user_id: i64 },
    AddMember { chat_id: String, user_id: i64 },
    Promote { chat_id: String, user_id: i64 },
    Rename { chat_id: String, title: String },
}

impl BridgeCall {
    /// Operation name, as passed to [`MockBridge::fail_on`].
    pub fn operation(&self) -> &'static str {
        match self {
            BridgeCall::Text { .. } => "send_text",
            BridgeCall::Media { .. } => "send_media",
            BridgeCall::InviteLink { .. } => "create_invite_link",
            BridgeCall::Unban { .. } => "unban_member",
            BridgeCall::AddMember { .. } => "add_member",
            BridgeCall::Promote { .. } => "promote_admin",
            BridgeCall::Rename { .. } => "rename_group",
        }
    }
}

/// A mock messaging bridge for testing.
///
/// Calls are recorded even when they are configured to fail, so tests can
/// assert that an attempt was made.
#[derive(Default)]
pub struct MockBridge {
    calls: Arc<Mutex<Vec<BridgeCall>>>,
    failing: Arc<Mutex<HashSet<&'static str>>>,
}

impl MockBridge {
    /// Create a new mock bridge where every call succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future call of `operation` fail.
    pub async fn fail_on(&self, operation: &'static str) {
        self.failing.lock().await.insert(operation);
    }

    /// Get all captured calls in order.
    pub async fn calls(&self) -> Vec<BridgeCall> {
        self.calls.lock().await.clone()
    }

    /// Captured text messages as `(chat_id, html)`.
    pub async fn sent_texts(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                BridgeCall::Text { chat_id, html } => Some((chat_id.clone(), html.clone())),
                _ => None,
            })
            .collect()
    }

    /// Captured uploads as `(chat_id, media)`.
    pub async fn sent_media(&self) -> Vec<(String, OutboundMedia)> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                BridgeCall::Media { chat_id, media } => Some((chat_id.clone(), media.clone())),
                _ => None,
            })
            .collect()
    }

    /// Clear all captured calls.
    pub async fn clear(&self) {
        self.calls.lock().await.clear();
    }

    async fn record(&self, call: BridgeCall) -> Result<(), RayhubError> {
        let operation = call.operation();
        self.calls.lock().await.push(call);
        if self.failing.lock().await.contains(operation) {
            return Err(RayhubError::External {
                service: "telegram",
                message: format!("mock {operation} failure"),
                source: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for MockBridge {
    fn name(&self) -> &str {
        "mock-bridge"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Messaging
    }

    async fn health_check(&self) -> Result<HealthStatus, RayhubError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RayhubError> {
        Ok(())
    }
}

#[async_trait]
impl MessagingBridge for MockBridge {
    async fn send_text(&self, chat_id: &str, html: &str) -> Result<(), RayhubError> {
        self.record(BridgeCall::Text {
            chat_id: chat_id.to_string(),
            html: html.to_string(),
        })
        .await
    }

    async fn send_media(&self, chat_id: &str, media: OutboundMedia) -> Result<(), RayhubError> {
        self.record(BridgeCall::Media {
            chat_id: chat_id.to_string(),
            media,
        })
        .await
    }

    async fn create_invite_link(
        &self,
        chat_id: &str,
        name: &str,
        member_limit: Option<u32>,
    ) -> Result<String, RayhubError> {
        self.record(BridgeCall::InviteLink {
            chat_id: chat_id.to_string(),
            name: name.to_string(),
            member_limit,
        })
        .await?;
        Ok(format!("https://t.me/+mock{}", chat_id.trim_start_matches('-')))
    }

    async fn unban_member(&self, chat_id: &str, user_id: i64) -> Result<(), RayhubError> {
        self.record(BridgeCall::Unban {
            chat_id: chat_id.to_string(),
            user_id,
        })
        .await
    }

    async fn add_member(&self, chat_id: &str, user_id: i64) -> Result<(), RayhubError> {
        self.record(BridgeCall::AddMember {
            chat_id: chat_id.to_string(),
            user_id,
        })
        .await
    }

    async fn promote_admin(&self, chat_id: &str, user_id: i64) -> Result<(), RayhubError> {
        self.record(BridgeCall::Promote {
            chat_id: chat_id.to_string(),
            user_id,
        })
        .await
    }

    async fn rename_group(&self, chat_id: &str, title: &str) -> Result<(), RayhubError> {
        self.record(BridgeCall::Rename {
            chat_id: chat_id.to_string(),
            title: title.to_string(),
        })
        .await
    }
}
