// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock webhook sink with a scripted response.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use rayhub_core::RayhubError;
use rayhub_core::traits::{PluginAdapter, WebhookSink};
use rayhub_core::types::{AdapterType, HealthStatus, WebhookResponse};

#[derive(Debug, Clone, Copy)]
enum Reply {
    Status(u16),
    TransportError,
}

/// A mock webhook sink for testing.
///
/// Every post is captured as `(url, payload)`. Replies with HTTP 200 until
/// told otherwise.
pub struct MockWebhook {
    posts: Arc<Mutex<Vec<(String, Value)>>>,
    reply: Arc<Mutex<Reply>>,
}

impl MockWebhook {
    pub fn new() -> Self {
        Self {
            posts: Arc::new(Mutex::new(Vec::new())),
            reply: Arc::new(Mutex::new(Reply::Status(200))),
        }
    }

    /// Answer future posts with this HTTP status.
    pub async fn respond_with(&self, status: u16) {
        *self.reply.lock().await = Reply::Status(status);
    }

    /// Fail future posts as if the endpoint were unreachable.
    pub async fn fail_transport(&self) {
        *self.reply.lock().await = Reply::TransportError;
    }

    /// Get all captured posts in order.
    pub async fn posts(&self) -> Vec<(String, Value)> {
        self.posts.lock().await.clone()
    }

    /// Get the count of captured posts.
    pub async fn post_count(&self) -> usize {
        self.posts.lock().await.len()
    }
}

impl Default for MockWebhook {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockWebhook {
    fn name(&self) -> &str {
        "mock-webhook"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Webhook
    }

    async fn health_check(&self) -> Result<HealthStatus, RayhubError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RayhubError> {
        Ok(())
    }
}

#[async_trait]
impl WebhookSink for MockWebhook {
    async fn post_json(&self, url: &str, payload: &Value) -> Result<WebhookResponse, RayhubError> {
        self.posts
            .lock()
            .await
            .push((url.to_string(), payload.clone()));
        match *self.reply.lock().await {
            Reply::Status(status) => Ok(WebhookResponse {
                status,
                body: String::new(),
            }),
            Reply::TransportError => Err(RayhubError::External {
                service: "webhook",
                message: "mock connection refused".into(),
                source: None,
            }),
        }
    }
}
