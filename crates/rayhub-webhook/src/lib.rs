// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for outbound workflow webhooks.
//!
//! Provides [`HttpWebhook`], a [`WebhookSink`] that posts JSON payloads
//! with a per-request timeout. Calls are never retried.

use std::time::Duration;

use async_trait::async_trait;
use rayhub_config::model::WebhookConfig;
use rayhub_core::error::RayhubError;
use rayhub_core::traits::{PluginAdapter, WebhookSink};
use rayhub_core::types::{AdapterType, HealthStatus, WebhookResponse};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, info};

/// Longest response body kept for logging.
const LOGGED_BODY_CHARS: usize = 200;

/// `reqwest`-backed webhook sink.
#[derive(Debug, Clone)]
pub struct HttpWebhook {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpWebhook {
    /// Creates a client using `webhooks.timeout_secs`.
    pub fn new(config: &WebhookConfig) -> Result<Self, RayhubError> {
        Self::with_timeout(Duration::from_secs(config.timeout_secs))
    }

    /// Creates a client with an explicit per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, RayhubError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| RayhubError::External {
                service: "webhook",
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self { client, timeout })
    }

    /// Returns the per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(LOGGED_BODY_CHARS).collect()
}

#[async_trait]
impl PluginAdapter for HttpWebhook {
    fn name(&self) -> &str {
        "webhook"
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
        debug!("webhook client shutting down");
        Ok(())
    }
}

#[async_trait]
impl WebhookSink for HttpWebhook {
    async fn post_json(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<WebhookResponse, RayhubError> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| RayhubError::External {
                service: "webhook",
                message: if e.is_timeout() {
                    format!("request to {url} timed out after {:?}", self.timeout)
                } else {
                    format!("request to {url} failed: {e}")
                },
                source: Some(Box::new(e)),
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        info!(url, status, body = %excerpt(&body), "webhook delivered");

        Ok(WebhookResponse { status, body })
    }
}
