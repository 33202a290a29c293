// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound webhook trait (workflow engine integration).

use async_trait::async_trait;

use crate::error::RayhubError;
use crate::traits::adapter::PluginAdapter;
use crate::types::WebhookResponse;

/// Posts JSON payloads to preconfigured URLs.
///
/// Transport failures are errors; HTTP error statuses are returned in the
/// response so the caller can decide whether they matter.
#[async_trait]
pub trait WebhookSink: PluginAdapter {
    async fn post_json(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<WebhookResponse, RayhubError>;
}
