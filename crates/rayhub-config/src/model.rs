// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Rayhub.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use rayhub_core::types::QueueType;
use serde::{Deserialize, Serialize};

/// Top-level Rayhub configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RayhubConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Inbound HTTP gateway (callbacks, Telegram bridge).
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Telegram bot settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Outbound webhook endpoints.
    #[serde(default)]
    pub webhooks: WebhookConfig,

    /// Team, stage, and queue ids used by the hand-off.
    #[serde(default)]
    pub crm: CrmConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name used in log lines and outbound messages.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "rayhub".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("rayhub").join("rayhub.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("rayhub.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Inbound HTTP gateway configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Start the gateway with `rayhub serve`.
    #[serde(default = "default_gateway_enabled")]
    pub enabled: bool,

    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Externally reachable base URL, used to build callback URLs.
    #[serde(default)]
    pub public_base_url: Option<String>,

    /// Shared secret the proposal generator must echo back in callbacks.
    #[serde(default)]
    pub callback_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: default_gateway_enabled(),
            host: default_gateway_host(),
            port: default_gateway_port(),
            public_base_url: None,
            callback_token: None,
        }
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("enabled", &self.enabled)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("public_base_url", &self.public_base_url)
            .field(
                "callback_token",
                &self.callback_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

fn default_gateway_enabled() -> bool {
    true
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8069
}

/// Telegram bot configuration.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. `None` disables the bridge.
    ///
    /// Also serves as the shared secret for inbound bridge posts.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Override of the Bot API base URL (self-hosted Bot API server).
    #[serde(default)]
    pub api_url: Option<String>,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "[redacted]"))
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Outbound webhook configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookConfig {
    /// Receives `project_initiated` events.
    #[serde(default)]
    pub project_initiated_url: Option<String>,

    /// Solar proposal generator.
    #[serde(default)]
    pub proposal_ses_url: Option<String>,

    /// Storage-system proposal generator.
    #[serde(default)]
    pub proposal_uze_url: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_webhook_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            project_initiated_url: None,
            proposal_ses_url: None,
            proposal_uze_url: None,
            timeout_secs: default_webhook_timeout_secs(),
        }
    }
}

fn default_webhook_timeout_secs() -> u64 {
    15
}

/// Team, stage, and queue ids resolved at setup time.
///
/// Lead hand-offs move records between the call-center team and the sales
/// team; unset ids leave the corresponding lead field untouched.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CrmConfig {
    /// Call-center (operator) team.
    #[serde(default)]
    pub operator_team_id: Option<i64>,

    /// Stage new generated leads start in.
    #[serde(default)]
    pub operator_first_stage_id: Option<i64>,

    /// Stage for leads returned by a manager ("on pause").
    #[serde(default)]
    pub operator_paused_stage_id: Option<i64>,

    /// Sales (managers) team.
    #[serde(default)]
    pub sales_team_id: Option<i64>,

    /// First stage of the sales pipeline.
    #[serde(default)]
    pub sales_first_stage_id: Option<i64>,

    /// Queue consulted when a new lead is handed over without an explicit manager.
    #[serde(default = "default_handoff_queue")]
    pub handoff_queue: QueueType,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            operator_team_id: None,
            operator_first_stage_id: None,
            operator_paused_stage_id: None,
            sales_team_id: None,
            sales_first_stage_id: None,
            handoff_queue: default_handoff_queue(),
        }
    }
}

fn default_handoff_queue() -> QueueType {
    QueueType::Kcc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = RayhubConfig::default();
        assert_eq!(config.service.name, "rayhub");
        assert_eq!(config.service.log_level, "info");
        assert!(config.storage.wal_mode);
        assert!(config.gateway.enabled);
        assert_eq!(config.gateway.port, 8069);
        assert_eq!(config.webhooks.timeout_secs, 15);
        assert_eq!(config.crm.handoff_queue, QueueType::Kcc);
        assert!(config.telegram.bot_token.is_none());
    }

    #[test]
    fn debug_redacts_secrets() {
        let telegram = TelegramConfig {
            bot_token: Some("123:secret".into()),
            api_url: None,
        };
        let gateway = GatewayConfig {
            callback_token: Some("cb-secret".into()),
            ..GatewayConfig::default()
        };
        let out = format!("{telegram:?} {gateway:?}");
        assert!(!out.contains("123:secret"));
        assert!(!out.contains("cb-secret"));
        assert!(out.contains("[redacted]"));
    }

    #[test]
    fn handoff_queue_parses_snake_case() {
        let toml_str = r#"
[crm]
handoff_queue = "incoming"
sales_team_id = 2
"#;
        let config: RayhubConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.crm.handoff_queue, QueueType::Incoming);
        assert_eq!(config.crm.sales_team_id, Some(2));
    }

    #[test]
    fn crm_denies_unknown_fields() {
        let toml_str = r#"
[crm]
sales_team = "Managers"
"#;
        assert!(toml::from_str::<RayhubConfig>(toml_str).is_err());
    }
}
