// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` opens a temp SQLite database, builds a configuration with
//! every integration enabled, and owns the mock adapters. Services under test
//! are assembled from its parts.

use std::sync::Arc;

use rayhub_config::RayhubConfig;
use rayhub_config::model::{CrmConfig, GatewayConfig, StorageConfig, TelegramConfig, WebhookConfig};
use rayhub_core::RayhubError;
use rayhub_core::types::{ChatPoolEntry, Client, Lead, QueueEntry, QueueType, User};
use rayhub_storage::queries::{chat_pool, leads, queue, users};
use rayhub_storage::{Database, NewLead};

use crate::mock_bridge::MockBridge;
use crate::mock_webhook::MockWebhook;

pub const OPERATOR_TEAM: i64 = 1;
pub const OPERATOR_FIRST_STAGE: i64 = 10;
pub const OPERATOR_PAUSED_STAGE: i64 = 11;
pub const SALES_TEAM: i64 = 2;
pub const SALES_FIRST_STAGE: i64 = 20;
pub const BOT_TOKEN: &str = "123456:test-token";
pub const CALLBACK_TOKEN: &str = "kp-secret";
pub const PUBLIC_BASE_URL: &str = "https://crm.example.test/";
pub const PROJECT_WEBHOOK: &str = "https://flows.example.test/project";
pub const SES_WEBHOOK: &str = "https://flows.example.test/kp-ses";
pub const UZE_WEBHOOK: &str = "https://flows.example.test/kp-uze";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    callback_token: Option<String>,
    project_webhook: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            callback_token: Some(CALLBACK_TOKEN.to_string()),
            project_webhook: true,
        }
    }

    /// Leave the proposal callback token unset.
    pub fn without_callback_token(mut self) -> Self {
        self.callback_token = None;
        self
    }

    /// Leave the project-initiated webhook URL unset.
    pub fn without_project_webhook(mut self) -> Self {
        self.project_webhook = false;
        self
    }

    /// Build the test harness, creating the database and mocks.
    pub async fn build(self) -> Result<TestHarness, RayhubError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| RayhubError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db").to_string_lossy().into_owned();
        let db = Database::open(&db_path).await?;

        let config = RayhubConfig {
            storage: StorageConfig {
                database_path: db_path,
                wal_mode: true,
            },
            gateway: GatewayConfig {
                public_base_url: Some(PUBLIC_BASE_URL.to_string()),
                callback_token: self.callback_token,
                ..GatewayConfig::default()
            },
            telegram: TelegramConfig {
                bot_token: Some(BOT_TOKEN.to_string()),
                api_url: None,
            },
            webhooks: WebhookConfig {
                project_initiated_url: self.project_webhook.then(|| PROJECT_WEBHOOK.to_string()),
                proposal_ses_url: Some(SES_WEBHOOK.to_string()),
                proposal_uze_url: Some(UZE_WEBHOOK.to_string()),
                ..WebhookConfig::default()
            },
            crm: CrmConfig {
                operator_team_id: Some(OPERATOR_TEAM),
                operator_first_stage_id: Some(OPERATOR_FIRST_STAGE),
                operator_paused_stage_id: Some(OPERATOR_PAUSED_STAGE),
                sales_team_id: Some(SALES_TEAM),
                sales_first_stage_id: Some(SALES_FIRST_STAGE),
                handoff_queue: QueueType::Kcc,
            },
            ..RayhubConfig::default()
        };

        Ok(TestHarness {
            db,
            config: Arc::new(config),
            bridge: Arc::new(MockBridge::new()),
            webhook: Arc::new(MockWebhook::new()),
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    /// Database handle (temp file, cleaned up on drop).
    pub db: Database,
    /// Configuration with every integration pointed at a test URL.
    pub config: Arc<RayhubConfig>,
    /// The mock messaging bridge.
    pub bridge: Arc<MockBridge>,
    /// The mock webhook sink.
    pub webhook: Arc<MockWebhook>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Build a harness with default options.
    pub async fn new() -> Result<Self, RayhubError> {
        Self::builder().build().await
    }

    /// Insert a user, optionally linked to a Telegram account.
    pub async fn user(&self, name: &str, telegram_user_id: Option<i64>) -> User {
        users::create_user(&self.db, name, telegram_user_id)
            .await
            .expect("create user")
    }

    /// Insert a user and put them in a queue at `rank`.
    pub async fn queued_user(&self, name: &str, queue_type: QueueType, rank: i64) -> (User, QueueEntry) {
        let user = self.user(name, None).await;
        let entry = queue::add_entry(&self.db, user.id, queue_type, rank)
            .await
            .expect("add queue entry");
        (user, entry)
    }

    /// Insert a company client.
    pub async fn company(&self, name: &str) -> Client {
        users::create_client(&self.db, name, true, None)
            .await
            .expect("create company")
    }

    /// Insert a contact person, optionally linked to a company.
    pub async fn person(&self, name: &str, company_id: Option<i64>) -> Client {
        users::create_client(&self.db, name, false, company_id)
            .await
            .expect("create person")
    }

    /// Insert a lead owned by `owner_id` in the operator team's first stage.
    pub async fn lead(&self, name: &str, client_id: Option<i64>, owner_id: Option<i64>) -> Lead {
        leads::create_lead(
            &self.db,
            NewLead {
                name: name.to_string(),
                client_id,
                team_id: Some(OPERATOR_TEAM),
                stage_id: Some(OPERATOR_FIRST_STAGE),
                owner_id,
                source: None,
            },
        )
        .await
        .expect("create lead")
    }

    /// Register a pooled Telegram group.
    pub async fn pooled_chat(&self, name: &str, tg_chat_id: &str) -> ChatPoolEntry {
        chat_pool::seed(&self.db, name, tg_chat_id)
            .await
            .expect("seed chat")
    }
}
