// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CRM services for Rayhub.
//!
//! [`Crm`] ties the database to the messaging bridge and the webhook sink.
//! Each module adds one group of operations:
//!
//! - [`handoff`]: operator <-> manager hand-off and manager suggestions
//! - [`leads`]: bulk lead generation from company clients
//! - [`projects`]: project initiation with chat-pool provisioning
//! - [`pool`]: chat-pool administration
//! - [`bridge`]: message forwarding between channels and Telegram groups
//! - [`proposals`]: commercial proposal generation and its callback
//!
//! Storage transitions commit before any outbound call; outbound failures
//! are logged and never roll back committed state.
//!
//! The host application drives hand-off, lead generation, project initiation,
//! comment forwarding and proposal generation from its own UI. The gateway
//! only exposes the inbound Telegram post and the proposal callback.

pub mod bridge;
pub mod handoff;
pub mod leads;
pub mod pool;
pub mod projects;
pub mod proposals;

use std::sync::Arc;

use rayhub_config::RayhubConfig;
use rayhub_core::traits::{MessagingBridge, WebhookSink};
use rayhub_storage::Database;
use rayhub_storage::queries::notifications;
use tracing::warn;

pub use bridge::{Comment, InboundPost};
pub use handoff::TransferRequest;
pub use leads::{GenerateLeads, GenerateOutcome, OwnerAssignment};
pub use projects::{InitiateProject, ProjectInitiation, ProvisionStep};
pub use proposals::{GenerateProposal, ProposalCallback, ProposalSpec};

/// Record type of leads in notifications.
pub const LEAD_MODEL: &str = "lead";

pub use rayhub_storage::queries::proposals::ORDER_MODEL;

/// Service facade shared by the gateway and the CLI.
#[derive(Clone)]
pub struct Crm {
    db: Database,
    bridge: Option<Arc<dyn MessagingBridge>>,
    webhook: Arc<dyn WebhookSink>,
    config: Arc<RayhubConfig>,
}

impl Crm {
    /// Creates the service. Without a bridge, Telegram calls are skipped.
    pub fn new(
        db: Database,
        bridge: Option<Arc<dyn MessagingBridge>>,
        webhook: Arc<dyn WebhookSink>,
        config: Arc<RayhubConfig>,
    ) -> Self {
        Self {
            db,
            bridge,
            webhook,
            config,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &RayhubConfig {
        &self.config
    }

    /// Post a chatter notification. Runs after commit, so failures are
    /// logged rather than returned.
    pub(crate) async fn post_notification(
        &self,
        target_model: &str,
        target_id: i64,
        recipient_id: Option<i64>,
        body: &str,
    ) {
        if let Err(e) =
            notifications::notify(&self.db, target_model, target_id, recipient_id, body).await
        {
            warn!(
                error = %e,
                target_model,
                target_id,
                "failed to post notification"
            );
        }
    }
}
