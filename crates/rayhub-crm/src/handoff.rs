// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator <-> manager hand-off.

use rayhub_core::RayhubError;
use rayhub_core::types::{Lead, Outcome, TransferKind, TransferRecord, User};
use rayhub_storage::queries::{leads, transfers, users};
use rayhub_storage::{HandoffToManager, HandoffToOperator};
use rayhub_telegram::html::escape_html;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Crm, LEAD_MODEL};

/// An operator handing a lead to a sales manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub lead_id: i64,
    pub operator_id: i64,
    pub kind: TransferKind,
    /// Explicit choice; otherwise the queue (new) or previous manager (old).
    #[serde(default)]
    pub manager_id: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A lead must have a client, and a private person must belong to a company.
pub fn check_client(lead: &Lead) -> Result<(), RayhubError> {
    if lead.client_id.is_none() {
        return Err(RayhubError::validation(
            "select a client before handing the lead over",
        ));
    }
    if lead.client_unlinked_person {
        return Err(RayhubError::validation(
            "the contact must be linked to a company",
        ));
    }
    Ok(())
}

fn transfer_body(manager: &str, notes: Option<&str>) -> String {
    let mut body = format!("📤 Opportunity handed to manager <b>{}</b>", escape_html(manager));
    if let Some(notes) = notes.filter(|n| !n.trim().is_empty()) {
        body.push_str(&format!("<br/>📝 {}", escape_html(notes)));
    }
    body
}

fn return_body(operator: &str) -> String {
    format!(
        "🔄 Opportunity returned to the call center.<br/>Operator: <b>{}</b>",
        escape_html(operator)
    )
}

impl Crm {
    async fn require_lead(&self, lead_id: i64) -> Result<Lead, RayhubError> {
        leads::get_lead(self.db(), lead_id)
            .await?
            .ok_or_else(|| RayhubError::not_found("lead", lead_id))
    }

    async fn user_name(&self, user_id: Option<i64>) -> String {
        match user_id {
            Some(id) => match users::get_user(self.db(), id).await {
                Ok(Some(user)) => user.name,
                _ => format!("#{id}"),
            },
            None => "-".to_string(),
        }
    }

    /// Who would receive the lead if it were handed over now.
    pub async fn suggest_manager(
        &self,
        lead_id: i64,
        kind: TransferKind,
    ) -> Result<Option<User>, RayhubError> {
        self.require_lead(lead_id).await?;
        let queue = self.config().crm.handoff_queue;
        match transfers::suggest_manager(self.db(), lead_id, kind, queue).await? {
            Some(id) => users::get_user(self.db(), id).await,
            None => Ok(None),
        }
    }

    /// Hand a lead to a manager and notify them.
    pub async fn transfer_to_manager(
        &self,
        req: TransferRequest,
    ) -> Result<TransferRecord, RayhubError> {
        let lead = self.require_lead(req.lead_id).await?;
        check_client(&lead)?;

        let crm = &self.config().crm;
        let record = transfers::transfer_to_manager(
            self.db(),
            HandoffToManager {
                lead_id: req.lead_id,
                operator_id: req.operator_id,
                kind: req.kind,
                manager_id: req.manager_id,
                notes: req.notes.clone(),
                queue: crm.handoff_queue,
                sales_team_id: crm.sales_team_id,
                sales_stage_id: crm.sales_first_stage_id,
            },
        )
        .await?;

        let manager = self.user_name(record.manager_id).await;
        self.post_notification(
            LEAD_MODEL,
            lead.id,
            record.manager_id,
            &transfer_body(&manager, req.notes.as_deref()),
        )
        .await;
        info!(
            lead_id = lead.id,
            manager = %manager,
            kind = %req.kind,
            "lead handed to manager"
        );
        Ok(record)
    }

    /// Return a lead to the call center and notify the operator.
    pub async fn return_to_operator(
        &self,
        lead_id: i64,
        acting_user_id: i64,
        notes: Option<String>,
    ) -> Result<TransferRecord, RayhubError> {
        let crm = &self.config().crm;
        let record = transfers::return_to_operator(
            self.db(),
            HandoffToOperator {
                lead_id,
                acting_user_id,
                notes,
                operator_team_id: crm.operator_team_id,
                operator_stage_id: crm.operator_paused_stage_id,
            },
        )
        .await?;

        let operator = self.user_name(record.operator_id).await;
        self.post_notification(LEAD_MODEL, lead_id, record.operator_id, &return_body(&operator))
            .await;
        Ok(record)
    }

    /// Close the active manager hand-off with a terminal outcome.
    pub async fn record_outcome(&self, lead_id: i64, outcome: Outcome) -> Result<usize, RayhubError> {
        transfers::record_outcome(self.db(), lead_id, outcome).await
    }
}
