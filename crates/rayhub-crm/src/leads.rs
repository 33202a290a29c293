// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bulk lead generation from company clients.

use std::collections::HashSet;

use rayhub_core::RayhubError;
use rayhub_storage::NewLead;
use rayhub_storage::queries::{leads, users};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::Crm;

/// How generated leads are distributed among operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "operators", rename_all = "snake_case")]
pub enum OwnerAssignment {
    /// Every lead goes to one operator.
    Single(i64),
    /// Operators take turns in the given order.
    RoundRobin(Vec<i64>),
}

impl OwnerAssignment {
    fn operators(&self) -> Vec<i64> {
        match self {
            OwnerAssignment::Single(id) => vec![*id],
            OwnerAssignment::RoundRobin(ids) => ids.clone(),
        }
    }
}

/// Lead generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateLeads {
    pub client_ids: Vec<i64>,
    pub assignment: OwnerAssignment,
    #[serde(default)]
    pub source: Option<String>,
    /// Skip clients that already have an open lead.
    #[serde(default = "default_skip_existing")]
    pub skip_existing: bool,
}

fn default_skip_existing() -> bool {
    true
}

/// Result of a generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateOutcome {
    pub created: Vec<i64>,
    pub skipped: usize,
}

impl Crm {
    /// Create one call-center lead per selected company client.
    ///
    /// Person clients are ignored. Owners rotate over the operator list.
    pub async fn generate_leads(&self, req: GenerateLeads) -> Result<GenerateOutcome, RayhubError> {
        let operators = req.assignment.operators();
        if operators.is_empty() {
            return Err(RayhubError::validation("select at least one operator"));
        }
        let found = users::get_users(self.db(), &operators).await?;
        if let Some(missing) = operators.iter().find(|id| !found.iter().any(|u| u.id == **id)) {
            return Err(RayhubError::not_found("user", missing));
        }

        let clients = users::get_clients(self.db(), &req.client_ids).await?;
        let open: HashSet<i64> = if req.skip_existing {
            leads::clients_with_open_leads(self.db(), &req.client_ids)
                .await?
                .into_iter()
                .collect()
        } else {
            HashSet::new()
        };

        let crm = &self.config().crm;
        let source = req.source.filter(|s| !s.trim().is_empty());
        let mut batch = Vec::new();
        let mut skipped = 0;
        for client in clients.iter().filter(|c| c.is_company) {
            if open.contains(&client.id) {
                skipped += 1;
                continue;
            }
            let owner = operators[batch.len() % operators.len()];
            batch.push(NewLead {
                name: client.name.clone(),
                client_id: Some(client.id),
                team_id: crm.operator_team_id,
                stage_id: crm.operator_first_stage_id,
                owner_id: Some(owner),
                source: source.clone(),
            });
        }

        let created = leads::create_leads(self.db(), batch).await?;
        info!(created = created.len(), skipped, "generated leads");
        Ok(GenerateOutcome { created, skipped })
    }
}
