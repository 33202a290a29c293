// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Input records for multi-column inserts and transactional operations.
//!
//! Stored rows are returned as the domain types from `rayhub_core::types`.

use rayhub_core::types::{MessageKind, MessageOrigin, ProjectKind, QueueType, TransferKind};

/// A lead to insert.
#[derive(Debug, Clone, Default)]
pub struct NewLead {
    pub name: String,
    pub client_id: Option<i64>,
    pub team_id: Option<i64>,
    pub stage_id: Option<i64>,
    pub owner_id: Option<i64>,
    pub source: Option<String>,
}

/// Operator -> manager hand-off, applied in one transaction.
#[derive(Debug, Clone)]
pub struct HandoffToManager {
    pub lead_id: i64,
    pub operator_id: i64,
    pub kind: TransferKind,
    /// Explicit choice; resolved from the queue or history when absent.
    pub manager_id: Option<i64>,
    pub notes: Option<String>,
    /// Queue used for `new` leads.
    pub queue: QueueType,
    pub sales_team_id: Option<i64>,
    pub sales_stage_id: Option<i64>,
}

/// Manager -> operator return, applied in one transaction.
#[derive(Debug, Clone)]
pub struct HandoffToOperator {
    pub lead_id: i64,
    /// The user performing the return; fallback operator.
    pub acting_user_id: i64,
    pub notes: Option<String>,
    pub operator_team_id: Option<i64>,
    pub operator_stage_id: Option<i64>,
}

/// A channel message to insert, with optional attachments.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub channel_id: i64,
    pub author: String,
    pub body: String,
    pub kind: MessageKind,
    pub origin: MessageOrigin,
    pub attachments: Vec<NewAttachment>,
}

/// A file to store next to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttachment {
    pub filename: String,
    pub mimetype: String,
    pub data: Vec<u8>,
}

/// Project to create for a lead, with its channel and pooled chat.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub lead_id: i64,
    pub name: String,
    pub kind: ProjectKind,
    pub owner_id: Option<i64>,
    pub channel_description: Option<String>,
}
