// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by storage, services, and adapters.
//!
//! Enums are persisted as snake_case text; `strum` provides the
//! `Display`/`FromStr` pair used by the storage layer.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Messaging,
    Webhook,
    Storage,
}

// --- Queue ---

/// A named assignment rotation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QueueType {
    /// Leads handed over by the call-center.
    Kcc,
    /// Inbound requests (site, phone).
    Incoming,
    /// Credit department rotation.
    Credit,
}

/// One assignee's position in one queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: i64,
    pub user_id: i64,
    pub queue_type: QueueType,
    /// Lower rank is served first.
    pub rank: i64,
    pub paused: bool,
    pub assignment_count: i64,
    /// ISO 8601 timestamp; `None` until the first assignment.
    pub last_assigned: Option<String>,
}

// --- Hand-off ---

/// Whether the lead is new to sales or is coming back to a previous manager.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    New,
    Old,
}

/// Direction of a hand-off.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Call-center operator -> sales manager.
    ToManager,
    /// Sales manager -> operator pool.
    ToOperator,
}

/// Lifecycle state of a transfer record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransferState {
    Active,
    Returned,
    Won,
    Lost,
}

/// Terminal sales-pipeline outcome.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Won,
    Lost,
}

impl From<Outcome> for TransferState {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Won => TransferState::Won,
            Outcome::Lost => TransferState::Lost,
        }
    }
}

/// One hand-off event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub id: i64,
    pub lead_id: i64,
    pub operator_id: Option<i64>,
    pub manager_id: Option<i64>,
    /// Only set for operator -> manager transfers.
    pub kind: Option<TransferKind>,
    pub direction: Direction,
    pub state: TransferState,
    pub notes: Option<String>,
    pub created_at: String,
}

// --- CRM records ---

/// A staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    /// Numeric Telegram user id, needed for group provisioning.
    pub telegram_user_id: Option<i64>,
}

/// A customer: a company, or a person optionally linked to one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub is_company: bool,
    pub company_id: Option<i64>,
}

/// Lead or opportunity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadKind {
    Lead,
    Opportunity,
}

/// A sales prospect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub name: String,
    pub kind: LeadKind,
    pub client_id: Option<i64>,
    /// The client is a private person with no parent company.
    pub client_unlinked_person: bool,
    pub team_id: Option<i64>,
    pub stage_id: Option<i64>,
    pub owner_id: Option<i64>,
    /// Operator who last worked the lead before a hand-off.
    pub last_operator_id: Option<i64>,
    pub source: Option<String>,
    pub project_id: Option<i64>,
    pub project_kind: Option<ProjectKind>,
    pub outcome: Option<Outcome>,
}

/// Type of installation a project delivers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectKind {
    /// Solar power plant.
    Ses,
    /// Energy storage system.
    Uze,
    /// Both.
    SesUze,
}

impl ProjectKind {
    /// Human label appended to project names.
    pub fn label(self) -> &'static str {
        match self {
            ProjectKind::Ses => "SES",
            ProjectKind::Uze => "UZE",
            ProjectKind::SesUze => "SES+UZE",
        }
    }
}

/// A delivery project created from a won opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub kind: ProjectKind,
    pub lead_id: Option<i64>,
    pub owner_id: Option<i64>,
    pub channel_id: Option<i64>,
}

/// Internal discussion channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// Kind of channel message; only comments are bridged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Comment,
    Notification,
}

/// Where a channel message was authored.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageOrigin {
    Internal,
    Telegram,
}

/// A message posted in an internal channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub id: i64,
    pub channel_id: i64,
    pub author: String,
    /// HTML body.
    pub body: String,
    pub kind: MessageKind,
    pub origin: MessageOrigin,
    pub created_at: String,
}

/// A stored binary file attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    /// Owning record type, e.g. `order` or `channel_message`.
    pub owner_model: String,
    pub owner_id: i64,
    pub filename: String,
    pub mimetype: String,
    pub data: Vec<u8>,
}

/// A chatter post mentioning the responsible user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    /// `lead` or `order`.
    pub target_model: String,
    pub target_id: i64,
    pub recipient_id: Option<i64>,
    pub body: String,
    pub created_at: String,
}

// --- Chat pool ---

/// Allocation state of a pooled Telegram group.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChatState {
    Free,
    Busy,
}

/// One pre-provisioned Telegram group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPoolEntry {
    pub id: i64,
    pub name: String,
    /// Telegram chat id, negative for groups (e.g. `-1003883870898`).
    pub tg_chat_id: String,
    pub state: ChatState,
    pub project_id: Option<i64>,
    pub channel_id: Option<i64>,
}

// --- Proposals ---

/// Commercial proposal family.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProposalKind {
    /// Solar power plant.
    Ses,
    /// Energy storage system.
    Uze,
}

/// Generation status of an order's proposal document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    #[strum(serialize = "none")]
    #[serde(rename = "none")]
    NotGenerated,
    Pending,
    Done,
}

/// Proposal generation job for one sales order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalRequest {
    pub order_id: i64,
    pub order_name: String,
    /// Opportunity the order belongs to, mirrored on completion.
    pub lead_id: Option<i64>,
    pub kind: Option<ProposalKind>,
    pub mode: Option<String>,
    /// Computed equipment bill as sent to the generator (JSON).
    pub equipment: Option<String>,
    pub status: ProposalStatus,
    pub updated_at: String,
}

// --- Messaging bridge ---

/// Telegram upload method chosen for an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    Voice,
    Audio,
    Document,
}

impl MediaKind {
    /// Pick the upload method for a MIME type.
    ///
    /// WebP and GIF images go as documents; Telegram would otherwise
    /// recompress or animate them.
    pub fn from_mimetype(mimetype: &str) -> Self {
        let mimetype = mimetype.to_ascii_lowercase();
        if mimetype.starts_with("image/") && mimetype != "image/webp" && mimetype != "image/gif"
        {
            MediaKind::Photo
        } else if mimetype.starts_with("video/") {
            MediaKind::Video
        } else if mimetype == "audio/ogg" {
            MediaKind::Voice
        } else if mimetype.starts_with("audio/") {
            MediaKind::Audio
        } else {
            MediaKind::Document
        }
    }
}

/// A file to upload to a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMedia {
    pub kind: MediaKind,
    pub filename: String,
    pub mimetype: String,
    pub data: Vec<u8>,
    /// Telegram HTML caption.
    pub caption: Option<String>,
}

/// Response of an outbound webhook call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: String,
}

impl WebhookResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn enums_persist_as_snake_case() {
        assert_eq!(QueueType::Kcc.to_string(), "kcc");
        assert_eq!(Direction::ToOperator.to_string(), "to_operator");
        assert_eq!(ProjectKind::SesUze.to_string(), "ses_uze");
        assert_eq!(ProposalStatus::NotGenerated.to_string(), "none");
        assert_eq!(
            ProposalStatus::from_str("none").unwrap(),
            ProposalStatus::NotGenerated
        );
        assert_eq!(
            TransferState::from_str("returned").unwrap(),
            TransferState::Returned
        );
        assert!(ChatState::from_str("taken").is_err());
    }

    #[test]
    fn outcome_maps_to_terminal_state() {
        assert_eq!(TransferState::from(Outcome::Won), TransferState::Won);
        assert_eq!(TransferState::from(Outcome::Lost), TransferState::Lost);
    }

    #[test]
    fn media_kind_routing() {
        assert_eq!(MediaKind::from_mimetype("image/png"), MediaKind::Photo);
        assert_eq!(MediaKind::from_mimetype("IMAGE/JPEG"), MediaKind::Photo);
        assert_eq!(MediaKind::from_mimetype("image/webp"), MediaKind::Document);
        assert_eq!(MediaKind::from_mimetype("image/gif"), MediaKind::Document);
        assert_eq!(MediaKind::from_mimetype("video/mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_mimetype("audio/ogg"), MediaKind::Voice);
        assert_eq!(MediaKind::from_mimetype("audio/mpeg"), MediaKind::Audio);
        assert_eq!(
            MediaKind::from_mimetype("application/pdf"),
            MediaKind::Document
        );
        assert_eq!(MediaKind::from_mimetype(""), MediaKind::Document);
    }

    #[test]
    fn project_kind_labels() {
        assert_eq!(ProjectKind::Ses.label(), "SES");
        assert_eq!(ProjectKind::SesUze.label(), "SES+UZE");
    }

    #[test]
    fn webhook_response_success_range() {
        let ok = WebhookResponse {
            status: 204,
            body: String::new(),
        };
        let bad = WebhookResponse {
            status: 502,
            body: "bad gateway".into(),
        };
        assert!(ok.is_success());
        assert!(!bad.is_success());
    }
}
