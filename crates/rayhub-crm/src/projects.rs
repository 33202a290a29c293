// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Project initiation: project, channel and pooled Telegram group in one
//! transaction, then best-effort group provisioning and the
//! `project_initiated` webhook.

use rayhub_core::RayhubError;
use rayhub_core::types::{
    Channel, ChatPoolEntry, Lead, MessageKind, MessageOrigin, Project, ProjectKind, User,
};
use rayhub_storage::queries::projects::InitiatedProject;
use rayhub_storage::queries::{channels, projects, users};
use rayhub_storage::{NewMessage, NewProject};
use rayhub_telegram::html::escape_html;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::{Crm, LEAD_MODEL};

/// Author shown on system posts.
const SYSTEM_AUTHOR: &str = "Rayhub";

/// Project initiation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiateProject {
    pub lead_id: i64,
    pub kind: ProjectKind,
    pub initiator_id: i64,
    /// Extra users to bring into the group besides the initiator and the
    /// lead owner.
    #[serde(default)]
    pub members: Vec<i64>,
}

/// One provisioning call and how it went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionStep {
    pub step: String,
    pub user_id: Option<i64>,
    pub ok: bool,
    pub error: Option<String>,
}

/// Everything produced by an initiation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectInitiation {
    pub project: Project,
    pub channel: Channel,
    pub chat: ChatPoolEntry,
    pub provisioning: Vec<ProvisionStep>,
    pub webhook_delivered: bool,
}

/// `{lead} [{label}]`.
pub fn project_name(lead_name: &str, kind: ProjectKind) -> String {
    format!("{lead_name} [{}]", kind.label())
}

fn step<T>(name: &str, user_id: Option<i64>, result: Result<T, RayhubError>) -> ProvisionStep {
    match result {
        Ok(_) => {
            info!(step = name, user_id = ?user_id, "provisioning step succeeded");
            ProvisionStep {
                step: name.to_string(),
                user_id,
                ok: true,
                error: None,
            }
        }
        Err(e) => {
            warn!(step = name, user_id = ?user_id, error = %e, "provisioning step failed");
            ProvisionStep {
                step: name.to_string(),
                user_id,
                ok: false,
                error: Some(e.to_string()),
            }
        }
    }
}

impl Crm {
    /// Initiate the delivery project for a won opportunity.
    ///
    /// Fails with `NoFreeChat` and no side effects when the pool is empty.
    pub async fn initiate_project(
        &self,
        req: InitiateProject,
    ) -> Result<ProjectInitiation, RayhubError> {
        let lead = self.require_lead_for_project(req.lead_id).await?;
        let initiator = users::get_user(self.db(), req.initiator_id)
            .await?
            .ok_or_else(|| RayhubError::not_found("user", req.initiator_id))?;

        let name = project_name(&lead.name, req.kind);
        let initiated = projects::create_project_with_chat(
            self.db(),
            NewProject {
                lead_id: lead.id,
                name: name.clone(),
                kind: req.kind,
                owner_id: Some(initiator.id),
                channel_description: Some(format!(
                    "Project channel: {name}. Opportunity: {}",
                    lead.name
                )),
            },
        )
        .await?;

        self.announce_project(&lead, &initiated).await;

        let mut member_ids = vec![initiator.id];
        member_ids.extend(lead.owner_id);
        member_ids.extend(req.members.iter().copied());
        let mut seen = std::collections::HashSet::new();
        member_ids.retain(|id| seen.insert(*id));
        let members = users::get_users(self.db(), &member_ids).await?;

        let provisioning = self.provision_chat(&initiated.chat, &name, &members).await;
        let webhook_delivered = self.send_project_webhook(&lead, &initiated, &initiator).await;

        let InitiatedProject {
            project,
            channel,
            chat,
        } = initiated;
        Ok(ProjectInitiation {
            project,
            channel,
            chat,
            provisioning,
            webhook_delivered,
        })
    }

    async fn require_lead_for_project(&self, lead_id: i64) -> Result<Lead, RayhubError> {
        rayhub_storage::queries::leads::get_lead(self.db(), lead_id)
            .await?
            .ok_or_else(|| RayhubError::not_found("lead", lead_id))
    }

    /// First channel post and the lead chatter entry.
    async fn announce_project(&self, lead: &Lead, initiated: &InitiatedProject) {
        let project = &initiated.project;
        let intro = format!(
            "🗂 <b>Project:</b> {}<br/>📋 Type: <b>{}</b><br/>💼 Opportunity: <b>{}</b>",
            escape_html(&project.name),
            project.kind.label(),
            escape_html(&lead.name)
        );
        let posted = channels::post_message(
            self.db(),
            NewMessage {
                channel_id: initiated.channel.id,
                author: SYSTEM_AUTHOR.to_string(),
                body: intro,
                kind: MessageKind::Notification,
                origin: MessageOrigin::Internal,
                attachments: Vec::new(),
            },
        )
        .await;
        if let Err(e) = posted {
            warn!(error = %e, channel_id = initiated.channel.id, "failed to post project intro");
        }

        let body = format!(
            "🚀 <b>Project initiated</b><br/>Type: <b>{}</b><br/>Project: {}<br/>Channel: <b>#{}</b><br/>Telegram group: <b>{}</b>",
            project.kind.label(),
            escape_html(&project.name),
            escape_html(&initiated.channel.name),
            escape_html(&initiated.chat.name)
        );
        self.post_notification(LEAD_MODEL, lead.id, None, &body).await;
    }

    /// Rename the group, then unban, add and promote every member with a
    /// Telegram id. Each call is independent and failures are only logged.
    async fn provision_chat(
        &self,
        chat: &ChatPoolEntry,
        title: &str,
        members: &[User],
    ) -> Vec<ProvisionStep> {
        let Some(bridge) = self.bridge.as_ref() else {
            info!(chat = %chat.name, "no Telegram bridge configured, skipping provisioning");
            return Vec::new();
        };
        let chat_id = chat.tg_chat_id.as_str();
        let mut steps = vec![step(
            "rename_group",
            None,
            bridge.rename_group(chat_id, title).await,
        )];

        for user in members {
            let Some(tg_user) = user.telegram_user_id else {
                warn!(user_id = user.id, user = %user.name, "user has no Telegram id, not added to group");
                continue;
            };
            steps.push(step(
                "unban_member",
                Some(user.id),
                bridge.unban_member(chat_id, tg_user).await,
            ));
            steps.push(step(
                "add_member",
                Some(user.id),
                bridge.add_member(chat_id, tg_user).await,
            ));
            steps.push(step(
                "promote_admin",
                Some(user.id),
                bridge.promote_admin(chat_id, tg_user).await,
            ));
        }
        steps
    }

    async fn send_project_webhook(
        &self,
        lead: &Lead,
        initiated: &InitiatedProject,
        initiator: &User,
    ) -> bool {
        let Some(url) = self.config().webhooks.project_initiated_url.as_deref() else {
            return false;
        };
        let payload = json!({
            "event": "project_initiated",
            "project": {
                "id": initiated.project.id,
                "name": initiated.project.name,
                "template_type": initiated.project.kind,
            },
            "channel": {
                "id": initiated.channel.id,
                "name": initiated.channel.name,
            },
            "telegram_chat": {
                "id": initiated.chat.tg_chat_id,
                "name": initiated.chat.name,
            },
            "initiator": {
                "id": initiator.id,
                "name": initiator.name,
            },
            "crm_lead": {
                "id": lead.id,
                "name": lead.name,
            },
        });
        match self.webhook.post_json(url, &payload).await {
            Ok(resp) if resp.is_success() => true,
            Ok(resp) => {
                warn!(status = resp.status, "project webhook rejected");
                false
            }
            Err(e) => {
                warn!(error = %e, "project webhook failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_names_carry_kind_label() {
        assert_eq!(project_name("Agro LLC", ProjectKind::Ses), "Agro LLC [SES]");
        assert_eq!(project_name("Agro LLC", ProjectKind::SesUze), "Agro LLC [SES+UZE]");
    }

    #[test]
    fn steps_record_errors() {
        let ok = step::<()>("rename_group", None, Ok(()));
        assert!(ok.ok && ok.error.is_none());
        let failed = step::<()>("add_member", Some(4), Err(RayhubError::NoFreeChat));
        assert!(!failed.ok);
        assert_eq!(failed.user_id, Some(4));
        assert_eq!(failed.error.as_deref(), Some("no free chat left in the pool"));
    }
}
