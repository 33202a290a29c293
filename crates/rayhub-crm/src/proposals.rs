// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Commercial proposal generation.
//!
//! Generation sizes the equipment, posts the payload to the SES or UZE
//! generator and marks the order `pending`. The generator later calls back
//! with the PDF, which is attached and marks the order `done`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rayhub_core::RayhubError;
use rayhub_core::types::{Attachment, ProposalKind, ProposalRequest};
use rayhub_sizing::{SesDetails, SizingInput, UzeDetails, build_ses_payload, build_uze_payload};
use rayhub_storage::NewAttachment;
use rayhub_storage::queries::proposals;
use rayhub_telegram::html::escape_html;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{error, info};

use crate::{Crm, LEAD_MODEL, ORDER_MODEL};

/// Default name of the generated document.
const DEFAULT_FILENAME: &str = "proposal.pdf";

/// Path of the completion callback under the gateway's public URL.
pub const CALLBACK_PATH: &str = "/kp/callback";

/// What to generate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kp_type", rename_all = "snake_case")]
pub enum ProposalSpec {
    /// Solar plant.
    Ses {
        details: SesDetails,
        sizing: SizingInput,
    },
    /// Storage system.
    Uze { details: UzeDetails },
}

impl ProposalSpec {
    pub fn kind(&self) -> ProposalKind {
        match self {
            ProposalSpec::Ses { .. } => ProposalKind::Ses,
            ProposalSpec::Uze { .. } => ProposalKind::Uze,
        }
    }
}

/// Proposal generation request for one sales order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateProposal {
    pub order_id: i64,
    pub order_name: String,
    /// Opportunity the order belongs to.
    #[serde(default)]
    pub lead_id: Option<i64>,
    pub spec: ProposalSpec,
}

/// Body posted by the generator when the document is ready.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalCallback {
    #[serde(default)]
    pub sale_order_id: Option<i64>,
    #[serde(default)]
    pub pdf_base64: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

fn kind_label(kind: ProposalKind) -> &'static str {
    match kind {
        ProposalKind::Ses => "SES",
        ProposalKind::Uze => "UZE",
    }
}

impl Crm {
    fn callback_url(&self) -> Result<String, RayhubError> {
        let base = self
            .config()
            .gateway
            .public_base_url
            .as_deref()
            .ok_or_else(|| {
                RayhubError::Config("gateway.public_base_url is required for proposals".into())
            })?;
        Ok(format!("{}{CALLBACK_PATH}", base.trim_end_matches('/')))
    }

    fn generator_url(&self, kind: ProposalKind) -> Result<String, RayhubError> {
        let webhooks = &self.config().webhooks;
        let (url, key) = match kind {
            ProposalKind::Ses => (&webhooks.proposal_ses_url, "webhooks.proposal_ses_url"),
            ProposalKind::Uze => (&webhooks.proposal_uze_url, "webhooks.proposal_uze_url"),
        };
        url.clone()
            .ok_or_else(|| RayhubError::Config(format!("{key} is not configured")))
    }

    /// Build the generator payload and post it.
    ///
    /// Validation and delivery errors leave the order untouched.
    pub async fn generate_proposal(
        &self,
        req: GenerateProposal,
    ) -> Result<ProposalRequest, RayhubError> {
        let kind = req.spec.kind();
        let (mut payload, mode, equipment): (Map<String, Value>, Option<String>, Value) =
            match &req.spec {
                ProposalSpec::Ses { details, sizing } => {
                    let built = build_ses_payload(details, sizing)?;
                    let equipment = serde_json::to_value(&built.sizing)
                        .map_err(|e| RayhubError::Internal(format!("serialize sizing: {e}")))?;
                    (built.payload, Some(built.sizing.mode.to_string()), equipment)
                }
                ProposalSpec::Uze { details } => {
                    let payload = build_uze_payload(details)?;
                    let equipment = json!({
                        "uze_model": details.uze_model,
                        "uze_qty": details.uze_qty,
                    });
                    (payload, None, equipment)
                }
            };

        let url = self.generator_url(kind)?;
        payload.insert("sale_order_id".into(), json!(req.order_id));
        payload.insert("sale_order_name".into(), json!(req.order_name));
        payload.insert("callback_url".into(), json!(self.callback_url()?));
        payload.insert("kp_type".into(), json!(kind));
        if let Some(token) = self.config().gateway.callback_token.as_deref() {
            payload.insert("callback_token".into(), json!(token));
        }

        let response = self
            .webhook
            .post_json(&url, &Value::Object(payload))
            .await
            .inspect_err(|e| error!(error = %e, order_id = req.order_id, "proposal webhook failed"))?;
        if !response.is_success() {
            error!(
                status = response.status,
                order_id = req.order_id,
                "proposal generator rejected the request"
            );
            return Err(RayhubError::External {
                service: "proposal generator",
                message: format!("generator returned HTTP {}", response.status),
                source: None,
            });
        }

        proposals::upsert_order(self.db(), req.order_id, &req.order_name, req.lead_id).await?;
        let job = proposals::mark_pending(
            self.db(),
            req.order_id,
            kind,
            mode.as_deref(),
            &equipment.to_string(),
        )
        .await?;

        self.post_notification(
            ORDER_MODEL,
            req.order_id,
            None,
            &format!(
                "📤 Proposal generation started ({}). The PDF will be attached automatically.",
                kind_label(kind)
            ),
        )
        .await;
        info!(order_id = req.order_id, kind = %kind, "proposal generation started");
        Ok(job)
    }

    /// Attach the generated document and mark the order done.
    pub async fn complete_proposal(
        &self,
        callback: ProposalCallback,
    ) -> Result<(ProposalRequest, Attachment), RayhubError> {
        let expected = self
            .config()
            .gateway
            .callback_token
            .as_deref()
            .filter(|t| !t.is_empty());
        if expected.is_none() || expected != callback.token.as_deref() {
            return Err(RayhubError::Unauthorized);
        }

        let (Some(order_id), Some(pdf)) = (callback.sale_order_id, callback.pdf_base64.as_deref())
        else {
            return Err(RayhubError::validation(
                "missing sale_order_id or pdf_base64",
            ));
        };
        let data = STANDARD
            .decode(pdf.trim())
            .map_err(|e| RayhubError::validation(format!("pdf_base64 is not valid base64: {e}")))?;
        let filename = callback
            .filename
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string());

        let (job, attachment) = proposals::complete(
            self.db(),
            order_id,
            NewAttachment {
                filename: filename.clone(),
                mimetype: "application/pdf".to_string(),
                data,
            },
        )
        .await?;

        let name = escape_html(&filename);
        self.post_notification(
            ORDER_MODEL,
            order_id,
            None,
            &format!("✅ <b>Commercial proposal ready!</b><br/>📄 {name}"),
        )
        .await;
        if let Some(lead_id) = job.lead_id {
            self.post_notification(
                LEAD_MODEL,
                lead_id,
                None,
                &format!(
                    "✅ <b>Commercial proposal ready!</b> ({})<br/>📄 {name}",
                    escape_html(&job.order_name)
                ),
            )
            .await;
        }
        info!(order_id, attachment_id = attachment.id, filename = %filename, "proposal attached");
        Ok((job, attachment))
    }
}
