// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway.
//!
//! Handles GET /health, POST /tg/post, POST /kp/callback. Every response body
//! carries a `status` of `ok` or `error`.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rayhub_core::RayhubError;
use rayhub_crm::{InboundPost, ProposalCallback};
use serde::Serialize;

use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Binary version.
    pub version: String,
    pub uptime_secs: u64,
    pub database: String,
}

/// Response body for accepted bridge posts.
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub status: &'static str,
    pub message_id: i64,
}

/// Response body for accepted proposal callbacks.
#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub status: &'static str,
    pub attachment_id: i64,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}

/// A [`RayhubError`] rendered as an HTTP response.
pub struct ApiError(pub RayhubError);

impl From<RayhubError> for ApiError {
    fn from(err: RayhubError) -> Self {
        Self(err)
    }
}

/// HTTP status for an error.
pub fn status_for(err: &RayhubError) -> StatusCode {
    match err {
        RayhubError::Unauthorized => StatusCode::UNAUTHORIZED,
        RayhubError::NotFound { .. } => StatusCode::NOT_FOUND,
        RayhubError::NoCandidate { .. } | RayhubError::NoFreeChat => StatusCode::CONFLICT,
        RayhubError::Validation(_)
        | RayhubError::RatioOutOfBand { .. }
        | RayhubError::QuantityCap { .. } => StatusCode::BAD_REQUEST,
        RayhubError::External { .. } => StatusCode::BAD_GATEWAY,
        RayhubError::Config(_) | RayhubError::Storage { .. } | RayhubError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let message = if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
            "internal error".to_string()
        } else {
            self.0.to_string()
        };
        (
            status,
            Json(ErrorResponse {
                status: "error",
                message,
            }),
        )
            .into_response()
    }
}

/// GET /health
///
/// Unauthenticated; reports the database as `ok` or `unavailable`.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let database = match state.crm.db().ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "health check: database ping failed");
            "unavailable"
        }
    };
    let code = if database == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        code,
        Json(HealthResponse {
            status: if database == "ok" { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: state.start_time.elapsed().as_secs(),
            database: database.to_string(),
        }),
    )
        .into_response()
}

/// POST /tg/post
///
/// Stores a message relayed from a Telegram group in its bound channel.
pub async fn post_telegram_message(
    State(state): State<GatewayState>,
    Json(body): Json<InboundPost>,
) -> Result<Json<PostResponse>, ApiError> {
    let message = state.crm.receive_from_telegram(body).await?;
    Ok(Json(PostResponse {
        status: "ok",
        message_id: message.id,
    }))
}

/// POST /kp/callback
///
/// Attaches a generated proposal PDF to its order.
pub async fn post_proposal_callback(
    State(state): State<GatewayState>,
    Json(body): Json<ProposalCallback>,
) -> Result<Json<CallbackResponse>, ApiError> {
    let (_, attachment) = state.crm.complete_proposal(body).await?;
    Ok(Json(CallbackResponse {
        status: "ok",
        attachment_id: attachment.id,
    }))
}
