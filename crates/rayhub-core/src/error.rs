// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Rayhub.

use thiserror::Error;

/// The primary error type used across all Rayhub crates.
///
/// Variants fall into three families:
/// - user input validation (`Validation`, `RatioOutOfBand`, `QuantityCap`),
/// - resource exhaustion (`NoCandidate`, `NoFreeChat`),
/// - infrastructure and external services (`Storage`, `External`, ...).
///
/// The first two are surfaced synchronously to the initiating user; see
/// [`RayhubError::is_user_facing`].
#[derive(Debug, Error)]
pub enum RayhubError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Invalid user input: missing selection, inconsistent record, duplicate key.
    #[error("{0}")]
    Validation(String),

    /// The named queue has no eligible (not paused) assignee.
    #[error("no eligible assignee in queue `{queue}`")]
    NoCandidate { queue: String },

    /// Every chat in the pool is already bound to a project.
    #[error("no free chat left in the pool")]
    NoFreeChat,

    /// Computed DC/AC ratio is outside the permitted band.
    #[error("DC/AC ratio {ratio:.2} is outside the permitted range {min}-{max}")]
    RatioOutOfBand { ratio: f64, min: f64, max: f64 },

    /// Requested quantity exceeds the per-model cap.
    #[error("model `{model}` allows at most {max} units")]
    QuantityCap { model: String, max: u32 },

    /// A referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A call to an external service (Telegram, webhook) failed.
    #[error("{service} error: {message}")]
    External {
        service: &'static str,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Shared-secret authentication failed.
    #[error("unauthorized")]
    Unauthorized,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RayhubError {
    /// Shorthand for a [`RayhubError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for a [`RayhubError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns true for errors that must be shown to the initiating user
    /// rather than treated as a crash: input validation and resource exhaustion.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::NoCandidate { .. }
                | Self::NoFreeChat
                | Self::RatioOutOfBand { .. }
                | Self::QuantityCap { .. }
                | Self::NotFound { .. }
        )
    }
}
