// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Rayhub.
//!
//! Provides the error type, the domain types persisted by `rayhub-storage`,
//! and the adapter traits implemented by the Telegram bridge and the
//! webhook client.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::RayhubError;
pub use types::{AdapterType, HealthStatus};

pub use traits::{MessagingBridge, PluginAdapter, WebhookSink};
