// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits at the seams between services and external systems.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod bridge;
pub mod webhook;

pub use adapter::PluginAdapter;
pub use bridge::MessagingBridge;
pub use webhook::WebhookSink;
