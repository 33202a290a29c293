// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Rayhub integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without Telegram or a workflow engine.
//!
//! # Components
//!
//! - [`MockBridge`] - Mock messaging bridge that records every call
//! - [`MockWebhook`] - Mock webhook sink with a scripted response
//! - [`TestHarness`] - Temp database, config and mocks with seed helpers

pub mod harness;
pub mod mock_bridge;
pub mod mock_webhook;

pub use harness::TestHarness;
pub use mock_bridge::{BridgeCall, MockBridge};
pub use mock_webhook::MockWebhook;
