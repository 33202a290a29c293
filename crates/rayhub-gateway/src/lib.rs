// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound HTTP gateway.
//!
//! Serves the endpoints external workflows call back into:
//! - `POST /kp/callback`: generated proposal document
//! - `POST /tg/post`: message relayed from a Telegram group
//! - `GET /health`: liveness and database check
//!
//! Both POST endpoints authenticate with a shared secret carried in the body.

pub mod handlers;
pub mod server;

pub use server::{GatewayState, ServerConfig, build_router, start_server};
