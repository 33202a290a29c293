// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. Every function takes `&Database` and runs on the
//! single writer thread.

pub mod attachments;
pub mod channels;
pub mod chat_pool;
pub mod leads;
pub mod notifications;
pub mod projects;
pub mod proposals;
pub mod queue;
pub mod transfers;
pub mod users;
