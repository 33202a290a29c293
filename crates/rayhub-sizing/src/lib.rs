// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Equipment sizing for commercial proposals.
//!
//! [`calculator::size`] maps a sizing mode and its inputs to an inverter
//! selection and panel count; [`payload`] turns the result into the flat
//! JSON objects the proposal generator expects.

pub mod calculator;
pub mod catalog;
pub mod payload;

pub use calculator::{
    CalculationMode, INVERTER_SLOTS, InverterChoice, InverterSlot, SizingInput, SizingResult,
    round_to_50, select_inverters, size,
};
pub use catalog::{RoofType, panel_watts};
pub use payload::{SesDetails, SesProposal, UzeDetails, build_ses_payload, build_uze_payload};
