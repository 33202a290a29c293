// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flat JSON payloads consumed by the proposal generator workflows.

use rayhub_core::RayhubError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::calculator::{SizingInput, SizingResult, size};
use crate::catalog::{panel_watts, storage_model};

fn default_power_regulation() -> String {
    "ДСТУ-Н Б В.2.5-44:2011 (МСЕЕ 364-4-43:2001)".to_string()
}

fn default_monitoring_device() -> String {
    "Huawei Smart Dongle".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_price_vat_type() -> String {
    "без ПДВ".to_string()
}

fn default_uze_vat() -> String {
    "без ПДВ".to_string()
}

fn default_equipment_vat() -> String {
    "з ПДВ".to_string()
}

fn default_usage_type() -> String {
    "На власне споживання".to_string()
}

fn default_delivery_term() -> String {
    "3 місяці".to_string()
}

fn default_payment_terms() -> String {
    "100% передплата".to_string()
}

fn default_delivery_terms() -> String {
    "DAP. Доставка до об'єкту Замовника без послуг по розвантаженню".to_string()
}

fn default_uze_qty() -> u32 {
    1
}

/// Descriptive fields of a solar (SES) proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SesDetails {
    pub project_name: String,
    pub manager: String,
    pub region: String,
    /// Panel model name, e.g. "Trina Vertex S+ 575W".
    pub module_type: String,
    #[serde(default)]
    pub mount_type: String,
    #[serde(default)]
    pub material_type: String,
    #[serde(default)]
    pub ses_type: String,
    #[serde(default = "default_power_regulation")]
    pub power_regulation: String,
    #[serde(default = "default_monitoring_device")]
    pub monitoring_device: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_price_vat_type")]
    pub price_vat_type: String,
    #[serde(default)]
    pub price_per_kw: f64,
}

/// Fields of a storage (UZE) proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UzeDetails {
    pub project_name: String,
    pub manager: String,
    pub region: String,
    pub uze_model: String,
    #[serde(default = "default_uze_qty")]
    pub uze_qty: u32,
    #[serde(default = "default_uze_vat")]
    pub uze_vat: String,
    #[serde(default = "default_equipment_vat")]
    pub equipment_vat: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_usage_type")]
    pub usage_type: String,
    #[serde(default = "default_delivery_term")]
    pub delivery_term: String,
    #[serde(default = "default_payment_terms")]
    pub payment_terms: String,
    #[serde(default = "default_delivery_terms")]
    pub delivery_terms: String,
}

/// Output of [`build_ses_payload`]: the generator payload plus the sizing it
/// was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct SesProposal {
    pub payload: Map<String, Value>,
    pub sizing: SizingResult,
}

fn require(field: &str, value: &str) -> Result<(), RayhubError> {
    if value.trim().is_empty() {
        return Err(RayhubError::validation(format!("{field} is required")));
    }
    Ok(())
}

/// Size the plant and build the SES generator payload.
pub fn build_ses_payload(
    details: &SesDetails,
    input: &SizingInput,
) -> Result<SesProposal, RayhubError> {
    require("project name", &details.project_name)?;
    require("manager", &details.manager)?;
    require("region", &details.region)?;

    let watts = panel_watts(&details.module_type);
    if watts.is_none() && !details.module_type.is_empty() {
        return Err(RayhubError::validation(format!(
            "unknown panel model `{}`",
            details.module_type
        )));
    }
    let sizing = size(input, watts)?;

    let mut payload = Map::new();
    payload.insert("calculation_mode".into(), json!(sizing.mode.to_string()));
    payload.insert("project_name".into(), json!(details.project_name));
    payload.insert("manager".into(), json!(details.manager));
    payload.insert("region".into(), json!(details.region));
    payload.insert("module_type".into(), json!(details.module_type));
    payload.insert("mount_type".into(), json!(details.mount_type));
    payload.insert("material_type".into(), json!(details.material_type));
    payload.insert("ses_type".into(), json!(details.ses_type));
    payload.insert("power_regulation".into(), json!(details.power_regulation));
    payload.insert("monitoring_device".into(), json!(details.monitoring_device));
    payload.insert("currency".into(), json!(details.currency));
    payload.insert("price_vat_type".into(), json!(details.price_vat_type));
    payload.insert(
        "price_per_kw".into(),
        json!(details.price_per_kw.to_string()),
    );

    match input {
        SizingInput::Consumption { monthly_mwh } => {
            payload.insert("monthly_consumption_mwh".into(), json!(monthly_mwh));
        }
        SizingInput::Power { planned_dc_kw } => {
            payload.insert("planned_dc_power".into(), json!(planned_dc_kw));
        }
        SizingInput::Roof { area_m2, roof_type } => {
            payload.insert("roof_area".into(), json!(area_m2));
            payload.insert("roof_mount_type".into(), json!(roof_type.to_string()));
        }
        SizingInput::Manual { .. } => {}
    }

    payload.extend(equipment_fields(&sizing));
    Ok(SesProposal { payload, sizing })
}

/// Equipment keys shared by every sizing mode.
pub fn equipment_fields(sizing: &SizingResult) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert(
        "real_dc".into(),
        json!(format!("{:.2}", sizing.real_dc_kw)),
    );
    fields.insert(
        "real_ac".into(),
        json!(format!("{:.2}", sizing.real_ac_kw)),
    );
    fields.insert("panel_qty".into(), json!(sizing.panel_qty));
    for (i, slot) in sizing.inverters.iter().enumerate() {
        let n = i + 1;
        fields.insert(format!("inverter_{n}_model"), json!(slot.model));
        fields.insert(format!("inverter_{n}_qty"), json!(slot.qty));
    }
    fields
}

/// Validate a storage order against the catalog and build the UZE payload.
pub fn build_uze_payload(details: &UzeDetails) -> Result<Map<String, Value>, RayhubError> {
    require("project name", &details.project_name)?;
    require("manager", &details.manager)?;
    require("region", &details.region)?;

    let model = storage_model(&details.uze_model).ok_or_else(|| {
        RayhubError::validation(format!("unknown storage model `{}`", details.uze_model))
    })?;
    if details.uze_qty == 0 {
        return Err(RayhubError::validation(
            "storage quantity must be at least 1",
        ));
    }
    if model.max_qty > 0 && details.uze_qty > model.max_qty {
        return Err(RayhubError::QuantityCap {
            model: model.name.to_string(),
            max: model.max_qty,
        });
    }

    let value = serde_json::to_value(details)
        .map_err(|e| RayhubError::Internal(format!("serialize storage payload: {e}")))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(RayhubError::Internal(
            "storage payload is not an object".to_string(),
        )),
    }
}
