// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Equipment catalogs and sizing constants.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Nominal DC/AC ratio used to derive DC from AC and back.
pub const DC_AC_RATIO: f64 = 1.28;
/// Lower bound of the permitted DC/AC ratio.
pub const MIN_RATIO: f64 = 1.1;
/// Upper bound of the permitted DC/AC ratio.
pub const MAX_RATIO: f64 = 1.5;
/// Yearly generation (kWh) per 100 kW of installed AC.
pub const GENERATION_PER_100KW: f64 = 18_000.0;
/// Smallest plant the automatic modes will propose (kW AC).
pub const MIN_AC_KW: u32 = 100;
/// Smallest monthly consumption accepted by consumption mode (MWh).
pub const MIN_MONTHLY_MWH: f64 = 10.0;
/// Smallest total inverter power accepted in manual mode (kW AC).
pub const MIN_MANUAL_AC_KW: u32 = 30;
/// Largest plant any mode will size (kW AC).
pub const MAX_AC_KW: u32 = 100_000;
/// Inverters at or above this power are placed first in greedy selection.
pub const LARGE_INVERTER_KW: u32 = 100;

/// A grid inverter model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inverter {
    pub model: &'static str,
    pub power_kw: u32,
}

/// Inverter catalog, largest first.
pub const INVERTERS: &[Inverter] = &[
    Inverter {
        model: "Huawei SUN2000-150KTL-G0",
        power_kw: 150,
    },
    Inverter {
        model: "Huawei SUN2000-115KTL-M2",
        power_kw: 115,
    },
    Inverter {
        model: "Huawei SUN2000-100KTL-M2",
        power_kw: 100,
    },
    Inverter {
        model: "Huawei SUN2000-50KTL-M3",
        power_kw: 50,
    },
    Inverter {
        model: "Huawei SUN2000-30KTL-M3",
        power_kw: 30,
    },
];

/// Look up an inverter by model name.
pub fn inverter(model: &str) -> Option<&'static Inverter> {
    INVERTERS.iter().find(|inv| inv.model == model)
}

/// Solar module models offered in proposals.
pub const PANEL_MODELS: &[&str] = &[
    "Trina Vertex S+ 575W",
    "Trina Vertex S+ 580W",
    "Trina Vertex S+ 585W",
    "Trina Vertex S+ 590W",
    "Trina Vertex S+ 595W",
    "Trina Vertex S+ 600W",
    "JA Solar Deep Blue 605W",
    "JA Solar Deep Blue 610W",
    "JA Solar Deep Blue 615W",
    "JA Solar Deep Blue 620W",
    "JA Solar Deep Blue 625W",
    "Longi Hi-MO 6 630W",
    "Longi Hi-MO 6 635W",
    "Longi Hi-MO 6 640W",
    "Longi Hi-MO 6 645W",
    "Longi Hi-MO 6 650W",
    "Longi Hi-MO 6 655W",
    "Longi Hi-MO 6 660W",
    "Longi Hi-MO 6 665W",
    "Longi Hi-MO 6 670W",
    "Longi Hi-MO 6 680W",
    "Longi Hi-MO 6 695W",
    "Longi Hi-MO 6 710W",
];

/// Panel wattage parsed from a model name ending in e.g. `575W`.
pub fn panel_watts(model: &str) -> Option<u32> {
    model
        .split_whitespace()
        .last()?
        .strip_suffix(['W', 'w'])?
        .parse()
        .ok()
        .filter(|w| *w > 0)
}

/// Roof construction, selecting the area-to-DC coefficient.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RoofType {
    #[default]
    Tilted,
    Flat,
}

impl RoofType {
    /// Installable DC per square metre of roof (W/m2).
    pub fn coefficient(self) -> f64 {
        match self {
            RoofType::Tilted => 130.55,
            RoofType::Flat => 229.33,
        }
    }
}

/// An energy-storage model and its order cap (0 = unlimited, made to order).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageModel {
    pub name: &'static str,
    pub max_qty: u32,
}

const fn storage(name: &'static str, max_qty: u32) -> StorageModel {
    StorageModel { name, max_qty }
}

/// Storage catalog.
pub const STORAGE_MODELS: &[StorageModel] = &[
    storage("RESS-100-215 Режим off-grid (авт. шовний) з контролером", 5),
    storage("RESS-100-215 Режим off-grid (ручний) без контролера", 5),
    storage("RESS-125-241 (з контролером)", 5),
    storage("RESS-125-241 (без контролера)", 5),
    storage("RESS-1125-2170 Режим off-grid (шовний)", 1),
    storage("RESS-1125-2170 Режим off-grid (безшовний)", 1),
    storage("RESS-100-233L", 1),
    storage("RESS-80-241", 1),
    storage("RESS-2500-5015", 50),
    storage("RESS-1000-4180", 50),
    storage("RESS-1250-4180", 50),
    storage("RESS-1500-4180", 50),
    storage("RESS-1000-5015", 50),
    storage("RESS-1250-5015", 50),
    storage("RESS-1500-5015", 50),
    storage("RESS-1725-3344", 50),
    storage("RESS-125-257", 0),
    storage("RESS-1000-3344", 0),
    storage("RESS-1250-3344", 0),
    storage("RESS-1500-3344", 0),
    storage("RESS-1725-4180", 0),
    storage("RESS-2000-4180", 0),
    storage("RESS-1725-5015", 0),
    storage("RESS-500-1000 лише off-grid", 0),
    storage("RESS-100-241", 0),
    storage("RESS-50-241", 0),
    storage("RESS-60-241", 0),
    storage("RESS-125-261 Режим off-grid (не швидкий) без STS", 0),
    storage("RESS-125-261 Режим off-grid (швидкий) з STS", 0),
];

/// Look up a storage model by name.
pub fn storage_model(name: &str) -> Option<&'static StorageModel> {
    STORAGE_MODELS.iter().find(|m| m.name == name)
}
