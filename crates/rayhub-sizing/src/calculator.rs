// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Solar plant sizing: target AC, greedy inverter selection, panel count.
//!
//! Every function here is pure and deterministic.

use rayhub_core::RayhubError;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::catalog::{
    DC_AC_RATIO, GENERATION_PER_100KW, INVERTERS, LARGE_INVERTER_KW, MAX_AC_KW, MAX_RATIO,
    MIN_AC_KW, MIN_MANUAL_AC_KW, MIN_MONTHLY_MWH, MIN_RATIO, RoofType, inverter,
};

/// Number of inverter slots in a proposal.
pub const INVERTER_SLOTS: usize = 3;

/// How the plant size is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CalculationMode {
    Consumption,
    Power,
    Roof,
    Manual,
}

/// A user-chosen inverter line in manual mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InverterChoice {
    pub model: String,
    pub qty: u32,
}

/// Sizing inputs, one variant per mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SizingInput {
    /// Client consumption in MWh per month.
    Consumption { monthly_mwh: f64 },
    /// Planned DC power in kW.
    Power { planned_dc_kw: f64 },
    /// Usable roof area in m2.
    Roof {
        area_m2: f64,
        #[serde(default)]
        roof_type: RoofType,
    },
    /// Inverters and panel count entered by hand.
    Manual {
        inverters: Vec<InverterChoice>,
        panel_qty: u32,
    },
}

impl SizingInput {
    pub fn mode(&self) -> CalculationMode {
        match self {
            SizingInput::Consumption { .. } => CalculationMode::Consumption,
            SizingInput::Power { .. } => CalculationMode::Power,
            SizingInput::Roof { .. } => CalculationMode::Roof,
            SizingInput::Manual { .. } => CalculationMode::Manual,
        }
    }
}

/// One filled (or empty) inverter slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InverterSlot {
    /// Empty for padding slots.
    pub model: String,
    pub power_kw: u32,
    pub qty: u32,
}

/// Equipment bill for a solar proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingResult {
    pub mode: CalculationMode,
    /// Rounded target before inverter selection; `None` in manual mode.
    pub target_ac_kw: Option<u32>,
    /// Always [`INVERTER_SLOTS`] entries, padded with empty slots.
    pub inverters: Vec<InverterSlot>,
    pub real_ac_kw: f64,
    pub real_dc_kw: f64,
    pub panel_qty: u32,
}

impl SizingResult {
    /// DC/AC ratio, when both sides are non-zero.
    pub fn ratio(&self) -> Option<f64> {
        (self.real_ac_kw > 0.0 && self.real_dc_kw > 0.0).then(|| self.real_dc_kw / self.real_ac_kw)
    }
}

/// Round up to the next multiple of 50, clamping negatives to zero.
/// `None` for non-finite values and results that do not fit a `u32`.
pub fn round_to_50(value: f64) -> Option<u32> {
    if !value.is_finite() {
        return None;
    }
    let rounded = ((value / 50.0).ceil() * 50.0).max(0.0);
    (rounded <= f64::from(u32::MAX)).then_some(rounded as u32)
}

/// Greedy inverter selection.
///
/// Large units (>= 100 kW), largest first, take as many whole units as fit;
/// any remainder is covered by rounding up on the largest small unit.
/// Returns `None` when nothing is selected (zero target).
pub fn select_inverters(target_ac_kw: u32) -> Option<Vec<InverterSlot>> {
    let mut remaining = target_ac_kw;
    let mut slots = Vec::new();

    for inv in INVERTERS.iter().filter(|i| i.power_kw >= LARGE_INVERTER_KW) {
        let qty = remaining / inv.power_kw;
        if qty > 0 {
            slots.push(InverterSlot {
                model: inv.model.to_string(),
                power_kw: inv.power_kw,
                qty,
            });
            remaining -= qty * inv.power_kw;
        }
    }

    if remaining > 0
        && let Some(inv) = INVERTERS.iter().find(|i| i.power_kw < LARGE_INVERTER_KW)
    {
        slots.push(InverterSlot {
            model: inv.model.to_string(),
            power_kw: inv.power_kw,
            qty: remaining.div_ceil(inv.power_kw),
        });
    }

    if slots.is_empty() {
        return None;
    }
    Some(pad_slots(slots))
}

fn pad_slots(mut slots: Vec<InverterSlot>) -> Vec<InverterSlot> {
    slots.resize(INVERTER_SLOTS.max(slots.len()), InverterSlot::default());
    slots.truncate(INVERTER_SLOTS);
    slots
}

/// Summed inverter power; `None` on overflow.
fn total_ac(slots: &[InverterSlot]) -> Option<u32> {
    slots
        .iter()
        .try_fold(0u32, |acc, s| s.power_kw.checked_mul(s.qty)?.checked_add(acc))
}

fn panels_for(dc_kw: f64, panel_watts: Option<u32>) -> Result<u32, RayhubError> {
    let Some(watts) = panel_watts.filter(|w| *w > 0) else {
        return Ok(0);
    };
    let panels = (dc_kw / (f64::from(watts) / 1000.0)).ceil();
    if !(panels.is_finite() && (0.0..=f64::from(u32::MAX)).contains(&panels)) {
        return Err(RayhubError::validation("panel count is out of range"));
    }
    Ok(panels as u32)
}

fn require_finite(value: f64, what: &str) -> Result<(), RayhubError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RayhubError::validation(format!("{what} must be a finite number")))
    }
}

fn plant_too_large() -> RayhubError {
    RayhubError::validation(format!("plant exceeds the {MAX_AC_KW} kW AC limit"))
}

fn check_ratio(ac_kw: f64, dc_kw: f64) -> Result<(), RayhubError> {
    if ac_kw > 0.0 && dc_kw > 0.0 {
        let ratio = dc_kw / ac_kw;
        if !(MIN_RATIO..=MAX_RATIO).contains(&ratio) {
            return Err(RayhubError::RatioOutOfBand {
                ratio,
                min: MIN_RATIO,
                max: MAX_RATIO,
            });
        }
    }
    Ok(())
}

/// Target AC (kW) for the automatic modes, before rounding.
fn raw_target(input: &SizingInput) -> Result<f64, RayhubError> {
    match *input {
        SizingInput::Consumption { monthly_mwh } => {
            require_finite(monthly_mwh, "monthly consumption")?;
            if monthly_mwh < MIN_MONTHLY_MWH {
                return Err(RayhubError::validation(format!(
                    "monthly consumption must be at least {MIN_MONTHLY_MWH} MWh"
                )));
            }
            Ok(monthly_mwh * 1000.0 / GENERATION_PER_100KW * 100.0)
        }
        SizingInput::Power { planned_dc_kw } => {
            if !(planned_dc_kw > 0.0) {
                return Err(RayhubError::validation("planned DC power must be positive"));
            }
            require_finite(planned_dc_kw, "planned DC power")?;
            Ok(planned_dc_kw / DC_AC_RATIO)
        }
        SizingInput::Roof { area_m2, roof_type } => {
            if !(area_m2 > 0.0) {
                return Err(RayhubError::validation("roof area must be positive"));
            }
            require_finite(area_m2, "roof area")?;
            Ok(area_m2 * roof_type.coefficient() / 1000.0 / DC_AC_RATIO)
        }
        SizingInput::Manual { .. } => Err(RayhubError::Internal(
            "manual sizing has no target".to_string(),
        )),
    }
}

/// Size a plant. `panel_watts` is the chosen module's wattage, if any;
/// without it the panel count is zero.
pub fn size(input: &SizingInput, panel_watts: Option<u32>) -> Result<SizingResult, RayhubError> {
    if let SizingInput::Manual {
        inverters,
        panel_qty,
    } = input
    {
        return size_manual(inverters, *panel_qty, panel_watts);
    }

    let target = round_to_50(raw_target(input)?)
        .filter(|t| *t <= MAX_AC_KW)
        .ok_or_else(plant_too_large)?
        .max(MIN_AC_KW);
    let inverters = select_inverters(target)
        .ok_or_else(|| RayhubError::validation("could not select inverters for this plant"))?;

    let real_ac = f64::from(total_ac(&inverters).ok_or_else(plant_too_large)?);
    let real_dc = real_ac * DC_AC_RATIO;
    check_ratio(real_ac, real_dc)?;
    let panel_qty = panels_for(real_dc, panel_watts)?;

    Ok(SizingResult {
        mode: input.mode(),
        target_ac_kw: Some(target),
        inverters,
        real_ac_kw: real_ac,
        real_dc_kw: real_dc,
        panel_qty,
    })
}

fn size_manual(
    choices: &[InverterChoice],
    panel_qty: u32,
    panel_watts: Option<u32>,
) -> Result<SizingResult, RayhubError> {
    if choices.len() > INVERTER_SLOTS {
        return Err(RayhubError::validation(format!(
            "at most {INVERTER_SLOTS} inverter lines are allowed"
        )));
    }

    let mut slots = Vec::with_capacity(INVERTER_SLOTS);
    for choice in choices {
        if choice.model.is_empty() {
            slots.push(InverterSlot::default());
            continue;
        }
        let inv = inverter(&choice.model).ok_or_else(|| {
            RayhubError::validation(format!("unknown inverter model `{}`", choice.model))
        })?;
        slots.push(InverterSlot {
            model: inv.model.to_string(),
            power_kw: inv.power_kw,
            qty: choice.qty,
        });
    }
    let slots = pad_slots(slots);

    let real_ac = total_ac(&slots)
        .filter(|ac| *ac <= MAX_AC_KW)
        .ok_or_else(plant_too_large)?;
    if real_ac < MIN_MANUAL_AC_KW {
        return Err(RayhubError::validation(format!(
            "total inverter AC power must be at least {MIN_MANUAL_AC_KW} kW"
        )));
    }
    let real_ac = f64::from(real_ac);
    let real_dc = match panel_watts {
        Some(w) => f64::from(panel_qty) * f64::from(w) / 1000.0,
        None => 0.0,
    };
    check_ratio(real_ac, real_dc)?;

    Ok(SizingResult {
        mode: CalculationMode::Manual,
        target_ac_kw: None,
        inverters: slots,
        real_ac_kw: real_ac,
        real_dc_kw: real_dc,
        panel_qty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn slot_summary(result: &SizingResult) -> Vec<(u32, u32)> {
        result
            .inverters
            .iter()
            .map(|s| (s.power_kw, s.qty))
            .collect()
    }

    #[test]
    fn rounds_up_to_fifty() {
        assert_eq!(round_to_50(0.0), Some(0));
        assert_eq!(round_to_50(-20.0), Some(0));
        assert_eq!(round_to_50(1.0), Some(50));
        assert_eq!(round_to_50(50.0), Some(50));
        assert_eq!(round_to_50(555.55), Some(600));
    }

    #[test]
    fn rounding_rejects_unrepresentable_values() {
        assert_eq!(round_to_50(f64::INFINITY), None);
        assert_eq!(round_to_50(f64::NAN), None);
        assert_eq!(round_to_50(1e12), None);
        assert_eq!(round_to_50(f64::from(u32::MAX) - 10.0), None);
    }

    #[test]
    fn totals_and_panels_never_overflow() {
        let slots = vec![InverterSlot {
            model: "Huawei SUN2000-150KTL-G0".into(),
            power_kw: 150,
            qty: 30_000_000,
        }];
        assert_eq!(total_ac(&slots), None);
        assert!(panels_for(f64::INFINITY, Some(575)).is_err());
        assert!(panels_for(1e12, Some(1)).is_err());
        assert_eq!(panels_for(1e12, None).unwrap(), 0);
    }

    #[test]
    fn oversized_requests_are_rejected() {
        let too_large = [
            SizingInput::Consumption { monthly_mwh: 1e12 },
            SizingInput::Consumption {
                monthly_mwh: f64::INFINITY,
            },
            SizingInput::Power {
                planned_dc_kw: f64::INFINITY,
            },
            SizingInput::Power {
                planned_dc_kw: 200_000.0,
            },
            SizingInput::Roof {
                area_m2: f64::INFINITY,
                roof_type: RoofType::Flat,
            },
            manual(&[("Huawei SUN2000-150KTL-G0", 30_000_000)], 0),
            manual(&[("Huawei SUN2000-150KTL-G0", 1_000)], 0),
            manual(
                &[
                    ("Huawei SUN2000-150KTL-G0", u32::MAX),
                    ("Huawei SUN2000-150KTL-G0", u32::MAX),
                ],
                0,
            ),
        ];
        for input in &too_large {
            let err = size(input, Some(575)).unwrap_err();
            assert!(
                matches!(err, RayhubError::Validation(_)),
                "{input:?} gave {err:?}"
            );
        }

        // Large plants under the limit are still sized.
        let r = size(
            &SizingInput::Consumption {
                monthly_mwh: 10_000.0,
            },
            Some(710),
        )
        .unwrap();
        // 10 000 MWh -> 55 555.6 kW -> 55 600 kW.
        assert_eq!(r.target_ac_kw, Some(55_600));
        assert!(r.real_ac_kw <= f64::from(MAX_AC_KW));
    }

    #[test]
    fn greedy_selection_examples() {
        let pick = |t| {
            select_inverters(t)
                .unwrap()
                .iter()
                .map(|s| (s.power_kw, s.qty))
                .collect::<Vec<_>>()
        };
        assert_eq!(pick(100), vec![(100, 1), (0, 0), (0, 0)]);
        assert_eq!(pick(250), vec![(150, 1), (100, 1), (0, 0)]);
        assert_eq!(pick(400), vec![(150, 2), (100, 1), (0, 0)]);
        // 450 = 3 x 150 exactly.
        assert_eq!(pick(450), vec![(150, 3), (0, 0), (0, 0)]);
        assert_eq!(pick(50), vec![(50, 1), (0, 0), (0, 0)]);
        assert!(select_inverters(0).is_none());
    }

    #[test]
    fn small_remainder_uses_fifty_kw_units() {
        // 1150 = 7 x 150 (1050) + 100 kW.
        let slots = select_inverters(1150).unwrap();
        assert_eq!(total_ac(&slots), Some(1150));
        // 600 = 4 x 150.
        assert_eq!(total_ac(&select_inverters(600).unwrap()), Some(600));
        // 280: 150 + 115 = 265, remainder 15 -> one 50 kW unit.
        let slots = select_inverters(280).unwrap();
        assert_eq!(
            slots.iter().map(|s| (s.power_kw, s.qty)).collect::<Vec<_>>(),
            vec![(150, 1), (115, 1), (50, 1)]
        );
    }

    #[test]
    fn consumption_100_mwh_is_deterministic() {
        let input = SizingInput::Consumption { monthly_mwh: 100.0 };
        let a = size(&input, Some(575)).unwrap();
        let b = size(&input, Some(575)).unwrap();
        assert_eq!(a, b);

        // 100 MWh -> 555.6 kW -> 600 kW AC -> 4 x 150.
        assert_eq!(a.target_ac_kw, Some(600));
        assert_eq!(slot_summary(&a), vec![(150, 4), (0, 0), (0, 0)]);
        assert_eq!(a.real_ac_kw, 600.0);
        assert!((a.real_dc_kw - 768.0).abs() < 1e-9);
        // 768 kW / 0.575 kW = 1335.65 -> 1336 panels.
        assert_eq!(a.panel_qty, 1336);
        assert_eq!(a.mode, CalculationMode::Consumption);
    }

    #[test]
    fn consumption_below_minimum_is_rejected() {
        let err = size(&SizingInput::Consumption { monthly_mwh: 9.99 }, None).unwrap_err();
        assert!(matches!(err, RayhubError::Validation(_)));
    }

    #[test]
    fn small_consumption_is_floored_at_minimum_ac() {
        let r = size(&SizingInput::Consumption { monthly_mwh: 10.0 }, None).unwrap();
        assert_eq!(r.target_ac_kw, Some(MIN_AC_KW));
        assert_eq!(r.panel_qty, 0);
    }

    #[test]
    fn power_mode() {
        let r = size(&SizingInput::Power { planned_dc_kw: 500.0 }, Some(600)).unwrap();
        // 500 / 1.28 = 390.6 -> 400 kW.
        assert_eq!(r.target_ac_kw, Some(400));
        assert_eq!(r.real_ac_kw, 400.0);
        assert_eq!(r.panel_qty, 854); // 512 / 0.6 = 853.3
        assert!(size(&SizingInput::Power { planned_dc_kw: 0.0 }, None).is_err());
        assert!(size(&SizingInput::Power { planned_dc_kw: f64::NAN }, None).is_err());
    }

    #[test]
    fn roof_mode_uses_coefficient() {
        let tilted = size(
            &SizingInput::Roof {
                area_m2: 5000.0,
                roof_type: RoofType::Tilted,
            },
            None,
        )
        .unwrap();
        // 5000 * 130.55 / 1000 / 1.28 = 509.96 -> 550.
        assert_eq!(tilted.target_ac_kw, Some(550));

        let flat = size(
            &SizingInput::Roof {
                area_m2: 5000.0,
                roof_type: RoofType::Flat,
            },
            None,
        )
        .unwrap();
        // 5000 * 229.33 / 1000 / 1.28 = 895.8 -> 900.
        assert_eq!(flat.target_ac_kw, Some(900));

        assert!(size(
            &SizingInput::Roof {
                area_m2: -1.0,
                roof_type: RoofType::Flat
            },
            None
        )
        .is_err());
    }

    fn manual(inverters: &[(&str, u32)], panel_qty: u32) -> SizingInput {
        SizingInput::Manual {
            inverters: inverters
                .iter()
                .map(|(m, q)| InverterChoice {
                    model: m.to_string(),
                    qty: *q,
                })
                .collect(),
            panel_qty,
        }
    }

    #[test]
    fn manual_below_minimum_ac_is_rejected() {
        let err = size(&manual(&[("Huawei SUN2000-30KTL-M3", 0)], 10), Some(575)).unwrap_err();
        assert!(matches!(err, RayhubError::Validation(_)));
    }

    #[test]
    fn manual_ratio_out_of_band_reports_ratio() {
        // 100 kW AC, 200 x 0.6 = 120 kW DC -> 1.20 is fine.
        let ok = size(&manual(&[("Huawei SUN2000-100KTL-M2", 1)], 200), Some(600)).unwrap();
        assert!((ok.ratio().unwrap() - 1.2).abs() < 1e-9);
        assert_eq!(ok.panel_qty, 200);

        // 300 x 0.6 = 180 kW DC -> 1.80.
        let err = size(&manual(&[("Huawei SUN2000-100KTL-M2", 1)], 300), Some(600)).unwrap_err();
        match err {
            RayhubError::RatioOutOfBand { ratio, min, max } => {
                assert!((ratio - 1.8).abs() < 1e-9);
                assert_eq!((min, max), (MIN_RATIO, MAX_RATIO));
            }
            other => panic!("expected RatioOutOfBand, got {other:?}"),
        }
        assert_eq!(
            size(&manual(&[("Huawei SUN2000-100KTL-M2", 1)], 300), Some(600))
                .unwrap_err()
                .to_string(),
            "DC/AC ratio 1.80 is outside the permitted range 1.1-1.5"
        );
    }

    #[test]
    fn manual_ratio_band_is_inclusive() {
        let inv = [("Huawei SUN2000-100KTL-M2", 1)];
        // 220 x 0.5 = 110 kW DC on 100 kW AC -> exactly 1.10.
        let low = size(&manual(&inv, 220), Some(500)).unwrap();
        assert_eq!(low.ratio(), Some(MIN_RATIO));
        // 300 x 0.5 = 150 kW DC -> exactly 1.50.
        let high = size(&manual(&inv, 300), Some(500)).unwrap();
        assert_eq!(high.ratio(), Some(MAX_RATIO));

        for panels in [219, 301] {
            let err = size(&manual(&inv, panels), Some(500)).unwrap_err();
            assert!(matches!(err, RayhubError::RatioOutOfBand { .. }));
        }
    }

    #[test]
    fn manual_without_dc_skips_ratio_check() {
        let r = size(&manual(&[("Huawei SUN2000-50KTL-M3", 1)], 0), None).unwrap();
        assert_eq!(r.real_dc_kw, 0.0);
        assert!(r.ratio().is_none());
        assert_eq!(r.inverters.len(), INVERTER_SLOTS);
    }

    #[test]
    fn manual_rejects_unknown_model_and_extra_lines() {
        assert!(size(&manual(&[("SUN-9000", 1)], 0), None).is_err());
        let four = [("Huawei SUN2000-50KTL-M3", 1); 4];
        assert!(size(&manual(&four, 0), None).is_err());
    }

    #[test]
    fn input_deserializes_with_mode_tag() {
        let input: SizingInput =
            serde_json::from_str(r#"{"mode":"roof","area_m2":120.5}"#).unwrap();
        assert_eq!(
            input,
            SizingInput::Roof {
                area_m2: 120.5,
                roof_type: RoofType::Tilted
            }
        );
        assert_eq!(input.mode(), CalculationMode::Roof);
    }

    proptest! {
        #[test]
        fn automatic_modes_stay_in_band(mwh in 10.0f64..5000.0, watts in 575u32..=710) {
            let r = size(&SizingInput::Consumption { monthly_mwh: mwh }, Some(watts)).unwrap();
            let ratio = r.ratio().unwrap();
            prop_assert!((MIN_RATIO..=MAX_RATIO).contains(&ratio));
            let target = r.target_ac_kw.unwrap();
            prop_assert!(target >= MIN_AC_KW && target % 50 == 0);
            // Greedy selection overshoots by less than one small unit.
            prop_assert!(r.real_ac_kw >= f64::from(target));
            prop_assert!(r.real_ac_kw < f64::from(target) + 50.0);
            prop_assert_eq!(r.inverters.len(), INVERTER_SLOTS);
            prop_assert!(f64::from(r.panel_qty) * f64::from(watts) / 1000.0 + 1e-6 >= r.real_dc_kw);
        }

        #[test]
        fn power_mode_matches_rounded_target(dc in 1.0f64..10_000.0, watts in 575u32..=710) {
            let r = size(&SizingInput::Power { planned_dc_kw: dc }, Some(watts)).unwrap();
            let expected = round_to_50(dc / DC_AC_RATIO).unwrap().max(MIN_AC_KW);
            prop_assert_eq!(r.target_ac_kw, Some(expected));
            prop_assert!(expected % 50 == 0);
            let ratio = r.ratio().unwrap();
            prop_assert!((MIN_RATIO..=MAX_RATIO).contains(&ratio));
        }

        #[test]
        fn roof_mode_stays_in_band(
            area in 1.0f64..50_000.0,
            flat in any::<bool>(),
            watts in 575u32..=710,
        ) {
            let roof_type = if flat { RoofType::Flat } else { RoofType::Tilted };
            let r = size(&SizingInput::Roof { area_m2: area, roof_type }, Some(watts)).unwrap();
            let target = r.target_ac_kw.unwrap();
            prop_assert!(target >= MIN_AC_KW && target % 50 == 0);
            prop_assert!(r.real_ac_kw >= f64::from(target));
            let ratio = r.ratio().unwrap();
            prop_assert!((MIN_RATIO..=MAX_RATIO).contains(&ratio));
        }

        #[test]
        fn sizing_never_panics(value in proptest::num::f64::ANY, qty in any::<u32>()) {
            let _ = size(&SizingInput::Consumption { monthly_mwh: value }, Some(575));
            let _ = size(&SizingInput::Power { planned_dc_kw: value }, Some(575));
            let _ = size(
                &SizingInput::Roof { area_m2: value, roof_type: RoofType::Flat },
                Some(575),
            );
            let _ = size(&manual(&[("Huawei SUN2000-150KTL-G0", qty)], qty), Some(575));
        }
    }
}
