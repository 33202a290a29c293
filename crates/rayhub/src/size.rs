// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline plant sizing from the command line.

use rayhub_core::RayhubError;
use rayhub_sizing::{InverterChoice, SizingInput, SizingResult, panel_watts, size};

use crate::{SizeArgs, SizeMode};

/// Parse a `MODEL=QTY` pair. The model may itself contain `=`; the last one splits.
fn parse_inverter(raw: &str) -> Result<InverterChoice, RayhubError> {
    let (model, qty) = raw
        .rsplit_once('=')
        .ok_or_else(|| RayhubError::validation(format!("expected MODEL=QTY, got `{raw}`")))?;
    let model = model.trim();
    if model.is_empty() {
        return Err(RayhubError::validation(format!("missing inverter model in `{raw}`")));
    }
    let qty = qty
        .trim()
        .parse::<u32>()
        .map_err(|_| RayhubError::validation(format!("invalid inverter quantity in `{raw}`")))?;
    Ok(InverterChoice {
        model: model.to_string(),
        qty,
    })
}

fn sizing_input(mode: SizeMode) -> Result<SizingInput, RayhubError> {
    Ok(match mode {
        SizeMode::Consumption { monthly_mwh } => SizingInput::Consumption { monthly_mwh },
        SizeMode::Power { planned_dc_kw } => SizingInput::Power { planned_dc_kw },
        SizeMode::Roof { area_m2, roof_type } => SizingInput::Roof { area_m2, roof_type },
        SizeMode::Manual {
            inverters,
            panel_qty,
        } => SizingInput::Manual {
            inverters: inverters
                .iter()
                .map(|raw| parse_inverter(raw))
                .collect::<Result<_, _>>()?,
            panel_qty,
        },
    })
}

fn render_table(result: &SizingResult) -> String {
    let mut out = format!("mode:        {}\n", result.mode);
    if let Some(target) = result.target_ac_kw {
        out.push_str(&format!("target AC:   {target} kW\n"));
    }
    for slot in result.inverters.iter().filter(|s| !s.model.is_empty()) {
        out.push_str(&format!(
            "inverter:    {} x {} ({} kW)\n",
            slot.qty, slot.model, slot.power_kw
        ));
    }
    out.push_str(&format!("real AC:     {:.2} kW\n", result.real_ac_kw));
    out.push_str(&format!("real DC:     {:.2} kW\n", result.real_dc_kw));
    out.push_str(&format!("panels:      {}\n", result.panel_qty));
    if let Some(ratio) = result.ratio() {
        out.push_str(&format!("DC/AC ratio: {ratio:.2}\n"));
    }
    out
}

pub fn run_size(args: SizeArgs) -> Result<(), RayhubError> {
    let watts = match args.panel.as_deref() {
        Some(model) => Some(
            panel_watts(model)
                .ok_or_else(|| RayhubError::validation(format!("cannot read wattage from panel `{model}`")))?,
        ),
        None => None,
    };
    let input = sizing_input(args.mode)?;
    let result = size(&input, watts)?;

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| RayhubError::Internal(format!("serialize sizing: {e}")))?;
        println!("{json}");
    } else {
        print!("{}", render_table(&result));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inverter_pairs() {
        let choice = parse_inverter("Huawei SUN2000-150KTL-G0=4").unwrap();
        assert_eq!(choice.model, "Huawei SUN2000-150KTL-G0");
        assert_eq!(choice.qty, 4);

        assert!(parse_inverter("Huawei SUN2000-150KTL-G0").is_err());
        assert!(parse_inverter("=4").is_err());
        assert!(parse_inverter("Huawei SUN2000-150KTL-G0=four").is_err());
    }

    #[test]
    fn table_lists_only_filled_slots() {
        let input = sizing_input(SizeMode::Consumption { monthly_mwh: 100.0 }).unwrap();
        let result = size(&input, Some(575)).unwrap();
        let table = render_table(&result);
        assert!(table.contains("target AC:   600 kW"));
        assert!(table.contains("4 x Huawei SUN2000-150KTL-G0 (150 kW)"));
        assert_eq!(table.matches("inverter:").count(), 1);
        assert!(table.contains("real AC:     600.00 kW"));
    }

    #[test]
    fn manual_mode_builds_choices() {
        let input = sizing_input(SizeMode::Manual {
            inverters: vec![
                "Huawei SUN2000-100KTL-M2=2".into(),
                "Huawei SUN2000-50KTL-M3=1".into(),
            ],
            panel_qty: 420,
        })
        .unwrap();
        let SizingInput::Manual { inverters, panel_qty } = input else {
            panic!("expected manual input");
        };
        assert_eq!(inverters.len(), 2);
        assert_eq!(panel_qty, 420);
    }

    #[test]
    fn unknown_panel_wattage_is_rejected() {
        let args = SizeArgs {
            mode: SizeMode::Power { planned_dc_kw: 500.0 },
            panel: Some("Mystery panel".into()),
            json: false,
        };
        assert!(matches!(run_size(args), Err(RayhubError::Validation(_))));
    }
}
