//! # Export Tokens
//!
//! Presentation layer between [`crate::calculator::QuoteOutputs`] and the
//! document renderers. Produces a flat map from placeholder token names
//! (`GRAND_CAPEX`, `ANNUAL_SAVINGS`, ...) to pre-formatted display strings:
//! currency rounded to the nearest whole unit with thousands separators,
//! percentages as rounded whole numbers.
//!
//! Formatting never mutates the underlying numeric fields; a template
//! renderer substitutes these strings and nothing else. Absent metrics
//! (no payback, no disclosed budget) render as `"N/A"` so a template cell
//! never shows a sentinel number.
//!
//! ## Example
//!
//! ```rust
//! use quote_core::assumptions::CostAssumptions;
//! use quote_core::calculator::compute;
//! use quote_core::export::token_map;
//! use quote_core::inputs::ProjectInputs;
//!
//! let inputs = ProjectInputs { power_mw: 1.0, standby_hours: 2.0, ..Default::default() };
//! let assumptions = CostAssumptions::default();
//! let outputs = compute(&inputs, &assumptions);
//!
//! let tokens = token_map(&inputs, &assumptions, &outputs, "$");
//! assert!(tokens.contains_key("GRAND_CAPEX"));
//! assert_eq!(tokens["ROI_YEARS"], "N/A");
//! ```

use std::collections::BTreeMap;

use crate::assumptions::CostAssumptions;
use crate::calculator::QuoteOutputs;
use crate::inputs::ProjectInputs;

/// Placeholder shown for metrics that are absent from the quote
pub const ABSENT_DISPLAY: &str = "N/A";

/// Format a currency amount: rounded to the nearest whole unit, thousands
/// separators, symbol prefix. Non-finite values render as [`ABSENT_DISPLAY`].
///
/// ```rust
/// use quote_core::export::format_currency;
///
/// assert_eq!(format_currency("$", 499228.8), "$499,229");
/// assert_eq!(format_currency("$", -1500.2), "-$1,500");
/// ```
pub fn format_currency(symbol: &str, value: f64) -> String {
    if !value.is_finite() {
        return ABSENT_DISPLAY.to_string();
    }
    let rounded = value.round();
    let negative = rounded < 0.0;
    let grouped = group_thousands(rounded.abs() as u128);
    if negative {
        format!("-{}{}", symbol, grouped)
    } else {
        format!("{}{}", symbol, grouped)
    }
}

/// Format a fraction as a rounded whole-number percentage ("0.12" -> "12%").
pub fn format_percent(fraction: f64) -> String {
    if !fraction.is_finite() {
        return ABSENT_DISPLAY.to_string();
    }
    format!("{:.0}%", fraction * 100.0)
}

/// Format a payback period with one decimal ("7.31" -> "7.3").
pub fn format_years(value: f64) -> String {
    if !value.is_finite() {
        return ABSENT_DISPLAY.to_string();
    }
    format!("{:.1}", value)
}

/// Format a plain quantity with up to two decimals, trimming trailing zeros.
pub fn format_quantity(value: f64) -> String {
    if !value.is_finite() {
        return ABSENT_DISPLAY.to_string();
    }
    let s = format!("{:.2}", value);
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

fn group_thousands(mut n: u128) -> String {
    let mut groups = Vec::new();
    loop {
        let group = n % 1000;
        n /= 1000;
        if n == 0 {
            groups.push(group.to_string());
            break;
        }
        groups.push(format!("{:03}", group));
    }
    groups.reverse();
    groups.join(",")
}

/// Build the flat token -> display-string map consumed by document
/// renderers.
///
/// Every token is always present so a template never sees an unfilled
/// placeholder; metrics that are absent from the quote map to
/// [`ABSENT_DISPLAY`].
pub fn token_map(
    inputs: &ProjectInputs,
    assumptions: &CostAssumptions,
    outputs: &QuoteOutputs,
    currency_symbol: &str,
) -> BTreeMap<String, String> {
    let mut tokens = BTreeMap::new();
    let mut put = |key: &str, value: String| {
        tokens.insert(key.to_string(), value);
    };

    // System configuration
    put("POWER_MW", format_quantity(inputs.power_mw));
    put("STANDBY_HOURS", format_quantity(inputs.standby_hours));
    put("TOTAL_MWH", format_quantity(outputs.total_mwh));
    put("PCS_KW", format_quantity(outputs.pcs_kw));
    put("GRID_MODE", inputs.grid_mode.to_string());
    put("REGION", inputs.location_region.to_string());
    put("WARRANTY_YEARS", inputs.warranty_years.years().to_string());
    put("GENERATOR_MW", format_quantity(inputs.generator_mw));
    put("SOLAR_MWP", format_quantity(inputs.solar_mwp));
    put("WIND_MW", format_quantity(inputs.wind_mw));

    // Itemized costs
    put(
        "BATTERY_SUBTOTAL",
        format_currency(currency_symbol, outputs.battery_subtotal),
    );
    put(
        "PCS_SUBTOTAL",
        format_currency(currency_symbol, outputs.pcs_subtotal),
    );
    put("BOS", format_currency(currency_symbol, outputs.bos));
    put("EPC", format_currency(currency_symbol, outputs.epc));
    put(
        "BESS_CAPEX",
        format_currency(currency_symbol, outputs.bess_capex),
    );
    put(
        "GEN_SUBTOTAL",
        format_currency(currency_symbol, outputs.gen_subtotal),
    );
    put(
        "SOLAR_SUBTOTAL",
        format_currency(currency_symbol, outputs.solar_subtotal),
    );
    put(
        "WIND_SUBTOTAL",
        format_currency(currency_symbol, outputs.wind_subtotal),
    );
    put("TARIFFS", format_currency(currency_symbol, outputs.tariffs));
    put(
        "TARIFF_PCT",
        format_percent(assumptions.tariff_for(inputs.location_region)),
    );
    put("BOS_PCT", format_percent(assumptions.bos_pct));
    put("EPC_PCT", format_percent(assumptions.epc_pct));

    // Totals
    put(
        "GRAND_CAPEX_BEFORE_WARRANTY",
        format_currency(currency_symbol, outputs.grand_capex_before_warranty),
    );
    put(
        "GRAND_CAPEX",
        format_currency(currency_symbol, outputs.grand_capex),
    );

    // Financial metrics
    put("UTILIZATION_PCT", format_percent(inputs.utilization));
    put(
        "VALUE_PER_KWH",
        format!("{}{:.3}", currency_symbol, inputs.value_per_kwh),
    );
    put(
        "ANNUAL_SAVINGS",
        format_currency(currency_symbol, outputs.annual_savings),
    );
    put(
        "ROI_YEARS",
        outputs
            .roi_years
            .map(format_years)
            .unwrap_or_else(|| ABSENT_DISPLAY.to_string()),
    );
    put(
        "BUDGET_AMOUNT",
        if inputs.budget_known {
            format_currency(currency_symbol, inputs.budget_amount)
        } else {
            ABSENT_DISPLAY.to_string()
        },
    );
    put(
        "BUDGET_DELTA",
        outputs
            .budget_delta
            .map(|delta| format_currency(currency_symbol, delta))
            .unwrap_or_else(|| ABSENT_DISPLAY.to_string()),
    );
    put(
        "BUDGET_STATUS",
        match outputs.budget_delta {
            Some(delta) if delta >= 0.0 => "Under budget".to_string(),
            Some(_) => "Over budget".to_string(),
            None => ABSENT_DISPLAY.to_string(),
        },
    );

    // Provenance disclosure
    put(
        "VENDOR_NAME",
        assumptions
            .vendor_name
            .clone()
            .unwrap_or_else(|| "Built-in defaults".to_string()),
    );
    put(
        "VENDOR_DATE",
        assumptions
            .vendor_date
            .clone()
            .unwrap_or_else(|| ABSENT_DISPLAY.to_string()),
    );

    tokens
}
