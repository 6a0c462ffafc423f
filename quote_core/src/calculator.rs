//! # Quote Calculator
//!
//! The pricing pipeline: a pure function from user inputs and vendor cost
//! assumptions to a fully itemized quote. Deterministic, no I/O, no shared
//! state; callers re-run it from scratch on every input change rather than
//! patching a previous result.
//!
//! ## Pipeline order
//!
//! Later figures consume earlier subtotals, so the computation order is
//! fixed: energy and PCS sizing first, then battery and PCS subtotals, BOS
//! as a fraction of those, EPC compounding on top of BOS, auxiliary
//! generation subtotals, regional tariffs (generator excluded from the
//! base), the warranty surcharge on the grand total, and finally the
//! savings/payback estimate.
//!
//! ## Example
//!
//! ```rust
//! use quote_core::assumptions::CostAssumptions;
//! use quote_core::calculator::compute;
//! use quote_core::inputs::ProjectInputs;
//!
//! let inputs = ProjectInputs {
//!     power_mw: 2.0,
//!     standby_hours: 4.0,
//!     utilization: 0.35,
//!     value_per_kwh: 0.11,
//!     ..Default::default()
//! };
//!
//! let quote = compute(&inputs, &CostAssumptions::default());
//! assert_eq!(quote.total_mwh, 8.0);
//! assert!(quote.grand_capex > 0.0);
//! assert!(quote.roi_years.is_some());
//! ```

use serde::{Deserialize, Serialize};

use crate::assumptions::CostAssumptions;
use crate::inputs::{GridMode, ProjectInputs};

/// Hours in a year, used for the annual savings estimate
const HOURS_PER_YEAR: f64 = 8760.0;

/// Surcharge on the PCS subtotal when the PCS is separately procured
const PCS_SEPARATE_SURCHARGE: f64 = 1.15;

/// One computed quote: intermediate quantities, itemized subtotals, totals,
/// and financial metrics.
///
/// Recreated in full by [`compute`] on every input change; no field depends
/// on wall-clock time or prior invocations. `roi_years` and `budget_delta`
/// are genuinely absent (not null, not a sentinel) when undefined, and stay
/// absent through JSON round-trips.
///
/// ## JSON Example
///
/// ```json
/// {
///   "total_mwh": 2.0,
///   "pcs_kw": 1000.0,
///   "battery_subtotal": 300000.0,
///   "pcs_subtotal": 80000.0,
///   "bos": 45600.0,
///   "epc": 63840.0,
///   "bess_capex": 489440.0,
///   "gen_subtotal": 0.0,
///   "solar_subtotal": 0.0,
///   "wind_subtotal": 0.0,
///   "tariffs": 9788.8,
///   "grand_capex_before_warranty": 499228.8,
///   "grand_capex": 499228.8,
///   "annual_savings": 420480.0,
///   "roi_years": 1.19
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteOutputs {
    // === Intermediate Quantities ===
    /// Total storage capacity (MWh) = power x duration
    pub total_mwh: f64,

    /// Required power-conversion capacity (kW), after the grid-mode
    /// sizing factor
    pub pcs_kw: f64,

    // === Subtotals ===
    /// Battery cost
    pub battery_subtotal: f64,

    /// Power conversion system cost, including the separate-procurement
    /// surcharge when it applies
    pub pcs_subtotal: f64,

    /// Balance of system, a fraction of battery + PCS
    pub bos: f64,

    /// Engineering/procurement/construction, compounding on top of BOS
    pub epc: f64,

    /// Battery + PCS + BOS + EPC
    pub bess_capex: f64,

    /// Backup generator cost
    pub gen_subtotal: f64,

    /// Solar PV cost
    pub solar_subtotal: f64,

    /// Wind cost
    pub wind_subtotal: f64,

    /// Regional import tariffs on BESS, solar, and wind (generator is
    /// excluded from the tariff base)
    pub tariffs: f64,

    // === Totals ===
    /// Everything above, before the warranty surcharge
    pub grand_capex_before_warranty: f64,

    /// Final quoted capital cost; the 20-year warranty tier applies its
    /// surcharge to this entire total, not just the battery/PCS portion
    pub grand_capex: f64,

    // === Financial Metrics ===
    /// Estimated value of delivered energy per year
    pub annual_savings: f64,

    /// Simple payback period. Absent when annual savings are zero or
    /// negative; never infinity or NaN.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi_years: Option<f64>,

    /// Budget minus grand CapEx (positive = under budget). Present only
    /// when the client disclosed a finite budget.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_delta: Option<f64>,
}

/// Compute a full quote from project inputs and cost assumptions.
///
/// Pure and infallible: any structurally valid input produces a result.
/// Out-of-range values (negative power, NaN) are not rejected here; they
/// propagate arithmetically into the outputs, and it is the form/CLI
/// layer's job to warn about them (see
/// [`ProjectInputs::validate`](crate::inputs::ProjectInputs::validate)).
/// The two guarded spots are `roi_years` and `budget_delta`, which go
/// absent instead of producing infinity or NaN.
///
/// Two calls with structurally equal arguments return equal outputs.
pub fn compute(inputs: &ProjectInputs, assumptions: &CostAssumptions) -> QuoteOutputs {
    // Energy capacity and PCS sizing
    let total_mwh = inputs.power_mw * inputs.standby_hours;
    let sizing_factor = match inputs.grid_mode {
        GridMode::OffGrid => assumptions.offgrid_factor,
        GridMode::OnGrid => assumptions.ongrid_factor,
    };
    let pcs_kw = inputs.power_mw * 1000.0 * sizing_factor;

    // Battery and PCS subtotals (MWh -> kWh via x1000)
    let mut pcs_subtotal = pcs_kw * assumptions.pcs_cost_per_kw;
    if inputs.pcs_separate {
        pcs_subtotal *= PCS_SEPARATE_SURCHARGE;
    }
    let battery_subtotal = total_mwh * 1000.0 * assumptions.battery_cost_per_kwh;

    // BOS on battery + PCS, then EPC compounding on top of BOS
    let bos = (battery_subtotal + pcs_subtotal) * assumptions.bos_pct;
    let epc = (battery_subtotal + pcs_subtotal + bos) * assumptions.epc_pct;
    let bess_capex = battery_subtotal + pcs_subtotal + bos + epc;

    // Auxiliary generation
    let gen_subtotal = inputs.generator_mw * 1000.0 * assumptions.gen_cost_per_kw;
    let solar_subtotal = inputs.solar_mwp * assumptions.solar_cost_per_kwp * 1000.0;
    let wind_subtotal = inputs.wind_mw * assumptions.wind_cost_per_kw * 1000.0;

    // Tariffs on BESS + solar + wind; generator is excluded from the base
    let tariff_pct = assumptions.tariff_for(inputs.location_region);
    let tariffs = (bess_capex + solar_subtotal + wind_subtotal) * tariff_pct;

    let grand_capex_before_warranty =
        bess_capex + gen_subtotal + solar_subtotal + wind_subtotal + tariffs;

    // The warranty surcharge applies to the entire grand total
    let grand_capex = grand_capex_before_warranty * inputs.warranty_years.capex_multiplier();

    // Savings treat utilization as a capacity factor on rated power,
    // independent of standby_hours
    let annual_savings =
        inputs.value_per_kwh * inputs.utilization * (inputs.power_mw * 1000.0) * HOURS_PER_YEAR;

    let roi_years = if annual_savings > 0.0 {
        Some(grand_capex / annual_savings)
    } else {
        None
    };

    let budget_delta = if inputs.budget_known && inputs.budget_amount.is_finite() {
        Some(inputs.budget_amount - grand_capex)
    } else {
        None
    };

    QuoteOutputs {
        total_mwh,
        pcs_kw,
        battery_subtotal,
        pcs_subtotal,
        bos,
        epc,
        bess_capex,
        gen_subtotal,
        solar_subtotal,
        wind_subtotal,
        tariffs,
        grand_capex_before_warranty,
        grand_capex,
        annual_savings,
        roi_years,
        budget_delta,
    }
}
