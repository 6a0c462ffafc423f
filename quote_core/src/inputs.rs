//! # Project Inputs
//!
//! User-supplied parameters for a single quote draft. One [`ProjectInputs`]
//! instance describes the system being priced: rated power, discharge
//! duration, grid connection mode, optional auxiliary generation, and the
//! financial context (utilization, energy value, budget).
//!
//! These values come straight from a form or CLI prompt and are passed by
//! value into [`crate::calculator::compute`] together with
//! [`crate::assumptions::CostAssumptions`].
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "power_mw": 2.0,
//!   "standby_hours": 4.0,
//!   "grid_mode": "on-grid",
//!   "generator_mw": 0.0,
//!   "solar_mwp": 1.0,
//!   "wind_mw": 0.0,
//!   "utilization": 0.35,
//!   "value_per_kwh": 0.11,
//!   "warranty_years": 10,
//!   "budget_known": true,
//!   "budget_amount": 3500000.0,
//!   "location_region": "US",
//!   "pcs_separate": false
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{QuoteError, QuoteResult};

/// Grid connection mode for the storage system.
///
/// Selects which power-conversion sizing factor applies: off-grid systems
/// need full inverter headroom without grid support, so their factor is
/// expected to be at least the on-grid one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridMode {
    /// Grid-tied installation
    #[serde(rename = "on-grid")]
    OnGrid,
    /// Island/microgrid installation
    #[serde(rename = "off-grid")]
    OffGrid,
}

impl Default for GridMode {
    fn default() -> Self {
        GridMode::OnGrid
    }
}

impl fmt::Display for GridMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridMode::OnGrid => write!(f, "on-grid"),
            GridMode::OffGrid => write!(f, "off-grid"),
        }
    }
}

/// Project location, used to select the regional import tariff percentage
/// from [`crate::assumptions::CostAssumptions::tariff_by_region`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "UK")]
    Uk,
    #[serde(rename = "EU")]
    Eu,
    #[serde(rename = "Other")]
    Other,
}

impl Region {
    /// All region values, in display order.
    pub const ALL: [Region; 4] = [Region::Us, Region::Uk, Region::Eu, Region::Other];
}

impl Default for Region {
    fn default() -> Self {
        Region::Us
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Us => write!(f, "US"),
            Region::Uk => write!(f, "UK"),
            Region::Eu => write!(f, "EU"),
            Region::Other => write!(f, "Other"),
        }
    }
}

/// Warranty tier for the installed system.
///
/// Serializes as the plain integer (10 or 20) so stored quotes read
/// naturally. The 20-year tier applies a fixed capital surcharge to the
/// grand total, see [`crate::calculator::compute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum WarrantyYears {
    Ten,
    Twenty,
}

impl WarrantyYears {
    /// Multiplier applied to the grand total for this tier.
    pub fn capex_multiplier(self) -> f64 {
        match self {
            WarrantyYears::Ten => 1.0,
            WarrantyYears::Twenty => 1.10,
        }
    }

    /// The tier length in years.
    pub fn years(self) -> u32 {
        match self {
            WarrantyYears::Ten => 10,
            WarrantyYears::Twenty => 20,
        }
    }
}

impl Default for WarrantyYears {
    fn default() -> Self {
        WarrantyYears::Ten
    }
}

impl From<WarrantyYears> for u32 {
    fn from(w: WarrantyYears) -> Self {
        w.years()
    }
}

impl TryFrom<u32> for WarrantyYears {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            10 => Ok(WarrantyYears::Ten),
            20 => Ok(WarrantyYears::Twenty),
            other => Err(format!("unsupported warranty tier: {} (expected 10 or 20)", other)),
        }
    }
}

impl fmt::Display for WarrantyYears {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} years", self.years())
    }
}

/// User-supplied parameters for one quote draft.
///
/// Every field defaults when absent from JSON, so a partially filled form
/// still deserializes; missing capacities mean "not included" and missing
/// numbers mean zero. The calculator accepts any structurally valid value,
/// including negative or non-finite numbers, and lets them propagate
/// arithmetically. Use [`ProjectInputs::validate`] in the form/CLI layer
/// when stricter checking is wanted before presenting a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectInputs {
    /// Rated discharge power (MW). Zero yields a degenerate all-zero quote.
    pub power_mw: f64,

    /// Discharge duration at rated power (hours)
    pub standby_hours: f64,

    /// Grid connection mode, selects the PCS sizing factor
    pub grid_mode: GridMode,

    /// Backup generator capacity (MW), 0 = not included
    pub generator_mw: f64,

    /// Solar PV capacity (MWp), 0 = not included
    pub solar_mwp: f64,

    /// Wind capacity (MW), 0 = not included
    pub wind_mw: f64,

    /// Fraction of rated power delivered on average (0..1),
    /// used only for the savings estimate
    pub utilization: f64,

    /// Assumed avoided-cost or revenue value per kWh delivered
    pub value_per_kwh: f64,

    /// Warranty tier (10 or 20 years)
    pub warranty_years: WarrantyYears,

    /// Whether the client has disclosed a budget
    pub budget_known: bool,

    /// Client budget, only meaningful when `budget_known` is true
    pub budget_amount: f64,

    /// Project location, selects the tariff percentage
    pub location_region: Region,

    /// Separately procured PCS: applies a 15% surcharge to the
    /// power-conversion subtotal
    pub pcs_separate: bool,
}

impl Default for ProjectInputs {
    fn default() -> Self {
        ProjectInputs {
            power_mw: 0.0,
            standby_hours: 0.0,
            grid_mode: GridMode::OnGrid,
            generator_mw: 0.0,
            solar_mwp: 0.0,
            wind_mw: 0.0,
            utilization: 0.0,
            value_per_kwh: 0.0,
            warranty_years: WarrantyYears::Ten,
            budget_known: false,
            budget_amount: 0.0,
            location_region: Region::Us,
            pcs_separate: false,
        }
    }
}

impl ProjectInputs {
    /// Validate input parameters for presentation purposes.
    ///
    /// This is a caller-side helper for form/CLI layers. The calculator
    /// itself never calls it: out-of-range values are accepted there and
    /// simply propagate arithmetically.
    pub fn validate(&self) -> QuoteResult<()> {
        if !self.power_mw.is_finite() || self.power_mw < 0.0 {
            return Err(QuoteError::invalid_input(
                "power_mw",
                self.power_mw.to_string(),
                "Rated power must be a non-negative number",
            ));
        }
        if !self.standby_hours.is_finite() || self.standby_hours < 0.0 {
            return Err(QuoteError::invalid_input(
                "standby_hours",
                self.standby_hours.to_string(),
                "Standby duration must be a non-negative number",
            ));
        }
        if !self.utilization.is_finite() || !(0.0..=1.0).contains(&self.utilization) {
            return Err(QuoteError::invalid_input(
                "utilization",
                self.utilization.to_string(),
                "Utilization must be a fraction between 0 and 1",
            ));
        }
        for (field, value) in [
            ("generator_mw", self.generator_mw),
            ("solar_mwp", self.solar_mwp),
            ("wind_mw", self.wind_mw),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(QuoteError::invalid_input(
                    field,
                    value.to_string(),
                    "Auxiliary capacity must be a non-negative number",
                ));
            }
        }
        if self.budget_known && !self.budget_amount.is_finite() {
            return Err(QuoteError::invalid_input(
                "budget_amount",
                self.budget_amount.to_string(),
                "Budget must be a finite number when budget_known is set",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_mode_serialization() {
        let json = serde_json::to_string(&GridMode::OffGrid).unwrap();
        assert_eq!(json, "\"off-grid\"");

        let roundtrip: GridMode = serde_json::from_str("\"on-grid\"").unwrap();
        assert_eq!(roundtrip, GridMode::OnGrid);
    }

    #[test]
    fn test_region_serialization() {
        let json = serde_json::to_string(&Region::Uk).unwrap();
        assert_eq!(json, "\"UK\"");

        let roundtrip: Region = serde_json::from_str("\"Other\"").unwrap();
        assert_eq!(roundtrip, Region::Other);
    }

    #[test]
    fn test_warranty_serializes_as_integer() {
        let json = serde_json::to_string(&WarrantyYears::Twenty).unwrap();
        assert_eq!(json, "20");

        let roundtrip: WarrantyYears = serde_json::from_str("10").unwrap();
        assert_eq!(roundtrip, WarrantyYears::Ten);

        // Only the two supported tiers parse
        assert!(serde_json::from_str::<WarrantyYears>("15").is_err());
    }

    #[test]
    fn test_missing_fields_default() {
        // A minimal draft with only power and duration still deserializes
        let inputs: ProjectInputs =
            serde_json::from_str(r#"{ "power_mw": 1.5, "standby_hours": 2.0 }"#).unwrap();
        assert_eq!(inputs.power_mw, 1.5);
        assert_eq!(inputs.generator_mw, 0.0);
        assert_eq!(inputs.grid_mode, GridMode::OnGrid);
        assert_eq!(inputs.warranty_years, WarrantyYears::Ten);
        assert!(!inputs.budget_known);
    }

    #[test]
    fn test_validate_accepts_reasonable_inputs() {
        let inputs = ProjectInputs {
            power_mw: 2.0,
            standby_hours: 4.0,
            utilization: 0.4,
            value_per_kwh: 0.12,
            ..Default::default()
        };
        assert!(inputs.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_power() {
        let inputs = ProjectInputs {
            power_mw: -1.0,
            ..Default::default()
        };
        let err = inputs.validate().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_validate_rejects_utilization_above_one() {
        let inputs = ProjectInputs {
            power_mw: 1.0,
            utilization: 1.5,
            ..Default::default()
        };
        assert!(inputs.validate().is_err());
    }

    #[test]
    fn test_inputs_roundtrip() {
        let inputs = ProjectInputs {
            power_mw: 3.0,
            standby_hours: 2.5,
            grid_mode: GridMode::OffGrid,
            solar_mwp: 1.2,
            warranty_years: WarrantyYears::Twenty,
            budget_known: true,
            budget_amount: 5_000_000.0,
            location_region: Region::Eu,
            pcs_separate: true,
            ..Default::default()
        };
        let json = serde_json::to_string_pretty(&inputs).unwrap();
        let roundtrip: ProjectInputs = serde_json::from_str(&json).unwrap();
        assert_eq!(inputs, roundtrip);
    }
}
