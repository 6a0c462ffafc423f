//! # Cost Assumptions
//!
//! Vendor-adjustable cost assumptions: unit costs, percentage multipliers,
//! PCS sizing factors, and the regional tariff table. These are editable
//! independently of any project and can be partially overridden from an
//! uploaded vendor file via [`merge_assumptions`].
//!
//! The shape is the same regardless of project; provenance fields record
//! where the numbers came from so a front-end can disclose "these
//! assumptions came from vendor X" without affecting any arithmetic.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "battery_cost_per_kwh": 150.0,
//!   "pcs_cost_per_kw": 80.0,
//!   "gen_cost_per_kw": 500.0,
//!   "solar_cost_per_kwp": 700.0,
//!   "wind_cost_per_kw": 1300.0,
//!   "bos_pct": 0.12,
//!   "epc_pct": 0.15,
//!   "offgrid_factor": 1.2,
//!   "ongrid_factor": 1.0,
//!   "tariff_by_region": { "US": 0.03, "UK": 0.02, "EU": 0.02, "Other": 0.0 },
//!   "vendor_name": "Acme Storage Co"
//! }
//! ```

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::inputs::Region;

/// Built-in vendor cost assumptions used when nothing has been imported yet.
pub static DEFAULT_ASSUMPTIONS: Lazy<CostAssumptions> = Lazy::new(CostAssumptions::default);

/// Vendor-adjustable cost assumptions for the quote calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostAssumptions {
    /// Battery cost per kWh of storage capacity
    pub battery_cost_per_kwh: f64,

    /// Power conversion system cost per kW
    pub pcs_cost_per_kw: f64,

    /// Backup generator cost per kW
    pub gen_cost_per_kw: f64,

    /// Solar PV cost per kWp
    pub solar_cost_per_kwp: f64,

    /// Wind cost per kW
    pub wind_cost_per_kw: f64,

    /// Balance-of-system fraction of battery + PCS subtotal
    pub bos_pct: f64,

    /// EPC fraction, applied on top of battery + PCS + BOS
    pub epc_pct: f64,

    /// PCS sizing factor for off-grid systems (MW rated -> kW required).
    /// Expected >= the on-grid factor: an islanded inverter carries the
    /// full load without grid support.
    pub offgrid_factor: f64,

    /// PCS sizing factor for on-grid systems
    pub ongrid_factor: f64,

    /// Regional import tariff fractions. A missing region means 0, never
    /// an error.
    pub tariff_by_region: HashMap<Region, f64>,

    /// Vendor these assumptions came from (informational only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,

    /// Source file the assumptions were imported from (informational only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_file: Option<String>,

    /// Date on the vendor price sheet (informational only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_date: Option<String>,
}

impl Default for CostAssumptions {
    fn default() -> Self {
        CostAssumptions {
            battery_cost_per_kwh: 150.0,
            pcs_cost_per_kw: 80.0,
            gen_cost_per_kw: 500.0,
            solar_cost_per_kwp: 700.0,
            wind_cost_per_kw: 1300.0,
            bos_pct: 0.12,
            epc_pct: 0.15,
            offgrid_factor: 1.2,
            ongrid_factor: 1.0,
            tariff_by_region: HashMap::from([
                (Region::Us, 0.03),
                (Region::Uk, 0.02),
                (Region::Eu, 0.02),
                (Region::Other, 0.0),
            ]),
            vendor_name: None,
            vendor_file: None,
            vendor_date: None,
        }
    }
}

impl CostAssumptions {
    /// Tariff fraction for a region, treating a missing entry as 0.
    pub fn tariff_for(&self, region: Region) -> f64 {
        self.tariff_by_region.get(&region).copied().unwrap_or(0.0)
    }
}

/// Partial cost-assumption fragment, e.g. parsed from an uploaded vendor
/// price sheet. Absent fields leave the base value untouched; the tariff
/// map carries only the regions the fragment mentions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssumptionsPatch {
    pub battery_cost_per_kwh: Option<f64>,
    pub pcs_cost_per_kw: Option<f64>,
    pub gen_cost_per_kw: Option<f64>,
    pub solar_cost_per_kwp: Option<f64>,
    pub wind_cost_per_kw: Option<f64>,
    pub bos_pct: Option<f64>,
    pub epc_pct: Option<f64>,
    pub offgrid_factor: Option<f64>,
    pub ongrid_factor: Option<f64>,

    /// Merged key-by-key into the base map, never replacing it wholesale
    pub tariff_by_region: HashMap<Region, f64>,

    pub vendor_name: Option<String>,
    pub vendor_file: Option<String>,
    pub vendor_date: Option<String>,
}

/// Apply a partial vendor override onto a base set of assumptions.
///
/// Field-by-field overwrite: a field present in the patch replaces the base
/// value, an absent field keeps it. The region-tariff map is merged
/// key-wise, so a fragment that only quotes a UK tariff leaves the other
/// regions' entries intact.
///
/// # Example
///
/// ```rust
/// use quote_core::assumptions::{merge_assumptions, AssumptionsPatch, CostAssumptions};
/// use quote_core::inputs::Region;
///
/// let base = CostAssumptions::default();
/// let patch = AssumptionsPatch {
///     battery_cost_per_kwh: Some(135.0),
///     tariff_by_region: [(Region::Uk, 0.05)].into(),
///     ..Default::default()
/// };
///
/// let merged = merge_assumptions(base.clone(), &patch);
/// assert_eq!(merged.battery_cost_per_kwh, 135.0);
/// assert_eq!(merged.tariff_for(Region::Uk), 0.05);
/// // Untouched fields and tariff entries survive
/// assert_eq!(merged.pcs_cost_per_kw, base.pcs_cost_per_kw);
/// assert_eq!(merged.tariff_for(Region::Us), base.tariff_for(Region::Us));
/// ```
pub fn merge_assumptions(base: CostAssumptions, patch: &AssumptionsPatch) -> CostAssumptions {
    let mut merged = base;

    if let Some(v) = patch.battery_cost_per_kwh {
        merged.battery_cost_per_kwh = v;
    }
    if let Some(v) = patch.pcs_cost_per_kw {
        merged.pcs_cost_per_kw = v;
    }
    if let Some(v) = patch.gen_cost_per_kw {
        merged.gen_cost_per_kw = v;
    }
    if let Some(v) = patch.solar_cost_per_kwp {
        merged.solar_cost_per_kwp = v;
    }
    if let Some(v) = patch.wind_cost_per_kw {
        merged.wind_cost_per_kw = v;
    }
    if let Some(v) = patch.bos_pct {
        merged.bos_pct = v;
    }
    if let Some(v) = patch.epc_pct {
        merged.epc_pct = v;
    }
    if let Some(v) = patch.offgrid_factor {
        merged.offgrid_factor = v;
    }
    if let Some(v) = patch.ongrid_factor {
        merged.ongrid_factor = v;
    }

    for (region, pct) in &patch.tariff_by_region {
        merged.tariff_by_region.insert(*region, *pct);
    }

    if let Some(name) = &patch.vendor_name {
        merged.vendor_name = Some(name.clone());
    }
    if let Some(file) = &patch.vendor_file {
        merged.vendor_file = Some(file.clone());
    }
    if let Some(date) = &patch.vendor_date {
        merged.vendor_date = Some(date.clone());
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_region() {
        let assumptions = CostAssumptions::default();
        for region in Region::ALL {
            assert!(
                assumptions.tariff_by_region.contains_key(&region),
                "default tariff table is missing {}",
                region
            );
        }
    }

    #[test]
    fn test_default_factors_ordered() {
        let assumptions = CostAssumptions::default();
        assert!(assumptions.offgrid_factor >= assumptions.ongrid_factor);
    }

    #[test]
    fn test_missing_tariff_entry_is_zero() {
        let mut assumptions = CostAssumptions::default();
        assumptions.tariff_by_region.remove(&Region::Eu);
        assert_eq!(assumptions.tariff_for(Region::Eu), 0.0);
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let base = CostAssumptions::default();
        let merged = merge_assumptions(base.clone(), &AssumptionsPatch::default());
        assert_eq!(merged, base);
    }

    #[test]
    fn test_merge_overwrites_fields() {
        let base = CostAssumptions::default();
        let patch = AssumptionsPatch {
            battery_cost_per_kwh: Some(120.0),
            epc_pct: Some(0.18),
            vendor_name: Some("Acme Storage Co".to_string()),
            ..Default::default()
        };

        let merged = merge_assumptions(base.clone(), &patch);
        assert_eq!(merged.battery_cost_per_kwh, 120.0);
        assert_eq!(merged.epc_pct, 0.18);
        assert_eq!(merged.vendor_name.as_deref(), Some("Acme Storage Co"));
        // Unpatched fields survive
        assert_eq!(merged.bos_pct, base.bos_pct);
        assert_eq!(merged.ongrid_factor, base.ongrid_factor);
    }

    #[test]
    fn test_tariff_map_merges_key_wise() {
        let base = CostAssumptions::default();
        let us_before = base.tariff_for(Region::Us);

        let patch = AssumptionsPatch {
            tariff_by_region: [(Region::Uk, 0.07)].into(),
            ..Default::default()
        };
        let merged = merge_assumptions(base, &patch);

        assert_eq!(merged.tariff_for(Region::Uk), 0.07);
        // The fragment only quoted a UK tariff; the US entry must survive
        assert_eq!(merged.tariff_for(Region::Us), us_before);
    }

    #[test]
    fn test_patch_from_partial_json() {
        // A vendor fragment mentioning only two fields
        let patch: AssumptionsPatch = serde_json::from_str(
            r#"{ "battery_cost_per_kwh": 140.0, "tariff_by_region": { "EU": 0.04 } }"#,
        )
        .unwrap();
        assert_eq!(patch.battery_cost_per_kwh, Some(140.0));
        assert_eq!(patch.pcs_cost_per_kw, None);
        assert_eq!(patch.tariff_by_region.get(&Region::Eu), Some(&0.04));
    }

    #[test]
    fn test_assumptions_roundtrip() {
        let assumptions = CostAssumptions {
            vendor_name: Some("Acme Storage Co".to_string()),
            vendor_date: Some("2026-05-01".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string_pretty(&assumptions).unwrap();
        let roundtrip: CostAssumptions = serde_json::from_str(&json).unwrap();
        assert_eq!(assumptions, roundtrip);
    }

    #[test]
    fn test_absent_provenance_not_serialized() {
        let json = serde_json::to_string(&CostAssumptions::default()).unwrap();
        assert!(!json.contains("vendor_name"));
    }

    #[test]
    fn test_lazy_defaults_match() {
        assert_eq!(*DEFAULT_ASSUMPTIONS, CostAssumptions::default());
    }
}
