//! # Quote Workbook
//!
//! The `QuoteWorkbook` struct is the root container for everything a sales
//! engineer persists: quote drafts, vendor records, and product records.
//! Workbooks serialize to `.vqf` (VoltQuote) files as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! QuoteWorkbook
//! ├── meta: WorkbookMetadata (version, prepared_by, quote ref, timestamps)
//! ├── settings: WorkbookSettings (currency symbol, defaults)
//! ├── vendors: HashMap<Uuid, VendorRecord>
//! ├── products: HashMap<Uuid, ProductRecord>
//! └── quotes: HashMap<Uuid, QuoteRecord> (inputs + assumptions + outputs)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use quote_core::workbook::QuoteWorkbook;
//!
//! let mut workbook = QuoteWorkbook::new("Jane Seller", "Q-2026-014", "Acme Industrial");
//!
//! // Serialize to JSON
//! let json = serde_json::to_string_pretty(&workbook).unwrap();
//!
//! // Save to file (see file_io module for atomic saves)
//! std::fs::write("acme.vqf", &json).unwrap();
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assumptions::CostAssumptions;
use crate::calculator::{compute, QuoteOutputs};
use crate::inputs::{ProjectInputs, Region, WarrantyYears};

/// Current schema version for .vqf files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root workbook container.
///
/// This is the top-level struct that gets serialized to `.vqf` files.
/// Records are stored in flat UUID-keyed maps for O(1) lookups and stable
/// references when lists are reordered in a front-end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteWorkbook {
    /// Workbook metadata (version, author, client info)
    pub meta: WorkbookMetadata,

    /// Workbook settings (currency symbol, defaults for new drafts)
    pub settings: WorkbookSettings,

    /// Vendor records, keyed by UUID
    pub vendors: HashMap<Uuid, VendorRecord>,

    /// Product records, keyed by UUID
    pub products: HashMap<Uuid, ProductRecord>,

    /// Quote drafts, keyed by UUID
    pub quotes: HashMap<Uuid, QuoteRecord>,
}

impl QuoteWorkbook {
    /// Create a new empty workbook.
    ///
    /// # Arguments
    ///
    /// * `prepared_by` - Name of the person preparing quotes
    /// * `quote_ref` - Quote reference number (e.g., "Q-2026-014")
    /// * `client` - Client name
    ///
    /// # Example
    ///
    /// ```rust
    /// use quote_core::workbook::QuoteWorkbook;
    ///
    /// let workbook = QuoteWorkbook::new("Jane Seller", "Q-2026-014", "Acme Industrial");
    /// assert_eq!(workbook.meta.prepared_by, "Jane Seller");
    /// ```
    pub fn new(prepared_by: impl Into<String>, quote_ref: impl Into<String>, client: impl Into<String>) -> Self {
        let now = Utc::now();
        QuoteWorkbook {
            meta: WorkbookMetadata {
                version: SCHEMA_VERSION.to_string(),
                prepared_by: prepared_by.into(),
                quote_ref: quote_ref.into(),
                client: client.into(),
                created: now,
                modified: now,
            },
            settings: WorkbookSettings::default(),
            vendors: HashMap::new(),
            products: HashMap::new(),
            quotes: HashMap::new(),
        }
    }

    /// Add a quote draft to the workbook.
    ///
    /// Returns the UUID assigned to the draft.
    pub fn add_quote(&mut self, quote: QuoteRecord) -> Uuid {
        let id = Uuid::new_v4();
        self.quotes.insert(id, quote);
        self.touch();
        id
    }

    /// Remove a quote draft by UUID.
    ///
    /// Returns the removed draft if it existed.
    pub fn remove_quote(&mut self, id: &Uuid) -> Option<QuoteRecord> {
        let quote = self.quotes.remove(id);
        if quote.is_some() {
            self.touch();
        }
        quote
    }

    /// Get a quote draft by UUID.
    pub fn get_quote(&self, id: &Uuid) -> Option<&QuoteRecord> {
        self.quotes.get(id)
    }

    /// Get a mutable reference to a quote draft by UUID.
    ///
    /// Note: getting a mutable reference marks the workbook as modified.
    pub fn get_quote_mut(&mut self, id: &Uuid) -> Option<&mut QuoteRecord> {
        if self.quotes.contains_key(id) {
            self.meta.modified = Utc::now();
            self.quotes.get_mut(id)
        } else {
            None
        }
    }

    /// Add a vendor record, returning its UUID.
    pub fn add_vendor(&mut self, vendor: VendorRecord) -> Uuid {
        let id = Uuid::new_v4();
        self.vendors.insert(id, vendor);
        self.touch();
        id
    }

    /// Remove a vendor record by UUID.
    pub fn remove_vendor(&mut self, id: &Uuid) -> Option<VendorRecord> {
        let vendor = self.vendors.remove(id);
        if vendor.is_some() {
            self.touch();
        }
        vendor
    }

    /// Add a product record, returning its UUID.
    pub fn add_product(&mut self, product: ProductRecord) -> Uuid {
        let id = Uuid::new_v4();
        self.products.insert(id, product);
        self.touch();
        id
    }

    /// Remove a product record by UUID.
    pub fn remove_product(&mut self, id: &Uuid) -> Option<ProductRecord> {
        let product = self.products.remove(id);
        if product.is_some() {
            self.touch();
        }
        product
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    pub fn quote_count(&self) -> usize {
        self.quotes.len()
    }

    pub fn vendor_count(&self) -> usize {
        self.vendors.len()
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }
}

impl Default for QuoteWorkbook {
    fn default() -> Self {
        QuoteWorkbook::new("", "", "")
    }
}

/// Workbook metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkbookMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Name of the person preparing quotes
    pub prepared_by: String,

    /// Quote reference number
    pub quote_ref: String,

    /// Client name
    pub client: String,

    /// When the workbook was created
    pub created: DateTime<Utc>,

    /// When the workbook was last modified
    pub modified: DateTime<Utc>,
}

/// Workbook-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkbookSettings {
    /// Currency symbol used for display formatting (e.g., "$")
    pub currency_symbol: String,

    /// Default region for new quote drafts
    pub default_region: Region,

    /// Default warranty tier for new quote drafts
    pub default_warranty: WarrantyYears,
}

impl Default for WorkbookSettings {
    fn default() -> Self {
        WorkbookSettings {
            currency_symbol: "$".to_string(),
            default_region: Region::Us,
            default_warranty: WarrantyYears::Ten,
        }
    }
}

/// A vendor the business buys equipment from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorRecord {
    /// Vendor company name
    pub name: String,

    /// Contact line (email or phone)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,

    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A product offered by a vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Owning vendor, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<Uuid>,

    /// Product name
    pub name: String,

    /// Model/part number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One persisted quote draft: the inputs, the assumptions they were priced
/// against, and the computed outputs, stored verbatim and independently so
/// a saved quote re-opens exactly as it was presented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    /// User label for this draft (e.g., "Option A - 2h system")
    pub label: String,

    /// User-supplied project parameters
    pub inputs: ProjectInputs,

    /// Cost assumptions in effect when the quote was computed
    pub assumptions: CostAssumptions,

    /// Computed quote, stored as presented (never recomputed on load)
    pub outputs: QuoteOutputs,
}

impl QuoteRecord {
    /// Create a draft by running the calculator over the given inputs and
    /// assumptions.
    pub fn new(
        label: impl Into<String>,
        inputs: ProjectInputs,
        assumptions: CostAssumptions,
    ) -> Self {
        let outputs = compute(&inputs, &assumptions);
        QuoteRecord {
            label: label.into(),
            inputs,
            assumptions,
            outputs,
        }
    }

    /// Recompute the outputs in full after editing inputs or assumptions.
    /// There is no partial update: the whole record is derived again.
    pub fn recompute(&mut self) {
        self.outputs = compute(&self.inputs, &self.assumptions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QuoteRecord {
        QuoteRecord::new(
            "Option A",
            ProjectInputs {
                power_mw: 1.0,
                standby_hours: 2.0,
                ..Default::default()
            },
            CostAssumptions::default(),
        )
    }

    #[test]
    fn test_workbook_creation() {
        let workbook = QuoteWorkbook::new("Jane Seller", "Q-2026-014", "Acme Industrial");
        assert_eq!(workbook.meta.prepared_by, "Jane Seller");
        assert_eq!(workbook.meta.quote_ref, "Q-2026-014");
        assert_eq!(workbook.meta.client, "Acme Industrial");
        assert_eq!(workbook.meta.version, SCHEMA_VERSION);
        assert_eq!(workbook.quote_count(), 0);
    }

    #[test]
    fn test_workbook_serialization() {
        let workbook = QuoteWorkbook::new("Jane Seller", "Q-2026-014", "Acme Industrial");
        let json = serde_json::to_string_pretty(&workbook).unwrap();

        assert!(json.contains("Jane Seller"));
        assert!(json.contains("Q-2026-014"));
        assert!(json.contains("currency_symbol"));

        let roundtrip: QuoteWorkbook = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip.meta.prepared_by, "Jane Seller");
    }

    #[test]
    fn test_add_remove_quote() {
        let mut workbook = QuoteWorkbook::new("Seller", "Q-1", "Client");

        let id = workbook.add_quote(draft());
        assert_eq!(workbook.quote_count(), 1);
        assert!(workbook.get_quote(&id).is_some());

        let removed = workbook.remove_quote(&id);
        assert!(removed.is_some());
        assert_eq!(workbook.quote_count(), 0);
    }

    #[test]
    fn test_vendor_and_product_records() {
        let mut workbook = QuoteWorkbook::new("Seller", "Q-1", "Client");

        let vendor_id = workbook.add_vendor(VendorRecord {
            name: "Acme Storage Co".to_string(),
            contact: Some("sales@acme.example".to_string()),
            notes: None,
        });
        let product_id = workbook.add_product(ProductRecord {
            vendor_id: Some(vendor_id),
            name: "PowerCell 500".to_string(),
            model: Some("PC-500".to_string()),
            notes: None,
        });

        assert_eq!(workbook.vendor_count(), 1);
        assert_eq!(workbook.product_count(), 1);
        assert_eq!(
            workbook.products[&product_id].vendor_id,
            Some(vendor_id)
        );

        assert!(workbook.remove_product(&product_id).is_some());
        assert!(workbook.remove_vendor(&vendor_id).is_some());
    }

    #[test]
    fn test_quote_record_computes_outputs() {
        let record = draft();
        assert_eq!(record.outputs.total_mwh, 2.0);
        assert!(record.outputs.grand_capex > 0.0);
    }

    #[test]
    fn test_recompute_follows_edits() {
        let mut record = draft();
        let before = record.outputs.clone();

        record.inputs.power_mw = 2.0;
        record.recompute();

        assert_eq!(record.outputs.total_mwh, 4.0);
        assert!(record.outputs.grand_capex > before.grand_capex);
    }

    #[test]
    fn test_get_quote_mut_touches_modified() {
        let mut workbook = QuoteWorkbook::new("Seller", "Q-1", "Client");
        let id = workbook.add_quote(draft());
        let modified_before = workbook.meta.modified;

        let _ = workbook.get_quote_mut(&id);
        assert!(workbook.meta.modified >= modified_before);
    }

    #[test]
    fn test_quote_record_roundtrip() {
        let record = draft();
        let json = serde_json::to_string_pretty(&record).unwrap();
        let roundtrip: QuoteRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, roundtrip);
    }
}
