//! # quote_core - BESS Quoting Engine
//!
//! `quote_core` is the computational heart of VoltQuote, turning project
//! parameters and vendor cost assumptions into a priced, itemized Battery
//! Energy Storage System quote. All inputs and outputs are
//! JSON-serializable, so the same types flow unchanged through the form
//! layer, the workbook file on disk, and the document exporters.
//!
//! ## Design Philosophy
//!
//! - **Pure core**: the calculator is a stateless function, recomputed in
//!   full on every input change
//! - **JSON-First**: all types implement Serialize/Deserialize, with true
//!   absence (not null, not 0) for undefined metrics
//! - **Rich Errors**: structured error types for the I/O and render layers;
//!   the calculator itself never fails
//! - **Display at the edge**: currency/percent formatting lives in the
//!   export layer and never touches the stored numbers
//!
//! ## Quick Start
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
//! println!("Grand CapEx: {}", quote.grand_capex);
//! ```
//!
//! ## Modules
//!
//! - [`inputs`] - Project inputs and their enums (grid mode, region, warranty)
//! - [`assumptions`] - Vendor cost assumptions, defaults, and partial merge
//! - [`calculator`] - The pure quote pipeline
//! - [`export`] - Token map and display formatting for document exporters
//! - [`workbook`] - Workbook container: quotes, vendors, products
//! - [`file_io`] - File operations with atomic saves and locking
//! - [`pdf`] - Quote document rendering via Typst
//! - [`errors`] - Structured error types

pub mod assumptions;
pub mod calculator;
pub mod errors;
pub mod export;
pub mod file_io;
pub mod inputs;
pub mod pdf;
pub mod workbook;

// Re-export commonly used types at crate root for convenience
pub use assumptions::{merge_assumptions, AssumptionsPatch, CostAssumptions};
pub use calculator::{compute, QuoteOutputs};
pub use errors::{QuoteError, QuoteResult};
pub use file_io::{load_workbook, load_workbook_with_lock_check, save_workbook, EditLockInfo, FileLock};
pub use inputs::{GridMode, ProjectInputs, Region, WarrantyYears};
pub use workbook::{QuoteRecord, QuoteWorkbook, WorkbookMetadata, WorkbookSettings};
