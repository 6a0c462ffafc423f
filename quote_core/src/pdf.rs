//! # PDF Generation Module
//!
//! Generates client-ready quote documents from computed quotes using Typst.
//!
//! ## Architecture
//!
//! - Typst templates are embedded as string constants
//! - Data is injected by substituting `{{TOKEN}}` placeholders with the
//!   pre-formatted strings from [`crate::export::token_map`]
//! - Output is raw PDF bytes (`Vec<u8>`)
//!
//! The renderer only ever sees display strings; the numeric quote fields
//! stay untouched in the workbook.
//!
//! ## Example
//!
//! ```rust,no_run
//! use quote_core::assumptions::CostAssumptions;
//! use quote_core::inputs::ProjectInputs;
//! use quote_core::pdf::render_quote_pdf;
//! use quote_core::workbook::{QuoteRecord, QuoteWorkbook};
//!
//! let workbook = QuoteWorkbook::new("Jane Seller", "Q-2026-014", "Acme Industrial");
//! let record = QuoteRecord::new(
//!     "Option A",
//!     ProjectInputs { power_mw: 2.0, standby_hours: 4.0, ..Default::default() },
//!     CostAssumptions::default(),
//! );
//!
//! let pdf_bytes = render_quote_pdf(&record, &workbook.meta, &workbook.settings).unwrap();
//! std::fs::write("quote.pdf", pdf_bytes).unwrap();
//! ```

use chrono::Utc;
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};
use typst_pdf::PdfOptions;

use crate::errors::{QuoteError, QuoteResult};
use crate::export::token_map;
use crate::workbook::{QuoteRecord, QuoteWorkbook, WorkbookMetadata, WorkbookSettings};

// ============================================================================
// Typst World Implementation
// ============================================================================

/// A minimal Typst world for compiling documents without external files.
struct PdfWorld {
    /// The main source document
    main: Source,
    /// Font book
    book: LazyHash<FontBook>,
    /// Available fonts
    fonts: Vec<Font>,
    /// Library (standard functions)
    library: LazyHash<Library>,
}

impl PdfWorld {
    fn new(source: String) -> Self {
        let fonts = Self::load_fonts();
        let book = FontBook::from_fonts(&fonts);

        PdfWorld {
            main: Source::detached(source),
            book: LazyHash::new(book),
            fonts,
            library: LazyHash::new(Library::default()),
        }
    }

    fn load_fonts() -> Vec<Font> {
        let mut fonts = Vec::new();

        // Bundled fonts from typst-assets (text plus math symbols)
        for font_bytes in typst_assets::fonts() {
            let buffer = Bytes::new(font_bytes.to_vec());
            for font in Font::iter(buffer) {
                fonts.push(font);
            }
        }

        fonts
    }
}

impl World for PdfWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        let now = Utc::now();
        Datetime::from_ymd(
            now.format("%Y").to_string().parse().ok()?,
            now.format("%m").to_string().parse().ok()?,
            now.format("%d").to_string().parse().ok()?,
        )
    }
}

// ============================================================================
// PDF Templates
// ============================================================================

/// Typst template for a single quote document
const QUOTE_TEMPLATE: &str = r##"
#set page(
  paper: "us-letter",
  margin: (top: 1in, bottom: 1in, left: 1in, right: 1in),
  header: align(right)[
    #text(size: 9pt, fill: gray)[VoltQuote Battery Storage Quotation]
  ],
  footer: context [
    #line(length: 100%, stroke: 0.5pt + gray)
    #v(4pt)
    #grid(
      columns: (1fr, 1fr, 1fr),
      align(left)[#text(size: 9pt)[Ref: {{QUOTE_REF}}]],
      align(center)[#text(size: 9pt)[Page #counter(page).display()]],
      align(right)[#text(size: 9pt)[{{DATE}}]],
    )
  ]
)

#set text(size: 11pt)

// Title Block
#align(center)[
  #block(width: 100%, fill: rgb("#f0f0f0"), inset: 12pt, radius: 4pt)[
    #text(size: 18pt, weight: "bold")[Battery Energy Storage System Quotation]
    #v(4pt)
    #text(size: 14pt)[{{QUOTE_LABEL}}]
  ]
]

#v(12pt)

#grid(
  columns: (1fr, 1fr),
  gutter: 20pt,
  [
    *Quotation Details*
    #v(4pt)
    #table(
      columns: (auto, 1fr),
      stroke: none,
      row-gutter: 4pt,
      [Prepared by:], [{{PREPARED_BY}}],
      [Reference:], [{{QUOTE_REF}}],
      [Client:], [{{CLIENT}}],
      [Date:], [{{DATE}}],
    )
  ],
  [
    *Cost Basis*
    #v(4pt)
    #table(
      columns: (auto, 1fr),
      stroke: none,
      row-gutter: 4pt,
      [Vendor pricing:], [{{VENDOR_NAME}}],
      [Price sheet date:], [{{VENDOR_DATE}}],
    )
  ]
)

#v(16pt)
#line(length: 100%, stroke: 0.5pt)
#v(8pt)

== System Configuration

#table(
  columns: (1fr, auto, auto),
  inset: 8pt,
  stroke: 0.5pt,
  align: (left, right, left),
  table.header([*Parameter*], [*Value*], [*Unit*]),
  [Rated Power], [{{POWER_MW}}], [MW],
  [Standby Duration], [{{STANDBY_HOURS}}], [h],
  [Storage Capacity], [{{TOTAL_MWH}}], [MWh],
  [Power Conversion], [{{PCS_KW}}], [kW],
  [Grid Mode], [{{GRID_MODE}}], [],
  [Backup Generator], [{{GENERATOR_MW}}], [MW],
  [Solar PV], [{{SOLAR_MWP}}], [MWp],
  [Wind], [{{WIND_MW}}], [MW],
  [Region], [{{REGION}}], [],
  [Warranty], [{{WARRANTY_YEARS}}], [years],
)

#v(12pt)

== Itemized Costs

#table(
  columns: (1fr, auto),
  inset: 8pt,
  stroke: 0.5pt,
  align: (left, right),
  table.header([*Item*], [*Cost*]),
  [Battery Storage], [{{BATTERY_SUBTOTAL}}],
  [Power Conversion System], [{{PCS_SUBTOTAL}}],
  [Balance of System ({{BOS_PCT}})], [{{BOS}}],
  [Engineering, Procurement & Construction ({{EPC_PCT}})], [{{EPC}}],
  [*BESS Subtotal*], [*{{BESS_CAPEX}}*],
  [Backup Generator], [{{GEN_SUBTOTAL}}],
  [Solar PV], [{{SOLAR_SUBTOTAL}}],
  [Wind], [{{WIND_SUBTOTAL}}],
  [Regional Tariffs ({{TARIFF_PCT}})], [{{TARIFFS}}],
  [Subtotal before warranty], [{{GRAND_CAPEX_BEFORE_WARRANTY}}],
  [*Grand Total*], [*{{GRAND_CAPEX}}*],
)

#v(12pt)

== Financial Summary

#table(
  columns: (1fr, auto),
  inset: 8pt,
  stroke: 0.5pt,
  align: (left, right),
  [Average Utilization], [{{UTILIZATION_PCT}}],
  [Energy Value], [{{VALUE_PER_KWH}} / kWh],
  [Estimated Annual Savings], [{{ANNUAL_SAVINGS}}],
  [Simple Payback (years)], [{{ROI_YEARS}}],
  [Client Budget], [{{BUDGET_AMOUNT}}],
  [Budget Delta], [{{BUDGET_DELTA}}],
)

#v(16pt)

#let budget_status = "{{BUDGET_STATUS}}"
#if budget_status != "N/A" [
  #align(center)[
    #block(
      width: auto,
      fill: if budget_status == "Under budget" { rgb("#d4edda") } else { rgb("#f8d7da") },
      inset: 16pt,
      radius: 4pt
    )[
      #text(size: 16pt, weight: "bold")[
        #if budget_status == "Under budget" [
          WITHIN CLIENT BUDGET
        ] else [
          EXCEEDS CLIENT BUDGET
        ]
      ]
      #v(4pt)
      #text(size: 12pt)[Delta vs budget: {{BUDGET_DELTA}}]
    ]
  ]
]

#v(24pt)
#line(length: 100%, stroke: 0.5pt)
#v(8pt)

#text(size: 9pt, fill: gray)[
  Generated by VoltQuote \
  Budgetary estimate only; final pricing subject to vendor confirmation.
]
"##;

// ============================================================================
// PDF Rendering Functions
// ============================================================================

/// Render a single quote draft to PDF.
///
/// # Arguments
///
/// * `record` - The quote draft (inputs, assumptions, computed outputs)
/// * `meta` - Workbook metadata for the document header
/// * `settings` - Workbook settings (currency symbol)
///
/// # Returns
///
/// * `Ok(Vec<u8>)` - PDF file as bytes
/// * `Err(QuoteError)` - If rendering fails
pub fn render_quote_pdf(
    record: &QuoteRecord,
    meta: &WorkbookMetadata,
    settings: &WorkbookSettings,
) -> QuoteResult<Vec<u8>> {
    let source = fill_template(QUOTE_TEMPLATE, record, meta, settings);
    compile_to_pdf(source)
}

/// Render an entire workbook (all quote drafts) to a single PDF.
///
/// Drafts are sorted by label for consistent ordering; each draft gets its
/// own page after a summary cover page.
///
/// # Returns
///
/// * `Ok(Vec<u8>)` - PDF file as bytes
/// * `Err(QuoteError)` - If rendering fails or the workbook has no drafts
pub fn render_workbook_pdf(workbook: &QuoteWorkbook) -> QuoteResult<Vec<u8>> {
    let mut drafts: Vec<&QuoteRecord> = workbook.quotes.values().collect();
    if drafts.is_empty() {
        return Err(QuoteError::render_error("Workbook has no quote drafts to export"));
    }
    drafts.sort_by(|a, b| a.label.cmp(&b.label));

    let mut source = format!(
        r##"
#set page(
  paper: "us-letter",
  margin: (top: 1in, bottom: 1in, left: 1in, right: 1in),
  header: align(right)[
    #text(size: 9pt, fill: gray)[VoltQuote Battery Storage Quotation]
  ],
  footer: context [
    #line(length: 100%, stroke: 0.5pt + gray)
    #v(4pt)
    #grid(
      columns: (1fr, 1fr, 1fr),
      align(left)[#text(size: 9pt)[Ref: {quote_ref}]],
      align(center)[#text(size: 9pt)[Page #counter(page).display()]],
      align(right)[#text(size: 9pt)[{date}]],
    )
  ]
)

#set text(size: 11pt)

// Cover Page
#align(center)[
  #block(width: 100%, fill: rgb("#f0f0f0"), inset: 20pt, radius: 4pt)[
    #text(size: 24pt, weight: "bold")[Battery Storage Quotation Package]
    #v(8pt)
    #text(size: 16pt)[{client}]
  ]
]

#v(24pt)

#grid(
  columns: (1fr, 1fr),
  gutter: 20pt,
  [
    *Quotation Details*
    #v(4pt)
    #table(
      columns: (auto, 1fr),
      stroke: none,
      row-gutter: 4pt,
      [Prepared by:], [{prepared_by}],
      [Reference:], [{quote_ref}],
      [Client:], [{client}],
      [Date:], [{date}],
    )
  ],
  [
    *Contents*
    #v(4pt)
    {count} quotation option(s), one per page.
  ]
)

#v(24pt)

== Option Summary

#table(
  columns: (auto, 1fr, auto, auto),
  inset: 8pt,
  stroke: 0.5pt,
  align: (left, left, right, right),
  table.header([*No.*], [*Option*], [*Grand Total*], [*Payback*]),
{summary_rows}
)
"##,
        quote_ref = escape_typst(&workbook.meta.quote_ref),
        date = Utc::now().format("%Y-%m-%d"),
        client = escape_typst(&workbook.meta.client),
        prepared_by = escape_typst(&workbook.meta.prepared_by),
        count = drafts.len(),
        summary_rows = build_summary_rows(&drafts, &workbook.settings),
    );

    // Add individual option pages; reuse the single-quote body without its
    // page setup by substituting into a pagebreak-prefixed section
    for draft in &drafts {
        source.push_str("\n#pagebreak()\n");
        let body_start = QUOTE_TEMPLATE
            .find("// Title Block")
            .unwrap_or(0);
        let section = &QUOTE_TEMPLATE[body_start..];
        source.push_str(&fill_template(section, draft, &workbook.meta, &workbook.settings));
    }

    compile_to_pdf(source)
}

/// Substitute quote data into a template's `{{TOKEN}}` placeholders.
fn fill_template(
    template: &str,
    record: &QuoteRecord,
    meta: &WorkbookMetadata,
    settings: &WorkbookSettings,
) -> String {
    let tokens = token_map(
        &record.inputs,
        &record.assumptions,
        &record.outputs,
        &settings.currency_symbol,
    );

    let mut source = template
        .replace("{{QUOTE_LABEL}}", &escape_typst(&record.label))
        .replace("{{PREPARED_BY}}", &escape_typst(&meta.prepared_by))
        .replace("{{QUOTE_REF}}", &escape_typst(&meta.quote_ref))
        .replace("{{CLIENT}}", &escape_typst(&meta.client))
        .replace("{{DATE}}", &Utc::now().format("%Y-%m-%d").to_string());

    for (token, value) in &tokens {
        source = source.replace(&format!("{{{{{}}}}}", token), &escape_typst(value));
    }

    source
}

/// Compile a Typst source string and render it to PDF bytes.
fn compile_to_pdf(source: String) -> QuoteResult<Vec<u8>> {
    let world = PdfWorld::new(source);

    let warned = typst::compile(&world);

    let document = warned.output.map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        QuoteError::render_error(format!(
            "Typst compilation failed: {}",
            error_msgs.join("; ")
        ))
    })?;

    let pdf_bytes = typst_pdf::pdf(&document, &PdfOptions::default()).map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        QuoteError::render_error(format!("PDF rendering failed: {}", error_msgs.join("; ")))
    })?;

    Ok(pdf_bytes)
}

/// Escape characters with special meaning in Typst markup.
fn escape_typst(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '*' => "\\*".to_string(),
            '_' => "\\_".to_string(),
            '#' => "\\#".to_string(),
            '$' => "\\$".to_string(),
            '@' => "\\@".to_string(),
            '<' => "\\<".to_string(),
            '>' => "\\>".to_string(),
            '\\' => "\\\\".to_string(),
            '`' => "\\`".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

/// Build summary table rows for the cover page
fn build_summary_rows(drafts: &[&QuoteRecord], settings: &WorkbookSettings) -> String {
    use crate::export::{format_currency, format_years, ABSENT_DISPLAY};

    drafts
        .iter()
        .enumerate()
        .map(|(i, draft)| {
            let payback = draft
                .outputs
                .roi_years
                .map(format_years)
                .unwrap_or_else(|| ABSENT_DISPLAY.to_string());
            format!(
                "  [{}], [{}], [{}], [{}],",
                i + 1,
                escape_typst(&draft.label),
                escape_typst(&format_currency(
                    &settings.currency_symbol,
                    draft.outputs.grand_capex
                )),
                payback
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::CostAssumptions;
    use crate::inputs::ProjectInputs;

    fn sample_record() -> QuoteRecord {
        QuoteRecord::new(
            "Option A - 2h system",
            ProjectInputs {
                power_mw: 1.0,
                standby_hours: 2.0,
                utilization: 0.4,
                value_per_kwh: 0.12,
                budget_known: true,
                budget_amount: 600_000.0,
                ..Default::default()
            },
            CostAssumptions::default(),
        )
    }

    #[test]
    fn test_escape_typst() {
        assert_eq!(escape_typst("$499,229"), "\\$499,229");
        assert_eq!(escape_typst("Acme #1 <Storage>"), "Acme \\#1 \\<Storage\\>");
        assert_eq!(escape_typst("plain"), "plain");
    }

    #[test]
    fn test_fill_template_leaves_no_placeholders() {
        let workbook = QuoteWorkbook::new("Test Seller", "Q-TEST-001", "Test Client");
        let record = sample_record();
        let source = fill_template(QUOTE_TEMPLATE, &record, &workbook.meta, &workbook.settings);
        assert!(!source.contains("{{"), "unfilled placeholder in: {}", source);
        assert!(source.contains("Test Client"));
    }

    #[test]
    fn test_pdf_generation() {
        let workbook = QuoteWorkbook::new("Test Seller", "Q-TEST-001", "Test Client");
        let record = sample_record();

        let pdf = render_quote_pdf(&record, &workbook.meta, &workbook.settings);

        // Should succeed
        assert!(pdf.is_ok(), "PDF generation failed: {:?}", pdf.err());

        let pdf_bytes = pdf.unwrap();
        // PDF should start with %PDF
        assert!(pdf_bytes.starts_with(b"%PDF"), "Output is not a valid PDF");
        // Should be a reasonable size (at least 1KB)
        assert!(pdf_bytes.len() > 1000, "PDF seems too small");
    }

    #[test]
    fn test_workbook_pdf_generation() {
        let mut workbook = QuoteWorkbook::new("Test Seller", "Q-TEST-001", "Test Client");
        workbook.add_quote(sample_record());

        let mut second = sample_record();
        second.label = "Option B - off-grid".to_string();
        second.inputs.grid_mode = crate::inputs::GridMode::OffGrid;
        second.recompute();
        workbook.add_quote(second);

        let pdf = render_workbook_pdf(&workbook);
        assert!(pdf.is_ok(), "PDF generation failed: {:?}", pdf.err());
        assert!(pdf.unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_empty_workbook_render_fails() {
        let workbook = QuoteWorkbook::new("Test", "Q-TEST", "Client");
        let err = render_workbook_pdf(&workbook).unwrap_err();
        assert_eq!(err.error_code(), "RENDER_ERROR");
    }
}
