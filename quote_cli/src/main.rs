//! # VoltQuote CLI Application
//!
//! Terminal front-end for BESS quoting. Collects project parameters at the
//! prompt, prices them against the built-in vendor cost assumptions, and
//! prints an itemized quote. The resulting draft can be saved as a `.vqf`
//! workbook and exported as a PDF quotation.

use std::io::{self, BufRead, Write};
use std::path::Path;

use quote_core::assumptions::DEFAULT_ASSUMPTIONS;
use quote_core::calculator::compute;
use quote_core::errors::{QuoteError, QuoteResult};
use quote_core::export::{format_currency, format_percent, format_quantity, format_years, ABSENT_DISPLAY};
use quote_core::file_io::{load_workbook_with_lock_check, save_workbook, FileLock};
use quote_core::inputs::{GridMode, ProjectInputs, Region, WarrantyYears};
use quote_core::pdf::render_quote_pdf;
use quote_core::workbook::{QuoteRecord, QuoteWorkbook};

fn prompt_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    if io::stdout().flush().is_err() {
        return None;
    }

    let mut input = String::new();
    if io::stdin().lock().read_line(&mut input).is_err() {
        return None;
    }
    Some(input.trim().to_string())
}

fn prompt_f64(prompt: &str, default: f64) -> f64 {
    prompt_line(prompt)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn prompt_bool(prompt: &str, default: bool) -> bool {
    match prompt_line(prompt).as_deref() {
        Some("y") | Some("Y") | Some("yes") => true,
        Some("n") | Some("N") | Some("no") => false,
        _ => default,
    }
}

fn prompt_region(prompt: &str, default: Region) -> Region {
    match prompt_line(prompt).as_deref() {
        Some("US") | Some("us") => Region::Us,
        Some("UK") | Some("uk") => Region::Uk,
        Some("EU") | Some("eu") => Region::Eu,
        Some("Other") | Some("other") => Region::Other,
        _ => default,
    }
}

/// Append a draft to the workbook at `path`, creating it on first save.
///
/// An existing workbook is loaded with a lock check first: if another
/// preparer holds the edit lock, the save is refused rather than clobbering
/// their session. The edit lock is held for the duration of the save.
///
/// Returns the number of drafts in the saved workbook.
fn append_and_save(record: QuoteRecord, path: &Path) -> QuoteResult<usize> {
    let mut workbook = if path.exists() {
        let (workbook, holder) = load_workbook_with_lock_check(path)?;
        if let Some(holder) = holder {
            return Err(QuoteError::file_locked(
                path.display().to_string(),
                format!("{} ({})", holder.prepared_by, holder.machine),
                holder.locked_at.to_rfc3339(),
            ));
        }
        workbook
    } else {
        QuoteWorkbook::new("CLI User", "Q-CLI-001", "CLI Client")
    };

    workbook.add_quote(record);

    let _lock = FileLock::acquire(path, &workbook.meta)?;
    save_workbook(&workbook, path)?;
    Ok(workbook.quote_count())
}

fn main() {
    println!("VoltQuote CLI - Battery Storage Quoting");
    println!("=======================================");
    println!();

    let power_mw = prompt_f64("Rated power (MW) [1.0]: ", 1.0);
    let standby_hours = prompt_f64("Standby duration (h) [2.0]: ", 2.0);
    let off_grid = prompt_bool("Off-grid installation? [y/N]: ", false);
    let generator_mw = prompt_f64("Backup generator (MW) [0]: ", 0.0);
    let solar_mwp = prompt_f64("Solar PV (MWp) [0]: ", 0.0);
    let wind_mw = prompt_f64("Wind (MW) [0]: ", 0.0);
    let utilization = prompt_f64("Average utilization (0..1) [0.35]: ", 0.35);
    let value_per_kwh = prompt_f64("Energy value per kWh [0.10]: ", 0.10);
    let twenty_year = prompt_bool("Extend warranty to 20 years? [y/N]: ", false);
    let location_region = prompt_region("Region (US/UK/EU/Other) [US]: ", Region::Us);
    let pcs_separate = prompt_bool("Separately procured PCS? [y/N]: ", false);
    let budget_known = prompt_bool("Client budget known? [y/N]: ", false);
    let budget_amount = if budget_known {
        prompt_f64("Client budget [0]: ", 0.0)
    } else {
        0.0
    };

    let inputs = ProjectInputs {
        power_mw,
        standby_hours,
        grid_mode: if off_grid { GridMode::OffGrid } else { GridMode::OnGrid },
        generator_mw,
        solar_mwp,
        wind_mw,
        utilization,
        value_per_kwh,
        warranty_years: if twenty_year { WarrantyYears::Twenty } else { WarrantyYears::Ten },
        budget_known,
        budget_amount,
        location_region,
        pcs_separate,
    };

    // Warn about questionable values but quote anyway; the calculator is
    // permissive by design
    if let Err(e) = inputs.validate() {
        println!();
        println!("Warning: {}", e);
    }

    let assumptions = DEFAULT_ASSUMPTIONS.clone();
    let quote = compute(&inputs, &assumptions);
    let sym = "$";

    println!();
    println!("═══════════════════════════════════════");
    println!("  BESS QUOTE");
    println!("═══════════════════════════════════════");
    println!();
    println!("System:");
    println!("  Capacity:   {} MWh ({} MW x {} h)",
        format_quantity(quote.total_mwh),
        format_quantity(inputs.power_mw),
        format_quantity(inputs.standby_hours),
    );
    println!("  PCS:        {} kW ({})", format_quantity(quote.pcs_kw), inputs.grid_mode);
    println!("  Warranty:   {}", inputs.warranty_years);
    println!();
    println!("Itemized Costs:");
    println!("  Battery:    {}", format_currency(sym, quote.battery_subtotal));
    println!("  PCS:        {}", format_currency(sym, quote.pcs_subtotal));
    println!("  BOS ({}):   {}", format_percent(assumptions.bos_pct), format_currency(sym, quote.bos));
    println!("  EPC ({}):   {}", format_percent(assumptions.epc_pct), format_currency(sym, quote.epc));
    println!("  BESS CapEx: {}", format_currency(sym, quote.bess_capex));
    if quote.gen_subtotal != 0.0 {
        println!("  Generator:  {}", format_currency(sym, quote.gen_subtotal));
    }
    if quote.solar_subtotal != 0.0 {
        println!("  Solar:      {}", format_currency(sym, quote.solar_subtotal));
    }
    if quote.wind_subtotal != 0.0 {
        println!("  Wind:       {}", format_currency(sym, quote.wind_subtotal));
    }
    println!("  Tariffs ({}): {}",
        format_percent(assumptions.tariff_for(inputs.location_region)),
        format_currency(sym, quote.tariffs),
    );
    println!();
    println!("  GRAND TOTAL: {}", format_currency(sym, quote.grand_capex));
    println!();
    println!("Financials:");
    println!("  Annual savings: {}", format_currency(sym, quote.annual_savings));
    match quote.roi_years {
        Some(roi) => println!("  Simple payback: {} years", format_years(roi)),
        None => println!("  Simple payback: {}", ABSENT_DISPLAY),
    }
    if let Some(delta) = quote.budget_delta {
        let status = if delta >= 0.0 { "under budget" } else { "over budget" };
        println!("  Budget delta:   {} ({})", format_currency(sym, delta), status);
    }
    println!();

    if prompt_bool("Print raw quote JSON? [y/N]: ", false) {
        match serde_json::to_string_pretty(&quote) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize quote: {}", e),
        }
    }

    if prompt_bool("Save workbook (quote.vqf)? [y/N]: ", false) {
        let record = QuoteRecord {
            label: "CLI Quote".to_string(),
            inputs: inputs.clone(),
            assumptions: assumptions.clone(),
            outputs: quote.clone(),
        };
        match append_and_save(record, Path::new("quote.vqf")) {
            Ok(count) => println!("Saved quote.vqf ({} draft(s))", count),
            Err(e) => eprintln!("Save failed: {}", e),
        }
    }

    if prompt_bool("Export PDF (quote.pdf)? [y/N]: ", false) {
        let workbook = QuoteWorkbook::new("CLI User", "Q-CLI-001", "CLI Client");
        let record = QuoteRecord {
            label: "CLI Quote".to_string(),
            inputs,
            assumptions,
            outputs: quote,
        };
        match render_quote_pdf(&record, &workbook.meta, &workbook.settings) {
            Ok(bytes) => match std::fs::write("quote.pdf", bytes) {
                Ok(()) => println!("Exported quote.pdf"),
                Err(e) => eprintln!("Write failed: {}", e),
            },
            Err(e) => eprintln!("PDF export failed: {}", e),
        }
    }
}
