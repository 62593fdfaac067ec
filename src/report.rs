//! Rendering a [`RateReport`] as a table, CSV, or JSON.

use std::fmt::Write as _;
use std::io::Write;

use chrono::NaiveDate;
use clap::ValueEnum;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{RateError, RateResult};
use crate::models::{EffectiveRate, RateReport};

/// ZIP codes shown per row in the table view.
pub const TABLE_ZIP_PREVIEW: usize = 5;

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Aligned plain-text table with a diagnostics footer.
    #[default]
    Table,
    /// One CSV row per tariff.
    Csv,
    /// The full report, including tier breakdowns and diagnostics.
    Json,
}

/// Writes the report in the requested format.
///
/// The writer is flushed before returning, so a buffered sink reports its
/// write failures here.
pub fn write_report<W: Write>(
    report: &RateReport,
    format: OutputFormat,
    mut writer: W,
) -> RateResult<()> {
    match format {
        OutputFormat::Table => {
            writer
                .write_all(render_table(report).as_bytes())
                .map_err(output_error)?;
            writer.flush().map_err(output_error)
        }
        OutputFormat::Csv => write_csv(report, writer),
        OutputFormat::Json => write_json(report, writer),
    }
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    utility_id: u32,
    utility_name: &'a str,
    rate_name: &'a str,
    label: Option<&'a str>,
    cents_per_kwh: Decimal,
    monthly_cost: Decimal,
    fixed_monthly_charge: Decimal,
    energy_period: usize,
    zip_count: usize,
    zips: String,
    ownership: Option<&'a str>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

impl<'a> From<&'a EffectiveRate> for CsvRow<'a> {
    fn from(rate: &'a EffectiveRate) -> Self {
        Self {
            utility_id: rate.utility_id,
            utility_name: &rate.utility_name,
            rate_name: &rate.rate_name,
            label: rate.label.as_deref(),
            cents_per_kwh: rate.cents_per_kwh_display(),
            monthly_cost: rate.monthly_cost.round_dp(2),
            fixed_monthly_charge: rate.fixed_monthly_charge.round_dp(2),
            energy_period: rate.energy_period,
            zip_count: rate.served_zips.len(),
            zips: rate.served_zips.join(" "),
            ownership: rate.ownership.as_deref(),
            start_date: rate.effective_date,
            end_date: rate.expiration_date,
        }
    }
}

/// Writes one CSV row per reported tariff, with a header.
pub fn write_csv<W: Write>(report: &RateReport, writer: W) -> RateResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for rate in &report.rates {
        wtr.serialize(CsvRow::from(rate)).map_err(output_error)?;
    }
    wtr.flush().map_err(output_error)
}

/// Writes the whole report as pretty-printed JSON.
pub fn write_json<W: Write>(report: &RateReport, mut writer: W) -> RateResult<()> {
    serde_json::to_writer_pretty(&mut writer, report).map_err(output_error)?;
    writeln!(writer).map_err(output_error)?;
    writer.flush().map_err(output_error)
}

/// Formats the report as an aligned text table followed by run diagnostics.
pub fn render_table(report: &RateReport) -> String {
    let headers = ["Utility", "Rate", "c/kWh", "Monthly $", "ZIPs", "Served ZIPs"];
    let rows: Vec<[String; 6]> = report
        .rates
        .iter()
        .map(|rate| {
            [
                rate.utility_name.clone(),
                rate.rate_name.clone(),
                rate.cents_per_kwh_display().to_string(),
                rate.monthly_cost.round_dp(2).to_string(),
                rate.served_zips.len().to_string(),
                zip_preview(&rate.served_zips),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let kwh = match report.load_profile.monthly_kwh() {
        Some(kwh) => kwh.normalize().to_string(),
        None => "an out-of-range number of".to_string(),
    };
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Effective residential rates for {} kWh/month ({:?} season, as of {})",
        kwh,
        report.season,
        report.reference_date
    );
    out.push('\n');
    push_row(&mut out, &headers.map(str::to_string), &widths);
    push_row(&mut out, &widths.map(|w| "-".repeat(w)), &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }

    let d = &report.diagnostics;
    out.push('\n');
    let _ = writeln!(
        out,
        "{} tariffs loaded, {} reported, {} rejected by filters, {} out of scope, \
         {} unusable structure",
        d.tariffs_loaded,
        d.tariffs_reported,
        d.total_rejected(),
        d.out_of_scope,
        d.structure_failures
    );
    for (predicate, count) in &d.rejected_by_predicate {
        let _ = writeln!(out, "  {predicate}: {count}");
    }
    let _ = writeln!(
        out,
        "Skipped rows: {} in ZIP mappings, {} in URDB export",
        d.zip_rows_skipped, d.urdb_rows_skipped
    );
    out
}

fn push_row(out: &mut String, cells: &[String; 6], widths: &[usize; 6]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, &width))| {
            // Numeric columns are right-aligned.
            if (2..=4).contains(&i) {
                format!("{cell:>width$}")
            } else {
                format!("{cell:<width$}")
            }
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

fn zip_preview(zips: &[String]) -> String {
    if zips.len() <= TABLE_ZIP_PREVIEW {
        return zips.join(" ");
    }
    format!(
        "{} (+{} more)",
        zips[..TABLE_ZIP_PREVIEW].join(" "),
        zips.len() - TABLE_ZIP_PREVIEW
    )
}

fn output_error<E: std::fmt::Display>(error: E) -> RateError {
    RateError::Output {
        message: error.to_string(),
    }
}
