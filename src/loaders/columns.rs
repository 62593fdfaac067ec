//! Header resolution and cell parsing shared by the CSV loaders.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{RateError, RateResult};

/// Case-insensitive lookup of column positions by name.
#[derive(Debug, Clone)]
pub(crate) struct HeaderIndex {
    names: Vec<String>,
}

impl HeaderIndex {
    pub(crate) fn new(headers: &StringRecord) -> Self {
        Self {
            names: headers
                .iter()
                .map(|h| h.trim().trim_start_matches('\u{feff}').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Position of the first alias present in the header.
    pub(crate) fn find(&self, aliases: &[&str]) -> Option<usize> {
        aliases
            .iter()
            .find_map(|alias| self.names.iter().position(|n| n == alias))
    }

    /// Like [`find`](Self::find), but a missing column is a `DataFormat` error.
    pub(crate) fn require(&self, aliases: &[&str], origin: &str) -> RateResult<usize> {
        self.find(aliases).ok_or_else(|| RateError::DataFormat {
            path: origin.to_string(),
            message: format!("missing required column '{}'", aliases.join("' or '")),
        })
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names.iter().enumerate().map(|(i, n)| (i, n.as_str()))
    }
}

/// The trimmed cell at `idx`, or `None` if the column is absent or the cell is blank.
pub(crate) fn cell(record: &StringRecord, idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Parses a decimal cell, accepting plain and scientific notation.
pub(crate) fn parse_decimal(raw: &str, column: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| format!("invalid number '{raw}' in column '{column}'"))
}

/// Parses an optional decimal cell; blank is `Ok(None)`, garbage is an error.
pub(crate) fn optional_decimal(
    record: &StringRecord,
    idx: Option<usize>,
    column: &str,
) -> Result<Option<Decimal>, String> {
    cell(record, idx)
        .map(|raw| parse_decimal(raw, column))
        .transpose()
}

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M"];

/// Parses the date forms seen in URDB exports.
pub(crate) fn parse_date(raw: &str, column: &str) -> Result<NaiveDate, String> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .ok_or_else(|| format!("invalid date '{raw}' in column '{column}'"))
}

pub(crate) fn optional_date(
    record: &StringRecord,
    idx: Option<usize>,
    column: &str,
) -> Result<Option<NaiveDate>, String> {
    cell(record, idx).map(|raw| parse_date(raw, column)).transpose()
}

/// Lenient boolean: unrecognized text reads as unknown rather than failing the row.
pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// Parses an EIA utility identifier, tolerating a float rendering such as `14328.0`.
pub(crate) fn parse_utility_id(raw: &str) -> Result<u32, String> {
    if let Ok(id) = raw.parse::<u32>() {
        return Ok(id);
    }
    Decimal::from_str(raw)
        .ok()
        .filter(|d| d.fract().is_zero() && !d.is_sign_negative())
        .and_then(|d| d.to_u32())
        .ok_or_else(|| format!("invalid utility id '{raw}'"))
}

/// Normalizes a ZIP code to five zero-padded digits.
///
/// Accepts 1-5 ASCII digits, or a ZIP+4 (`02139-4307`) whose first part is
/// used. Anything else is `None`.
///
/// # Examples
///
/// ```
/// use urdb_rates::loaders::normalize_zip;
///
/// assert_eq!(normalize_zip("501").as_deref(), Some("00501"));
/// assert_eq!(normalize_zip("02139-4307").as_deref(), Some("02139"));
/// assert_eq!(normalize_zip("ABCDE"), None);
/// ```
pub fn normalize_zip(raw: &str) -> Option<String> {
    let base = raw.trim().split('-').next().unwrap_or_default();
    if base.is_empty() || base.len() > 5 || !base.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("{base:0>5}"))
}
