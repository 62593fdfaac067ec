//! Loader for the ZIP-to-utility mapping files.
//!
//! Expected header columns (by name, case-insensitive):
//! - zip
//! - utility_id (or eiaid)
//! - utility_name
//! - ownership_type (or ownership)
//! - state (optional)
//! - service_type (optional)

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info};

use crate::error::{RateError, RateResult};
use crate::models::{Ownership, UtilityZipRecord};

use super::Loaded;
use super::columns::{HeaderIndex, cell, normalize_zip, parse_utility_id};

struct ZipColumns {
    zip: usize,
    utility_id: usize,
    utility_name: usize,
    ownership: usize,
    state: Option<usize>,
    service_type: Option<usize>,
}

impl ZipColumns {
    fn resolve(index: &HeaderIndex, origin: &str) -> RateResult<Self> {
        Ok(Self {
            zip: index.require(&["zip"], origin)?,
            utility_id: index.require(&["utility_id", "eiaid"], origin)?,
            utility_name: index.require(&["utility_name"], origin)?,
            ownership: index.require(&["ownership_type", "ownership"], origin)?,
            state: index.find(&["state"]),
            service_type: index.find(&["service_type"]),
        })
    }
}

fn record_to_zip(
    record: &StringRecord,
    columns: &ZipColumns,
    ownership: Ownership,
) -> Result<UtilityZipRecord, String> {
    let raw_zip = cell(record, Some(columns.zip)).ok_or("missing zip")?;
    let zip = normalize_zip(raw_zip).ok_or_else(|| format!("invalid zip '{raw_zip}'"))?;

    let raw_id = cell(record, Some(columns.utility_id)).ok_or("missing utility id")?;
    let utility_id = parse_utility_id(raw_id)?;

    let utility_name = cell(record, Some(columns.utility_name))
        .ok_or("missing utility name")?
        .to_string();

    Ok(UtilityZipRecord {
        zip,
        utility_id,
        utility_name,
        ownership,
        ownership_label: cell(record, Some(columns.ownership))
            .unwrap_or_default()
            .to_string(),
        state: cell(record, columns.state).map(str::to_ascii_uppercase),
        service_type: cell(record, columns.service_type).map(str::to_string),
    })
}

/// Reads a ZIP mapping from any reader.
///
/// `origin` names the source in errors and logs; `ownership` is stamped on
/// every record. Rows with a bad ZIP, utility ID, or name are skipped and
/// counted.
pub fn read_zip_map<R: Read>(
    reader: R,
    origin: &str,
    ownership: Ownership,
) -> RateResult<Loaded<UtilityZipRecord>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| super::csv_error(origin, e))?
        .clone();
    let columns = ZipColumns::resolve(&HeaderIndex::new(&headers), origin)?;

    let mut loaded = Loaded::default();
    for (row, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(super::csv_error(origin, e)),
            Err(e) => {
                debug!(file = origin, row = row + 1, error = %e, "Skipping unreadable row");
                loaded.skipped_rows += 1;
                continue;
            }
        };

        match record_to_zip(&record, &columns, ownership) {
            Ok(zip) => loaded.records.push(zip),
            Err(reason) => {
                debug!(file = origin, row = row + 1, reason = %reason, "Skipping ZIP mapping row");
                loaded.skipped_rows += 1;
            }
        }
    }

    info!(
        file = origin,
        records = loaded.records.len(),
        skipped = loaded.skipped_rows,
        "Loaded ZIP mapping"
    );
    Ok(loaded)
}

/// Loads one ZIP mapping file from disk.
pub fn load_zip_map<P: AsRef<Path>>(
    path: P,
    ownership: Ownership,
) -> RateResult<Loaded<UtilityZipRecord>> {
    let path = path.as_ref();
    let origin = path.display().to_string();
    let file = File::open(path).map_err(|e| RateError::FileAccess {
        path: origin.clone(),
        message: e.to_string(),
    })?;
    read_zip_map(file, &origin, ownership)
}

/// Loads the IOU and non-IOU mapping files and concatenates them.
///
/// Records from the first file are tagged investor-owned, records from the
/// second non-IOU. Skip counts are summed.
pub fn load_zip_maps<P: AsRef<Path>, Q: AsRef<Path>>(
    iou_path: P,
    non_iou_path: Q,
) -> RateResult<Loaded<UtilityZipRecord>> {
    let mut combined = load_zip_map(iou_path, Ownership::InvestorOwned)?;
    let non_iou = load_zip_map(non_iou_path, Ownership::NonInvestorOwned)?;
    combined.merge(non_iou);
    Ok(combined)
}
