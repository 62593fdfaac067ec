//! Loader for the URDB CSV export.
//!
//! Required columns (by name, case-insensitive; aliases in parentheses):
//! - utility_id (eiaid)
//! - rate_name (name)
//! - sector
//! - approved_status (approved)
//!
//! Optional columns: label, utility, is_default, description,
//! startdate, enddate, fixedmonthlycharge (fixedchargefirstmeter),
//! fixedchargeunits, energyweekdayschedule, and any number of
//! `energyratestructure/period{P}/tier{T}{max,rate,adj,unit}` tier columns.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info};

use crate::error::{RateError, RateResult};
use crate::models::{
    ChargeStructure, EnergyPeriod, EnergyTier, FixedChargeUnit, PeriodSchedule, TariffRecord,
    ThresholdUnit,
};

use super::Loaded;
use super::columns::{
    HeaderIndex, cell, optional_date, optional_decimal, parse_bool, parse_utility_id,
};

const TIER_PREFIX: &str = "energyratestructure/period";

/// Column positions for one `(period, tier)` pair.
#[derive(Debug, Clone, Default)]
struct TierColumns {
    max: Option<usize>,
    rate: Option<usize>,
    adj: Option<usize>,
    unit: Option<usize>,
}

struct UrdbColumns {
    utility_id: usize,
    rate_name: usize,
    sector: usize,
    approved: usize,
    label: Option<usize>,
    utility_name: Option<usize>,
    is_default: Option<usize>,
    description: Option<usize>,
    start_date: Option<usize>,
    end_date: Option<usize>,
    fixed_charge: Option<usize>,
    fixed_charge_units: Option<usize>,
    weekday_schedule: Option<usize>,
    tiers: BTreeMap<(usize, usize), TierColumns>,
}

/// Splits `energyratestructure/period3/tier1rate` into `(3, 1, "rate")`.
fn parse_tier_header(name: &str) -> Option<(usize, usize, &str)> {
    let rest = name.strip_prefix(TIER_PREFIX)?;
    let (period, rest) = rest.split_once("/tier")?;
    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    let (tier, field) = rest.split_at(digits);
    Some((period.parse().ok()?, tier.parse().ok()?, field))
}

impl UrdbColumns {
    fn resolve(index: &HeaderIndex, origin: &str) -> RateResult<Self> {
        let mut tiers: BTreeMap<(usize, usize), TierColumns> = BTreeMap::new();
        for (position, name) in index.names() {
            let Some((period, tier, field)) = parse_tier_header(name) else {
                continue;
            };
            let entry = tiers.entry((period, tier)).or_default();
            match field {
                "max" => entry.max = Some(position),
                "rate" => entry.rate = Some(position),
                "adj" => entry.adj = Some(position),
                "unit" => entry.unit = Some(position),
                _ => {}
            }
        }

        Ok(Self {
            utility_id: index.require(&["utility_id", "eiaid"], origin)?,
            rate_name: index.require(&["rate_name", "name"], origin)?,
            sector: index.require(&["sector"], origin)?,
            approved: index.require(&["approved_status", "approved"], origin)?,
            label: index.find(&["label"]),
            utility_name: index.find(&["utility", "utility_name"]),
            is_default: index.find(&["is_default"]),
            description: index.find(&["description"]),
            start_date: index.find(&["startdate", "effective_date"]),
            end_date: index.find(&["enddate", "expiration_date"]),
            fixed_charge: index.find(&["fixedmonthlycharge", "fixedchargefirstmeter"]),
            fixed_charge_units: index.find(&["fixedchargeunits"]),
            weekday_schedule: index.find(&["energyweekdayschedule"]),
            tiers,
        })
    }
}

/// Parses a 12x24 JSON period schedule; anything else reads as absent.
fn parse_schedule(raw: &str) -> Option<PeriodSchedule> {
    let schedule: PeriodSchedule = serde_json::from_str(raw).ok()?;
    (schedule.len() == 12 && schedule.iter().all(|row| row.len() == 24)).then_some(schedule)
}

fn parse_periods(
    record: &StringRecord,
    tiers: &BTreeMap<(usize, usize), TierColumns>,
) -> Result<Vec<EnergyPeriod>, String> {
    let mut periods: Vec<EnergyPeriod> = Vec::new();

    for (&(period, _tier), columns) in tiers {
        let max_kwh = optional_decimal(record, columns.max, "tier max")?;
        let rate = optional_decimal(record, columns.rate, "tier rate")?;
        let adj = optional_decimal(record, columns.adj, "tier adj")?;

        // Blank tier slots pad every row of the export to the widest tariff.
        if max_kwh.is_none() && rate.is_none() {
            continue;
        }

        let price_per_kwh = match rate {
            Some(rate) => Some(
                rate.checked_add(adj.unwrap_or_default())
                    .ok_or("tier rate plus adjustment overflows")?,
            ),
            None => None,
        };

        let energy_tier = EnergyTier {
            max_kwh,
            price_per_kwh,
            threshold_unit: cell(record, columns.unit)
                .map(ThresholdUnit::parse)
                .unwrap_or_default(),
        };

        match periods.last_mut() {
            Some(last) if last.index == period => last.tiers.push(energy_tier),
            _ => {
                periods.push(EnergyPeriod {
                    index: period,
                    tiers: vec![energy_tier],
                });
            }
        }
    }

    Ok(periods)
}

fn record_to_tariff(record: &StringRecord, columns: &UrdbColumns) -> Result<TariffRecord, String> {
    let raw_id = cell(record, Some(columns.utility_id)).ok_or("missing utility id")?;
    let utility_id = parse_utility_id(raw_id)?;

    let rate_name = cell(record, Some(columns.rate_name))
        .ok_or("missing rate name")?
        .to_string();
    let sector = cell(record, Some(columns.sector))
        .ok_or("missing sector")?
        .to_string();

    let charges = ChargeStructure {
        fixed_charge: optional_decimal(record, columns.fixed_charge, "fixed charge")?,
        fixed_charge_unit: cell(record, columns.fixed_charge_units)
            .map(FixedChargeUnit::parse)
            .unwrap_or_default(),
        energy_periods: parse_periods(record, &columns.tiers)?,
        weekday_schedule: cell(record, columns.weekday_schedule).and_then(parse_schedule),
    };

    Ok(TariffRecord {
        label: cell(record, columns.label).map(str::to_string),
        utility_id,
        utility_name: cell(record, columns.utility_name).map(str::to_string),
        rate_name,
        sector,
        approved_status: cell(record, Some(columns.approved))
            .unwrap_or_default()
            .to_string(),
        is_default: cell(record, columns.is_default).and_then(parse_bool),
        description: cell(record, columns.description).map(str::to_string),
        effective_date: optional_date(record, columns.start_date, "startdate")?,
        expiration_date: optional_date(record, columns.end_date, "enddate")?,
        charges,
    })
}

/// Reads URDB tariffs from any reader.
///
/// Rows with an unparsable utility ID, an empty rate name or sector, or a
/// malformed number or date are skipped and counted. Missing tier data is
/// not a row error; the calculator reports it.
pub fn read_urdb<R: Read>(reader: R, origin: &str) -> RateResult<Loaded<TariffRecord>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| super::csv_error(origin, e))?
        .clone();
    let columns = UrdbColumns::resolve(&HeaderIndex::new(&headers), origin)?;

    debug!(
        file = origin,
        tier_columns = columns.tiers.len(),
        "Resolved URDB header"
    );

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

        match record_to_tariff(&record, &columns) {
            Ok(tariff) => loaded.records.push(tariff),
            Err(reason) => {
                debug!(file = origin, row = row + 1, reason = %reason, "Skipping URDB row");
                loaded.skipped_rows += 1;
            }
        }
    }

    info!(
        file = origin,
        tariffs = loaded.records.len(),
        skipped = loaded.skipped_rows,
        "Loaded URDB export"
    );
    Ok(loaded)
}

/// Loads the URDB export from disk.
pub fn load_urdb<P: AsRef<Path>>(path: P) -> RateResult<Loaded<TariffRecord>> {
    let path = path.as_ref();
    let origin = path.display().to_string();
    let file = File::open(path).map_err(|e| RateError::FileAccess {
        path: origin.clone(),
        message: e.to_string(),
    })?;
    read_urdb(file, &origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    const HEADER: &str = "label,eiaid,name,utility,sector,approved,is_default,servicetype,\
        description,startdate,enddate,fixedchargefirstmeter,fixedchargeunits,\
        energyratestructure/period0/tier0max,energyratestructure/period0/tier0rate,\
        energyratestructure/period0/tier0adj,energyratestructure/period0/tier1max,\
        energyratestructure/period0/tier1rate,energyratestructure/period1/tier0rate\n";

    fn read(body: &str) -> Loaded<TariffRecord> {
        let csv = format!("{HEADER}{body}");
        read_urdb(csv.as_bytes(), "usurdb.csv").unwrap()
    }

    #[test]
    fn test_parse_tier_header() {
        assert_eq!(
            parse_tier_header("energyratestructure/period3/tier12rate"),
            Some((3, 12, "rate"))
        );
        assert_eq!(
            parse_tier_header("energyratestructure/period0/tier0max"),
            Some((0, 0, "max"))
        );
        assert_eq!(parse_tier_header("demandratestructure/period0/tier0rate"), None);
    }

    #[test]
    fn test_reads_full_row() {
        let loaded = read(
            "abc123,13206,R-1 Residential,Massachusetts Electric Co,Residential,true,true,Bundled,\
             Standard residential,2023-01-01 00:00:00,,7.00,$/month,500,0.10,0.01,,0.20,0.12\n",
        );

        assert_eq!(loaded.skipped_rows, 0);
        let tariff = &loaded.records[0];
        assert_eq!(tariff.label.as_deref(), Some("abc123"));
        assert_eq!(tariff.utility_id, 13206);
        assert_eq!(tariff.rate_name, "R-1 Residential");
        assert_eq!(tariff.utility_name.as_deref(), Some("Massachusetts Electric Co"));
        assert!(tariff.is_approved());
        assert_eq!(tariff.is_default, Some(true));
        assert_eq!(
            tariff.effective_date,
            Some(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap())
        );
        assert_eq!(tariff.expiration_date, None);
        assert_eq!(tariff.charges.fixed_charge, Some(dec("7.00")));
        assert_eq!(tariff.charges.fixed_charge_unit, FixedChargeUnit::PerMonth);

        let periods = &tariff.charges.energy_periods;
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].index, 0);
        assert_eq!(periods[0].tiers.len(), 2);
        assert_eq!(periods[0].tiers[0].max_kwh, Some(dec("500")));
        assert_eq!(periods[0].tiers[0].price_per_kwh, Some(dec("0.11")));
        assert_eq!(periods[0].tiers[1].max_kwh, None);
        assert_eq!(periods[0].tiers[1].price_per_kwh, Some(dec("0.20")));
        assert_eq!(periods[1].index, 1);
        assert_eq!(periods[1].tiers[0].price_per_kwh, Some(dec("0.12")));
    }

    #[test]
    fn test_blank_tier_slots_are_ignored() {
        let loaded = read("x,1,Flat,U,Residential,true,,,,,,5,,,0.15,,,,\n");
        let periods = &loaded.records[0].charges.energy_periods;
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].tiers.len(), 1);
    }

    #[test]
    fn test_tier_without_rate_is_kept_unpriced() {
        let loaded = read("x,1,Broken,U,Residential,true,,,,,,5,,500,,,,,\n");
        let tier = &loaded.records[0].charges.energy_periods[0].tiers[0];
        assert_eq!(tier.max_kwh, Some(dec("500")));
        assert_eq!(tier.price_per_kwh, None);
    }

    #[test]
    fn test_no_tier_data_loads_with_empty_structure() {
        let loaded = read("x,1,Empty,U,Residential,true,,,,,,5,,,,,,,\n");
        assert_eq!(loaded.skipped_rows, 0);
        assert!(loaded.records[0].charges.energy_periods.is_empty());
    }

    #[test]
    fn test_malformed_rows_are_skipped_and_counted() {
        let loaded = read(
            "a,1,Good,U,Residential,true,,,,,,5,,,0.15,,,,\n\
             b,one,Bad id,U,Residential,true,,,,,,5,,,0.15,,,,\n\
             c,1,,U,Residential,true,,,,,,5,,,0.15,,,,\n\
             d,1,Bad charge,U,Residential,true,,,,,,five,,,0.15,,,,\n\
             e,1,Bad date,U,Residential,true,,,,,someday,5,,,0.15,,,,\n\
             f,1,Bad rate,U,Residential,true,,,,,,5,,,cheap,,,,\n",
        );
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.skipped_rows, 5);
    }

    #[test]
    fn test_overflowing_rate_adjustment_skips_row() {
        let loaded = read(
            "a,1,Good,U,Residential,true,,,,,,5,,,0.15,,,,\n\
             b,1,Huge,U,Residential,true,,,,,,5,,,79228162514264337593543950335,1,,,\n",
        );
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.skipped_rows, 1);
        assert_eq!(loaded.records[0].rate_name, "Good");
    }

    #[test]
    fn test_alternate_column_names_are_accepted() {
        let csv = "utility_id,rate_name,sector,approved_status,fixedmonthlycharge,expiration_date,\
                   energyratestructure/period0/tier0rate\n\
                   42,Basic,Residential,Approved,10,2030-12-31,0.15\n";
        let loaded = read_urdb(csv.as_bytes(), "simple.csv").unwrap();
        let tariff = &loaded.records[0];
        assert_eq!(tariff.utility_id, 42);
        assert_eq!(tariff.approved_status, "Approved");
        assert_eq!(tariff.charges.fixed_charge, Some(dec("10")));
        assert_eq!(
            tariff.expiration_date,
            Some(NaiveDate::from_ymd_opt(2030, 12, 31).unwrap())
        );
    }

    #[test]
    fn test_weekday_schedule_is_parsed() {
        let row: Vec<String> = (0..12)
            .map(|m| {
                let period = if (5..9).contains(&m) { 1 } else { 0 };
                format!("[{}]", vec![period.to_string(); 24].join(","))
            })
            .collect();
        let schedule = format!("[{}]", row.join(","));
        let parsed = parse_schedule(&schedule).unwrap();
        assert_eq!(parsed.len(), 12);
        assert_eq!(parsed[6][12], 1);
        assert_eq!(parsed[0][12], 0);
        assert!(parse_schedule("[[0,1]]").is_none());
        assert!(parse_schedule("not json").is_none());
    }

    #[test]
    fn test_missing_required_column_is_data_format_error() {
        let csv = "eiaid,name,approved\n1,R-1,true\n";
        let result = read_urdb(csv.as_bytes(), "usurdb.csv");
        match result {
            Err(RateError::DataFormat { message, .. }) => assert!(message.contains("sector")),
            other => panic!("Expected DataFormat error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_file_access_error() {
        let result = load_urdb("/nonexistent/usurdb.csv");
        match result {
            Err(RateError::FileAccess { path, .. }) => assert!(path.contains("usurdb.csv")),
            other => panic!("Expected FileAccess error, got {:?}", other),
        }
    }
}
