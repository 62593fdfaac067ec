//! Tariff records parsed from the URDB export.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Billing unit of a fixed charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedChargeUnit {
    /// Dollars per month (the URDB default).
    #[default]
    PerMonth,
    /// Dollars per day.
    PerDay,
    /// Dollars per year.
    PerYear,
}

impl FixedChargeUnit {
    /// Parses a URDB `fixedchargeunits` value such as `$/month` or `$/day`.
    ///
    /// Unknown or empty values fall back to [`FixedChargeUnit::PerMonth`].
    ///
    /// # Examples
    ///
    /// ```
    /// use urdb_rates::models::FixedChargeUnit;
    ///
    /// assert_eq!(FixedChargeUnit::parse("$/day"), FixedChargeUnit::PerDay);
    /// assert_eq!(FixedChargeUnit::parse(""), FixedChargeUnit::PerMonth);
    /// ```
    pub fn parse(raw: &str) -> Self {
        let lowered = raw.trim().to_ascii_lowercase();
        if lowered.ends_with("day") {
            FixedChargeUnit::PerDay
        } else if lowered.ends_with("year") {
            FixedChargeUnit::PerYear
        } else {
            FixedChargeUnit::PerMonth
        }
    }
}

/// Unit of a tier's usage threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdUnit {
    /// kWh per billing month.
    #[default]
    Monthly,
    /// kWh per day.
    Daily,
}

impl ThresholdUnit {
    /// Parses a URDB tier unit such as `kWh` or `kWh daily`.
    pub fn parse(raw: &str) -> Self {
        if raw.to_ascii_lowercase().contains("daily") {
            ThresholdUnit::Daily
        } else {
            ThresholdUnit::Monthly
        }
    }
}

/// A usage band within an energy period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyTier {
    /// Upper bound of the band in kWh; `None` means unbounded.
    pub max_kwh: Option<Decimal>,
    /// Price in $/kWh including any adjustment; `None` if the export left
    /// the rate cell empty.
    pub price_per_kwh: Option<Decimal>,
    /// Unit of `max_kwh`.
    pub threshold_unit: ThresholdUnit,
}

/// An energy-rate period (a season or time-of-use slot in URDB terms).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyPeriod {
    /// Period index as numbered in the URDB column names.
    pub index: usize,
    /// Tiers in column order.
    pub tiers: Vec<EnergyTier>,
}

/// Month-by-hour period schedule: 12 rows of 24 period indices.
pub type PeriodSchedule = Vec<Vec<usize>>;

/// The priced components of a tariff.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChargeStructure {
    /// Fixed charge amount, in `fixed_charge_unit`.
    pub fixed_charge: Option<Decimal>,
    /// Billing unit of the fixed charge.
    pub fixed_charge_unit: FixedChargeUnit,
    /// Energy periods sorted by index.
    pub energy_periods: Vec<EnergyPeriod>,
    /// Weekday period schedule, if the export carries one.
    pub weekday_schedule: Option<PeriodSchedule>,
}

impl ChargeStructure {
    /// Returns the period with the given index.
    pub fn period(&self, index: usize) -> Option<&EnergyPeriod> {
        self.energy_periods.iter().find(|p| p.index == index)
    }
}

/// One row of the URDB export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffRecord {
    /// URDB unique label.
    pub label: Option<String>,
    /// EIA utility identifier.
    pub utility_id: u32,
    /// Utility name as recorded in URDB.
    pub utility_name: Option<String>,
    /// Tariff name.
    pub rate_name: String,
    /// Customer class ("Residential", "Commercial", ...).
    pub sector: String,
    /// Approval status text ("Approved", or URDB's boolean export).
    pub approved_status: String,
    /// Whether URDB marks this as the utility's default rate.
    pub is_default: Option<bool>,
    /// Free-text description.
    pub description: Option<String>,
    /// First day the tariff applies.
    pub effective_date: Option<NaiveDate>,
    /// Day the tariff stops applying.
    pub expiration_date: Option<NaiveDate>,
    /// Fixed and energy charges.
    pub charges: ChargeStructure,
}

impl TariffRecord {
    /// Returns true if the approval status marks the tariff as approved.
    ///
    /// Accepts the literal `Approved` as well as the `true`/`1` values found in
    /// URDB's boolean export, all case-insensitively.
    pub fn is_approved(&self) -> bool {
        let status = self.approved_status.trim();
        status.eq_ignore_ascii_case("approved")
            || status.eq_ignore_ascii_case("true")
            || status == "1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tariff_with_status(status: &str) -> TariffRecord {
        TariffRecord {
            label: None,
            utility_id: 1,
            utility_name: None,
            rate_name: "R-1".to_string(),
            sector: "Residential".to_string(),
            approved_status: status.to_string(),
            is_default: None,
            description: None,
            effective_date: None,
            expiration_date: None,
            charges: ChargeStructure::default(),
        }
    }

    #[test]
    fn test_approved_status_variants() {
        assert!(tariff_with_status("Approved").is_approved());
        assert!(tariff_with_status(" approved ").is_approved());
        assert!(tariff_with_status("TRUE").is_approved());
        assert!(tariff_with_status("1").is_approved());
        assert!(!tariff_with_status("Pending").is_approved());
        assert!(!tariff_with_status("False").is_approved());
        assert!(!tariff_with_status("").is_approved());
    }

    #[test]
    fn test_fixed_charge_unit_parse() {
        assert_eq!(FixedChargeUnit::parse("$/month"), FixedChargeUnit::PerMonth);
        assert_eq!(FixedChargeUnit::parse("$/Day"), FixedChargeUnit::PerDay);
        assert_eq!(FixedChargeUnit::parse("$/year"), FixedChargeUnit::PerYear);
        assert_eq!(FixedChargeUnit::parse("bogus"), FixedChargeUnit::PerMonth);
    }

    #[test]
    fn test_threshold_unit_parse() {
        assert_eq!(ThresholdUnit::parse("kWh"), ThresholdUnit::Monthly);
        assert_eq!(ThresholdUnit::parse("kWh daily"), ThresholdUnit::Daily);
    }

    #[test]
    fn test_period_lookup_by_index() {
        let charges = ChargeStructure {
            energy_periods: vec![
                EnergyPeriod { index: 0, tiers: vec![] },
                EnergyPeriod { index: 2, tiers: vec![] },
            ],
            ..ChargeStructure::default()
        };
        assert!(charges.period(2).is_some());
        assert!(charges.period(1).is_none());
    }
}
