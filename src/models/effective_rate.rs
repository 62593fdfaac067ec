//! Calculator outputs: effective rates, run diagnostics, and the final report.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{LoadProfile, Season};

/// Energy billed within one tier band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCharge {
    /// Zero-based position of the tier after sorting by threshold.
    pub tier: usize,
    /// kWh billed in this band.
    pub kwh: Decimal,
    /// Price in $/kWh.
    pub price_per_kwh: Decimal,
    /// `kwh * price_per_kwh`, in dollars.
    pub amount: Decimal,
}

/// The blended price of one tariff for the reference load.
///
/// Only the calculator builds these, and only for tariffs that passed every
/// filter predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveRate {
    /// EIA utility identifier.
    pub utility_id: u32,
    /// Utility name, preferring the mapping file over URDB.
    pub utility_name: String,
    /// Tariff name.
    pub rate_name: String,
    /// URDB unique label, if present.
    pub label: Option<String>,
    /// Ownership as written in the ZIP mapping file; `None` if the utility is unmapped.
    pub ownership: Option<String>,
    /// Date the tariff took effect, if known.
    pub effective_date: Option<NaiveDate>,
    /// Date the tariff expires, if set.
    pub expiration_date: Option<NaiveDate>,
    /// Effective price in cents/kWh.
    pub cents_per_kwh: Decimal,
    /// Total monthly bill for the reference load, in dollars.
    pub monthly_cost: Decimal,
    /// Fixed charge normalized to dollars per month.
    pub fixed_monthly_charge: Decimal,
    /// Energy period the tiers were taken from.
    pub energy_period: usize,
    /// Energy charge broken down by tier.
    pub tier_charges: Vec<TierCharge>,
    /// ZIP codes served by the utility, sorted; empty if the utility is unmapped.
    pub served_zips: Vec<String>,
}

impl EffectiveRate {
    /// The effective price rounded to two decimal places for display.
    pub fn cents_per_kwh_display(&self) -> Decimal {
        self.cents_per_kwh.round_dp(2)
    }
}

/// Counts of everything that did not make it into the report.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunDiagnostics {
    /// Malformed rows skipped across both ZIP mapping files.
    pub zip_rows_skipped: usize,
    /// Malformed rows skipped in the URDB export.
    pub urdb_rows_skipped: usize,
    /// Tariffs parsed from the URDB export.
    pub tariffs_loaded: usize,
    /// Rejections keyed by the first failing predicate in chain order.
    pub rejected_by_predicate: BTreeMap<String, usize>,
    /// Eligible tariffs dropped because their utility is outside the scope.
    pub out_of_scope: usize,
    /// Eligible tariffs whose charge structure could not be evaluated.
    pub structure_failures: usize,
    /// Tariffs present in the report.
    pub tariffs_reported: usize,
}

impl RunDiagnostics {
    /// Total tariffs rejected by the filter pipeline.
    pub fn total_rejected(&self) -> usize {
        self.rejected_by_predicate.values().sum()
    }
}

/// The result of one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateReport {
    /// Date the active/started predicates were evaluated against.
    pub reference_date: NaiveDate,
    /// Load profile every tariff was priced for.
    pub load_profile: LoadProfile,
    /// Season used to pick energy periods.
    pub season: Season,
    /// Effective rates sorted ascending by price.
    pub rates: Vec<EffectiveRate>,
    /// Skip and rejection counts.
    pub diagnostics: RunDiagnostics,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_display_rounds_to_cents() {
        let rate = EffectiveRate {
            utility_id: 1,
            utility_name: "Test Utility".to_string(),
            rate_name: "R-1".to_string(),
            label: None,
            ownership: None,
            effective_date: None,
            expiration_date: None,
            cents_per_kwh: dec("16.369863013698630136986301370"),
            monthly_cost: dec("119.50"),
            fixed_monthly_charge: dec("10"),
            energy_period: 0,
            tier_charges: vec![],
            served_zips: vec![],
        };
        assert_eq!(rate.cents_per_kwh_display(), dec("16.37"));
    }

    #[test]
    fn test_total_rejected_sums_predicates() {
        let mut diagnostics = RunDiagnostics::default();
        diagnostics
            .rejected_by_predicate
            .insert("is_active".to_string(), 3);
        diagnostics
            .rejected_by_predicate
            .insert("is_not_ev".to_string(), 2);
        assert_eq!(diagnostics.total_rejected(), 5);
    }

    #[test]
    fn test_diagnostics_serialize_counts_only() {
        let diagnostics = RunDiagnostics {
            urdb_rows_skipped: 2,
            ..RunDiagnostics::default()
        };
        let json = serde_json::to_value(&diagnostics).unwrap();
        assert_eq!(json["urdb_rows_skipped"], 2);
        assert_eq!(json["tariffs_reported"], 0);
    }
}
