//! End-to-end analysis: load, filter, join, price, sort.

use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use crate::calculation::{UtilityIndex, UtilityMatch, calculate_effective_rate};
use crate::config::AnalysisConfig;
use crate::error::{RateError, RateResult};
use crate::filter::FilterPipeline;
use crate::loaders::{Loaded, load_urdb, load_zip_maps};
use crate::models::{EffectiveRate, RateReport, RunDiagnostics, TariffRecord, UtilityZipRecord};

/// Runs a full analysis from the files named in `config`.
///
/// The reference date is `config.reference_date`, or today's local date
/// when unset. `config` should already be normalized.
///
/// # Errors
///
/// Any fatal loader error, or [`RateError::NoUtilitiesForZip`] when the
/// scope names an unserved ZIP.
pub fn run_analysis(config: &AnalysisConfig) -> RateResult<RateReport> {
    let reference_date = config
        .reference_date
        .unwrap_or_else(|| Local::now().date_naive());

    info!(
        urdb = %config.inputs.urdb.display(),
        reference_date = %reference_date,
        season = ?config.load.season,
        "Starting rate analysis"
    );

    let zip_records = load_zip_maps(&config.inputs.iou_zip_map, &config.inputs.non_iou_zip_map)?;
    let tariffs = load_urdb(&config.inputs.urdb)?;

    analyze(config, zip_records, tariffs, reference_date)
}

/// Runs the analysis over records that are already loaded.
///
/// Tariffs are filtered, joined to their utility's service area, and priced.
/// The delivery-service filter reads the mapping files' service type, so
/// only utilities listed as "Delivery" for an in-scope ZIP pass it.
/// A tariff whose charge structure cannot be priced is logged, counted, and
/// left out of the report. The report is sorted ascending by effective
/// rate, then utility name, then rate name.
pub fn analyze(
    config: &AnalysisConfig,
    zip_records: Loaded<UtilityZipRecord>,
    tariffs: Loaded<TariffRecord>,
    reference_date: NaiveDate,
) -> RateResult<RateReport> {
    let profile = config.load.profile();
    let season = config.load.season;

    let index = UtilityIndex::build(&zip_records.records, &config.scope)?;
    let pipeline = FilterPipeline::from_config(config, reference_date)
        .with_delivery_utilities(index.delivery_utilities());
    let outcome = pipeline.apply(&tariffs.records);

    let mut diagnostics = RunDiagnostics {
        zip_rows_skipped: zip_records.skipped_rows,
        urdb_rows_skipped: tariffs.skipped_rows,
        tariffs_loaded: tariffs.records.len(),
        rejected_by_predicate: outcome.rejected_by,
        ..RunDiagnostics::default()
    };

    let mut rates = Vec::with_capacity(outcome.eligible.len());
    for tariff in outcome.eligible {
        let (utility_name, ownership, served_zips) = match index.lookup(tariff.utility_id) {
            UtilityMatch::InScope {
                utility_name,
                ownership,
                zips,
            } => (
                utility_name.to_string(),
                Some(ownership.to_string()),
                zips.iter().cloned().collect(),
            ),
            UtilityMatch::Unmapped => (fallback_name(tariff), None, Vec::new()),
            UtilityMatch::OutOfScope => {
                diagnostics.out_of_scope += 1;
                continue;
            }
        };

        let breakdown = match calculate_effective_rate(tariff, &profile, season) {
            Ok(breakdown) => breakdown,
            Err(RateError::TariffStructure { rate_name, message }) => {
                warn!(
                    utility_id = tariff.utility_id,
                    rate = %rate_name,
                    reason = %message,
                    "Skipping tariff with unusable charge structure"
                );
                diagnostics.structure_failures += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        rates.push(EffectiveRate {
            utility_id: tariff.utility_id,
            utility_name,
            rate_name: tariff.rate_name.clone(),
            label: tariff.label.clone(),
            ownership,
            effective_date: tariff.effective_date,
            expiration_date: tariff.expiration_date,
            cents_per_kwh: breakdown.cents_per_kwh,
            monthly_cost: breakdown.monthly_cost,
            fixed_monthly_charge: breakdown.fixed_monthly_charge,
            energy_period: breakdown.energy_period,
            tier_charges: breakdown.tier_charges,
            served_zips,
        });
    }

    rates.sort_by(|a, b| {
        a.cents_per_kwh
            .cmp(&b.cents_per_kwh)
            .then_with(|| a.utility_name.cmp(&b.utility_name))
            .then_with(|| a.rate_name.cmp(&b.rate_name))
    });
    diagnostics.tariffs_reported = rates.len();

    info!(
        loaded = diagnostics.tariffs_loaded,
        rejected = diagnostics.total_rejected(),
        out_of_scope = diagnostics.out_of_scope,
        structure_failures = diagnostics.structure_failures,
        reported = diagnostics.tariffs_reported,
        "Rate analysis complete"
    );

    Ok(RateReport {
        reference_date,
        load_profile: profile,
        season,
        rates,
        diagnostics,
    })
}

fn fallback_name(tariff: &TariffRecord) -> String {
    tariff
        .utility_name
        .clone()
        .unwrap_or_else(|| tariff.utility_id.to_string())
}
