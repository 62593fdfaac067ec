//! Ordered predicate chains.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::models::TariffRecord;

use super::markers::MarkerSet;
use super::predicates::{FilterContext, TariffPredicate};

/// Tariffs that passed a [`FilterPipeline`], with rejection counts.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome<'a> {
    /// Tariffs satisfying every predicate, in input order.
    pub eligible: Vec<&'a TariffRecord>,
    /// Rejected tariffs keyed by the name of the first predicate they failed.
    pub rejected_by: BTreeMap<String, usize>,
}

/// An ordered list of predicates applied conjunctively.
///
/// The set of tariffs that pass is the same for any ordering of the
/// predicates; the order only decides which predicate a rejection is
/// attributed to.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use urdb_rates::config::AnalysisConfig;
/// use urdb_rates::filter::{FilterPipeline, TariffPredicate};
///
/// let config = AnalysisConfig::default();
/// let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
/// let pipeline = FilterPipeline::from_config(&config, date);
///
/// assert_eq!(pipeline.predicates()[0], TariffPredicate::IsActive);
/// assert!(pipeline.predicates().contains(&TariffPredicate::HasStarted));
/// ```
#[derive(Debug, Clone)]
pub struct FilterPipeline {
    predicates: Vec<TariffPredicate>,
    context: FilterContext,
}

impl FilterPipeline {
    /// Builds the pipeline a configuration asks for: the required
    /// predicates followed by whichever optional ones are switched on.
    ///
    /// No utility counts as a delivery service until
    /// [`with_delivery_utilities`](Self::with_delivery_utilities) supplies them.
    pub fn from_config(config: &AnalysisConfig, reference_date: NaiveDate) -> Self {
        let mut predicates = TariffPredicate::REQUIRED.to_vec();
        if config.filters.require_started {
            predicates.push(TariffPredicate::HasStarted);
        }
        if config.filters.require_default {
            predicates.push(TariffPredicate::IsDefaultRate);
        }
        if config.filters.require_delivery {
            predicates.push(TariffPredicate::IsDeliveryService);
        }

        let context = FilterContext {
            reference_date,
            markers: MarkerSet::from(&config.markers),
            delivery_utilities: BTreeSet::new(),
        };
        Self::with_order(predicates, context)
    }

    /// Sets the utilities that pass [`TariffPredicate::IsDeliveryService`].
    pub fn with_delivery_utilities(mut self, utilities: BTreeSet<u32>) -> Self {
        self.context.delivery_utilities = utilities;
        self
    }

    /// Builds a pipeline with an explicit predicate order.
    pub fn with_order(predicates: Vec<TariffPredicate>, context: FilterContext) -> Self {
        Self {
            predicates,
            context,
        }
    }

    /// The predicates in evaluation order.
    pub fn predicates(&self) -> &[TariffPredicate] {
        &self.predicates
    }

    /// The context predicates are evaluated against.
    pub fn context(&self) -> &FilterContext {
        &self.context
    }

    /// Returns the first predicate the tariff fails, if any.
    pub fn first_failure(&self, tariff: &TariffRecord) -> Option<TariffPredicate> {
        self.predicates
            .iter()
            .copied()
            .find(|p| !p.evaluate(tariff, &self.context))
    }

    /// Returns true if the tariff satisfies every predicate.
    pub fn passes(&self, tariff: &TariffRecord) -> bool {
        self.first_failure(tariff).is_none()
    }

    /// Splits tariffs into the eligible ones and per-predicate rejection counts.
    pub fn apply<'a>(&self, tariffs: &'a [TariffRecord]) -> FilterOutcome<'a> {
        let mut eligible = Vec::new();
        let mut rejected_by: BTreeMap<String, usize> = BTreeMap::new();

        for tariff in tariffs {
            match self.first_failure(tariff) {
                None => eligible.push(tariff),
                Some(predicate) => {
                    debug!(
                        utility_id = tariff.utility_id,
                        rate = %tariff.rate_name,
                        predicate = predicate.name(),
                        "Tariff rejected"
                    );
                    *rejected_by.entry(predicate.name().to_string()).or_default() += 1;
                }
            }
        }

        info!(
            candidates = tariffs.len(),
            eligible = eligible.len(),
            rejected = tariffs.len() - eligible.len(),
            "Applied tariff filters"
        );

        FilterOutcome {
            eligible,
            rejected_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FilterToggles, MarkerConfig};
    use crate::models::ChargeStructure;
    use proptest::prelude::*;

    const DELIVERY_UTILITY: u32 = 4176;

    fn reference_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn context() -> FilterContext {
        FilterContext {
            reference_date: reference_date(),
            markers: MarkerSet::from(&MarkerConfig::default()),
            delivery_utilities: BTreeSet::from([DELIVERY_UTILITY]),
        }
    }

    fn tariff(rate_name: &str, sector: &str, status: &str) -> TariffRecord {
        TariffRecord {
            label: None,
            utility_id: 13206,
            utility_name: None,
            rate_name: rate_name.to_string(),
            sector: sector.to_string(),
            approved_status: status.to_string(),
            is_default: None,
            description: None,
            effective_date: None,
            expiration_date: None,
            charges: ChargeStructure::default(),
        }
    }

    fn sample_tariffs() -> Vec<TariffRecord> {
        let mut expired = tariff("R-1 Old", "Residential", "Approved");
        expired.expiration_date = NaiveDate::from_ymd_opt(2023, 12, 31);
        let mut future = tariff("R-1 Next Year", "Residential", "Approved");
        future.effective_date = NaiveDate::from_ymd_opt(2025, 1, 1);
        let mut default_rate = tariff("R-1 Default", "Residential", "Approved");
        default_rate.is_default = Some(true);
        let mut delivery_rate = tariff("R-1 Delivery", "Residential", "Approved");
        delivery_rate.utility_id = DELIVERY_UTILITY;
        delivery_rate.is_default = Some(true);

        vec![
            tariff("R-1 Residential", "Residential", "Approved"),
            tariff("G-1 General", "Commercial", "Approved"),
            tariff("R-2 Low Income", "Residential", "Approved"),
            tariff("Residential EV", "Residential", "Approved"),
            tariff("Residential TOU", "Residential", "Approved"),
            tariff("Multi-Family Residential", "Residential", "Approved"),
            tariff("R-3 Draft", "Residential", "Pending"),
            tariff("EV Low Income Time of Use", "Commercial", "Pending"),
            expired,
            future,
            default_rate,
            delivery_rate,
        ]
    }

    #[test]
    fn test_from_config_appends_enabled_optional_predicates() {
        let mut config = AnalysisConfig::default();
        let pipeline = FilterPipeline::from_config(&config, reference_date());
        assert_eq!(pipeline.predicates().len(), 7);
        assert_eq!(pipeline.predicates()[6], TariffPredicate::HasStarted);

        config.filters = FilterToggles {
            require_started: false,
            require_default: true,
            require_delivery: true,
        };
        let pipeline = FilterPipeline::from_config(&config, reference_date());
        assert_eq!(
            &pipeline.predicates()[6..],
            &[TariffPredicate::IsDefaultRate, TariffPredicate::IsDeliveryService]
        );
    }

    #[test]
    fn test_apply_keeps_only_clean_residential_tariffs() {
        let pipeline = FilterPipeline::from_config(&AnalysisConfig::default(), reference_date());
        let tariffs = sample_tariffs();
        let outcome = pipeline.apply(&tariffs);

        let names: Vec<&str> = outcome.eligible.iter().map(|t| t.rate_name.as_str()).collect();
        assert_eq!(names, vec!["R-1 Residential", "R-1 Default", "R-1 Delivery"]);
    }

    #[test]
    fn test_rejections_are_attributed_to_first_failing_predicate() {
        let pipeline = FilterPipeline::from_config(&AnalysisConfig::default(), reference_date());
        let tariffs = sample_tariffs();
        let outcome = pipeline.apply(&tariffs);

        // The pending commercial EV/TOU/low-income tariff counts once, against is_active.
        assert_eq!(outcome.rejected_by.get("is_active"), Some(&3));
        assert_eq!(outcome.rejected_by.get("is_residential_sector"), Some(&1));
        assert_eq!(outcome.rejected_by.get("is_not_low_income"), Some(&1));
        assert_eq!(outcome.rejected_by.get("is_not_ev"), Some(&1));
        assert_eq!(outcome.rejected_by.get("is_not_tou"), Some(&1));
        assert_eq!(outcome.rejected_by.get("is_not_multi_unit"), Some(&1));
        assert_eq!(outcome.rejected_by.get("has_started"), Some(&1));

        let total: usize = outcome.rejected_by.values().sum();
        assert_eq!(total + outcome.eligible.len(), tariffs.len());
    }

    #[test]
    fn test_optional_predicates_narrow_the_result() {
        let mut config = AnalysisConfig::default();
        config.filters.require_default = true;
        config.filters.require_delivery = true;
        let pipeline = FilterPipeline::from_config(&config, reference_date())
            .with_delivery_utilities(BTreeSet::from([DELIVERY_UTILITY]));
        let tariffs = sample_tariffs();

        let outcome = pipeline.apply(&tariffs);
        assert_eq!(outcome.eligible.len(), 1);
        assert_eq!(outcome.eligible[0].rate_name, "R-1 Delivery");
        assert_eq!(outcome.rejected_by.get("is_default_rate"), Some(&1));
        assert_eq!(outcome.rejected_by.get("is_delivery_service"), Some(&1));
    }

    #[test]
    fn test_delivery_filter_without_delivery_utilities_rejects_all() {
        let mut config = AnalysisConfig::default();
        config.filters.require_delivery = true;
        let pipeline = FilterPipeline::from_config(&config, reference_date());
        let tariffs = sample_tariffs();

        let outcome = pipeline.apply(&tariffs);
        assert!(outcome.eligible.is_empty());
        assert_eq!(outcome.rejected_by.get("is_delivery_service"), Some(&3));
    }

    #[test]
    fn test_empty_pipeline_passes_everything() {
        let pipeline = FilterPipeline::with_order(Vec::new(), context());
        let tariffs = sample_tariffs();
        assert_eq!(pipeline.apply(&tariffs).eligible.len(), tariffs.len());
    }

    fn all_predicates() -> Vec<TariffPredicate> {
        let mut all = TariffPredicate::REQUIRED.to_vec();
        all.extend([
            TariffPredicate::HasStarted,
            TariffPredicate::IsDefaultRate,
            TariffPredicate::IsDeliveryService,
        ]);
        all
    }

    proptest! {
        #[test]
        fn prop_predicate_order_does_not_change_result(
            order in Just(all_predicates()).prop_shuffle(),
            subset in proptest::collection::vec(any::<bool>(), 9),
        ) {
            let chosen: Vec<TariffPredicate> = order
                .into_iter()
                .zip(subset)
                .filter_map(|(p, keep)| keep.then_some(p))
                .collect();
            let mut canonical = chosen.clone();
            canonical.sort();

            let shuffled = FilterPipeline::with_order(chosen, context());
            let sorted = FilterPipeline::with_order(canonical, context());
            let tariffs = sample_tariffs();

            let names = |pipeline: &FilterPipeline| -> Vec<String> {
                pipeline
                    .apply(&tariffs)
                    .eligible
                    .iter()
                    .map(|t| t.rate_name.clone())
                    .collect()
            };
            let a = names(&shuffled);
            let b = names(&sorted);
            prop_assert_eq!(a, b);
        }
    }
}
