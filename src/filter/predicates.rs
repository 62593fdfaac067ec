//! Eligibility predicates over tariff records.
//!
//! Each predicate is a pure function of the tariff and a [`FilterContext`];
//! none depends on another's outcome, so the order they run in never changes
//! which tariffs pass.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::TariffRecord;

use super::markers::{MarkerList, MarkerSet, normalize_text};

/// Inputs shared by every predicate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterContext {
    /// Date that "active" and "started" are judged against.
    pub reference_date: NaiveDate,
    /// Exclusion markers.
    pub markers: MarkerSet,
    /// Utilities the ZIP mapping lists with a "Delivery" service type.
    pub delivery_utilities: BTreeSet<u32>,
}

/// A single inclusion test for a tariff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TariffPredicate {
    /// Approved, and not expired on the reference date.
    IsActive,
    /// Sector is "Residential".
    IsResidentialSector,
    /// No low-income marker in the name or description.
    IsNotLowIncome,
    /// No electric-vehicle marker in the name or description.
    IsNotEv,
    /// No time-of-use marker in the name or description.
    IsNotTou,
    /// No multi-unit marker in the name or description.
    IsNotMultiUnit,
    /// Effective date absent or on/before the reference date.
    HasStarted,
    /// URDB flags the tariff as the utility's default.
    IsDefaultRate,
    /// The ZIP mapping lists the tariff's utility as a delivery service.
    IsDeliveryService,
}

impl TariffPredicate {
    /// The predicates every run applies, in their canonical order.
    pub const REQUIRED: [TariffPredicate; 6] = [
        TariffPredicate::IsActive,
        TariffPredicate::IsResidentialSector,
        TariffPredicate::IsNotLowIncome,
        TariffPredicate::IsNotEv,
        TariffPredicate::IsNotTou,
        TariffPredicate::IsNotMultiUnit,
    ];

    /// Stable snake_case name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            TariffPredicate::IsActive => "is_active",
            TariffPredicate::IsResidentialSector => "is_residential_sector",
            TariffPredicate::IsNotLowIncome => "is_not_low_income",
            TariffPredicate::IsNotEv => "is_not_ev",
            TariffPredicate::IsNotTou => "is_not_tou",
            TariffPredicate::IsNotMultiUnit => "is_not_multi_unit",
            TariffPredicate::HasStarted => "has_started",
            TariffPredicate::IsDefaultRate => "is_default_rate",
            TariffPredicate::IsDeliveryService => "is_delivery_service",
        }
    }

    /// Returns true if the tariff satisfies this predicate.
    pub fn evaluate(self, tariff: &TariffRecord, ctx: &FilterContext) -> bool {
        match self {
            TariffPredicate::IsActive => {
                tariff.is_approved()
                    && tariff
                        .expiration_date
                        .is_none_or(|end| end > ctx.reference_date)
            }
            TariffPredicate::IsResidentialSector => {
                tariff.sector.trim().eq_ignore_ascii_case("residential")
            }
            TariffPredicate::IsNotLowIncome => !mentions(tariff, &ctx.markers.low_income),
            TariffPredicate::IsNotEv => !mentions(tariff, &ctx.markers.ev),
            TariffPredicate::IsNotTou => !mentions(tariff, &ctx.markers.tou),
            TariffPredicate::IsNotMultiUnit => !mentions(tariff, &ctx.markers.multi_unit),
            TariffPredicate::HasStarted => tariff
                .effective_date
                .is_none_or(|start| start <= ctx.reference_date),
            TariffPredicate::IsDefaultRate => tariff.is_default == Some(true),
            TariffPredicate::IsDeliveryService => {
                ctx.delivery_utilities.contains(&tariff.utility_id)
            }
        }
    }
}

fn mentions(tariff: &TariffRecord, markers: &MarkerList) -> bool {
    let mut text = normalize_text(&tariff.rate_name);
    if let Some(description) = &tariff.description {
        text.push_str(&normalize_text(description));
    }
    markers.matches(&text)
}
