//! Monthly cost and effective rate for a tiered tariff.
//!
//! The reference load is a flat average demand, so a month's energy is
//! `average_kw * hours_per_month`. That energy fills the selected period's
//! tiers in ascending threshold order, and the fixed charge is added on top.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{RateError, RateResult};
use crate::models::{
    ChargeStructure, FixedChargeUnit, LoadProfile, Season, TariffRecord, ThresholdUnit, TierCharge,
};

use super::season::select_energy_period;

/// Cents per dollar.
pub const CENTS_PER_DOLLAR: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// The priced result for one tariff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateBreakdown {
    /// Energy consumed by the reference load, in kWh.
    pub monthly_kwh: Decimal,
    /// Fixed charge in dollars per month.
    pub fixed_monthly_charge: Decimal,
    /// Energy period the tiers were taken from.
    pub energy_period: usize,
    /// Energy billed per tier band.
    pub tier_charges: Vec<TierCharge>,
    /// Sum of the tier amounts, in dollars.
    pub energy_charge: Decimal,
    /// Fixed plus energy charge, in dollars.
    pub monthly_cost: Decimal,
    /// `monthly_cost / monthly_kwh`, in cents.
    pub cents_per_kwh: Decimal,
}

/// Converts the tariff's fixed charge to dollars per month.
///
/// Daily charges are multiplied by the days in the billing month and
/// annual charges divided by twelve. A missing charge is zero. `None` if the
/// daily charge overflows when scaled to a month.
///
/// # Example
///
/// ```
/// use urdb_rates::calculation::monthly_fixed_charge;
/// use urdb_rates::models::{ChargeStructure, FixedChargeUnit, LoadProfile};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let charges = ChargeStructure {
///     fixed_charge: Some(Decimal::from_str("0.48").unwrap()),
///     fixed_charge_unit: FixedChargeUnit::PerDay,
///     ..ChargeStructure::default()
/// };
/// let monthly = monthly_fixed_charge(&charges, &LoadProfile::default()).unwrap();
/// assert_eq!(monthly.round_dp(2), Decimal::from_str("14.60").unwrap());
/// ```
pub fn monthly_fixed_charge(charges: &ChargeStructure, profile: &LoadProfile) -> Option<Decimal> {
    let Some(amount) = charges.fixed_charge else {
        return Some(Decimal::ZERO);
    };
    match charges.fixed_charge_unit {
        FixedChargeUnit::PerMonth => Some(amount),
        FixedChargeUnit::PerDay => amount.checked_mul(profile.days_per_month()),
        FixedChargeUnit::PerYear => amount.checked_div(Decimal::from(12)),
    }
}

/// Prices a tariff for the reference load.
///
/// # Errors
///
/// Returns [`RateError::TariffStructure`] when the tariff has no energy
/// periods, the selected period has no tiers, a tier has no price, or its
/// charges overflow `Decimal`. Returns [`RateError::InvalidConfig`] if the
/// profile consumes no energy or its monthly energy overflows.
///
/// # Examples
///
/// ```
/// use urdb_rates::calculation::calculate_effective_rate;
/// use urdb_rates::models::{
///     ChargeStructure, EnergyPeriod, EnergyTier, LoadProfile, Season, TariffRecord,
///     ThresholdUnit,
/// };
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let dec = |s: &str| Decimal::from_str(s).unwrap();
/// let tariff = TariffRecord {
///     label: None,
///     utility_id: 1,
///     utility_name: None,
///     rate_name: "Residential".to_string(),
///     sector: "Residential".to_string(),
///     approved_status: "Approved".to_string(),
///     is_default: None,
///     description: None,
///     effective_date: None,
///     expiration_date: None,
///     charges: ChargeStructure {
///         fixed_charge: Some(dec("10")),
///         energy_periods: vec![EnergyPeriod {
///             index: 0,
///             tiers: vec![EnergyTier {
///                 max_kwh: Some(dec("1000")),
///                 price_per_kwh: Some(dec("0.15")),
///                 threshold_unit: ThresholdUnit::Monthly,
///             }],
///         }],
///         ..ChargeStructure::default()
///     },
/// };
///
/// let rate = calculate_effective_rate(&tariff, &LoadProfile::default(), Season::Default).unwrap();
/// assert_eq!(rate.monthly_cost, dec("119.50"));
/// assert_eq!(rate.cents_per_kwh.round_dp(2), dec("16.37"));
/// ```
pub fn calculate_effective_rate(
    tariff: &TariffRecord,
    profile: &LoadProfile,
    season: Season,
) -> RateResult<RateBreakdown> {
    let monthly_kwh = profile.monthly_kwh().ok_or_else(|| RateError::InvalidConfig {
        field: "load.average_kw".to_string(),
        message: "the reference load is too large".to_string(),
    })?;
    if monthly_kwh <= Decimal::ZERO {
        return Err(RateError::InvalidConfig {
            field: "load.average_kw".to_string(),
            message: "the reference load must consume energy".to_string(),
        });
    }

    let charges = &tariff.charges;
    let period_index = select_energy_period(charges, season)
        .ok_or_else(|| structure_error(tariff, "no energy rate periods".to_string()))?;
    let period = charges
        .period(period_index)
        .ok_or_else(|| structure_error(tariff, format!("period {period_index} is not defined")))?;
    if period.tiers.is_empty() {
        return Err(structure_error(
            tariff,
            format!("period {period_index} has no tiers"),
        ));
    }

    // (upper bound in monthly kWh, price), bounded tiers ascending then unbounded.
    let mut bands = Vec::with_capacity(period.tiers.len());
    for (position, tier) in period.tiers.iter().enumerate() {
        let price = tier.price_per_kwh.ok_or_else(|| {
            structure_error(
                tariff,
                format!("period {period_index} tier {position} has no rate"),
            )
        })?;
        let upper = match (tier.max_kwh, tier.threshold_unit) {
            (None, _) => None,
            (Some(max), ThresholdUnit::Monthly) => Some(max),
            (Some(max), ThresholdUnit::Daily) => Some(
                max.checked_mul(profile.days_per_month())
                    .ok_or_else(|| overflow_error(tariff))?,
            ),
        };
        bands.push((upper, price));
    }
    bands.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    let mut tier_charges = Vec::new();
    let mut remaining = monthly_kwh;
    let mut lower = Decimal::ZERO;
    let last = bands.len() - 1;
    for (tier, (upper, price)) in bands.into_iter().enumerate() {
        if remaining <= Decimal::ZERO {
            break;
        }
        // The last band absorbs everything left over, bounded or not.
        let kwh = match upper {
            Some(upper) if tier < last => upper
                .checked_sub(lower)
                .ok_or_else(|| overflow_error(tariff))?
                .max(Decimal::ZERO)
                .min(remaining),
            _ => remaining,
        };
        if let Some(upper) = upper {
            lower = lower.max(upper);
        }
        if kwh.is_zero() {
            continue;
        }
        remaining -= kwh;
        tier_charges.push(TierCharge {
            tier,
            kwh,
            price_per_kwh: price,
            amount: kwh.checked_mul(price).ok_or_else(|| overflow_error(tariff))?,
        });
    }

    let fixed_monthly_charge =
        monthly_fixed_charge(charges, profile).ok_or_else(|| overflow_error(tariff))?;
    let energy_charge = tier_charges
        .iter()
        .try_fold(Decimal::ZERO, |sum, c| sum.checked_add(c.amount))
        .ok_or_else(|| overflow_error(tariff))?;
    let monthly_cost = fixed_monthly_charge
        .checked_add(energy_charge)
        .ok_or_else(|| overflow_error(tariff))?;
    let cents_per_kwh = monthly_cost
        .checked_div(monthly_kwh)
        .and_then(|dollars| dollars.checked_mul(CENTS_PER_DOLLAR))
        .ok_or_else(|| overflow_error(tariff))?;

    Ok(RateBreakdown {
        monthly_kwh,
        fixed_monthly_charge,
        energy_period: period_index,
        tier_charges,
        energy_charge,
        monthly_cost,
        cents_per_kwh,
    })
}

fn structure_error(tariff: &TariffRecord, message: String) -> RateError {
    RateError::TariffStructure {
        rate_name: tariff.rate_name.clone(),
        message,
    }
}

fn overflow_error(tariff: &TariffRecord) -> RateError {
    structure_error(tariff, "charge arithmetic overflowed".to_string())
}
