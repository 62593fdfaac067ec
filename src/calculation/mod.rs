//! Pricing and joining logic for eligible tariffs.
//!
//! This module selects the energy period that represents a season, prices a
//! tariff's tiers for the reference load, and joins each tariff to the ZIP
//! codes its utility serves.

mod season;
mod tiered_cost;
mod zip_join;

pub use season::select_energy_period;
pub use tiered_cost::{
    CENTS_PER_DOLLAR, RateBreakdown, calculate_effective_rate, monthly_fixed_charge,
};
pub use zip_join::{UtilityIndex, UtilityMatch};
