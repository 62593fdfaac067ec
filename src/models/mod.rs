//! Core data models for the rate analyzer.
//!
//! Inputs ([`UtilityZipRecord`], [`TariffRecord`]) are immutable once loaded;
//! outputs ([`EffectiveRate`], [`RateReport`]) are built once by the
//! calculator and pipeline.

mod effective_rate;
mod load_profile;
mod tariff;
mod utility;

pub use effective_rate::{EffectiveRate, RateReport, RunDiagnostics, TierCharge};
pub use load_profile::{DEFAULT_HOURS_PER_MONTH, LoadProfile, Season};
pub use tariff::{
    ChargeStructure, EnergyPeriod, EnergyTier, FixedChargeUnit, PeriodSchedule, TariffRecord,
    ThresholdUnit,
};
pub use utility::{Ownership, OwnershipFilter, UtilityZipRecord};
