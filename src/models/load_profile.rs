//! The reference household load a tariff is priced against.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Hours in an average month (8760 / 12).
pub const DEFAULT_HOURS_PER_MONTH: Decimal = Decimal::from_parts(730, 0, 0, false, 0);

/// Which energy period represents a seasonal tariff.
///
/// This is an explicit parameter, never derived from the current date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    /// The tariff's first energy period.
    #[default]
    Default,
    /// The period that dominates July in the weekday schedule.
    Summer,
    /// The period that dominates January in the weekday schedule.
    Winter,
}

impl Season {
    /// Zero-based month row of the weekday schedule that represents this season.
    pub fn schedule_month(self) -> Option<usize> {
        match self {
            Season::Default => None,
            Season::Summer => Some(6),
            Season::Winter => Some(0),
        }
    }
}

/// A flat average load, evaluated over one month.
///
/// # Example
///
/// ```
/// use urdb_rates::models::LoadProfile;
/// use rust_decimal::Decimal;
///
/// let profile = LoadProfile::default();
/// assert_eq!(profile.monthly_kwh(), Some(Decimal::from(730)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadProfile {
    /// Average demand in kW.
    pub average_kw: Decimal,
    /// Hours in the billing month.
    pub hours_per_month: Decimal,
}

impl Default for LoadProfile {
    fn default() -> Self {
        Self {
            average_kw: Decimal::ONE,
            hours_per_month: DEFAULT_HOURS_PER_MONTH,
        }
    }
}

impl LoadProfile {
    /// Energy consumed over the month, in kWh.
    ///
    /// `None` if the product does not fit in a `Decimal`.
    pub fn monthly_kwh(&self) -> Option<Decimal> {
        self.average_kw.checked_mul(self.hours_per_month)
    }

    /// Length of the billing month in days.
    pub fn days_per_month(&self) -> Decimal {
        self.hours_per_month / Decimal::from(24)
    }
}
