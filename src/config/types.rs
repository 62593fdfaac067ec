//! Configuration types for a rate analysis run.
//!
//! Every field has a default so a YAML file only needs to name what it
//! changes. Command-line flags are applied on top of the loaded values.

use std::path::PathBuf;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{RateError, RateResult};
use crate::loaders::normalize_zip;
use crate::models::{DEFAULT_HOURS_PER_MONTH, LoadProfile, OwnershipFilter, Season};

/// Locations of the three input files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputPaths {
    /// URDB CSV export.
    pub urdb: PathBuf,
    /// ZIP mapping for investor-owned utilities.
    pub iou_zip_map: PathBuf,
    /// ZIP mapping for all other utilities.
    pub non_iou_zip_map: PathBuf,
}

impl Default for InputPaths {
    fn default() -> Self {
        Self {
            urdb: PathBuf::from("usurdb.csv"),
            iou_zip_map: PathBuf::from("iou_zipcodes_2024.csv"),
            non_iou_zip_map: PathBuf::from("non_iou_zipcodes_2024.csv"),
        }
    }
}

/// Which utilities the report covers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScopeConfig {
    /// Two-letter state code; `None` covers every state.
    pub state: Option<String>,
    /// Ownership classes to include.
    pub ownership: OwnershipFilter,
    /// Restrict to utilities serving this ZIP code.
    pub zip: Option<String>,
}

/// The reference load and season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    /// Average household demand in kW.
    pub average_kw: Decimal,
    /// Hours in the billing month.
    pub hours_per_month: Decimal,
    /// Season used to select an energy period.
    pub season: Season,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            average_kw: Decimal::ONE,
            hours_per_month: DEFAULT_HOURS_PER_MONTH,
            season: Season::Default,
        }
    }
}

impl LoadConfig {
    /// The load profile described by this section.
    pub fn profile(&self) -> LoadProfile {
        LoadProfile {
            average_kw: self.average_kw,
            hours_per_month: self.hours_per_month,
        }
    }
}

/// Switches for the optional filter predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterToggles {
    /// Exclude tariffs whose effective date is after the reference date.
    pub require_started: bool,
    /// Keep only tariffs URDB flags as the utility default.
    pub require_default: bool,
    /// Keep only tariffs whose utility the ZIP mapping lists as a delivery
    /// service.
    pub require_delivery: bool,
}

impl Default for FilterToggles {
    fn default() -> Self {
        Self {
            require_started: true,
            require_default: false,
            require_delivery: false,
        }
    }
}

/// Text markers that disqualify a tariff when found in its name or description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkerConfig {
    /// Low-income assistance programs.
    pub low_income: Vec<String>,
    /// Electric-vehicle charging rates.
    pub ev: Vec<String>,
    /// Time-of-use rates.
    pub tou: Vec<String>,
    /// Multi-unit or master-metered buildings.
    pub multi_unit: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            low_income: strings(&[
                "low income",
                "income qualified",
                "limited income",
                "care",
                "fera",
            ]),
            ev: strings(&["ev", "electric vehicle", "plug in", "pev"]),
            tou: strings(&[
                "time of use",
                "tou",
                "time of day",
                "tod",
                "on peak",
                "off peak",
                "critical peak",
            ]),
            multi_unit: strings(&[
                "multi family",
                "multifamily",
                "multi unit",
                "master metered",
                "apartment",
            ]),
        }
    }
}

impl MarkerConfig {
    fn groups(&self) -> [(&'static str, &[String]); 4] {
        [
            ("markers.low_income", &self.low_income),
            ("markers.ev", &self.ev),
            ("markers.tou", &self.tou),
            ("markers.multi_unit", &self.multi_unit),
        ]
    }
}

/// The complete configuration of one analysis run.
///
/// # Example
///
/// ```
/// use urdb_rates::config::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert!(config.validate().is_ok());
/// let kwh = config.load.profile().monthly_kwh().map(|kwh| kwh.to_string());
/// assert_eq!(kwh.as_deref(), Some("730"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Input file locations.
    pub inputs: InputPaths,
    /// Utility scope.
    pub scope: ScopeConfig,
    /// Reference load.
    pub load: LoadConfig,
    /// Date tariffs must be active on; `None` means today.
    pub reference_date: Option<NaiveDate>,
    /// Optional predicates.
    pub filters: FilterToggles,
    /// Exclusion markers.
    pub markers: MarkerConfig,
}

impl AnalysisConfig {
    /// Checks value ranges without modifying anything.
    pub fn validate(&self) -> RateResult<()> {
        if self.load.average_kw <= Decimal::ZERO {
            return Err(invalid("load.average_kw", "must be greater than zero"));
        }
        if self.load.hours_per_month <= Decimal::ZERO {
            return Err(invalid("load.hours_per_month", "must be greater than zero"));
        }
        if self.load.profile().monthly_kwh().is_none() {
            return Err(invalid("load.average_kw", "monthly energy is too large to price"));
        }
        if let Some(state) = &self.scope.state {
            let state = state.trim();
            if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(invalid(
                    "scope.state",
                    &format!("expected a two-letter state code, got '{state}'"),
                ));
            }
        }
        if let Some(zip) = &self.scope.zip {
            if normalize_zip(zip).is_none() {
                return Err(invalid(
                    "scope.zip",
                    &format!("expected up to five digits, got '{zip}'"),
                ));
            }
        }
        for (field, markers) in self.markers.groups() {
            if markers.iter().any(|m| !m.chars().any(char::is_alphanumeric)) {
                return Err(invalid(field, "markers must contain letters or digits"));
            }
        }
        Ok(())
    }

    /// Validates, then returns the config with the state code uppercased and
    /// the ZIP code zero-padded so later stages can compare them directly.
    pub fn normalized(mut self) -> RateResult<Self> {
        self.validate()?;
        self.scope.state = self.scope.state.map(|s| s.trim().to_ascii_uppercase());
        self.scope.zip = self.scope.zip.as_deref().and_then(normalize_zip);
        Ok(self)
    }
}

fn invalid(field: &str, message: &str) -> RateError {
    RateError::InvalidConfig {
        field: field.to_string(),
        message: message.to_string(),
    }
}
