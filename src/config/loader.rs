//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for reading an
//! [`AnalysisConfig`] from a YAML file.

use std::fs;
use std::path::Path;

use crate::error::{RateError, RateResult};

use super::types::AnalysisConfig;

/// Loads analysis configuration from YAML.
///
/// # File Format
///
/// Every section is optional; omitted fields keep their defaults.
/// ```text
/// inputs:
///   urdb: data/usurdb.csv
///   iou_zip_map: data/iou_zipcodes_2024.csv
///   non_iou_zip_map: data/non_iou_zipcodes_2024.csv
/// scope:
///   state: MA
///   ownership: investor_owned
/// load:
///   average_kw: 1.0
///   season: summer
/// reference_date: 2024-06-01
/// markers:
///   ev: [ev, electric vehicle, charging]
/// ```
///
/// # Example
///
/// ```no_run
/// use urdb_rates::config::ConfigLoader;
///
/// let config = ConfigLoader::load("./rates.yaml")?;
/// println!("URDB export: {}", config.inputs.urdb.display());
/// # Ok::<(), urdb_rates::error::RateError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads and validates configuration from the specified file.
    ///
    /// # Returns
    ///
    /// Returns the configuration on success, or an error if:
    /// - The file does not exist or cannot be read (`ConfigNotFound`)
    /// - The file is not valid YAML or has unknown keys (`ConfigParse`)
    /// - A value is out of range (`InvalidConfig`)
    pub fn load<P: AsRef<Path>>(path: P) -> RateResult<AnalysisConfig> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| RateError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        Self::from_yaml_str(&content, &path_str)
    }

    /// Parses and validates configuration from YAML text.
    ///
    /// `origin` names the source in error messages.
    pub fn from_yaml_str(content: &str, origin: &str) -> RateResult<AnalysisConfig> {
        let config: AnalysisConfig =
            serde_yaml::from_str(content).map_err(|e| RateError::ConfigParse {
                path: origin.to_string(),
                message: e.to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }
}
