//! Error types for the URDB rate analyzer.
//!
//! File-level problems (unreadable inputs, missing columns, bad configuration)
//! are fatal and surface as a [`RateError`]. Row-level and tariff-level
//! problems are counted in [`RunDiagnostics`](crate::models::RunDiagnostics)
//! instead of aborting the run.

use thiserror::Error;

/// The main error type for the rate analyzer.
///
/// # Example
///
/// ```
/// use urdb_rates::error::RateError;
///
/// let error = RateError::FileAccess {
///     path: "usurdb.csv".to_string(),
///     message: "No such file or directory".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Cannot read input file 'usurdb.csv': No such file or directory"
/// );
/// ```
#[derive(Debug, Error)]
pub enum RateError {
    /// An input file is missing or unreadable.
    #[error("Cannot read input file '{path}': {message}")]
    FileAccess {
        /// The path that could not be read.
        path: String,
        /// The underlying I/O or CSV error.
        message: String,
    },

    /// An input file is readable but lacks a required column.
    #[error("Malformed input file '{path}': {message}")]
    DataFormat {
        /// The path of the malformed file.
        path: String,
        /// A description of what is missing.
        message: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParse {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A configuration value is out of range or inconsistent.
    #[error("Invalid configuration value '{field}': {message}")]
    InvalidConfig {
        /// The offending field, in dotted form (e.g. `load.average_kw`).
        field: String,
        /// A description of what made the value invalid.
        message: String,
    },

    /// The configured ZIP code is not served by any utility in the mapping.
    #[error("No utilities found for ZIP code {zip}")]
    NoUtilitiesForZip {
        /// The ZIP code that was requested.
        zip: String,
    },

    /// A tariff's charge structure cannot be evaluated.
    #[error("Unusable charge structure for rate '{rate_name}': {message}")]
    TariffStructure {
        /// The name of the tariff.
        rate_name: String,
        /// A description of the structural problem.
        message: String,
    },

    /// The report could not be written.
    #[error("Failed to write report: {message}")]
    Output {
        /// A description of the write failure.
        message: String,
    },
}

/// A type alias for Results that return RateError.
pub type RateResult<T> = Result<T, RateError>;
