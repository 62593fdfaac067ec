//! Configuration loading and management for the rate analyzer.
//!
//! An [`AnalysisConfig`] carries everything a run needs: input paths, the
//! utility scope, the reference load, and the exclusion markers. It is passed
//! explicitly through the pipeline rather than read from global state.
//!
//! # Example
//!
//! ```no_run
//! use urdb_rates::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./rates.yaml").unwrap();
//! println!("Season: {:?}", config.load.season);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AnalysisConfig, FilterToggles, InputPaths, LoadConfig, MarkerConfig, ScopeConfig,
};
