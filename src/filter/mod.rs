//! Tariff eligibility filtering.
//!
//! A tariff is reported only if it passes every predicate in the
//! [`FilterPipeline`]: the six required residential checks, plus any
//! optional checks the configuration enables.

mod markers;
mod pipeline;
mod predicates;

pub use markers::{MarkerList, MarkerSet, normalize_text};
pub use pipeline::{FilterOutcome, FilterPipeline};
pub use predicates::{FilterContext, TariffPredicate};
