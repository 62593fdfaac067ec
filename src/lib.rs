//! Effective residential electricity rates from the Utility Rate Database.
//!
//! This crate reads the OpenEI URDB tariff export and the EIA ZIP-to-utility
//! mapping files, keeps the residential tariffs that are in force and not
//! restricted to special programs, and prices each one for a reference
//! household load to give a comparable cents/kWh figure.
//!
//! The stages are independent and can be used on their own:
//! [`loaders`] parse the CSV inputs, [`filter`] decides eligibility,
//! [`calculation`] prices tiers and joins ZIP codes, [`pipeline`] wires
//! them together, and [`report`] renders the result.

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod error;
pub mod filter;
pub mod loaders;
pub mod models;
pub mod pipeline;
pub mod report;
