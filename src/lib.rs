//! Hourly battery-storage dispatch simulator and capacity sizing.

/// Command-line parsing for the binary.
pub mod cli;
pub mod config;
/// Savings valuation, tariff tables and finance.
pub mod economics;
pub mod error;
/// CSV load-profile import and SOC-trace export.
pub mod io;
pub mod profile;
pub mod reporting;
/// Per-hour dispatch simulation.
pub mod sim;
/// Storage and PV size searches.
pub mod sizing;

pub use error::{Error, Result};
