//! Crate-wide error type for the input/output boundary.
//!
//! The simulation core itself never fails: degenerate inputs produce neutral
//! results. Errors only arise while reading profiles, parsing configuration,
//! or rejecting invalid inputs before they reach the simulator.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A row of an input file could not be interpreted.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Input rejected at the boundary (e.g. a negative PV nameplate).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
