//! CSV reader for measured hourly load profiles.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::{Error, Result};
use crate::profile::series::{HourlySeries, LoadSeries};

/// Accepted timestamp layouts, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Reads a load profile from a CSV file with a `timestamp,load_kw` header.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or a row is malformed.
pub fn read_load_csv(path: &Path) -> Result<LoadSeries> {
    let file = File::open(path)?;
    parse_load_csv(file)
}

/// Parses a load profile from any reader.
///
/// Rows may come in any order; they are sorted and snapped to whole hours.
/// Blank load cells are rejected rather than read as zero, as are `NaN` and
/// infinite readings.
///
/// # Errors
///
/// Returns [`Error::Parse`] naming the line of the first malformed row.
pub fn parse_load_csv(reader: impl Read) -> Result<LoadSeries> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let expected = ["timestamp", "load_kw"];
    if headers.len() < 2 || headers.iter().take(2).ne(expected.iter().copied()) {
        return Err(Error::Parse {
            line: 1,
            message: format!(
                "expected header \"timestamp,load_kw\", got \"{}\"",
                headers.iter().collect::<Vec<_>>().join(",")
            ),
        });
    }

    let mut samples = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line() as usize);

        let raw_ts = record.get(0).unwrap_or_default();
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| Error::Parse {
            line,
            message: format!("unrecognised timestamp \"{raw_ts}\""),
        })?;

        let raw_load = record.get(1).unwrap_or_default();
        let load_kw: f64 = raw_load.parse().map_err(|_| Error::Parse {
            line,
            message: format!("load_kw \"{raw_load}\" is not a number"),
        })?;
        if !load_kw.is_finite() {
            return Err(Error::Parse {
                line,
                message: format!("load_kw \"{raw_load}\" is not finite"),
            });
        }

        samples.push((timestamp, load_kw));
    }

    debug!(rows = samples.len(), "read load profile");
    Ok(HourlySeries::new(samples))
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}
