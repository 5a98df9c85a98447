//! Loaders for the files dropped into the data directory.
//!
//! Each loader has a `load(path)` entry point and a `from_reader` variant so
//! tests can feed inline CSV/GeoJSON.

pub mod boundaries;
pub mod carbon_monitor;
pub mod pm25_fallback;
pub mod tri;

use anyhow::{Context, Result, bail};
use csv::StringRecord;

pub const CARBON_MONITOR_FILE: &str = "carbon_monitor_cities.csv";
pub const PM25_FALLBACK_FILE: &str = "pm25_fallback.csv";
pub const TRI_FILE: &str = "tri_2023_us.csv";
pub const BOUNDARIES_FILE: &str = "places.geojson";

/// Returns the index of the first header accepted by `pred`.
pub(crate) fn find_column(headers: &StringRecord, pred: impl Fn(&str) -> bool) -> Option<usize> {
    headers.iter().position(|h| pred(h.trim()))
}

/// Parses a numeric cell, treating blank cells as absent.
///
/// `NaN` and infinities are rejected like any other non-number. `origin` and
/// `line` only feed the error message.
pub(crate) fn parse_number(cell: &str, column: &str, origin: &str, line: u64) -> Result<Option<f64>> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }
    let not_a_number = || format!("{origin}: line {line}: `{column}` value {cell:?} is not a number");
    let value: f64 = cell.parse().with_context(not_a_number)?;
    if !value.is_finite() {
        bail!(not_a_number());
    }
    Ok(Some(value))
}

/// 1-based line of a record, falling back to the record counter.
pub(crate) fn line_of(record: &StringRecord, fallback: usize) -> u64 {
    record
        .position()
        .map(|p| p.line())
        .unwrap_or(fallback as u64 + 2)
}
