//! EPA Toxics Release Inventory facility locations.
//!
//! TRI basic data files carry one row per facility and chemical, with
//! numbered headers such as `"12. LATITUDE"`. Rows are collapsed to one
//! facility per `TRIFD` id when that column is present.

use anyhow::{Context, Result, anyhow, bail};
use geo::Point;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use super::{find_column, line_of, parse_number};

#[derive(Debug, Clone, PartialEq)]
pub struct Facility {
    pub id: Option<String>,
    /// `x` = longitude, `y` = latitude.
    pub point: Point<f64>,
}

#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load(path: &Path) -> Result<Vec<Facility>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening TRI data {}", path.display()))?;
    from_reader(file, &path.display().to_string())
}

pub fn from_reader<R: Read>(reader: R, origin: &str) -> Result<Vec<Facility>> {
    let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
    let headers = rdr
        .headers()
        .with_context(|| format!("{origin}: reading header"))?
        .clone();

    let lat_idx = find_column(&headers, |h| bare_header(h).starts_with("LAT"))
        .ok_or_else(|| anyhow!("{origin}: no latitude column"))?;
    let lon_idx = find_column(&headers, |h| bare_header(h).starts_with("LON"))
        .ok_or_else(|| anyhow!("{origin}: no longitude column"))?;
    let id_idx = find_column(&headers, |h| bare_header(h) == "TRIFD");

    let mut facilities = Vec::new();
    let mut seen = HashSet::new();
    let mut rows = 0usize;
    let mut unlocated = 0usize;

    for (i, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("{origin}: malformed row {}", i + 2))?;
        let line = line_of(&record, i);
        rows += 1;

        let lat = parse_number(record.get(lat_idx).unwrap_or(""), "latitude", origin, line)?;
        let lon = parse_number(record.get(lon_idx).unwrap_or(""), "longitude", origin, line)?;
        let (Some(lat), Some(lon)) = (lat, lon) else {
            unlocated += 1;
            continue;
        };
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            bail!("{origin}: line {line}: coordinates ({lat}, {lon}) out of range");
        }

        let id = id_idx
            .and_then(|idx| record.get(idx))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        if let Some(ref id) = id {
            if !seen.insert(id.clone()) {
                continue;
            }
        }

        facilities.push(Facility {
            id,
            point: Point::new(lon, lat),
        });
    }

    debug!(rows, unlocated, facilities = facilities.len(), "TRI data loaded");
    Ok(facilities)
}

/// Upper-cased header with any leading `"<n>. "` numbering removed.
fn bare_header(header: &str) -> String {
    let header = header.trim();
    let bare = match header.split_once('.') {
        Some((prefix, rest)) if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) => {
            rest.trim_start()
        }
        _ => header,
    };
    bare.to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_header_strips_numbering() {
        assert_eq!(bare_header("12. LATITUDE"), "LATITUDE");
        assert_eq!(bare_header("Longitude"), "LONGITUDE");
        assert_eq!(bare_header("2. TRIFD"), "TRIFD");
    }

    #[test]
    fn test_collapses_rows_by_facility_id() {
        let csv = "2. TRIFD,12. LATITUDE,13. LONGITUDE,37. CHEMICAL\n\
                   A1,41.88,-87.63,Lead\n\
                   A1,41.88,-87.63,Benzene\n\
                   B2,41.90,-87.70,Lead\n";
        let facilities = from_reader(csv.as_bytes(), "tri.csv").unwrap();

        assert_eq!(facilities.len(), 2);
        assert_eq!(facilities[0].id.as_deref(), Some("A1"));
        assert_eq!(facilities[0].point, Point::new(-87.63, 41.88));
    }

    #[test]
    fn test_without_id_column_every_row_counts() {
        let csv = "LAT,LON\n29.7,-95.3\n29.7,-95.3\n";
        let facilities = from_reader(csv.as_bytes(), "tri.csv").unwrap();
        assert_eq!(facilities.len(), 2);
    }

    #[test]
    fn test_blank_coordinates_are_dropped() {
        let csv = "LATITUDE,LONGITUDE\n,-95.3\n29.7,-95.3\n";
        let facilities = from_reader(csv.as_bytes(), "tri.csv").unwrap();
        assert_eq!(facilities.len(), 1);
    }

    #[test]
    fn test_missing_coordinate_columns_is_an_error() {
        assert!(from_reader("NAME,CITY\nPlant,Tampa\n".as_bytes(), "tri.csv").is_err());
    }

    #[test]
    fn test_out_of_range_latitude_is_an_error() {
        let err = from_reader("LAT,LON\n129.7,-95.3\n".as_bytes(), "tri.csv").unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
