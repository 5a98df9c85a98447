//! Data types flowing through the join and export stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analyzers::tier::HotspotTier;
use crate::config::City;

/// Where a city's PM2.5 value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pm25Source {
    OpenAq,
    Fallback,
}

/// Which area TRI facilities were counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FootprintKind {
    /// The city's boundary polygon.
    Boundary,
    /// A circle of the configured radius around the centroid.
    Radius,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacilityFootprint {
    pub kind: FootprintKind,
    pub facilities: u32,
    pub area_km2: f64,
}

/// Everything gathered for one city before the join; any source may be absent.
#[derive(Debug, Clone)]
pub struct CityObservation {
    pub city: City,
    pub pm25: Option<(f64, Pm25Source)>,
    pub co2: Option<f64>,
    pub footprint: Option<FacilityFootprint>,
}

impl CityObservation {
    /// Names of the sources this city has no data from.
    pub fn missing_sources(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.pm25.is_none() {
            missing.push("pm25");
        }
        if self.co2.is_none() {
            missing.push("co2");
        }
        if self.footprint.is_none() {
            missing.push("tri");
        }
        missing
    }
}

/// One output row: a city matched across all three sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub pm25: f64,
    pub pm25_source: Pm25Source,
    pub co2: f64,
    pub tri_facilities: u32,
    pub footprint: FootprintKind,
    pub facility_density: f64,
    pub hotspot_score: f64,
    pub tier: HotspotTier,
}

/// A configured city left out of the outputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exclusion {
    pub city: String,
    pub missing: Vec<&'static str>,
}

/// What a pipeline run produced, logged as JSON at the end.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub year: i32,
    pub matched: usize,
    pub excluded: Vec<Exclusion>,
    pub mean_score: f64,
    pub score_stddev: f64,
    pub csv_path: String,
    pub geojson_path: String,
    pub map_path: String,
}
