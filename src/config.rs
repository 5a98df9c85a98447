//! Study configuration: which cities to analyse and how to score them.
//!
//! Stored as a JSON object on disk; every field is optional:
//! ```json
//! {
//!   "year": 2024,
//!   "radius_km": 25.0,
//!   "cities": [
//!     { "name": "New York", "latitude": 40.7128, "longitude": -74.0060 }
//!   ],
//!   "weights": { "pm25": 0.5, "co2": 0.3, "facility_density": 0.2 }
//! }
//! ```

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Cities analysed when no configuration file supplies its own list.
static DEFAULT_CITIES: &[(&str, f64, f64)] = &[
    ("New York", 40.7128, -74.0060),
    ("Los Angeles", 34.0522, -118.2437),
    ("Chicago", 41.8781, -87.6298),
    ("Houston", 29.7604, -95.3698),
    ("Phoenix", 33.4484, -112.0740),
    ("Philadelphia", 39.9526, -75.1652),
    ("Tampa", 27.9506, -82.4572),
];

/// File name looked up inside the data directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Normalises a city name into the key every source is joined on.
///
/// Trims, collapses internal whitespace and lower-cases, so `"  New   York "`
/// and `"new york"` refer to the same city.
pub fn city_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A study city and its centroid (WGS84 degrees).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl City {
    pub fn new(name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.to_string(),
            latitude,
            longitude,
        }
    }

    pub fn key(&self) -> String {
        city_key(&self.name)
    }
}

/// Relative contribution of each measure to the hotspot score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub pm25: f64,
    pub co2: f64,
    pub facility_density: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            pm25: 0.5,
            co2: 0.3,
            facility_density: 0.2,
        }
    }
}

/// Value at which each measure saturates its share of the score.
///
/// PM2.5 defaults to the EPA 24-hour standard (35 µg/m³), CO₂ to 150 kt/day
/// and facility density to 10 facilities per 100 km².
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreReferences {
    pub pm25: f64,
    pub co2: f64,
    pub facility_density: f64,
}

impl Default for ScoreReferences {
    fn default() -> Self {
        Self {
            pm25: 35.0,
            co2: 150.0,
            facility_density: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    pub cities: Vec<City>,
    /// Carbon Monitor year averaged into the CO₂ figure.
    pub year: i32,
    /// OpenAQ search radius, and facility footprint radius when a city has no boundary.
    pub radius_km: f64,
    pub openaq_base_url: String,
    pub weights: ScoreWeights,
    pub references: ScoreReferences,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            cities: DEFAULT_CITIES
                .iter()
                .map(|(name, lat, lon)| City::new(name, *lat, *lon))
                .collect(),
            year: 2024,
            radius_km: 25.0,
            openaq_base_url: "https://api.openaq.org".to_string(),
            weights: ScoreWeights::default(),
            references: ScoreReferences::default(),
        }
    }
}

impl StudyConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: StudyConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validated()
    }

    /// Picks the explicit config file if given, else `<data_dir>/config.json`
    /// when it exists, else the built-in defaults.
    pub fn resolve(explicit: Option<&Path>, data_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let candidate = data_dir.join(DEFAULT_CONFIG_FILE);
        if candidate.exists() {
            info!(path = %candidate.display(), "Using config from data directory");
            Self::load(&candidate)
        } else {
            info!("No config file found, using built-in city list");
            Ok(Self::default())
        }
    }

    fn validated(mut self) -> Result<Self> {
        let mut seen = HashSet::new();
        self.cities.retain(|city| {
            let fresh = seen.insert(city.key());
            if !fresh {
                warn!(city = %city.name, "Duplicate city in config, keeping first occurrence");
            }
            fresh
        });

        if self.cities.is_empty() {
            bail!("config lists no cities");
        }
        if !(self.radius_km > 0.0) {
            bail!("radius_km must be positive, got {}", self.radius_km);
        }
        let w = self.weights;
        if [w.pm25, w.co2, w.facility_density].iter().any(|v| *v < 0.0) {
            bail!("score weights must not be negative");
        }
        let r = self.references;
        if [r.pm25, r.co2, r.facility_density].iter().any(|v| !(*v > 0.0)) {
            bail!("score references must be positive");
        }

        Ok(self)
    }
}
