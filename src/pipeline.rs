//! The end-to-end run: load the data directory, look up PM2.5, join by city,
//! score, and export the map, CSV and GeoJSON.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use std::path::Path;
use tracing::{info, warn};

use crate::analyzers::footprint::{FootprintSource, footprint_for};
use crate::analyzers::join::join;
use crate::analyzers::types::{CityObservation, Pm25Source, RunSummary};
use crate::analyzers::utility::{mean, stddev};
use crate::config::{City, StudyConfig};
use crate::map::write_map;
use crate::output::{CSV_FILE, GEOJSON_FILE, MAP_FILE, print_pretty, write_csv, write_geojson};
use crate::services::air_quality::AirQualityApi;
use crate::sources::boundaries::Boundaries;
use crate::sources::carbon_monitor::CarbonMonitor;
use crate::sources::pm25_fallback::Pm25Fallback;
use crate::sources::tri::{self, Facility};
use crate::sources::{BOUNDARIES_FILE, CARBON_MONITOR_FILE, PM25_FALLBACK_FILE, TRI_FILE};

/// Everything read from the data directory.
pub struct Inputs {
    pub carbon: CarbonMonitor,
    pub facilities: Vec<Facility>,
    pub pm25_fallback: Option<Pm25Fallback>,
    pub boundaries: Option<Boundaries>,
}

impl Inputs {
    /// Carbon Monitor and TRI files are required; the PM2.5 fallback and the
    /// boundaries file are used when present.
    #[tracing::instrument(skip_all, fields(data_dir = %data_dir.display()))]
    pub fn load(data_dir: &Path) -> Result<Self> {
        let carbon = CarbonMonitor::load(&data_dir.join(CARBON_MONITOR_FILE))?;
        let facilities = tri::load(&data_dir.join(TRI_FILE))?;

        let fallback_path = data_dir.join(PM25_FALLBACK_FILE);
        let pm25_fallback = if fallback_path.exists() {
            Some(Pm25Fallback::load(&fallback_path)?)
        } else {
            info!(file = PM25_FALLBACK_FILE, "No PM2.5 fallback file");
            None
        };

        let boundaries_path = data_dir.join(BOUNDARIES_FILE);
        let boundaries = if boundaries_path.exists() {
            let boundaries = Boundaries::load(&boundaries_path)?;
            if boundaries.is_empty() {
                warn!(
                    file = BOUNDARIES_FILE,
                    "Boundaries file has no usable polygons, no city will get a footprint"
                );
            }
            Some(boundaries)
        } else {
            info!(
                file = BOUNDARIES_FILE,
                "No boundaries file, counting facilities within the configured radius"
            );
            None
        };

        info!(facilities = facilities.len(), "Inputs loaded");
        Ok(Self {
            carbon,
            facilities,
            pm25_fallback,
            boundaries,
        })
    }
}

/// Gathers each configured city's PM2.5, CO₂ and facility footprint.
///
/// Cities are looked up one after another. A failed PM2.5 lookup is logged
/// and treated like a missing reading.
pub async fn observe<A: AirQualityApi>(
    api: &A,
    config: &StudyConfig,
    inputs: &Inputs,
) -> Vec<CityObservation> {
    let footprint_source = match &inputs.boundaries {
        Some(boundaries) => FootprintSource::Boundaries(boundaries),
        None => FootprintSource::Radius(config.radius_km),
    };

    let mut observations = Vec::with_capacity(config.cities.len());
    for city in &config.cities {
        let pm25 = lookup_pm25(api, city, inputs.pm25_fallback.as_ref()).await;
        let co2 = inputs.carbon.mean_daily(&city.name, config.year);
        let footprint = footprint_for(city, &inputs.facilities, &footprint_source);

        info!(
            city = %city.name,
            pm25 = ?pm25.map(|(v, _)| v),
            co2 = ?co2,
            facilities = ?footprint.map(|f| f.facilities),
            "City observed"
        );

        observations.push(CityObservation {
            city: city.clone(),
            pm25,
            co2,
            footprint,
        });
    }
    observations
}

async fn lookup_pm25<A: AirQualityApi>(
    api: &A,
    city: &City,
    fallback: Option<&Pm25Fallback>,
) -> Option<(f64, Pm25Source)> {
    let live = match api.latest_pm25(city).await {
        Ok(value) => value,
        Err(e) => {
            warn!(city = %city.name, error = %format!("{e:#}"), "PM2.5 lookup failed");
            None
        }
    };

    live.map(|v| (v, Pm25Source::OpenAq)).or_else(|| {
        fallback?
            .get(&city.name)
            .map(|v| (v, Pm25Source::Fallback))
    })
}

/// Runs the whole pipeline and writes the three outputs into `output_dir`.
///
/// Fails when no configured city has data from all three sources.
#[tracing::instrument(skip_all, fields(data_dir = %data_dir.display(), output_dir = %output_dir.display()))]
pub async fn run<A: AirQualityApi>(
    api: &A,
    config: &StudyConfig,
    data_dir: &Path,
    output_dir: &Path,
) -> Result<RunSummary> {
    let inputs = Inputs::load(data_dir)?;
    let observations = observe(api, config, &inputs).await;
    let outcome = join(observations, config);

    if outcome.records.is_empty() {
        let excluded: Vec<_> = outcome.excluded.iter().map(|e| e.city.as_str()).collect();
        bail!(
            "no city has PM2.5, CO₂ and TRI data for {}; excluded: {}",
            config.year,
            excluded.join(", ")
        );
    }

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let csv_path = output_dir.join(CSV_FILE);
    let geojson_path = output_dir.join(GEOJSON_FILE);
    let map_path = output_dir.join(MAP_FILE);

    print_pretty(&outcome.records);
    write_csv(&csv_path, &outcome.records)?;
    write_geojson(&geojson_path, &outcome.records)?;
    write_map(&map_path, &outcome.records, config.references.pm25)?;

    let scores: Vec<f64> = outcome.records.iter().map(|r| r.hotspot_score).collect();
    let mean_score = mean(&scores);

    Ok(RunSummary {
        generated_at: Utc::now(),
        year: config.year,
        matched: outcome.records.len(),
        excluded: outcome.excluded,
        mean_score,
        score_stddev: stddev(&scores, mean_score),
        csv_path: csv_path.display().to_string(),
        geojson_path: geojson_path.display().to_string(),
        map_path: map_path.display().to_string(),
    })
}
