//! Output formatting and persistence for city records.
//!
//! Supports pretty-printing, JSON run summaries, CSV and GeoJSON files.

use anyhow::{Context, Result, anyhow};
use csv::WriterBuilder;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::analyzers::types::CityRecord;

pub const CSV_FILE: &str = "metrics_by_city.csv";
pub const GEOJSON_FILE: &str = "metrics_by_city.geojson";
pub const MAP_FILE: &str = "air_quality_map.html";

/// Logs records using Rust's debug pretty-print format.
pub fn print_pretty(records: &[CityRecord]) {
    debug!("{:#?}", records);
}

/// Logs any serializable value (the run summary) as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes one CSV row per record, replacing any existing file.
///
/// The header is written even when there are no records.
#[tracing::instrument(skip_all, fields(path = %path.display(), rows = records.len()))]
pub fn write_csv(path: &Path, records: &[CityRecord]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

static CSV_HEADER: &[&str] = &[
    "city",
    "latitude",
    "longitude",
    "pm25",
    "pm25_source",
    "co2",
    "tri_facilities",
    "footprint",
    "facility_density",
    "hotspot_score",
    "tier",
];

pub fn read_csv(path: &Path) -> Result<Vec<CityRecord>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(file);

    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: CityRecord = result?;
        records.push(record);
    }
    Ok(records)
}

/// Converts records into `Point` features; every record field becomes a property.
pub fn to_feature_collection(records: &[CityRecord]) -> Result<FeatureCollection> {
    let features = records
        .iter()
        .map(|record| -> Result<Feature> {
            let properties = match serde_json::to_value(record)? {
                serde_json::Value::Object(map) => map,
                other => return Err(anyhow!("record serialized to {other}, expected an object")),
            };
            Ok(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![
                    record.longitude,
                    record.latitude,
                ]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

#[tracing::instrument(skip_all, fields(path = %path.display(), features = records.len()))]
pub fn write_geojson(path: &Path, records: &[CityRecord]) -> Result<()> {
    let collection = to_feature_collection(records)?;
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &collection)?;
    writer.flush()?;
    Ok(())
}

pub fn read_geojson(path: &Path) -> Result<Vec<CityRecord>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let GeoJson::FeatureCollection(fc) = text.parse::<GeoJson>()? else {
        return Err(anyhow!("{}: expected a FeatureCollection", path.display()));
    };

    fc.features
        .into_iter()
        .map(|feature| -> Result<CityRecord> {
            let properties = feature
                .properties
                .ok_or_else(|| anyhow!("{}: feature without properties", path.display()))?;
            Ok(serde_json::from_value(serde_json::Value::Object(properties))?)
        })
        .collect()
}
