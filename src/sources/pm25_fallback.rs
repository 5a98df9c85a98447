//! Optional hand-curated PM2.5 values used when OpenAQ has nothing for a city.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use super::line_of;
use crate::config::city_key;

#[derive(Debug, Deserialize)]
struct FallbackRow {
    city: String,
    pm25: Option<f64>,
}

#[derive(Debug, Default)]
pub struct Pm25Fallback {
    values: HashMap<String, f64>,
}

impl Pm25Fallback {
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("opening PM2.5 fallback {}", path.display()))?;
        Self::from_reader(file, &path.display().to_string())
    }

    pub fn from_reader<R: Read>(reader: R, origin: &str) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr
            .headers()
            .with_context(|| format!("{origin}: reading header"))?
            .clone();
        let mut values = HashMap::new();

        for (i, result) in rdr.records().enumerate() {
            let record = result.with_context(|| format!("{origin}: malformed row {}", i + 2))?;
            let line = line_of(&record, i);
            let row: FallbackRow = record
                .deserialize(Some(&headers))
                .with_context(|| format!("{origin}: line {line}: malformed row"))?;
            let Some(pm25) = row.pm25 else {
                continue;
            };
            if !pm25.is_finite() {
                bail!("{origin}: line {line}: `pm25` value {pm25} is not a number");
            }
            // first row per city wins
            values.entry(city_key(&row.city)).or_insert(pm25);
        }

        debug!(cities = values.len(), "PM2.5 fallback loaded");
        Ok(Self { values })
    }

    pub fn get(&self, city: &str) -> Option<f64> {
        self.values.get(&city_key(city)).copied()
    }
}
