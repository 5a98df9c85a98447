//! Carbon Monitor city-level daily CO₂ emissions.

use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use super::{find_column, line_of, parse_number};
use crate::analyzers::utility::mean;
use crate::config::city_key;

static DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

/// Daily emissions keyed by city key.
#[derive(Debug, Default)]
pub struct CarbonMonitor {
    daily: HashMap<String, Vec<(NaiveDate, f64)>>,
}

impl CarbonMonitor {
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("opening Carbon Monitor data {}", path.display()))?;
        Self::from_reader(file, &path.display().to_string())
    }

    pub fn from_reader<R: Read>(reader: R, origin: &str) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
        let headers = rdr
            .headers()
            .with_context(|| format!("{origin}: reading header"))?
            .clone();

        let city_idx = find_column(&headers, |h| h.eq_ignore_ascii_case("city"))
            .ok_or_else(|| anyhow!("{origin}: no `city` column"))?;
        let date_idx = find_column(&headers, |h| h.eq_ignore_ascii_case("date"))
            .ok_or_else(|| anyhow!("{origin}: no `date` column"))?;
        let emission_idx = find_column(&headers, is_emission_header)
            .ok_or_else(|| anyhow!("{origin}: no emission column (`emission*`, `value` or `co2`)"))?;
        let emission_name = headers[emission_idx].trim().to_string();

        let mut daily: HashMap<String, Vec<(NaiveDate, f64)>> = HashMap::new();
        let mut undated = 0usize;

        for (i, result) in rdr.records().enumerate() {
            let record = result.with_context(|| format!("{origin}: malformed row {}", i + 2))?;
            let line = line_of(&record, i);

            let Some(date) = parse_date(record.get(date_idx).unwrap_or("")) else {
                undated += 1;
                continue;
            };
            let Some(value) = parse_number(
                record.get(emission_idx).unwrap_or(""),
                &emission_name,
                origin,
                line,
            )?
            else {
                continue;
            };

            let city = record.get(city_idx).unwrap_or("");
            daily.entry(city_key(city)).or_default().push((date, value));
        }

        debug!(
            cities = daily.len(),
            rows = daily.values().map(Vec::len).sum::<usize>(),
            undated,
            "Carbon Monitor data loaded"
        );

        Ok(Self { daily })
    }

    /// Mean daily emission for `city` over `year`, `None` without data.
    pub fn mean_daily(&self, city: &str, year: i32) -> Option<f64> {
        let values: Vec<f64> = self
            .daily
            .get(&city_key(city))?
            .iter()
            .filter(|(date, _)| date.year() == year)
            .map(|(_, value)| *value)
            .collect();

        if values.is_empty() {
            None
        } else {
            Some(mean(&values))
        }
    }
}

fn is_emission_header(header: &str) -> bool {
    let lower = header.to_lowercase();
    lower.starts_with("emission") || lower == "value" || lower == "co2"
}

fn parse_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cell, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(csv: &str) -> Result<CarbonMonitor> {
        CarbonMonitor::from_reader(csv.as_bytes(), "test.csv")
    }

    #[test]
    fn test_mean_daily_filters_by_year() {
        let cm = load(
            "city,date,value\n\
             Chicago,2024-01-01,10\n\
             Chicago,2024-01-02,20\n\
             Chicago,2023-12-31,1000\n",
        )
        .unwrap();

        assert_eq!(cm.mean_daily("Chicago", 2024), Some(15.0));
        assert_eq!(cm.mean_daily("Chicago", 2023), Some(1000.0));
        assert_eq!(cm.mean_daily("Chicago", 2022), None);
    }

    #[test]
    fn test_city_lookup_uses_key() {
        let cm = load("City,Date,Emissions (kt)\nNEW YORK,2024-03-01,120.5\n").unwrap();
        assert_eq!(cm.mean_daily("New York", 2024), Some(120.5));
    }

    #[test]
    fn test_day_first_dates_are_parsed() {
        let cm = load("city,date,co2\nTampa,31/01/2024,4\nTampa,01/02/2024,6\n").unwrap();
        assert_eq!(cm.mean_daily("Tampa", 2024), Some(5.0));
    }

    #[test]
    fn test_undated_rows_are_dropped() {
        let cm = load("city,date,value\nTampa,,4\nTampa,not a date,9\nTampa,2024-05-05,2\n").unwrap();
        assert_eq!(cm.mean_daily("Tampa", 2024), Some(2.0));
    }

    #[test]
    fn test_non_numeric_emission_is_an_error() {
        let err = load("city,date,value\nTampa,2024-05-05,lots\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_nan_emission_is_an_error() {
        let err = load("city,date,value\nChicago,2024-01-01,10\nChicago,2024-01-02,NaN\n").unwrap_err();
        assert!(err.to_string().contains("line 3"));
        assert!(err.to_string().contains("is not a number"));
    }

    #[test]
    fn test_missing_emission_column_is_an_error() {
        assert!(load("city,date,pm25\nTampa,2024-05-05,3\n").is_err());
    }
}
