use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::analyzers::utility::mean;
use crate::config::City;
use crate::fetch::{HttpClient, fetch_bytes};
use crate::services::air_quality::AirQualityApi;

#[derive(Deserialize)]
struct LatestResponse {
    #[serde(default)]
    results: Vec<LatestLocation>,
}

#[derive(Deserialize)]
struct LatestLocation {
    #[serde(default)]
    measurements: Vec<LatestMeasurement>,
}

#[derive(Deserialize)]
struct LatestMeasurement {
    parameter: Option<String>,
    value: Option<f64>,
}

/// Client for the OpenAQ `latest` endpoint.
///
/// Readings are requested within `radius_km` of the city centroid. An API key,
/// when configured, is added by wrapping `http` in
/// [`crate::fetch::auth::UrlParam`].
pub struct OpenAqClient<C> {
    http: C,
    base_url: String,
    radius_km: f64,
}

impl<C: HttpClient> OpenAqClient<C> {
    pub fn new(http: C, base_url: &str, radius_km: f64) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            radius_km,
        }
    }

    fn latest_url(&self, city: &City) -> Result<reqwest::Url> {
        let radius_m = (self.radius_km * 1000.0).round() as u64;
        let params = [
            ("coordinates", format!("{},{}", city.latitude, city.longitude)),
            ("radius", radius_m.to_string()),
            ("parameter", "pm25".to_string()),
            ("limit", "100".to_string()),
        ];
        let url = reqwest::Url::parse_with_params(&format!("{}/v2/latest", self.base_url), &params)?;
        Ok(url)
    }
}

/// Averages every non-negative PM2.5 measurement in a `latest` response body.
///
/// Negative values are provider sentinels for missing data. Returns `None`
/// when nothing usable is left.
pub fn parse_latest(body: &[u8]) -> Result<Option<f64>> {
    let response: LatestResponse =
        serde_json::from_slice(body).context("Failed to parse OpenAQ response")?;

    let values: Vec<f64> = response
        .results
        .iter()
        .flat_map(|loc| &loc.measurements)
        .filter(|m| m.parameter.as_deref().is_none_or(|p| p == "pm25"))
        .filter_map(|m| m.value)
        .filter(|v| *v >= 0.0)
        .collect();

    if values.is_empty() {
        Ok(None)
    } else {
        Ok(Some(mean(&values)))
    }
}

#[async_trait]
impl<C: HttpClient> AirQualityApi for OpenAqClient<C> {
    #[tracing::instrument(skip_all, fields(city = %city.name))]
    async fn latest_pm25(&self, city: &City) -> Result<Option<f64>> {
        let url = self.latest_url(city)?;
        let bytes = fetch_bytes(&self.http, url.as_str())
            .await
            .with_context(|| format!("OpenAQ request failed for {}", city.name))?;
        debug!(bytes = bytes.len(), "OpenAQ response received");

        parse_latest(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Answers every request with a fixed status and body, remembering the URL.
    struct Canned {
        status: u16,
        body: &'static str,
        last_url: Mutex<Option<String>>,
    }

    impl Canned {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                last_url: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl HttpClient for Canned {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            *self.last_url.lock().unwrap() = Some(req.url().to_string());
            let resp = http::Response::builder()
                .status(self.status)
                .body(self.body)
                .unwrap();
            Ok(resp.into())
        }
    }

    const LATEST: &str = r#"{
        "meta": { "found": 2 },
        "results": [
            { "location": "A", "measurements": [
                { "parameter": "pm25", "value": 10.0, "unit": "µg/m³" },
                { "parameter": "pm25", "value": -999.0, "unit": "µg/m³" }
            ] },
            { "location": "B", "measurements": [
                { "parameter": "pm25", "value": 14.0, "unit": "µg/m³" },
                { "parameter": "pm10", "value": 80.0, "unit": "µg/m³" }
            ] }
        ]
    }"#;

    #[test]
    fn test_parse_latest_averages_valid_pm25() {
        assert_eq!(parse_latest(LATEST.as_bytes()).unwrap(), Some(12.0));
    }

    #[test]
    fn test_parse_latest_without_results() {
        assert_eq!(parse_latest(br#"{ "results": [] }"#).unwrap(), None);
        assert_eq!(parse_latest(b"{}").unwrap(), None);
    }

    #[test]
    fn test_parse_latest_invalid_json() {
        assert!(parse_latest(b"<html>gone</html>").is_err());
    }

    #[tokio::test]
    async fn test_latest_pm25_builds_query() {
        let client = OpenAqClient::new(Canned::new(200, LATEST), "https://api.example.org/", 25.0);
        let city = City::new("Chicago", 41.8781, -87.6298);

        let value = client.latest_pm25(&city).await.unwrap();
        assert_eq!(value, Some(12.0));

        let url = client.http.last_url.lock().unwrap().clone().unwrap();
        assert_eq!(
            url,
            "https://api.example.org/v2/latest?coordinates=41.8781%2C-87.6298&radius=25000&parameter=pm25&limit=100"
        );
    }

    #[tokio::test]
    async fn test_gone_endpoint_is_an_error() {
        let client = OpenAqClient::new(Canned::new(410, ""), "https://api.example.org", 25.0);
        let city = City::new("Tampa", 27.9506, -82.4572);

        let err = client.latest_pm25(&city).await.unwrap_err();
        assert!(err.to_string().contains("Tampa"));
    }
}
