//! Trait for looking up current PM2.5 levels around a city.

use anyhow::Result;

use crate::config::City;

/// Abstraction over a PM2.5 provider (e.g., OpenAQ).
#[async_trait::async_trait]
pub trait AirQualityApi {
    /// Mean of the latest PM2.5 readings (µg/m³) near `city`, or `None`
    /// when the provider has no readings there.
    async fn latest_pm25(&self, city: &City) -> Result<Option<f64>>;
}

/// Provider used with `--offline`: never has readings, so every city falls
/// back to the PM2.5 fallback file.
pub struct OfflineAirQuality;

#[async_trait::async_trait]
impl AirQualityApi for OfflineAirQuality {
    async fn latest_pm25(&self, _city: &City) -> Result<Option<f64>> {
        Ok(None)
    }
}
