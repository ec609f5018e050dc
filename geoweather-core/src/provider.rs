use crate::{Config, Coordinate, DailyForecast, ForecastError};
use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};

pub mod open_meteo;

pub use open_meteo::OpenMeteoProvider;

/// Source of multi-day forecasts for a coordinate.
///
/// One call issues one request; failures are returned, never retried.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch_daily(&self, coordinate: &Coordinate) -> Result<DailyForecast, ForecastError>;
}

/// Construct the forecast provider described by config.
pub fn forecast_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn ForecastProvider>> {
    let provider = OpenMeteoProvider::new(
        config.forecast_url(),
        Duration::from_secs(config.request_timeout_secs()),
    )
    .map_err(|e| anyhow::anyhow!("Failed to create forecast client: {e}"))?;

    Ok(Box::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_default_config() {
        let cfg = Config::default();
        assert!(forecast_provider_from_config(&cfg).is_ok());
    }
}
