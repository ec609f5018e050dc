use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::{Coordinate, DailyForecast, ForecastError};

use super::ForecastProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";

const DAILY_FIELDS: &str = "weathercode,temperature_2m_max,temperature_2m_min,apparent_temperature_max,apparent_temperature_min";

/// Daily forecast client for the Open-Meteo API (no API key needed).
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    base_url: String,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ForecastError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn forecast_url(&self) -> String {
        format!("{}/v1/forecast", self.base_url)
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteoProvider {
    async fn fetch_daily(&self, coordinate: &Coordinate) -> Result<DailyForecast, ForecastError> {
        let url = self.forecast_url();
        tracing::debug!(%url, lat = coordinate.latitude, lng = coordinate.longitude, "requesting daily forecast");

        let latitude = coordinate.latitude.to_string();
        let longitude = coordinate.longitude.to_string();

        let res = self
            .http
            .get(&url)
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("daily", DAILY_FIELDS),
                ("timezone", "auto"),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(ForecastError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let forecast = DailyForecast::from_json(&body)?;
        tracing::debug!(days = forecast.len(), "received daily forecast");
        Ok(forecast)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider = OpenMeteoProvider::new("http://localhost:8080/", Duration::from_secs(1))
            .expect("client builds");
        assert_eq!(provider.forecast_url(), "http://localhost:8080/v1/forecast");
    }

    #[test]
    fn truncate_body_keeps_short_bodies() {
        assert_eq!(truncate_body("oops"), "oops");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "°".repeat(150);
        let out = truncate_body(&body);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 203);
    }
}
