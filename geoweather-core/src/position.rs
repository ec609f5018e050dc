//! Position sources standing in for a device geolocation capability.
//!
//! Every source answers a single "where am I now" request with either a
//! coordinate or a [`PositionError`].

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, time::Duration};

use crate::{Config, Coordinate, PositionError};

pub const DEFAULT_IP_API_URL: &str = "http://ip-api.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSourceId {
    #[default]
    Ip,
    Fixed,
}

impl PositionSourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionSourceId::Ip => "ip",
            PositionSourceId::Fixed => "fixed",
        }
    }

    pub const fn all() -> &'static [PositionSourceId] {
        &[PositionSourceId::Ip, PositionSourceId::Fixed]
    }
}

impl std::fmt::Display for PositionSourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for PositionSourceId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "ip" => Ok(PositionSourceId::Ip),
            "fixed" => Ok(PositionSourceId::Fixed),
            _ => Err(anyhow::anyhow!(
                "Unknown position source '{value}'. Supported sources: ip, fixed."
            )),
        }
    }
}

#[async_trait]
pub trait PositionSource: Send + Sync + Debug {
    async fn current_position(&self) -> Result<Coordinate, PositionError>;
}

/// Always reports the same coordinate.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition {
    coordinate: Coordinate,
}

impl FixedPosition {
    pub fn new(coordinate: Coordinate) -> Self {
        Self { coordinate }
    }
}

#[async_trait]
impl PositionSource for FixedPosition {
    async fn current_position(&self) -> Result<Coordinate, PositionError> {
        self.coordinate.validate().map_err(PositionError::Invalid)?;
        Ok(self.coordinate)
    }
}

/// Approximate position derived from the public IP address.
#[derive(Debug, Clone)]
pub struct IpApiPosition {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

impl IpApiPosition {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, PositionError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PositionError::Unavailable(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait]
impl PositionSource for IpApiPosition {
    async fn current_position(&self) -> Result<Coordinate, PositionError> {
        let url = format!("{}/json", self.base_url);
        tracing::debug!(%url, "requesting IP geolocation");

        let res = self
            .http
            .get(&url)
            .query(&[("fields", "status,message,lat,lon")])
            .send()
            .await
            .map_err(|e| PositionError::Request(e.to_string()))?;

        if !res.status().is_success() {
            return Err(PositionError::Request(format!(
                "geolocation service returned status {}",
                res.status()
            )));
        }

        let body: IpApiResponse = res
            .json()
            .await
            .map_err(|e| PositionError::Request(format!("unreadable response: {e}")))?;

        if body.status != "success" {
            let reason = body.message.unwrap_or_else(|| "unknown reason".to_string());
            return Err(PositionError::Unavailable(reason));
        }

        let (Some(lat), Some(lon)) = (body.lat, body.lon) else {
            return Err(PositionError::Unavailable(
                "response did not include coordinates".to_string(),
            ));
        };

        let coordinate = Coordinate::new(lat, lon);
        coordinate.validate().map_err(PositionError::Invalid)?;
        Ok(coordinate)
    }
}

/// Build the configured position source.
///
/// An explicit `override_position` (e.g. from command-line flags) wins over config.
pub fn position_source_from_config(
    config: &Config,
    override_position: Option<Coordinate>,
) -> anyhow::Result<Box<dyn PositionSource>> {
    if let Some(coordinate) = override_position {
        return Ok(Box::new(FixedPosition::new(coordinate)));
    }

    let boxed: Box<dyn PositionSource> = match config.position_source {
        PositionSourceId::Fixed => {
            let coordinate = config.fixed_position.ok_or_else(|| {
                anyhow::anyhow!(
                    "Position source is 'fixed' but no fixed position is configured.\n\
                     Hint: run `geoweather configure` or pass --lat/--lng."
                )
            })?;
            Box::new(FixedPosition::new(coordinate))
        }
        PositionSourceId::Ip => Box::new(
            IpApiPosition::new(
                config.ip_geolocation_url(),
                Duration::from_secs(config.request_timeout_secs()),
            )
            .map_err(|e| anyhow::anyhow!("Failed to create geolocation client: {e}"))?,
        ),
    };

    Ok(boxed)
}
