use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    Coordinate, LocationSet, WeatherCodeTable,
    position::{DEFAULT_IP_API_URL, PositionSourceId},
    provider::open_meteo,
    session::AppData,
};

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// position_source = "fixed"
/// locations_file = "/home/me/places.json"
///
/// [fixed_position]
/// latitude = 3.139
/// longitude = 101.6869
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Where the current position comes from: "ip" or "fixed".
    pub position_source: PositionSourceId,

    /// Base URL of the forecast API. Defaults to Open-Meteo.
    pub forecast_url: Option<String>,

    /// Base URL of the IP geolocation service.
    pub ip_geolocation_url: Option<String>,

    /// JSON array of `{name, lat, lng}` replacing the bundled place list.
    pub locations_file: Option<PathBuf>,

    /// JSON object of two-digit code -> description replacing the bundled table.
    pub codes_file: Option<PathBuf>,

    pub request_timeout_secs: Option<u64>,

    /// Coordinate reported by the "fixed" source. Kept last so it serializes
    /// as a trailing TOML table.
    pub fixed_position: Option<Coordinate>,
}

impl Config {
    pub fn forecast_url(&self) -> &str {
        self.forecast_url.as_deref().unwrap_or(open_meteo::DEFAULT_BASE_URL)
    }

    pub fn ip_geolocation_url(&self) -> &str {
        self.ip_geolocation_url.as_deref().unwrap_or(DEFAULT_IP_API_URL)
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    /// Select the fixed source and remember its coordinate.
    pub fn set_fixed_position(&mut self, coordinate: Coordinate) -> Result<()> {
        coordinate
            .validate()
            .map_err(|e| anyhow!("Invalid fixed position: {e}"))?;
        self.position_source = PositionSourceId::Fixed;
        self.fixed_position = Some(coordinate);
        Ok(())
    }

    /// Load config from the platform config directory, or defaults on first run.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "geoweather", "geoweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load the place list and code table, from configured files or the bundled defaults.
    pub fn load_app_data(&self) -> Result<AppData> {
        let locations = match &self.locations_file {
            Some(path) => LocationSet::from_file(path)?,
            None => LocationSet::embedded()?,
        };
        let codes = match &self.codes_file {
            Some(path) => WeatherCodeTable::from_file(path)?,
            None => WeatherCodeTable::embedded()?,
        };

        tracing::debug!(
            locations = locations.len(),
            codes = codes.len(),
            "loaded static datasets"
        );

        Ok(AppData::new(locations, codes))
    }
}
