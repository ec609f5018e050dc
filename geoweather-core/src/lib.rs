//! Core library for the `geoweather` CLI.
//!
//! This crate defines:
//! - Great-circle distance and nearest known place lookup
//! - Weather code translation
//! - Daily forecast fetching (Open-Meteo)
//! - Position sources and the acquisition session state
//! - Configuration and plain-text rendering
//!
//! It is used by `geoweather-cli`, but can also be reused by other binaries or services.

pub mod codes;
pub mod config;
pub mod error;
pub mod geo;
pub mod model;
pub mod position;
pub mod provider;
pub mod render;
pub mod runner;
pub mod session;

pub use codes::WeatherCodeTable;
pub use config::Config;
pub use error::{DatasetError, ForecastError, PositionError, SessionError};
pub use geo::{Coordinate, LocationSet, NamedLocation, distance_km, nearest};
pub use model::{DailyForecast, ForecastDay};
pub use position::{PositionSource, PositionSourceId};
pub use provider::ForecastProvider;
pub use runner::Runner;
pub use session::{AppData, Applied, ForecastState, ForecastTicket, GpsState, Session};
