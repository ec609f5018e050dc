use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::DatasetError;

/// Mean Earth radius used by the haversine formula, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

const DEFAULT_LOCATIONS: &str = include_str!("../data/malaysia.json");

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Sentinel for "no position acquired yet".
    pub const UNKNOWN: Coordinate = Coordinate { latitude: -1.0, longitude: -1.0 };

    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::UNKNOWN
    }

    /// Check that both components are finite and within their degree ranges.
    pub fn validate(&self) -> Result<(), String> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!("latitude {} is outside [-90, 90]", self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(format!("longitude {} is outside [-180, 180]", self.longitude));
        }
        Ok(())
    }
}

impl Default for Coordinate {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

/// Great-circle distance between two coordinates in kilometers (haversine).
///
/// Out-of-range degrees are not rejected here; callers validate their input.
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat_diff = (b.latitude - a.latitude).to_radians();
    let lon_diff = (b.longitude - a.longitude).to_radians();

    let h = (lat_diff / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (lon_diff / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// A labelled place from the static location dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedLocation {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl NamedLocation {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self { name: name.into(), lat, lng }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }

    /// Display label, e.g. `Kuala Lumpur (3.139 , 101.6869)`.
    pub fn label(&self) -> String {
        format!("{} ({} , {})", self.name, self.lat, self.lng)
    }
}

/// Return the location closest to `target`, or `None` for an empty slice.
///
/// Ties keep the earliest entry: only a strictly smaller distance replaces
/// the current best.
pub fn nearest<'a>(locations: &'a [NamedLocation], target: &Coordinate) -> Option<&'a NamedLocation> {
    nearest_with_distance(locations, target).map(|(loc, _)| loc)
}

/// Like [`nearest`], also returning the distance in kilometers.
pub fn nearest_with_distance<'a>(
    locations: &'a [NamedLocation],
    target: &Coordinate,
) -> Option<(&'a NamedLocation, f64)> {
    let mut closest: Option<(&NamedLocation, f64)> = None;

    for location in locations {
        let distance = distance_km(&location.coordinate(), target);
        if closest.is_none_or(|(_, best)| distance < best) {
            closest = Some((location, distance));
        }
    }

    closest
}

/// Immutable, ordered set of known places.
#[derive(Debug, Clone, Default)]
pub struct LocationSet {
    locations: Vec<NamedLocation>,
}

impl LocationSet {
    pub fn new(locations: Vec<NamedLocation>) -> Self {
        Self { locations }
    }

    /// The dataset bundled with the crate.
    pub fn embedded() -> Result<Self, DatasetError> {
        Self::from_json(DEFAULT_LOCATIONS)
    }

    pub fn from_json(json: &str) -> Result<Self, DatasetError> {
        let locations: Vec<NamedLocation> =
            serde_json::from_str(json).map_err(|e| DatasetError::Parse {
                dataset: "locations",
                message: e.to_string(),
            })?;
        Ok(Self { locations })
    }

    pub fn from_file(path: &Path) -> Result<Self, DatasetError> {
        let contents = fs::read_to_string(path).map_err(|e| DatasetError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json(&contents)
    }

    pub fn nearest(&self, target: &Coordinate) -> Option<&NamedLocation> {
        nearest(&self.locations, target)
    }

    pub fn nearest_with_distance(&self, target: &Coordinate) -> Option<(&NamedLocation, f64)> {
        nearest_with_distance(&self.locations, target)
    }

    pub fn as_slice(&self) -> &[NamedLocation] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
