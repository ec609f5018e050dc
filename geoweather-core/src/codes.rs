use std::{borrow::Cow, collections::HashMap, fs, path::Path};

use crate::DatasetError;

const DEFAULT_CODES: &str = include_str!("../data/weather_code_status.json");

/// Weather code descriptions keyed by two-digit, zero-padded code strings.
#[derive(Debug, Clone, Default)]
pub struct WeatherCodeTable {
    entries: HashMap<String, String>,
}

impl WeatherCodeTable {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    /// WMO interpretation codes as reported by Open-Meteo.
    pub fn embedded() -> Result<Self, DatasetError> {
        Self::from_json(DEFAULT_CODES)
    }

    pub fn from_json(json: &str) -> Result<Self, DatasetError> {
        let entries: HashMap<String, String> =
            serde_json::from_str(json).map_err(|e| DatasetError::Parse {
                dataset: "weather codes",
                message: e.to_string(),
            })?;
        Ok(Self { entries })
    }

    pub fn from_file(path: &Path) -> Result<Self, DatasetError> {
        let contents = fs::read_to_string(path).map_err(|e| DatasetError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json(&contents)
    }

    /// Lookup key for a numeric code: `3` -> `"03"`, `61` -> `"61"`.
    pub fn key(code: i32) -> String {
        format!("{code:02}")
    }

    pub fn describe(&self, code: i32) -> Option<&str> {
        self.entries
            .get(&Self::key(code))
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Human-readable status, falling back to the raw code when the table has no entry.
    pub fn translate(&self, code: i32) -> Cow<'_, str> {
        match self.describe(code) {
            Some(s) => Cow::Borrowed(s),
            None => Cow::Owned(code.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
