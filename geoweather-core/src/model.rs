use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ForecastError;

/// Per-day arrays of an Open-Meteo daily forecast. Index `i` in every array
/// refers to `time[i]`. Values are `None` where the model has no data for a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    pub time: Vec<String>,
    pub temperature_2m_min: Vec<Option<f64>>,
    pub temperature_2m_max: Vec<Option<f64>>,
    pub apparent_temperature_min: Vec<Option<f64>>,
    pub apparent_temperature_max: Vec<Option<f64>>,
    pub weathercode: Vec<Option<i32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyUnits {
    pub temperature_2m_min: String,
    pub temperature_2m_max: String,
    pub apparent_temperature_min: String,
    pub apparent_temperature_max: String,
}

/// A multi-day forecast as returned by the forecast endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub latitude: f64,
    pub longitude: f64,
    pub daily: DailySeries,
    pub daily_units: DailyUnits,
}

/// One aligned row of a [`DailyForecast`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastDay<'a> {
    pub time: &'a str,
    pub temperature_min: Option<f64>,
    pub temperature_max: Option<f64>,
    pub apparent_min: Option<f64>,
    pub apparent_max: Option<f64>,
    pub weathercode: Option<i32>,
}

impl ForecastDay<'_> {
    /// Calendar date of the row, if `time` is an ISO-8601 date.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.time, "%Y-%m-%d").ok()
    }
}

impl DailyForecast {
    /// Parse a JSON response body and check the per-day arrays line up.
    pub fn from_json(body: &str) -> Result<Self, ForecastError> {
        let parsed: DailyForecast =
            serde_json::from_str(body).map_err(|e| ForecastError::Parse(e.to_string()))?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<(), ForecastError> {
        let d = &self.daily;
        let expected = d.time.len();
        let lengths = [
            ("temperature_2m_min", d.temperature_2m_min.len()),
            ("temperature_2m_max", d.temperature_2m_max.len()),
            ("apparent_temperature_min", d.apparent_temperature_min.len()),
            ("apparent_temperature_max", d.apparent_temperature_max.len()),
            ("weathercode", d.weathercode.len()),
        ];

        for (field, len) in lengths {
            if len != expected {
                return Err(ForecastError::Misaligned(format!(
                    "`{field}` has {len} entries but `time` has {expected}"
                )));
            }
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.daily.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.daily.time.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = ForecastDay<'_>> + '_ {
        let d = &self.daily;
        (0..self.len()).map(move |i| ForecastDay {
            time: d.time[i].as_str(),
            temperature_min: d.temperature_2m_min[i],
            temperature_max: d.temperature_2m_max[i],
            apparent_min: d.apparent_temperature_min[i],
            apparent_max: d.apparent_temperature_max[i],
            weathercode: d.weathercode[i],
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A five-day forecast body shaped like an Open-Meteo response.
    pub(crate) fn five_day_json() -> serde_json::Value {
        serde_json::json!({
            "latitude": 3.125,
            "longitude": 101.625,
            "timezone": "Asia/Kuala_Lumpur",
            "daily_units": {
                "time": "iso8601",
                "weathercode": "wmo code",
                "temperature_2m_max": "°C",
                "temperature_2m_min": "°C",
                "apparent_temperature_max": "°C",
                "apparent_temperature_min": "°C"
            },
            "daily": {
                "time": ["2024-03-01", "2024-03-02", "2024-03-03", "2024-03-04", "2024-03-05"],
                "weathercode": [3, 61, 95, 80, 2],
                "temperature_2m_max": [33.1, 32.4, 31.0, 32.8, 33.5],
                "temperature_2m_min": [24.0, 24.3, 23.9, 24.1, 24.6],
                "apparent_temperature_max": [38.2, 37.5, 36.1, 37.9, 39.0],
                "apparent_temperature_min": [27.1, 27.5, 26.8, 27.0, 27.7]
            }
        })
    }

    pub(crate) fn five_day() -> DailyForecast {
        DailyForecast::from_json(&five_day_json().to_string()).expect("valid forecast")
    }

    #[test]
    fn parses_open_meteo_shape() {
        let forecast = five_day();
        assert_eq!(forecast.len(), 5);
        assert_eq!(forecast.daily_units.temperature_2m_min, "°C");
        assert_eq!(
            forecast.daily.weathercode,
            vec![Some(3), Some(61), Some(95), Some(80), Some(2)]
        );
    }

    #[test]
    fn rows_are_index_aligned() {
        let forecast = five_day();
        let rows: Vec<_> = forecast.rows().collect();
        assert_eq!(rows.len(), 5);

        let third = rows[2];
        assert_eq!(third.time, "2024-03-03");
        assert_eq!(third.temperature_min, Some(23.9));
        assert_eq!(third.temperature_max, Some(31.0));
        assert_eq!(third.apparent_min, Some(26.8));
        assert_eq!(third.apparent_max, Some(36.1));
        assert_eq!(third.weathercode, Some(95));
        assert_eq!(third.date(), NaiveDate::from_ymd_opt(2024, 3, 3));
    }

    #[test]
    fn null_day_values_keep_every_row() {
        let mut json = five_day_json();
        json["daily"]["apparent_temperature_min"][4] = serde_json::Value::Null;
        json["daily"]["weathercode"][4] = serde_json::Value::Null;

        let forecast = DailyForecast::from_json(&json.to_string()).expect("nulls are accepted");
        let rows: Vec<_> = forecast.rows().collect();
        assert_eq!(rows.len(), 5);

        let last = rows[4];
        assert_eq!(last.time, "2024-03-05");
        assert_eq!(last.apparent_min, None);
        assert_eq!(last.weathercode, None);
        assert_eq!(last.apparent_max, Some(39.0));
        assert_eq!(rows[3].apparent_min, Some(27.0));
    }

    #[test]
    fn misaligned_arrays_are_rejected() {
        let mut json = five_day_json();
        json["daily"]["weathercode"] = serde_json::json!([3, 61]);

        let err = DailyForecast::from_json(&json.to_string()).unwrap_err();
        assert!(matches!(err, ForecastError::Misaligned(_)));
        assert!(err.to_string().contains("weathercode"));
    }

    #[test]
    fn missing_daily_block_is_a_parse_error() {
        let err = DailyForecast::from_json(r#"{"latitude": 1.0, "longitude": 2.0}"#).unwrap_err();
        assert!(matches!(err, ForecastError::Parse(_)));
    }
}
