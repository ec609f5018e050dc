use std::{borrow::Cow, fmt::Write};

use crate::{DailyForecast, Session, WeatherCodeTable};

pub const ATTRIBUTION: &str = "Uses weather data from Open-Meteo (https://open-meteo.com/)";

/// Render the full session view as plain text.
pub fn render_session(session: &Session<'_>) -> String {
    let coordinate = session.coordinate();
    let mut out = String::new();

    let _ = writeln!(out, "{ATTRIBUTION}");
    let _ = writeln!(out, "Latitude : {}", coordinate.latitude);
    let _ = writeln!(out, "Longitude : {}", coordinate.longitude);
    let _ = writeln!(out, "Approximate location : {}", session.location_label());
    let _ = writeln!(
        out,
        "[Use GPS: {}]",
        if session.control_enabled() { "enabled" } else { "disabled" }
    );
    out.push('\n');

    if let Some(message) = session.forecast_state().error() {
        let _ = writeln!(out, "Forecast update failed: {message}");
        out.push('\n');
    }

    match session.forecast() {
        Some(forecast) => out.push_str(&render_forecast(forecast, session.data().codes())),
        None => out.push_str("Use GPS first\n"),
    }

    out
}

/// Shown in place of a value the forecast has no data for.
pub const MISSING_VALUE: &str = "-";

/// Render one block per forecast day, separated by blank lines.
pub fn render_forecast(forecast: &DailyForecast, codes: &WeatherCodeTable) -> String {
    let units = &forecast.daily_units;

    forecast
        .rows()
        .map(|day| {
            let date = match day.date() {
                Some(date) => date.format("%Y-%m-%d (%a)").to_string(),
                None => day.time.to_string(),
            };
            let status = match day.weathercode {
                Some(code) => codes.translate(code),
                None => Cow::Borrowed(MISSING_VALUE),
            };

            format!(
                "{date}\n{} ~ {}\nfeels like {} ~ {}\nWeather : {status}\n",
                with_unit(day.temperature_min, &units.temperature_2m_min),
                with_unit(day.temperature_max, &units.temperature_2m_max),
                with_unit(day.apparent_min, &units.apparent_temperature_min),
                with_unit(day.apparent_max, &units.apparent_temperature_max),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn with_unit(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v}{unit}"),
        None => MISSING_VALUE.to_string(),
    }
}
