use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use geoweather_core::{
    AppData, Applied, Config, Coordinate, ForecastProvider, GpsState, PositionSourceId, Runner,
    position::position_source_from_config, provider::forecast_provider_from_config,
    render::render_session,
};
use inquire::{CustomType, Select, Text};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "geoweather", version, about = "Nearest known place and daily forecast for your position")]
pub struct Cli {
    /// Log progress to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Explicit coordinate overriding the configured position source.
#[derive(Debug, Args)]
pub struct PositionArgs {
    /// Latitude in degrees.
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude in degrees.
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lng: Option<f64>,
}

impl PositionArgs {
    fn coordinate(&self) -> anyhow::Result<Option<Coordinate>> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => {
                let coordinate = Coordinate::new(lat, lng);
                coordinate.validate().map_err(|e| anyhow!("Invalid coordinate: {e}"))?;
                Ok(Some(coordinate))
            }
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively choose the position source, endpoints and datasets.
    Configure,

    /// Acquire the position once and show the nearest place and forecast.
    Show {
        #[command(flatten)]
        position: PositionArgs,
    },

    /// Re-acquire the position periodically and redraw as forecasts arrive.
    Watch {
        #[command(flatten)]
        position: PositionArgs,

        /// Seconds between position requests.
        #[arg(long, default_value_t = 60)]
        interval: u64,

        /// Stop after this many position requests.
        #[arg(long)]
        count: Option<u32>,
    },

    /// Print the known place closest to a coordinate.
    Nearest {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },

    /// Translate a numeric weather code.
    Code { code: i32 },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { position } => {
                let config = Config::load()?;
                let data = config.load_app_data()?;
                show(&config, &data, position.coordinate()?).await
            }
            Command::Watch { position, interval, count } => {
                let config = Config::load()?;
                let data = config.load_app_data()?;
                watch(&config, &data, position.coordinate()?, interval, count).await
            }
            Command::Nearest { lat, lng } => {
                let data = Config::load()?.load_app_data()?;
                nearest(&data, Coordinate::new(lat, lng))
            }
            Command::Code { code } => {
                let data = Config::load()?.load_app_data()?;
                println!("{}", data.codes().translate(code));
                Ok(())
            }
        }
    }
}

fn build_runner<'a>(
    config: &Config,
    data: &'a AppData,
    position: Option<Coordinate>,
) -> anyhow::Result<Runner<'a>> {
    let source = position_source_from_config(config, position)?;
    let provider: Arc<dyn ForecastProvider> = Arc::from(forecast_provider_from_config(config)?);
    Ok(Runner::new(data, source, provider))
}

fn report_gps_failure(runner: &Runner<'_>) {
    if let GpsState::Failed(message) = runner.session().gps_state() {
        eprintln!("Failed : {message}");
    }
}

async fn show(config: &Config, data: &AppData, position: Option<Coordinate>) -> anyhow::Result<()> {
    let mut runner = build_runner(config, data, position)?;

    runner.acquire().await?;
    report_gps_failure(&runner);
    runner.settle().await;

    print!("{}", render_session(runner.session()));
    Ok(())
}

async fn watch(
    config: &Config,
    data: &AppData,
    position: Option<Coordinate>,
    interval: u64,
    count: Option<u32>,
) -> anyhow::Result<()> {
    if interval == 0 {
        return Err(anyhow!("--interval must be at least 1 second"));
    }

    if count == Some(0) {
        return Ok(());
    }

    let mut runner = build_runner(config, data, position)?;
    let mut ticker = tokio::time::interval(Duration::from_secs(interval));
    let mut remaining = count;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                runner.acquire().await?;
                report_gps_failure(&runner);

                if last_acquisition(&mut remaining) {
                    break;
                }
            }
            Some(applied) = runner.next_forecast() => {
                if applied == Applied::Updated {
                    println!("--- {} ---", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
                    print!("{}", render_session(runner.session()));
                }
            }
        }
    }

    let pending = runner.in_flight();
    if pending > 0 {
        tracing::info!(pending, "waiting for outstanding forecasts");
        runner.settle().await;
        print!("{}", render_session(runner.session()));
    }

    Ok(())
}

/// Count down one acquisition; `true` once the requested number has been made.
fn last_acquisition(remaining: &mut Option<u32>) -> bool {
    match remaining {
        Some(n) => {
            *n = n.saturating_sub(1);
            *n == 0
        }
        None => false,
    }
}

fn nearest(data: &AppData, target: Coordinate) -> anyhow::Result<()> {
    target.validate().map_err(|e| anyhow!("Invalid coordinate: {e}"))?;

    match data.locations().nearest_with_distance(&target) {
        Some((location, km)) => println!("{} - {km:.1} km away", location.label()),
        None => println!("No known places loaded"),
    }
    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let source = Select::new("Position source:", PositionSourceId::all().to_vec())
        .with_starting_cursor(if config.position_source == PositionSourceId::Fixed { 1 } else { 0 })
        .prompt()
        .context("Position source selection aborted")?;

    match source {
        PositionSourceId::Fixed => {
            let current = config.fixed_position.unwrap_or(Coordinate::new(3.139, 101.6869));
            let lat = CustomType::<f64>::new("Latitude:")
                .with_default(current.latitude)
                .prompt()
                .context("Latitude input aborted")?;
            let lng = CustomType::<f64>::new("Longitude:")
                .with_default(current.longitude)
                .prompt()
                .context("Longitude input aborted")?;
            config.set_fixed_position(Coordinate::new(lat, lng))?;
        }
        PositionSourceId::Ip => {
            config.position_source = PositionSourceId::Ip;
            config.ip_geolocation_url = optional_text(
                "IP geolocation URL (empty for default):",
                config.ip_geolocation_url.as_deref(),
            )?;
        }
    }

    config.forecast_url = optional_text(
        "Forecast API URL (empty for Open-Meteo):",
        config.forecast_url.as_deref(),
    )?;

    config.locations_file = optional_text(
        "Places JSON file (empty for bundled list):",
        config.locations_file.as_deref().and_then(|p| p.to_str()),
    )?
    .map(PathBuf::from);

    config.codes_file = optional_text(
        "Weather code JSON file (empty for bundled table):",
        config.codes_file.as_deref().and_then(|p| p.to_str()),
    )?
    .map(PathBuf::from);

    // Dataset paths must load before they are saved.
    config.load_app_data()?;

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

fn optional_text(message: &str, current: Option<&str>) -> anyhow::Result<Option<String>> {
    let answer = Text::new(message)
        .with_initial_value(current.unwrap_or_default())
        .prompt()
        .with_context(|| format!("Input aborted: {message}"))?;

    let trimmed = answer.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}
