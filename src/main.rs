//! fishcast - Monthly fishing forecast for a location
//!
//! Prints one line per day of the requested month, or the full forecast as
//! JSON with `--json`.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fishcast::aggregator::{AggregatorSettings, WeatherAggregator};
use fishcast::cache::{CacheManager, MemoryCache, WeatherCache};
use fishcast::cli::{Cli, RunConfig};
use fishcast::data::{FishingDay, MonthlyForecast, OpenMeteoClient, SimulatedSource, WeatherSource};
use fishcast::forecast::ForecastEngine;

/// Picks the on-disk cache, falling back to memory when no cache dir exists
fn build_cache(config: &RunConfig) -> Arc<dyn WeatherCache> {
    let manager = match &config.cache_dir {
        Some(dir) => Some(CacheManager::with_dir(dir.clone())),
        None => CacheManager::new(),
    };

    match manager {
        Some(manager) => Arc::new(manager),
        None => {
            tracing::warn!("no cache directory available, weather will not persist");
            Arc::new(MemoryCache::new())
        }
    }
}

fn build_source(config: &RunConfig) -> Arc<dyn WeatherSource> {
    if config.offline {
        Arc::new(SimulatedSource::new())
    } else {
        Arc::new(OpenMeteoClient::with_timeout(config.fetch_timeout))
    }
}

/// One summary line for a day, e.g. "2025-02-12  Full Moon  87  ..."
fn format_day(forecast: &MonthlyForecast, day: &FishingDay) -> String {
    let weather = &day.weather;
    format!(
        "{}-{:02}-{:02}  {:<15}  {:>3}  best {:<13}  {:>3}..{:<3}C  {:<6}  wind {} km/h {:?}",
        forecast.year,
        forecast.month,
        day.day,
        day.moon_phase_name.label(),
        day.score,
        day.best_times.join(", "),
        weather.temp_low,
        weather.temp_high,
        format!("{:?}", weather.conditions),
        weather.wind_speed,
        weather.wind_direction,
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout stays clean for the forecast
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fishcast=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = RunConfig::from_cli(&cli)?;

    let settings = AggregatorSettings {
        fetch_timeout: config.fetch_timeout,
        ..Default::default()
    };
    let aggregator =
        WeatherAggregator::with_settings(build_source(&config), build_cache(&config), settings);
    let engine = ForecastEngine::new(aggregator);

    tracing::debug!(
        month = config.month,
        year = config.year,
        latitude = config.location.latitude,
        longitude = config.location.longitude,
        offline = config.offline,
        "computing forecast"
    );

    let forecast = engine
        .compute_monthly_forecast(config.month, config.year, &config.location)
        .await?;

    if config.json {
        println!("{}", serde_json::to_string_pretty(&forecast)?);
        return Ok(());
    }

    let place = config
        .location
        .name
        .clone()
        .unwrap_or_else(|| format!("{:.4}, {:.4}", config.location.latitude, config.location.longitude));
    println!("Fishing forecast for {} - {}-{:02}", place, forecast.year, forecast.month);
    for day in &forecast.days {
        println!("{}", format_day(&forecast, day));
    }

    Ok(())
}
