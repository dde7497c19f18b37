//! Command-line interface parsing for fishcast
//!
//! Parses arguments with clap and validates them into a `RunConfig`.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{Datelike, Local};
use clap::Parser;
use thiserror::Error;

use crate::data::Location;

/// Error types for CLI argument validation
#[derive(Debug, Error, PartialEq)]
pub enum CliError {
    /// Month outside 1-12
    #[error("Invalid month: {0}. Expected 1-12")]
    InvalidMonth(u32),

    /// Latitude outside -90..=90
    #[error("Invalid latitude: {0}. Expected -90 to 90")]
    InvalidLatitude(f64),

    /// Longitude outside -180..=180
    #[error("Invalid longitude: {0}. Expected -180 to 180")]
    InvalidLongitude(f64),
}

/// fishcast - Monthly fishing forecast from solunar tables and weather
#[derive(Parser, Debug)]
#[command(name = "fishcast")]
#[command(about = "Monthly fishing forecast from solunar tables and weather")]
#[command(version)]
pub struct Cli {
    /// Latitude in decimal degrees, positive north
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in decimal degrees, positive east
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Month to forecast (1-12), defaults to the current month
    #[arg(long)]
    pub month: Option<u32>,

    /// Year to forecast, defaults to the current year
    #[arg(long, allow_hyphen_values = true)]
    pub year: Option<i32>,

    /// Display name for the location
    #[arg(long)]
    pub name: Option<String>,

    /// Print the forecast as JSON
    #[arg(long)]
    pub json: bool,

    /// Use simulated weather instead of fetching from Open-Meteo
    #[arg(long)]
    pub offline: bool,

    /// Directory for cached weather, overrides the platform cache directory
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Timeout for each weather request, in seconds
    #[arg(long, value_name = "SECS", default_value_t = 15)]
    pub timeout_secs: u64,
}

/// Validated settings for one forecast run
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub month: u32,
    pub year: i32,
    pub location: Location,
    pub json: bool,
    pub offline: bool,
    pub cache_dir: Option<PathBuf>,
    pub fetch_timeout: Duration,
}

impl RunConfig {
    /// Creates a RunConfig from parsed CLI arguments.
    ///
    /// Missing month and year default to today's local date.
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let today = Local::now().date_naive();

        let month = cli.month.unwrap_or_else(|| today.month());
        if !(1..=12).contains(&month) {
            return Err(CliError::InvalidMonth(month));
        }
        if !(-90.0..=90.0).contains(&cli.lat) {
            return Err(CliError::InvalidLatitude(cli.lat));
        }
        if !(-180.0..=180.0).contains(&cli.lon) {
            return Err(CliError::InvalidLongitude(cli.lon));
        }

        let mut location = Location::new(cli.lat, cli.lon);
        if let Some(name) = &cli.name {
            location = location.with_name(name.clone());
        }

        Ok(RunConfig {
            month,
            year: cli.year.unwrap_or_else(|| today.year()),
            location,
            json: cli.json,
            offline: cli.offline,
            cache_dir: cli.cache_dir.clone(),
            fetch_timeout: Duration::from_secs(cli.timeout_secs),
        })
    }
}
