//! Open-Meteo weather API client
//!
//! This module fetches hourly weather from the three Open-Meteo products used by
//! the forecast (archive, forecast, seasonal) and parses the parallel-array
//! hourly block into `HourlySample` records.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use super::{Conditions, Location};

/// Hourly variables requested from every Open-Meteo product
const HOURLY_VARIABLES: &str =
    "temperature_2m,pressure_msl,wind_speed_10m,wind_direction_10m,weather_code";

/// Default per-request timeout for the HTTP client
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// The data source used for a date range relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// Historical observations for dates before today
    Archive,
    /// High-resolution forecast from today through the forecast horizon
    Forecast,
    /// Coarse seasonal outlook beyond the forecast horizon
    Seasonal,
}

impl Segment {
    /// Base URL of the Open-Meteo product serving this segment
    pub fn base_url(&self) -> &'static str {
        match self {
            Segment::Archive => "https://archive-api.open-meteo.com/v1/archive",
            Segment::Forecast => "https://api.open-meteo.com/v1/forecast",
            Segment::Seasonal => "https://seasonal-api.open-meteo.com/v1/seasonal",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Segment::Archive => "archive",
            Segment::Forecast => "forecast",
            Segment::Seasonal => "seasonal",
        }
    }
}

/// One hour of weather at the location's local time
///
/// Open-Meteo reports `null` for variables it has no value for, so every
/// measurement is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlySample {
    pub time: NaiveDateTime,
    /// Temperature in Celsius
    pub temperature: Option<f64>,
    /// Mean sea-level pressure in hPa
    pub pressure: Option<f64>,
    /// Wind speed in km/h
    pub wind_speed: Option<f64>,
    /// Wind direction in degrees
    pub wind_direction: Option<f64>,
    /// WMO weather code
    pub weather_code: Option<u8>,
}

/// Errors that can occur when fetching weather data
#[derive(Debug, Error)]
pub enum WeatherError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Unexpected HTTP status: {0}")]
    Status(reqwest::StatusCode),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Missing or empty field in response
    #[error("Missing expected field in response: {0}")]
    MissingField(String),

    /// Invalid time format in response
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),

    /// The request did not finish in time
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

/// A provider of hourly weather for a location and inclusive date range
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_hourly(
        &self,
        segment: Segment,
        location: &Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HourlySample>, WeatherError>;
}

/// Client for fetching hourly weather from the Open-Meteo APIs
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
}

impl Default for OpenMeteoClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenMeteoClient {
    /// Create a new client with the default request timeout
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a new client whose requests give up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Create a new client with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Builds the request URL for a segment and date range
    fn request_url(
        segment: Segment,
        location: &Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> String {
        format!(
            "{}?latitude={}&longitude={}&timezone=auto&start_date={}&end_date={}&hourly={}",
            segment.base_url(),
            location.latitude,
            location.longitude,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
            HOURLY_VARIABLES
        )
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    async fn fetch_hourly(
        &self,
        segment: Segment,
        location: &Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HourlySample>, WeatherError> {
        let url = Self::request_url(segment, location, start, end);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status(status));
        }

        let text = response.text().await?;
        let api_response: OpenMeteoResponse = serde_json::from_str(&text)?;
        let hourly = api_response
            .hourly
            .ok_or_else(|| WeatherError::MissingField("hourly".to_string()))?;

        parse_hourly_data(&hourly)
    }
}

/// Parse hourly weather data arrays into `HourlySample` records
fn parse_hourly_data(hourly: &HourlyWeather) -> Result<Vec<HourlySample>, WeatherError> {
    let len = hourly.time.len();
    if len == 0 {
        return Err(WeatherError::MissingField("hourly.time".to_string()));
    }

    // Every variable array must line up with the timestamp array
    if hourly.temperature_2m.len() != len
        || hourly.pressure_msl.len() != len
        || hourly.wind_speed_10m.len() != len
        || hourly.wind_direction_10m.len() != len
        || hourly.weather_code.len() != len
    {
        return Err(WeatherError::MissingField(
            "hourly arrays have inconsistent lengths".to_string(),
        ));
    }

    let mut samples = Vec::with_capacity(len);

    for i in 0..len {
        samples.push(HourlySample {
            time: parse_datetime(&hourly.time[i])?,
            temperature: hourly.temperature_2m[i],
            pressure: hourly.pressure_msl[i],
            wind_speed: hourly.wind_speed_10m[i],
            wind_direction: hourly.wind_direction_10m[i],
            weather_code: hourly.weather_code[i].map(|code| code.clamp(0.0, 255.0) as u8),
        });
    }

    Ok(samples)
}

/// Parse a datetime string in ISO 8601 format (e.g., "2024-07-15T05:30") to NaiveDateTime
fn parse_datetime(datetime_str: &str) -> Result<NaiveDateTime, WeatherError> {
    NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%dT%H:%M")
        .map_err(|_| WeatherError::InvalidTimeFormat(datetime_str.to_string()))
}

/// Map a WMO weather code to a daily condition category
///
/// Weather codes from WMO (World Meteorological Organization):
/// - 0: Clear sky
/// - 1-3: Mainly clear, partly cloudy, overcast
/// - 45, 48: Fog
/// - 51-57: Drizzle, freezing drizzle
/// - 61-67: Rain, freezing rain
/// - 71-77: Snow, snow grains
/// - 80-82: Rain showers
/// - 85-86: Snow showers
/// - 95-99: Thunderstorm
pub fn weather_code_to_conditions(code: u8) -> Conditions {
    match code {
        0 => Conditions::Clear,
        1..=3 => Conditions::Cloudy,
        45 | 48 => Conditions::Foggy,
        51..=67 | 80..=82 => Conditions::Rainy,
        71..=77 | 85..=86 => Conditions::Snowy,
        95..=99 => Conditions::Stormy,
        _ => Conditions::Cloudy, // Default for unknown codes
    }
}

/// Open-Meteo API response structure
#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    hourly: Option<HourlyWeather>,
}

/// Hourly weather data from Open-Meteo
#[derive(Debug, Deserialize)]
struct HourlyWeather {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    pressure_msl: Vec<Option<f64>>,
    wind_speed_10m: Vec<Option<f64>>,
    wind_direction_10m: Vec<Option<f64>>,
    weather_code: Vec<Option<f64>>,
}
