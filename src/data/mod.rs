//! Core data models for the fishing forecast
//!
//! This module contains the types produced by the forecast engine: locations,
//! solar/lunar events, daily weather summaries, and the per-day and per-month
//! forecast records.

pub mod daily;
pub mod simulated;
pub mod weather;

pub use daily::{aggregate_daily, fill_gaps, DailyWeather};
pub use simulated::SimulatedSource;
pub use weather::{HourlySample, OpenMeteoClient, Segment, WeatherError, WeatherSource};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A geographic location in decimal degrees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude, positive north
    pub latitude: f64,
    /// Longitude, positive east
    pub longitude: f64,
    /// Optional human-readable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Location {
    /// Creates an unnamed location
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            name: None,
        }
    }

    /// Attaches a display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Cache key for this location, rounded to two decimal degrees
    pub fn cache_key(&self) -> String {
        format!("weather_daily_{:.2}_{:.2}", self.latitude, self.longitude)
    }
}

/// Kinds of solar and lunar events reported for a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Sunrise,
    Sunset,
    Moonrise,
    Moonset,
    Major,
    Minor,
    PeakWindow,
}

/// A solar or lunar event at a local wall-clock time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolarLunarEvent {
    pub kind: EventKind,
    /// Local time of day as "HH:MM"
    pub time: String,
    pub label: String,
}

/// Direction of the day-over-day pressure change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressureTrend {
    Rising,
    Falling,
    Steady,
}

/// One of the 8 compass sectors, 45 degrees wide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindDirection {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl WindDirection {
    const SECTORS: [WindDirection; 8] = [
        WindDirection::N,
        WindDirection::NE,
        WindDirection::E,
        WindDirection::SE,
        WindDirection::S,
        WindDirection::SW,
        WindDirection::W,
        WindDirection::NW,
    ];

    /// Maps an angle in degrees to its sector via `round(angle / 45) mod 8`
    pub fn from_degrees(degrees: f64) -> Self {
        let sector = (degrees.rem_euclid(360.0) / 45.0).round() as usize % 8;
        Self::SECTORS[sector]
    }
}

/// Daily weather category
///
/// Variants are declared in ascending priority, so the dominant condition of
/// a day is simply the maximum over its hourly categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Conditions {
    Clear,
    Cloudy,
    Foggy,
    Rainy,
    Snowy,
    Stormy,
}

/// Aggregated weather for a single calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherInfo {
    /// Daily maximum in Celsius
    pub temp_high: i32,
    /// Daily minimum in Celsius
    pub temp_low: i32,
    /// Mean sea-level pressure in hPa
    pub pressure: i32,
    pub pressure_trend: PressureTrend,
    /// Mean wind speed in km/h
    pub wind_speed: i32,
    pub wind_direction: WindDirection,
    pub conditions: Conditions,
}

impl Default for WeatherInfo {
    /// Seasonally neutral weather used when a day has no data at all
    fn default() -> Self {
        Self {
            temp_high: 20,
            temp_low: 12,
            pressure: 1013,
            pressure_trend: PressureTrend::Steady,
            wind_speed: 5,
            wind_direction: WindDirection::NW,
            conditions: Conditions::Clear,
        }
    }
}

/// Named moon phase, bucketed from the phase value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoonPhase {
    #[serde(rename = "New Moon")]
    NewMoon,
    #[serde(rename = "Waxing Crescent")]
    WaxingCrescent,
    #[serde(rename = "First Quarter")]
    FirstQuarter,
    #[serde(rename = "Waxing Gibbous")]
    WaxingGibbous,
    #[serde(rename = "Full Moon")]
    FullMoon,
    #[serde(rename = "Waning Gibbous")]
    WaningGibbous,
    #[serde(rename = "Last Quarter")]
    LastQuarter,
    #[serde(rename = "Waning Crescent")]
    WaningCrescent,
}

impl MoonPhase {
    /// Returns a human-readable display label for the phase.
    pub fn label(&self) -> &'static str {
        match self {
            MoonPhase::NewMoon => "New Moon",
            MoonPhase::WaxingCrescent => "Waxing Crescent",
            MoonPhase::FirstQuarter => "First Quarter",
            MoonPhase::WaxingGibbous => "Waxing Gibbous",
            MoonPhase::FullMoon => "Full Moon",
            MoonPhase::WaningGibbous => "Waning Gibbous",
            MoonPhase::LastQuarter => "Last Quarter",
            MoonPhase::WaningCrescent => "Waning Crescent",
        }
    }
}

/// Forecast for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FishingDay {
    /// Day of month, starting at 1
    pub day: u32,
    /// Overall fishing quality, 0-100
    pub score: u8,
    pub moon_phase_name: MoonPhase,
    /// Phase value in [0, 1), 0 = new moon, 0.5 = full moon
    pub moon_phase_value: f64,
    /// Major peak times, ascending
    pub best_times: Vec<String>,
    /// Exactly 24 values, each within 10..=100
    pub hourly_activity: Vec<u8>,
    pub events: Vec<SolarLunarEvent>,
    pub weather: WeatherInfo,
}

/// Forecast for a calendar month, one `FishingDay` per day in ascending order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyForecast {
    pub month: u32,
    pub year: i32,
    pub days: Vec<FishingDay>,
}

/// Formats a date as the "YYYY-MM-DD" key used by daily weather maps
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
