//! Monthly fishing forecast assembly
//!
//! For each calendar day the astronomy and scoring are computed synchronously,
//! while weather for the whole month is looked up once through the aggregator.

use chrono::{DateTime, Datelike, Local, NaiveDate};
use thiserror::Error;

use crate::aggregator::WeatherAggregator;
use crate::astronomy::{format_clock, DayAstronomy};
use crate::data::{
    date_key, EventKind, FishingDay, Location, MonthlyForecast, SolarLunarEvent, WeatherInfo,
};
use crate::scoring::{score_day, DayScore};

/// Errors for requests outside the forecastable domain
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ForecastError {
    /// Month is not within 1..=12
    #[error("Invalid month: {0}. Expected 1-12")]
    InvalidMonth(u32),

    /// The month cannot be represented as a calendar date
    #[error("Invalid date: {year}-{month:02}")]
    InvalidDate { year: i32, month: u32 },
}

/// Number of days in `month` of `year`, or `None` if the month is invalid
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from(next.signed_duration_since(first).num_days()).ok()
}

/// Builds a day's event list, ordered by clock time
pub fn day_events(astronomy: &DayAstronomy, score: &DayScore) -> Vec<SolarLunarEvent> {
    let event = |kind, hours: f64, label: String| SolarLunarEvent {
        kind,
        time: format_clock(hours),
        label,
    };

    let solar = &astronomy.solar;
    let lunar = &astronomy.lunar;

    let mut events = vec![
        event(EventKind::Sunrise, solar.sunrise, "Sunrise".to_string()),
        event(EventKind::Sunset, solar.sunset, "Sunset".to_string()),
        event(EventKind::Moonrise, lunar.moonrise, "Moonrise".to_string()),
        event(EventKind::Moonset, lunar.moonset, "Moonset".to_string()),
    ];

    events.extend(
        lunar
            .major
            .iter()
            .map(|&hour| event(EventKind::Major, hour, "Major peak".to_string())),
    );
    events.extend(
        lunar
            .minor
            .iter()
            .map(|&hour| event(EventKind::Minor, hour, "Minor peak".to_string())),
    );

    if let Some(window) = &score.peak_window {
        events.push(event(
            EventKind::PeakWindow,
            window.center,
            format!("Peak window {} ({})", window.range_label(), window.kind.label()),
        ));
    }

    // "HH:MM" sorts lexically; the sort is stable so equal times keep insertion order
    events.sort_by(|a, b| a.time.cmp(&b.time));
    events
}

/// Computes one day's forecast from its date, location and weather
pub fn fishing_day(date: NaiveDate, location: &Location, weather: WeatherInfo) -> FishingDay {
    let astronomy = DayAstronomy::compute(date, location);
    let score = score_day(astronomy.phase, &astronomy.solar, &astronomy.lunar);
    let events = day_events(&astronomy, &score);

    FishingDay {
        day: date.day(),
        score: score.score,
        moon_phase_name: astronomy.phase_name,
        moon_phase_value: astronomy.phase,
        best_times: astronomy.lunar.major.iter().map(|&h| format_clock(h)).collect(),
        hourly_activity: score.hourly_activity,
        events,
        weather,
    }
}

/// Produces monthly forecasts from astronomy, scoring and aggregated weather
pub struct ForecastEngine {
    aggregator: WeatherAggregator,
}

impl ForecastEngine {
    pub fn new(aggregator: WeatherAggregator) -> Self {
        Self { aggregator }
    }

    pub fn aggregator(&self) -> &WeatherAggregator {
        &self.aggregator
    }

    /// Forecast for every day of `month`/`year` at `location`
    pub async fn compute_monthly_forecast(
        &self,
        month: u32,
        year: i32,
        location: &Location,
    ) -> Result<MonthlyForecast, ForecastError> {
        self.compute_monthly_forecast_at(month, year, location, Local::now())
            .await
    }

    /// Same as `compute_monthly_forecast`, with an explicit current time
    ///
    /// Repeated calls on the same local day reuse the cached weather window.
    pub async fn compute_monthly_forecast_at(
        &self,
        month: u32,
        year: i32,
        location: &Location,
        now: DateTime<Local>,
    ) -> Result<MonthlyForecast, ForecastError> {
        if !(1..=12).contains(&month) {
            return Err(ForecastError::InvalidMonth(month));
        }

        let invalid = || ForecastError::InvalidDate { year, month };
        let day_count = days_in_month(year, month).ok_or_else(invalid)?;
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let last = NaiveDate::from_ymd_opt(year, month, day_count).ok_or_else(invalid)?;

        let weather = self
            .aggregator
            .weather_for_range_at(location, first, last, now)
            .await;

        let days = first
            .iter_days()
            .take(day_count as usize)
            .map(|date| {
                let info = weather.get(&date_key(date)).cloned().unwrap_or_default();
                fishing_day(date, location, info)
            })
            .collect();

        Ok(MonthlyForecast { month, year, days })
    }
}
