//! Deterministic offline weather source
//!
//! Generates plausible hourly weather without network access. Every day is
//! driven by its own linear-congruential generator seeded from the calendar
//! date and the rounded location, so the same request always yields the same
//! samples regardless of when it is made.

use std::f64::consts::PI;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveTime};

use super::weather::{HourlySample, Segment, WeatherError, WeatherSource};
use super::Location;

/// 32-bit linear-congruential generator (Numerical Recipes constants)
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    const MULTIPLIER: u32 = 1_664_525;
    const INCREMENT: u32 = 1_013_904_223;

    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
        self.state
    }

    /// Uniform value in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }

    /// Uniform value in [low, high)
    pub fn range(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }
}

/// Seed for one day at one location, independent of the wall clock
pub fn seed_for(date: NaiveDate, location: &Location) -> u32 {
    let day = i64::from(date.num_days_from_ce());
    let lat = (location.latitude * 100.0).round() as i64;
    let lon = (location.longitude * 100.0).round() as i64;

    let mixed = day.wrapping_mul(73_856_093)
        ^ lat.wrapping_mul(19_349_663)
        ^ lon.wrapping_mul(83_492_791);
    mixed as u32
}

/// Weather source that synthesizes hourly samples from seeded generators
#[derive(Debug, Clone, Default)]
pub struct SimulatedSource;

impl SimulatedSource {
    pub fn new() -> Self {
        Self
    }

    /// Generates the 24 hourly samples of a single day
    pub fn day_samples(&self, date: NaiveDate, location: &Location) -> Vec<HourlySample> {
        let mut rng = Lcg::new(seed_for(date, location));

        let mean_temp = seasonal_mean_temperature(date, location.latitude) + rng.range(-3.0, 3.0);
        let diurnal_range = rng.range(4.0, 9.0);
        let pressure = 1013.0 + rng.range(-12.0, 12.0);
        let wind_base = rng.range(2.0, 25.0);
        let wind_heading = rng.range(0.0, 360.0);
        let day_code = pick_weather_code(rng.next_f64(), mean_temp);

        (0..24u32)
            .map(|hour| {
                // Warmest around 15:00, coolest around 03:00
                let phase = 2.0 * PI * (f64::from(hour) - 9.0) / 24.0;
                let temperature = mean_temp + diurnal_range / 2.0 * phase.sin();
                let weather_code = if rng.next_f64() < 0.2 { 1 } else { day_code };

                HourlySample {
                    time: date.and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_default()),
                    temperature: Some(temperature),
                    pressure: Some(pressure + rng.range(-0.5, 0.5)),
                    wind_speed: Some((wind_base + rng.range(-3.0, 3.0)).max(0.0)),
                    wind_direction: Some((wind_heading + rng.range(-30.0, 30.0)).rem_euclid(360.0)),
                    weather_code: Some(weather_code),
                }
            })
            .collect()
    }
}

#[async_trait]
impl WeatherSource for SimulatedSource {
    async fn fetch_hourly(
        &self,
        _segment: Segment,
        location: &Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HourlySample>, WeatherError> {
        Ok(start
            .iter_days()
            .take_while(|date| *date <= end)
            .flat_map(|date| self.day_samples(date, location))
            .collect())
    }
}

/// Rough climatological mean temperature for a date and latitude
fn seasonal_mean_temperature(date: NaiveDate, latitude: f64) -> f64 {
    let abs_lat = latitude.abs();
    let annual_mean = 28.0 - 0.4 * abs_lat;
    let amplitude = 0.25 * abs_lat;

    // Warmest day of year is mid-July in the north, mid-January in the south
    let warmest_day = if latitude >= 0.0 { 196.0 } else { 15.0 };
    let angle = 2.0 * PI * (f64::from(date.ordinal()) - warmest_day) / 365.0;

    annual_mean + amplitude * angle.cos()
}

/// Picks the dominant WMO code of a day from a uniform draw
fn pick_weather_code(draw: f64, mean_temp: f64) -> u8 {
    match draw {
        d if d < 0.40 => 0,
        d if d < 0.65 => 3,
        d if d < 0.72 => 45,
        d if d < 0.86 => {
            if mean_temp < 1.0 {
                71
            } else {
                61
            }
        }
        d if d < 0.96 => 80,
        _ => 95,
    }
}
