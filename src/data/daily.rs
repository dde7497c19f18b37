//! Hourly to daily weather aggregation
//!
//! Buckets hourly samples by local calendar date and reduces each bucket to a
//! `WeatherInfo`. Pressure trend is carried forward chronologically across the
//! whole sample set, so callers must pass samples from every segment at once.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::weather::{weather_code_to_conditions, HourlySample};
use super::{date_key, Conditions, PressureTrend, WeatherInfo, WindDirection};

/// Daily weather keyed by "YYYY-MM-DD"; keys sort chronologically
pub type DailyWeather = BTreeMap<String, WeatherInfo>;

/// Pressure used when neither today nor any earlier day has samples
const DEFAULT_PRESSURE_HPA: f64 = 1013.0;

/// Day-over-day change that counts as a trend (exclusive)
const PRESSURE_TREND_THRESHOLD_HPA: f64 = 1.0;

/// Aggregates hourly samples into one `WeatherInfo` per calendar date.
///
/// Days without any temperature reading are left out so that gap filling can
/// cover them.
pub fn aggregate_daily(samples: &[HourlySample]) -> DailyWeather {
    let mut buckets: BTreeMap<NaiveDate, Vec<&HourlySample>> = BTreeMap::new();
    for sample in samples {
        buckets.entry(sample.time.date()).or_default().push(sample);
    }

    let mut daily = DailyWeather::new();
    let mut previous_pressure: Option<f64> = None;

    for (date, hours) in buckets {
        let temperatures: Vec<f64> = hours.iter().filter_map(|h| h.temperature).collect();
        if temperatures.is_empty() {
            continue;
        }
        let high = temperatures.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let low = temperatures.iter().copied().fold(f64::INFINITY, f64::min);

        let pressure = mean(hours.iter().filter_map(|h| h.pressure))
            .or(previous_pressure)
            .unwrap_or(DEFAULT_PRESSURE_HPA);
        let pressure_trend = pressure_trend(previous_pressure, pressure);
        previous_pressure = Some(pressure);

        let wind_speed = mean(hours.iter().filter_map(|h| h.wind_speed)).unwrap_or(0.0);
        let directions: Vec<f64> = hours.iter().filter_map(|h| h.wind_direction).collect();
        let wind_direction = vector_mean_degrees(&directions)
            .map(WindDirection::from_degrees)
            .unwrap_or(WindDirection::N);

        let conditions = hours
            .iter()
            .filter_map(|h| h.weather_code)
            .map(weather_code_to_conditions)
            .max()
            .unwrap_or(Conditions::Clear);

        daily.insert(
            date_key(date),
            WeatherInfo {
                temp_high: high.round() as i32,
                temp_low: low.round() as i32,
                pressure: pressure.round() as i32,
                pressure_trend,
                wind_speed: wind_speed.round() as i32,
                wind_direction,
                conditions,
            },
        );
    }

    daily
}

/// Classifies the change from the previous day's mean pressure
///
/// The first day of a series has nothing to compare against and is steady.
pub fn pressure_trend(previous: Option<f64>, current: f64) -> PressureTrend {
    let Some(previous) = previous else {
        return PressureTrend::Steady;
    };

    let delta = current - previous;
    if delta > PRESSURE_TREND_THRESHOLD_HPA {
        PressureTrend::Rising
    } else if delta < -PRESSURE_TREND_THRESHOLD_HPA {
        PressureTrend::Falling
    } else {
        PressureTrend::Steady
    }
}

/// Circular mean of angles in degrees, normalized to [0, 360)
///
/// Sums unit vectors so that 350° and 10° average to 0° rather than 180°.
/// Returns `None` for an empty slice.
pub fn vector_mean_degrees(angles: &[f64]) -> Option<f64> {
    if angles.is_empty() {
        return None;
    }

    let (sin_sum, cos_sum) = angles.iter().fold((0.0, 0.0), |(s, c), angle| {
        let radians = angle.to_radians();
        (s + radians.sin(), c + radians.cos())
    });

    // rem_euclid rounds tiny negative angles up to exactly 360.0
    let degrees = sin_sum.atan2(cos_sum).to_degrees().rem_euclid(360.0);
    Some(if degrees >= 360.0 { 0.0 } else { degrees })
}

/// Produces a gap-free map covering `start..=end`.
///
/// A missing date copies the most recent earlier value, including values in
/// `daily` that precede `start`. With nothing earlier, the neutral default
/// from `WeatherInfo::default` is used.
pub fn fill_gaps(daily: &DailyWeather, start: NaiveDate, end: NaiveDate) -> DailyWeather {
    let mut filled = DailyWeather::new();
    let mut last = daily
        .range(..date_key(start))
        .next_back()
        .map(|(_, weather)| weather.clone());

    for date in start.iter_days().take_while(|date| *date <= end) {
        let key = date_key(date);
        let weather = match daily.get(&key) {
            Some(weather) => weather.clone(),
            None => last.clone().unwrap_or_default(),
        };
        last = Some(weather.clone());
        filled.insert(key, weather);
    }

    filled
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn sample(time: &str, temperature: f64, pressure: f64, code: u8) -> HourlySample {
        HourlySample {
            time: NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M").unwrap(),
            temperature: Some(temperature),
            pressure: Some(pressure),
            wind_speed: Some(10.0),
            wind_direction: Some(90.0),
            weather_code: Some(code),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_vector_mean_of_perpendicular_angles_is_northeast() {
        let mean = vector_mean_degrees(&[0.0, 90.0]).unwrap();
        assert!((mean - 45.0).abs() < 1e-9);
        assert_eq!(WindDirection::from_degrees(mean), WindDirection::NE);
    }

    #[test]
    fn test_vector_mean_across_north_is_north() {
        let mean = vector_mean_degrees(&[350.0, 10.0]).unwrap();
        assert!(mean < 1e-6 || mean > 360.0 - 1e-6, "got {}", mean);
        assert_eq!(WindDirection::from_degrees(mean), WindDirection::N);
    }

    #[test]
    fn test_vector_mean_empty_is_none() {
        assert!(vector_mean_degrees(&[]).is_none());
    }

    #[test]
    fn test_pressure_trend_threshold() {
        assert_eq!(pressure_trend(Some(1010.0), 1012.5), PressureTrend::Rising);
        assert_eq!(pressure_trend(Some(1010.0), 1011.0), PressureTrend::Steady);
        assert_eq!(pressure_trend(Some(1010.0), 1009.0), PressureTrend::Steady);
        assert_eq!(pressure_trend(Some(1010.0), 1008.0), PressureTrend::Falling);
        assert_eq!(pressure_trend(None, 990.0), PressureTrend::Steady);
    }

    #[test]
    fn test_aggregate_buckets_by_date() {
        let samples = vec![
            sample("2025-02-01T00:00", 1.4, 1010.0, 0),
            sample("2025-02-01T12:00", 7.6, 1012.0, 2),
            sample("2025-02-02T00:00", -2.6, 1014.0, 0),
            sample("2025-02-02T12:00", 3.0, 1016.0, 0),
        ];

        let daily = aggregate_daily(&samples);
        assert_eq!(daily.len(), 2);

        let first = &daily["2025-02-01"];
        assert_eq!(first.temp_high, 8);
        assert_eq!(first.temp_low, 1);
        assert_eq!(first.pressure, 1011);
        assert_eq!(first.pressure_trend, PressureTrend::Steady);
        assert_eq!(first.wind_speed, 10);
        assert_eq!(first.wind_direction, WindDirection::E);
        assert_eq!(first.conditions, Conditions::Cloudy);

        let second = &daily["2025-02-02"];
        assert_eq!(second.temp_low, -3);
        assert_eq!(second.pressure, 1015);
        assert_eq!(second.pressure_trend, PressureTrend::Rising);
        assert_eq!(second.conditions, Conditions::Clear);
    }

    #[test]
    fn test_thunderstorm_outranks_rain() {
        let samples = vec![
            sample("2025-02-01T06:00", 10.0, 1010.0, 61),
            sample("2025-02-01T07:00", 11.0, 1010.0, 95),
            sample("2025-02-01T08:00", 12.0, 1010.0, 51),
        ];

        let daily = aggregate_daily(&samples);
        assert_eq!(daily["2025-02-01"].conditions, Conditions::Stormy);
    }

    #[test]
    fn test_missing_pressure_falls_back_to_previous_day() {
        let mut second = sample("2025-02-02T00:00", 5.0, 0.0, 0);
        second.pressure = None;
        let samples = vec![sample("2025-02-01T00:00", 5.0, 1020.0, 0), second];

        let daily = aggregate_daily(&samples);
        assert_eq!(daily["2025-02-02"].pressure, 1020);
        assert_eq!(daily["2025-02-02"].pressure_trend, PressureTrend::Steady);
    }

    #[test]
    fn test_missing_pressure_without_history_uses_default() {
        let mut only = sample("2025-02-01T00:00", 5.0, 0.0, 0);
        only.pressure = None;

        let daily = aggregate_daily(&[only]);
        assert_eq!(daily["2025-02-01"].pressure, 1013);
    }

    #[test]
    fn test_day_without_temperatures_is_skipped() {
        let mut empty = sample("2025-02-02T00:00", 0.0, 1010.0, 0);
        empty.temperature = None;
        let samples = vec![sample("2025-02-01T00:00", 5.0, 1010.0, 0), empty];

        let daily = aggregate_daily(&samples);
        assert!(daily.contains_key("2025-02-01"));
        assert!(!daily.contains_key("2025-02-02"));
    }

    #[test]
    fn test_trend_carries_across_unsorted_input() {
        let samples = vec![
            sample("2025-02-02T00:00", 5.0, 1005.0, 0),
            sample("2025-02-01T00:00", 5.0, 1010.0, 0),
        ];

        let daily = aggregate_daily(&samples);
        assert_eq!(daily["2025-02-02"].pressure_trend, PressureTrend::Falling);
    }

    #[test]
    fn test_fill_gaps_copies_preceding_day() {
        let samples = vec![
            sample("2025-02-01T00:00", 5.0, 1010.0, 0),
            sample("2025-02-03T00:00", 9.0, 1010.0, 3),
        ];
        let daily = aggregate_daily(&samples);

        let filled = fill_gaps(&daily, date(2025, 2, 1), date(2025, 2, 4));
        assert_eq!(filled.len(), 4);
        assert_eq!(filled["2025-02-02"], filled["2025-02-01"]);
        assert_eq!(filled["2025-02-04"], filled["2025-02-03"]);
    }

    #[test]
    fn test_fill_gaps_without_history_uses_default() {
        let filled = fill_gaps(&DailyWeather::new(), date(2025, 2, 27), date(2025, 3, 2));
        assert_eq!(filled.len(), 4);
        assert!(filled.values().all(|w| *w == WeatherInfo::default()));
        assert!(filled.contains_key("2025-03-01"));
    }

    #[test]
    fn test_fill_gaps_uses_value_before_range_start() {
        let daily = aggregate_daily(&[sample("2025-01-31T00:00", 3.0, 1000.0, 71)]);

        let filled = fill_gaps(&daily, date(2025, 2, 1), date(2025, 2, 2));
        assert_eq!(filled.len(), 2);
        assert_eq!(filled["2025-02-01"].conditions, Conditions::Snowy);
        assert!(!filled.contains_key("2025-01-31"));
    }
}
