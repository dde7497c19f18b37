//! Segmented weather aggregation with a once-per-day cache
//!
//! A requested window is split around "today" into archive, forecast and
//! seasonal segments. Segments are fetched concurrently, each under its own
//! timeout; a failed segment is logged and its days are gap-filled instead of
//! failing the whole request. Results are cached per rounded location and
//! reused for the rest of the local calendar day.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, TimeDelta, Utc};
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::cache::{WeatherCache, WeatherCacheEntry};
use crate::data::{
    aggregate_daily, fill_gaps, DailyWeather, HourlySample, Location, Segment, WeatherError,
    WeatherSource,
};

/// Tunables for the aggregator
#[derive(Debug, Clone)]
pub struct AggregatorSettings {
    /// Days before today included in the cached window
    pub days_back: i64,
    /// Days after today included in the cached window
    pub days_forward: i64,
    /// Days, starting today, served by the high-resolution forecast
    pub forecast_horizon_days: i64,
    /// Per-segment fetch timeout
    pub fetch_timeout: Duration,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            days_back: 7,
            days_forward: 60,
            forecast_horizon_days: 16,
            fetch_timeout: Duration::from_secs(15),
        }
    }
}

/// An inclusive date range served by one source segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentRange {
    pub segment: Segment,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Splits `start..=end` into archive, forecast and seasonal ranges around `today`.
///
/// The forecast covers `today` and the following `horizon_days - 1` days.
/// Empty ranges are omitted; the result is in chronological order.
pub fn plan_segments(
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
    horizon_days: i64,
) -> Vec<SegmentRange> {
    let mut ranges = Vec::with_capacity(3);
    if start > end {
        return ranges;
    }

    let yesterday = today - TimeDelta::days(1);
    let horizon_end = today + TimeDelta::days(horizon_days.max(1) - 1);

    let candidates = [
        (Segment::Archive, start, end.min(yesterday)),
        (Segment::Forecast, start.max(today), end.min(horizon_end)),
        (
            Segment::Seasonal,
            start.max(horizon_end + TimeDelta::days(1)),
            end,
        ),
    ];

    for (segment, range_start, range_end) in candidates {
        if range_start <= range_end {
            ranges.push(SegmentRange {
                segment,
                start: range_start,
                end: range_end,
            });
        }
    }

    ranges
}

/// Fetches, aggregates and caches daily weather for a location
pub struct WeatherAggregator {
    source: Arc<dyn WeatherSource>,
    cache: Arc<dyn WeatherCache>,
    settings: AggregatorSettings,
}

impl WeatherAggregator {
    /// Creates an aggregator with default settings
    pub fn new(source: Arc<dyn WeatherSource>, cache: Arc<dyn WeatherCache>) -> Self {
        Self::with_settings(source, cache, AggregatorSettings::default())
    }

    pub fn with_settings(
        source: Arc<dyn WeatherSource>,
        cache: Arc<dyn WeatherCache>,
        settings: AggregatorSettings,
    ) -> Self {
        Self {
            source,
            cache,
            settings,
        }
    }

    pub fn settings(&self) -> &AggregatorSettings {
        &self.settings
    }

    /// Gap-free daily weather for `start..=end`, sliced from the cached window
    pub async fn weather_for_range(
        &self,
        location: &Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DailyWeather {
        self.weather_for_range_at(location, start, end, Local::now())
            .await
    }

    /// Same as `weather_for_range`, with an explicit current time
    pub async fn weather_for_range_at(
        &self,
        location: &Location,
        start: NaiveDate,
        end: NaiveDate,
        now: DateTime<Local>,
    ) -> DailyWeather {
        let window = self.daily_weather_at(location, now).await;
        fill_gaps(&window, start, end)
    }

    /// Daily weather for the fixed window around today
    pub async fn daily_weather(&self, location: &Location) -> DailyWeather {
        self.daily_weather_at(location, Local::now()).await
    }

    /// Daily weather for the fixed window around `now`.
    ///
    /// Returns the cached entry untouched when it was fetched on the same
    /// local calendar day. Otherwise fetches every segment, gap-fills the
    /// window, stores it, and drops entries cached for other locations.
    pub async fn daily_weather_at(&self, location: &Location, now: DateTime<Local>) -> DailyWeather {
        let key = location.cache_key();

        match self.cache.get(&key) {
            Ok(Some(entry)) if entry.is_fresh(now) => {
                debug!(key = %key, fetched_at = %entry.fetched_at, "using cached daily weather");
                return entry.data;
            }
            Ok(Some(_)) => debug!(key = %key, "cached daily weather is from an earlier day"),
            Ok(None) => debug!(key = %key, "no cached daily weather"),
            Err(e) => warn!(key = %key, error = %e, "weather cache read failed, fetching fresh data"),
        }

        let today = now.date_naive();
        let start = today - TimeDelta::days(self.settings.days_back);
        let end = today + TimeDelta::days(self.settings.days_forward);

        let fetched = self.fetch_range(location, start, end, today).await;
        info!(
            key = %key,
            days = fetched.len(),
            start = %start,
            end = %end,
            "fetched daily weather"
        );

        let entry = WeatherCacheEntry {
            fetched_at: now.with_timezone(&Utc),
            range_start: start,
            range_end: end,
            data: fill_gaps(&fetched, start, end),
        };

        if let Err(e) = self.cache.set(&key, &entry) {
            warn!(key = %key, error = %e, "weather cache write failed");
        } else if let Err(e) = self.cache.purge_except(&key) {
            warn!(key = %key, error = %e, "weather cache purge failed");
        }

        entry.data
    }

    /// Fetches and aggregates `start..=end` without consulting the cache.
    ///
    /// Days no segment delivered are absent from the result.
    pub async fn fetch_range(
        &self,
        location: &Location,
        start: NaiveDate,
        end: NaiveDate,
        today: NaiveDate,
    ) -> DailyWeather {
        let plan = plan_segments(start, end, today, self.settings.forecast_horizon_days);
        let results = join_all(plan.iter().map(|range| self.fetch_segment(location, *range))).await;

        let mut samples: Vec<HourlySample> = results.into_iter().flatten().collect();
        // Trend is carried day to day, so aggregate once over the merged timeline
        samples.sort_by_key(|sample| sample.time);

        aggregate_daily(&samples)
    }

    /// Fetches one segment; failures are logged and yield no samples
    async fn fetch_segment(&self, location: &Location, range: SegmentRange) -> Vec<HourlySample> {
        let timeout = self.settings.fetch_timeout;
        let request = self
            .source
            .fetch_hourly(range.segment, location, range.start, range.end);

        let result = match tokio::time::timeout(timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(WeatherError::Timeout(timeout)),
        };

        match result {
            Ok(mut samples) => {
                samples.retain(|s| (range.start..=range.end).contains(&s.time.date()));
                debug!(
                    segment = range.segment.label(),
                    start = %range.start,
                    end = %range.end,
                    samples = samples.len(),
                    "weather segment fetched"
                );
                samples
            }
            Err(e) => {
                warn!(
                    segment = range.segment.label(),
                    start = %range.start,
                    end = %range.end,
                    error = %e,
                    "weather segment failed, days will be gap-filled"
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheError, MemoryCache};
    use crate::data::{date_key, PressureTrend, SimulatedSource, WeatherInfo};
    use async_trait::async_trait;
    use chrono::{NaiveDateTime, NaiveTime, TimeZone};
    use std::sync::Mutex;

    type Call = (Segment, NaiveDate, NaiveDate);

    /// Source that records calls and serves constant hourly weather
    #[derive(Default)]
    struct RecordingSource {
        calls: Mutex<Vec<Call>>,
        failing: Vec<Segment>,
        pressure_by_segment: Option<fn(Segment) -> f64>,
        delay: Option<Duration>,
    }

    impl RecordingSource {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WeatherSource for RecordingSource {
        async fn fetch_hourly(
            &self,
            segment: Segment,
            _location: &Location,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<HourlySample>, WeatherError> {
            self.calls.lock().unwrap().push((segment, start, end));

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.failing.contains(&segment) {
                return Err(WeatherError::MissingField("hourly".to_string()));
            }

            let pressure = self.pressure_by_segment.map(|f| f(segment)).unwrap_or(1013.0);
            Ok(start
                .iter_days()
                .take_while(|d| *d <= end)
                .map(|date| HourlySample {
                    time: NaiveDateTime::new(date, NaiveTime::from_hms_opt(12, 0, 0).unwrap()),
                    temperature: Some(10.0),
                    pressure: Some(pressure),
                    wind_speed: Some(12.0),
                    wind_direction: Some(180.0),
                    weather_code: Some(3),
                })
                .collect())
        }
    }

    /// Cache whose every operation fails
    struct BrokenCache;

    impl WeatherCache for BrokenCache {
        fn get(&self, _key: &str) -> Result<Option<WeatherCacheEntry>, CacheError> {
            Err(CacheError::Io(std::io::Error::other("disk on fire")))
        }
        fn set(&self, _key: &str, _entry: &WeatherCacheEntry) -> Result<(), CacheError> {
            Err(CacheError::Io(std::io::Error::other("disk on fire")))
        }
        fn purge_except(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::Io(std::io::Error::other("disk on fire")))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn morning(y: i32, m: u32, d: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
    }

    fn location() -> Location {
        Location::new(45.2671, 19.8335)
    }

    #[test]
    fn test_plan_segments_spanning_all_three() {
        let plan = plan_segments(date(2025, 2, 3), date(2025, 4, 11), date(2025, 2, 10), 16);

        assert_eq!(
            plan,
            vec![
                SegmentRange {
                    segment: Segment::Archive,
                    start: date(2025, 2, 3),
                    end: date(2025, 2, 9),
                },
                SegmentRange {
                    segment: Segment::Forecast,
                    start: date(2025, 2, 10),
                    end: date(2025, 2, 25),
                },
                SegmentRange {
                    segment: Segment::Seasonal,
                    start: date(2025, 2, 26),
                    end: date(2025, 4, 11),
                },
            ]
        );
    }

    #[test]
    fn test_plan_segments_past_only() {
        let plan = plan_segments(date(2024, 1, 1), date(2024, 1, 31), date(2025, 2, 10), 16);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].segment, Segment::Archive);
        assert_eq!(plan[0].end, date(2024, 1, 31));
    }

    #[test]
    fn test_plan_segments_within_forecast_horizon() {
        let plan = plan_segments(date(2025, 2, 12), date(2025, 2, 20), date(2025, 2, 10), 16);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].segment, Segment::Forecast);
        assert_eq!((plan[0].start, plan[0].end), (date(2025, 2, 12), date(2025, 2, 20)));
    }

    #[test]
    fn test_plan_segments_far_future_only() {
        let plan = plan_segments(date(2025, 6, 1), date(2025, 6, 30), date(2025, 2, 10), 16);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].segment, Segment::Seasonal);
    }

    #[test]
    fn test_plan_segments_empty_range() {
        assert!(plan_segments(date(2025, 2, 2), date(2025, 2, 1), date(2025, 2, 10), 16).is_empty());
    }

    #[tokio::test]
    async fn test_same_day_calls_fetch_once() {
        let source = Arc::new(RecordingSource::default());
        let aggregator = WeatherAggregator::new(source.clone(), Arc::new(MemoryCache::new()));

        let first = aggregator.daily_weather_at(&location(), morning(2025, 2, 10)).await;
        let calls_after_first = source.calls().len();
        assert_eq!(calls_after_first, 3);

        let later = Local.with_ymd_and_hms(2025, 2, 10, 21, 45, 0).unwrap();
        let second = aggregator.daily_weather_at(&location(), later).await;

        assert_eq!(source.calls().len(), calls_after_first);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_next_day_fetches_again() {
        let source = Arc::new(RecordingSource::default());
        let aggregator = WeatherAggregator::new(source.clone(), Arc::new(MemoryCache::new()));

        aggregator.daily_weather_at(&location(), morning(2025, 2, 10)).await;
        aggregator.daily_weather_at(&location(), morning(2025, 2, 11)).await;

        let calls = source.calls();
        assert_eq!(calls.len(), 6);
        assert_eq!(calls[3..].iter().find(|c| c.0 == Segment::Forecast).unwrap().1, date(2025, 2, 11));
    }

    #[tokio::test]
    async fn test_window_is_gap_free() {
        let source = Arc::new(RecordingSource::default());
        let aggregator = WeatherAggregator::new(source, Arc::new(MemoryCache::new()));

        let window = aggregator.daily_weather_at(&location(), morning(2025, 2, 10)).await;

        assert_eq!(window.len(), 68);
        assert!(window.contains_key("2025-02-03"));
        assert!(window.contains_key("2025-04-11"));
    }

    #[tokio::test]
    async fn test_failed_segment_is_gap_filled() {
        let source = Arc::new(RecordingSource {
            failing: vec![Segment::Forecast],
            ..Default::default()
        });
        let aggregator = WeatherAggregator::new(source.clone(), Arc::new(MemoryCache::new()));

        let window = aggregator.daily_weather_at(&location(), morning(2025, 2, 10)).await;

        assert_eq!(source.calls().len(), 3);
        assert_eq!(window.len(), 68);
        // Forecast days copy the last archive day
        assert_eq!(window["2025-02-15"], window["2025-02-09"]);
        assert_eq!(window["2025-02-15"].conditions, crate::data::Conditions::Cloudy);
    }

    #[tokio::test]
    async fn test_all_segments_failing_yields_defaults() {
        let source = Arc::new(RecordingSource {
            failing: vec![Segment::Archive, Segment::Forecast, Segment::Seasonal],
            ..Default::default()
        });
        let aggregator = WeatherAggregator::new(source, Arc::new(MemoryCache::new()));

        let window = aggregator.daily_weather_at(&location(), morning(2025, 2, 10)).await;

        assert_eq!(window.len(), 68);
        assert!(window.values().all(|w| *w == WeatherInfo::default()));
    }

    #[tokio::test]
    async fn test_slow_segment_times_out() {
        let source = Arc::new(RecordingSource {
            delay: Some(Duration::from_secs(5)),
            ..Default::default()
        });
        let settings = AggregatorSettings {
            fetch_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let aggregator =
            WeatherAggregator::with_settings(source, Arc::new(MemoryCache::new()), settings);

        let window = aggregator.daily_weather_at(&location(), morning(2025, 2, 10)).await;

        assert_eq!(window.len(), 68);
        assert!(window.values().all(|w| *w == WeatherInfo::default()));
    }

    #[tokio::test]
    async fn test_broken_cache_is_treated_as_miss() {
        let source = Arc::new(RecordingSource::default());
        let aggregator = WeatherAggregator::new(source.clone(), Arc::new(BrokenCache));

        let window = aggregator.daily_weather_at(&location(), morning(2025, 2, 10)).await;
        aggregator.daily_weather_at(&location(), morning(2025, 2, 10)).await;

        assert_eq!(window.len(), 68);
        assert_eq!(source.calls().len(), 6);
    }

    #[tokio::test]
    async fn test_fetch_purges_other_locations() {
        let cache = Arc::new(MemoryCache::new());
        let aggregator =
            WeatherAggregator::new(Arc::new(RecordingSource::default()), cache.clone());
        let elsewhere = Location::new(-33.8568, 151.2153);

        aggregator.daily_weather_at(&elsewhere, morning(2025, 2, 10)).await;
        aggregator.daily_weather_at(&location(), morning(2025, 2, 10)).await;

        assert_eq!(cache.len(), 1);
        assert!(cache.get(&location().cache_key()).unwrap().is_some());
        assert!(cache.get(&elsewhere.cache_key()).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pressure_trend_carries_across_segments() {
        fn pressure(segment: Segment) -> f64 {
            match segment {
                Segment::Archive => 1000.0,
                _ => 1010.0,
            }
        }
        let source = Arc::new(RecordingSource {
            pressure_by_segment: Some(pressure as fn(Segment) -> f64),
            ..Default::default()
        });
        let aggregator = WeatherAggregator::new(source, Arc::new(MemoryCache::new()));

        let window = aggregator.daily_weather_at(&location(), morning(2025, 2, 10)).await;

        assert_eq!(window["2025-02-09"].pressure_trend, PressureTrend::Steady);
        assert_eq!(window["2025-02-10"].pressure_trend, PressureTrend::Rising);
        assert_eq!(window["2025-02-11"].pressure_trend, PressureTrend::Steady);
    }

    #[tokio::test]
    async fn test_weather_for_range_slices_and_fills() {
        let aggregator = WeatherAggregator::new(
            Arc::new(SimulatedSource::new()),
            Arc::new(MemoryCache::new()),
        );

        let month = aggregator
            .weather_for_range_at(&location(), date(2025, 2, 1), date(2025, 2, 28), morning(2025, 2, 10))
            .await;

        assert_eq!(month.len(), 28);
        assert_eq!(month.keys().next().map(String::as_str), Some("2025-02-01"));
        // Days before the cached window have nothing earlier to copy
        assert_eq!(month[&date_key(date(2025, 2, 1))], WeatherInfo::default());
        assert_ne!(month[&date_key(date(2025, 2, 20))], WeatherInfo::default());
    }
}
