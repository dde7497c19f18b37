//! Cache module for persisting daily weather between runs
//!
//! The aggregator talks to a `WeatherCache` trait object, so the on-disk
//! `CacheManager` can be swapped for the in-memory `MemoryCache` (tests, or
//! embedding without a filesystem) or any other key-value store.

mod manager;
mod memory;

pub use manager::CacheManager;
pub use memory::MemoryCache;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::DailyWeather;

/// Prefix shared by every weather cache key
pub const WEATHER_KEY_PREFIX: &str = "weather_daily_";

/// Errors raised by cache backends
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading, writing or deleting the backing store failed
    #[error("Cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The stored entry could not be encoded or decoded
    #[error("Cache entry is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Daily weather for one location, stamped with when it was fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherCacheEntry {
    pub fetched_at: DateTime<Utc>,
    /// First date of the cached window
    pub range_start: NaiveDate,
    /// Last date of the cached window
    pub range_end: NaiveDate,
    pub data: DailyWeather,
}

impl WeatherCacheEntry {
    /// Whether the entry was fetched on the same local calendar day as `now`
    pub fn is_fresh(&self, now: DateTime<Local>) -> bool {
        self.fetched_at.with_timezone(&Local).date_naive() == now.date_naive()
    }
}

/// Key-value store for weather cache entries
pub trait WeatherCache: Send + Sync {
    /// Returns the entry stored under `key`, or `None` if there is none
    fn get(&self, key: &str) -> Result<Option<WeatherCacheEntry>, CacheError>;

    /// Stores `entry` under `key`, replacing any previous entry
    fn set(&self, key: &str, entry: &WeatherCacheEntry) -> Result<(), CacheError>;

    /// Removes every weather entry except the one stored under `key`
    fn purge_except(&self, key: &str) -> Result<(), CacheError>;
}
