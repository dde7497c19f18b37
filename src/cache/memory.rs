//! In-memory weather cache

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::{CacheError, WeatherCache, WeatherCacheEntry, WEATHER_KEY_PREFIX};

/// Weather cache held in process memory; contents vanish with the process
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, WeatherCacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WeatherCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<WeatherCacheEntry>, CacheError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, entry: &WeatherCacheEntry) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), entry.clone());
        Ok(())
    }

    fn purge_except(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|k, _| k == key || !k.starts_with(WEATHER_KEY_PREFIX));
        Ok(())
    }
}
