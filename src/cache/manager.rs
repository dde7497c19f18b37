//! File-backed weather cache
//!
//! Provides a `CacheManager` that stores each weather cache entry as a JSON
//! file named after its key.

use directories::ProjectDirs;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use super::{CacheError, WeatherCache, WeatherCacheEntry, WEATHER_KEY_PREFIX};

/// Manages reading and writing cache entries on disk
///
/// Entries live as JSON files in an XDG-compliant cache directory
/// (`~/.cache/fishcast/` on Linux).
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl CacheManager {
    /// Creates a new CacheManager using XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "fishcast")?;
        let cache_dir = project_dirs.cache_dir().to_path_buf();
        Some(Self { cache_dir })
    }

    /// Creates a new CacheManager with a custom cache directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Returns the path to a cache file for the given key
    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)
    }
}

impl WeatherCache for CacheManager {
    fn get(&self, key: &str) -> Result<Option<WeatherCacheEntry>, CacheError> {
        let content = match fs::read_to_string(self.cache_path(key)) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(serde_json::from_str(&content)?))
    }

    fn set(&self, key: &str, entry: &WeatherCacheEntry) -> Result<(), CacheError> {
        self.ensure_dir()?;

        let json = serde_json::to_string_pretty(entry)?;
        fs::write(self.cache_path(key), json)?;
        Ok(())
    }

    fn purge_except(&self, key: &str) -> Result<(), CacheError> {
        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let keep = format!("{}.json", key);
        for dir_entry in entries {
            let dir_entry = dir_entry?;
            let file_name = dir_entry.file_name();
            let file_name = file_name.to_string_lossy();

            if file_name.starts_with(WEATHER_KEY_PREFIX)
                && file_name.ends_with(".json")
                && file_name != keep
            {
                fs::remove_file(dir_entry.path())?;
            }
        }

        Ok(())
    }
}
