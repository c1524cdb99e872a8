//! Client-local persistent key/value storage.
//!
//! A single JSON object on disk, read once on open and rewritten on every
//! update. Holds the theme preference and the initial-location snapshot.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Key holding `"dark"` or `"light"`
pub const THEME_KEY: &str = "theme";

/// Key holding the serialized `{coords, city, country}` snapshot
pub const INITIAL_LOCATION_KEY: &str = "initial_location";

pub struct LocalStorage {
    path: PathBuf,
    entries: Mutex<Map<String, Value>>,
}

impl LocalStorage {
    /// Open the storage file, starting empty if it doesn't exist yet
    pub fn open(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let json = fs::read_to_string(path).context("Failed to read local storage")?;
            match serde_json::from_str::<Map<String, Value>>(&json) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!("Local storage is malformed, starting empty: {}", e);
                    Map::new()
                }
            }
        } else {
            Map::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            entries: Mutex::new(entries),
        })
    }

    /// Read and decode a value. A stored value that no longer decodes is
    /// treated as absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.entries.lock();
        let value = entries.get(key)?.clone();
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Ignoring undecodable local storage value for {}: {}", key, e);
                None
            }
        }
    }

    /// Overwrite a value and flush to disk
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).context("Failed to serialize storage value")?;
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value);
        self.flush(&entries)?;
        tracing::debug!("Stored local value: {}", key);
        Ok(())
    }

    fn flush(&self, entries: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create storage directory")?;
        }

        let json =
            serde_json::to_string_pretty(entries).context("Failed to serialize local storage")?;

        fs::write(&self.path, json).context("Failed to write local storage")?;
        Ok(())
    }
}
