//! Persisted watchlist storage.
//!
//! A small key-value layer stands in for the browser's local storage. The
//! watchlist lives under a single key as a JSON array of summaries; the older
//! double-encoded layout (an array of JSON strings) is upgraded on first load.

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::models::MovieSummary;

pub const WATCHLIST_KEY: &str = "watchlist";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// One file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(anyhow!("Invalid storage key '{}'", key));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::write(&path, value).with_context(|| format!("Failed to write {}", path.display()))
    }
}

/// In-process store, used by tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut values) = store.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Clone)]
pub struct WatchlistStore {
    inner: Arc<dyn KeyValueStore>,
}

impl WatchlistStore {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    /// Reads the stored watchlist. Absent or unreadable data is an empty list.
    pub fn load(&self) -> Vec<MovieSummary> {
        let raw = match self.inner.get(WATCHLIST_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read stored watchlist, treating as empty: {:#}", e);
                return Vec::new();
            }
        };
        match decode(&raw) {
            Decoded::Current(entries) => entries,
            Decoded::Legacy(entries) => {
                info!(
                    "Upgrading stored watchlist from double-encoded layout ({} entries)",
                    entries.len()
                );
                if let Err(e) = self.save(&entries) {
                    warn!("Failed to rewrite upgraded watchlist: {:#}", e);
                }
                entries
            }
            Decoded::Malformed(reason) => {
                warn!("Stored watchlist is malformed, treating as empty: {}", reason);
                Vec::new()
            }
        }
    }

    pub fn save(&self, entries: &[MovieSummary]) -> Result<()> {
        let text = serde_json::to_string(entries).context("Failed to encode watchlist")?;
        self.inner.set(WATCHLIST_KEY, &text)
    }
}

enum Decoded {
    Current(Vec<MovieSummary>),
    Legacy(Vec<MovieSummary>),
    Malformed(String),
}

fn decode(raw: &str) -> Decoded {
    let trimmed = raw.trim();
    // Older sessions stored `""` before anything was added.
    if trimmed.is_empty() || trimmed == "\"\"" {
        return Decoded::Current(Vec::new());
    }
    let current_err = match serde_json::from_str::<Vec<MovieSummary>>(trimmed) {
        Ok(entries) => return Decoded::Current(entries),
        Err(e) => e,
    };
    let Ok(strings) = serde_json::from_str::<Vec<String>>(trimmed) else {
        return Decoded::Malformed(current_err.to_string());
    };
    let mut entries = Vec::with_capacity(strings.len());
    for s in &strings {
        match serde_json::from_str::<MovieSummary>(s) {
            Ok(entry) => entries.push(entry),
            Err(e) => return Decoded::Malformed(format!("legacy entry: {e}")),
        }
    }
    Decoded::Legacy(entries)
}
