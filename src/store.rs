//! Key-value persistence for the code history.
//!
//! Reads never fail: a missing or corrupt value yields an empty history.
//! Writes report errors to the caller, which decides how loud to be.

use crate::history::{History, HistoryEntry};
use anyhow::{Context, Result};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// Storage key used when none is configured
pub const DEFAULT_KEY: &str = "codeHistory";

pub trait HistoryStore {
    fn load(&self) -> History;
    fn save(&self, history: &History) -> Result<()>;
}

/// Entries that fail to parse are skipped; a value that is not a list is unreadable
fn decode(text: &str, limit: usize) -> Option<History> {
    let values: Vec<serde_json::Value> = serde_json::from_str(text).ok()?;
    let entries = values
        .into_iter()
        .filter_map(|value| serde_json::from_value::<HistoryEntry>(value).ok())
        .collect();
    Some(History::from_entries(entries, limit))
}

fn encode(history: &History) -> Result<String> {
    Ok(serde_json::to_string(history.entries())?)
}

/// Stores the history as `<dir>/<key>.json`
pub struct JsonFileStore {
    path: PathBuf,
    limit: usize,
}

impl JsonFileStore {
    pub fn new(dir: &Path, key: &str, limit: usize) -> Self {
        Self {
            path: dir.join(format!("{}.json", key)),
            limit,
        }
    }

    /// Default location: `<data dir>/vcode`
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("vcode"))
    }
}

impl HistoryStore for JsonFileStore {
    fn load(&self) -> History {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|text| decode(&text, self.limit))
            .unwrap_or_else(|| History::new(self.limit))
    }

    fn save(&self, history: &History) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = encode(history)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

/// Keeps the serialized history in memory for the life of the process
pub struct MemoryStore {
    value: RefCell<Option<String>>,
    limit: usize,
}

impl MemoryStore {
    pub fn new(limit: usize) -> Self {
        Self {
            value: RefCell::new(None),
            limit,
        }
    }

    /// Start from an already serialized value
    #[cfg(test)]
    pub fn with_value(value: &str, limit: usize) -> Self {
        Self {
            value: RefCell::new(Some(value.to_string())),
            limit,
        }
    }

    #[cfg(test)]
    pub fn raw(&self) -> Option<String> {
        self.value.borrow().clone()
    }
}

impl HistoryStore for MemoryStore {
    fn load(&self) -> History {
        self.value
            .borrow()
            .as_deref()
            .and_then(|text| decode(text, self.limit))
            .unwrap_or_else(|| History::new(self.limit))
    }

    fn save(&self, history: &History) -> Result<()> {
        *self.value.borrow_mut() = Some(encode(history)?);
        Ok(())
    }
}
