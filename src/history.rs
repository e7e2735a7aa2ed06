//! Bounded, newest-first record of generated codes.
//!
//! Entries are immutable once created; they only leave the history through
//! cap eviction on insert or a bulk clear.

use crate::code::Code;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Default number of entries kept
pub const DEFAULT_LIMIT: usize = 10;

/// One generated code. Field names match the stored format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub code: Code,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "expires")]
    pub expires_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(code: Code, created_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            code,
            created_at,
            expires_at,
        }
    }

    /// Counted as valid by the stats view
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// Status label used by the history view
    pub fn status_at(&self, now: DateTime<Utc>) -> Status {
        if self.expires_at < now {
            Status::Expired
        } else {
            Status::Valid
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Valid,
    Expired,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Valid => "Valid",
            Status::Expired => "Expired",
        }
    }
}

/// Derived counters over the history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub total: usize,
    pub valid: usize,
}

/// A history entry prepared for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub code: String,
    pub time_label: String,
    pub status: Status,
}

/// Newest-first history capped at `limit` entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    entries: Vec<HistoryEntry>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit,
        }
    }

    /// Build from stored entries (assumed newest-first), dropping any beyond the cap
    pub fn from_entries(mut entries: Vec<HistoryEntry>, limit: usize) -> Self {
        entries.truncate(limit);
        Self { entries, limit }
    }

    /// Prepend an entry and evict the oldest beyond the cap
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(self.limit);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self, now: DateTime<Utc>) -> Stats {
        Stats {
            total: self.entries.len(),
            valid: self.entries.iter().filter(|e| e.is_valid_at(now)).count(),
        }
    }

    /// Rows with a local time-of-day label formatted with `time_format`
    pub fn rows(&self, now: DateTime<Utc>, time_format: &str) -> Vec<HistoryRow> {
        self.entries
            .iter()
            .map(|e| HistoryRow {
                code: e.code.to_string(),
                time_label: e
                    .created_at
                    .with_timezone(&Local)
                    .format(time_format)
                    .to_string(),
                status: e.status_at(now),
            })
            .collect()
    }
}
