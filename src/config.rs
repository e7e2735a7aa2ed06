use crate::clipboard::DEFAULT_TIMEOUT_MS;
use crate::history::DEFAULT_LIMIT;
use crate::store::DEFAULT_KEY;
use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Longest allowed code validity (one year)
const MAX_VALIDITY_MINUTES: i64 = 525_600;

/// Upper bound for the millisecond timings in `[clipboard]` and `[ui]`
const MAX_TIMING_MS: u64 = 600_000;

static KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("static regex"));

/// A validation error in the configuration
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.field, self.message)
    }
}

/// Code validity settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CodeConfig {
    #[serde(default = "default_validity_minutes")]
    pub validity_minutes: i64,
    /// Countdown turns urgent below this many whole minutes
    #[serde(default = "default_urgent_minutes")]
    pub urgent_minutes: i64,
}

fn default_validity_minutes() -> i64 {
    30
}
fn default_urgent_minutes() -> i64 {
    5
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            validity_minutes: default_validity_minutes(),
            urgent_minutes: default_urgent_minutes(),
        }
    }
}

/// History size and storage location
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryConfig {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_key")]
    pub key: String,
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}
fn default_key() -> String {
    DEFAULT_KEY.to_string()
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            key: default_key(),
            dir: None,
        }
    }
}

/// Clipboard helper settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClipboardConfig {
    /// Command line receiving the text on stdin; autodetected when unset
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default = "default_clipboard_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_clipboard_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            command: None,
            timeout_ms: default_clipboard_timeout_ms(),
        }
    }
}

/// Presentation timings and formats
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UiConfig {
    #[serde(default = "default_copy_feedback_ms")]
    pub copy_feedback_ms: u64,
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,
    /// strftime pattern for the history time-of-day label
    #[serde(default = "default_time_format")]
    pub time_format: String,
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_copy_feedback_ms() -> u64 {
    2_000
}
fn default_startup_delay_ms() -> u64 {
    500
}
fn default_time_format() -> String {
    "%H:%M".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            copy_feedback_ms: default_copy_feedback_ms(),
            startup_delay_ms: default_startup_delay_ms(),
            time_format: default_time_format(),
            color: default_true(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub code: CodeConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub clipboard: ClipboardConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl Config {
    /// Load configuration from default paths
    /// Priority: project (.vcode/config.toml) > user (~/.vcode/config.toml) > built-in defaults
    pub fn load() -> Result<Self> {
        let mut layers = Vec::new();
        if let Some(home) = dirs::home_dir() {
            layers.push(home.join(".vcode").join("config.toml"));
        }
        layers.push(Path::new(".vcode").join("config.toml"));
        Self::load_layers(&layers)
    }

    /// Load and merge config files in order, later files overriding earlier
    /// ones key by key. Missing files are skipped.
    pub fn load_layers(paths: &[PathBuf]) -> Result<Self> {
        let mut merged = toml::Table::new();
        for path in paths {
            if path.exists() {
                merge_tables(&mut merged, read_layer(path)?);
            }
        }
        Ok(toml::Value::Table(merged).try_into()?)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        Ok(toml::Value::Table(read_layer(path)?).try_into()?)
    }

    /// Validate configuration and return any errors found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.code.validity_minutes <= 0 {
            errors.push(ValidationError {
                field: "code.validity_minutes".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        } else if self.code.validity_minutes > MAX_VALIDITY_MINUTES {
            errors.push(ValidationError {
                field: "code.validity_minutes".to_string(),
                message: format!(
                    "Must be at most {} (one year), got {}",
                    MAX_VALIDITY_MINUTES, self.code.validity_minutes
                ),
            });
        }

        if self.code.urgent_minutes < 0 || self.code.urgent_minutes > self.code.validity_minutes {
            errors.push(ValidationError {
                field: "code.urgent_minutes".to_string(),
                message: format!(
                    "Must be between 0 and validity_minutes ({}), got {}",
                    self.code.validity_minutes, self.code.urgent_minutes
                ),
            });
        }

        if self.history.limit == 0 {
            errors.push(ValidationError {
                field: "history.limit".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if !KEY_RE.is_match(&self.history.key) {
            errors.push(ValidationError {
                field: "history.key".to_string(),
                message: format!(
                    "Invalid storage key '{}', use letters, digits, '_', '.' or '-'",
                    self.history.key
                ),
            });
        }

        let timings = [
            ("clipboard.timeout_ms", self.clipboard.timeout_ms, 1),
            ("ui.copy_feedback_ms", self.ui.copy_feedback_ms, 0),
            ("ui.startup_delay_ms", self.ui.startup_delay_ms, 0),
        ];
        for (field, value, min) in timings {
            if !(min..=MAX_TIMING_MS).contains(&value) {
                errors.push(ValidationError {
                    field: field.to_string(),
                    message: format!(
                        "Must be between {} and {}, got {}",
                        min, MAX_TIMING_MS, value
                    ),
                });
            }
        }

        if let Some(command) = &self.clipboard.command {
            match shell_words::split(command) {
                Ok(words) if !words.is_empty() => {}
                Ok(_) => errors.push(ValidationError {
                    field: "clipboard.command".to_string(),
                    message: "Command must not be empty".to_string(),
                }),
                Err(e) => errors.push(ValidationError {
                    field: "clipboard.command".to_string(),
                    message: format!("Invalid command line: {}", e),
                }),
            }
        }

        if StrftimeItems::new(&self.ui.time_format).any(|item| matches!(item, Item::Error)) {
            errors.push(ValidationError {
                field: "ui.time_format".to_string(),
                message: format!("Invalid strftime pattern '{}'", self.ui.time_format),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn read_layer(path: &Path) -> Result<toml::Table> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let table: toml::Table = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(table)
}

/// Overlay `other` onto `base`; nested tables merge, any other value replaces
fn merge_tables(base: &mut toml::Table, other: toml::Table) {
    for (key, value) in other {
        match value {
            toml::Value::Table(incoming) => {
                if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                    merge_tables(existing, incoming);
                } else {
                    base.insert(key, toml::Value::Table(incoming));
                }
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}
