use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Append-only JSONL diagnostic log, one line per event
pub struct Journal {
    session_id: String,
    out: Box<dyn Write>,
}

#[derive(Serialize)]
struct Event<'a> {
    ts: DateTime<Utc>,
    session_id: &'a str,
    #[serde(rename = "type")]
    event_type: &'a str,
    #[serde(flatten)]
    data: serde_json::Value,
}

impl Journal {
    pub fn open(path: &Path, session_id: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::from_writer(Box::new(file), session_id))
    }

    pub fn from_writer(out: Box<dyn Write>, session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            out,
        }
    }

    pub fn log(&mut self, event_type: &str, data: serde_json::Value) -> Result<()> {
        let event = Event {
            ts: Utc::now(),
            session_id: &self.session_id,
            event_type,
            data,
        };
        let line = serde_json::to_string(&event)?;
        writeln!(self.out, "{}", line)?;
        self.out.flush()?;
        Ok(())
    }

    pub fn session_start(&mut self, history_len: usize) -> Result<()> {
        self.log(
            "session_start",
            serde_json::json!({ "history_len": history_len }),
        )
    }

    pub fn code_generated(&mut self, code: &str, expires: DateTime<Utc>) -> Result<()> {
        self.log(
            "code_generated",
            serde_json::json!({ "code": code, "expires": expires }),
        )
    }

    pub fn code_expired(&mut self, code: &str) -> Result<()> {
        self.log("code_expired", serde_json::json!({ "code": code }))
    }

    pub fn copy_ok(&mut self, code: &str) -> Result<()> {
        self.log("copy_ok", serde_json::json!({ "code": code }))
    }

    pub fn copy_failed(&mut self, error: &str) -> Result<()> {
        self.log("copy_failed", serde_json::json!({ "error": error }))
    }

    pub fn history_cleared(&mut self, removed: usize) -> Result<()> {
        self.log(
            "history_cleared",
            serde_json::json!({ "removed": removed }),
        )
    }

    pub fn history_save_failed(&mut self, error: &str) -> Result<()> {
        self.log(
            "history_save_failed",
            serde_json::json!({ "error": error }),
        )
    }
}
