//! Code/history manager: owns the session state and drives every mutation.
//!
//! The manager is single-threaded. Timers, input and clipboard completion
//! reach it as plain method calls from the event loop:
//!
//! - `generate` replaces the current code, records it and restarts the countdown
//! - `tick` renders the countdown, and the terminal expired state once
//! - `copy_to_clipboard` / `finish_copy` bracket the asynchronous clipboard call
//! - `clear_history` empties the history after confirmation
//!
//! History is persisted after every mutation. A failed save is reported on
//! the diagnostic channel only; the in-memory history stays authoritative.

use crate::clock::Clock;
use crate::code::{Code, SymbolSource};
use crate::config::Config;
use crate::display::{Countdown, Display, Severity};
use crate::history::{History, HistoryEntry, HistoryRow, Stats};
use crate::journal::Journal;
use crate::prompt::Confirm;
use crate::store::HistoryStore;
use crate::ticker::Ticker;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

/// Timings and formats the manager needs from the configuration
#[derive(Debug, Clone)]
pub struct Settings {
    pub validity: Duration,
    pub urgent_minutes: i64,
    pub copy_feedback: Duration,
    pub time_format: String,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            validity: Duration::minutes(config.code.validity_minutes),
            urgent_minutes: config.code.urgent_minutes,
            copy_feedback: Duration::milliseconds(config.ui.copy_feedback_ms as i64),
            time_format: config.ui.time_format.clone(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Injected collaborators
pub struct Collaborators {
    pub store: Box<dyn HistoryStore>,
    pub symbols: Box<dyn SymbolSource>,
    pub clock: Box<dyn Clock>,
    pub display: Box<dyn Display>,
    pub ticker: Box<dyn Ticker>,
    pub confirm: Box<dyn Confirm>,
    pub journal: Option<Journal>,
}

/// Lifecycle of the current code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No code generated yet this session
    Idle,
    Active,
    Expired,
}

pub struct CodeManager {
    settings: Settings,
    store: Box<dyn HistoryStore>,
    symbols: Box<dyn SymbolSource>,
    clock: Box<dyn Clock>,
    display: Box<dyn Display>,
    ticker: Box<dyn Ticker>,
    confirm: Box<dyn Confirm>,
    journal: Option<Journal>,
    history: History,
    current: Option<Code>,
    expires_at: Option<DateTime<Utc>>,
    phase: Phase,
    feedback_until: Option<DateTime<Utc>>,
}

impl CodeManager {
    /// Build the manager and load the stored history
    pub fn new(settings: Settings, parts: Collaborators) -> Self {
        let history = parts.store.load();
        Self {
            settings,
            store: parts.store,
            symbols: parts.symbols,
            clock: parts.clock,
            display: parts.display,
            ticker: parts.ticker,
            confirm: parts.confirm,
            journal: parts.journal,
            history,
            current: None,
            expires_at: None,
            phase: Phase::Idle,
            feedback_until: None,
        }
    }

    /// Render the initial views. The host auto-generates the first code afterwards.
    pub fn start(&mut self) {
        let len = self.history.len();
        self.log(|j| j.session_start(len));
        self.show_stats();
        self.show_history();
    }

    /// Create a new code, record it and restart the countdown
    pub fn generate(&mut self) -> Code {
        let code = Code::generate(self.symbols.as_mut());
        let now = self.clock.now();
        let expires_at = now + self.settings.validity;

        self.current = Some(code.clone());
        self.expires_at = Some(expires_at);
        self.phase = Phase::Active;

        self.display.show_code(Some(&code));
        self.start_countdown();
        self.add_to_history(HistoryEntry::new(code.clone(), now, expires_at));
        self.show_stats();
        self.display.toast(Severity::Success, "New code generated!");
        self.display.pulse();

        let text = code.to_string();
        self.log(|j| j.code_generated(&text, expires_at));
        code
    }

    fn start_countdown(&mut self) {
        self.ticker.start();
        self.tick();
    }

    /// Periodic countdown refresh. No-op unless a code is active.
    pub fn tick(&mut self) {
        if self.phase != Phase::Active {
            return;
        }
        let Some(expires_at) = self.expires_at else {
            return;
        };

        let remaining = (expires_at - self.clock.now()).num_milliseconds();
        if remaining <= 0 {
            self.ticker.stop();
            self.phase = Phase::Expired;
            self.display.show_countdown(&Countdown::Expired);
            self.show_stats();
            if let Some(code) = self.current.as_ref().map(|c| c.to_string()) {
                self.log(|j| j.code_expired(&code));
            }
            return;
        }

        let countdown = Countdown::running(remaining, self.settings.urgent_minutes);
        self.display.show_countdown(&countdown);
    }

    /// Begin a copy. Returns the clipboard payload (the code without its
    /// hyphen), or `None` after reporting that there is nothing to copy.
    /// The host hands the payload to the clipboard and reports back through
    /// `finish_copy`.
    pub fn copy_to_clipboard(&mut self) -> Option<String> {
        match &self.current {
            Some(code) => Some(code.compact()),
            None => {
                self.display
                    .toast(Severity::Error, "Generate a code first!");
                None
            }
        }
    }

    /// Completion of the clipboard call started by `copy_to_clipboard`
    pub fn finish_copy(&mut self, result: Result<()>) {
        match result {
            Ok(()) => {
                self.display.copy_feedback(true);
                self.feedback_until = Some(self.clock.now() + self.settings.copy_feedback);
                self.display.toast(Severity::Success, "Code copied!");
                if self.phase == Phase::Expired {
                    self.display
                        .toast(Severity::Warning, "This code has expired");
                }
                if let Some(code) = self.current.as_ref().map(|c| c.to_string()) {
                    self.log(|j| j.copy_ok(&code));
                }
            }
            Err(e) => {
                self.display.toast(Severity::Error, "Copy failed");
                let msg = e.to_string();
                self.log(|j| j.copy_failed(&msg));
            }
        }
    }

    /// Expire transient UI state (copy feedback) whose deadline has passed
    pub fn poll(&mut self) {
        if let Some(until) = self.feedback_until {
            if self.clock.now() >= until {
                self.feedback_until = None;
                self.display.copy_feedback(false);
            }
        }
    }

    /// Empty the history after confirmation. Returns whether it was cleared.
    pub fn clear_history(&mut self) -> bool {
        if !self
            .confirm
            .confirm("Are you sure you want to clear the whole history?")
        {
            return false;
        }

        let removed = self.history.len();
        self.history.clear();
        self.persist();
        self.show_history();
        self.show_stats();
        self.display.toast(Severity::Info, "History cleared!");
        self.log(|j| j.history_cleared(removed));
        true
    }

    pub fn stats(&self) -> Stats {
        self.history.stats(self.clock.now())
    }

    pub fn history_rows(&self) -> Vec<HistoryRow> {
        self.history
            .rows(self.clock.now(), &self.settings.time_format)
    }

    /// Countdown for the current code as of now, if any
    pub fn countdown(&self) -> Option<Countdown> {
        let expires_at = self.expires_at?;
        let remaining = (expires_at - self.clock.now()).num_milliseconds();
        if self.phase == Phase::Expired || remaining <= 0 {
            Some(Countdown::Expired)
        } else {
            Some(Countdown::running(remaining, self.settings.urgent_minutes))
        }
    }

    /// Re-render the current code and countdown
    pub fn show_status(&mut self) {
        self.display.show_code(self.current.as_ref());
        if let Some(countdown) = self.countdown() {
            self.display.show_countdown(&countdown);
        }
    }

    pub fn show_history(&mut self) {
        let rows = self.history_rows();
        self.display.show_history(&rows);
    }

    pub fn show_stats(&mut self) {
        let stats = self.stats();
        self.display.show_stats(stats);
    }

    #[cfg(test)]
    pub fn current_code(&self) -> Option<&Code> {
        self.current.as_ref()
    }

    #[cfg(test)]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    #[cfg(test)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    pub fn history(&self) -> &History {
        &self.history
    }

    fn add_to_history(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
        self.persist();
        self.show_history();
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.history) {
            eprintln!("Warning: failed to save history: {}", e);
            let msg = e.to_string();
            self.log(|j| j.history_save_failed(&msg));
        }
    }

    fn log(&mut self, f: impl FnOnce(&mut Journal) -> Result<()>) {
        if let Some(journal) = self.journal.as_mut() {
            let _ = f(journal);
        }
    }
}
