//! Collaborator fakes shared by the unit tests.

use crate::clock::Clock;
use crate::code::{SymbolSource, ALPHABET};
use crate::display::{Countdown, Display, Severity};
use crate::history::{History, HistoryRow, Stats};
use crate::prompt::Confirm;
use crate::store::{HistoryStore, MemoryStore};
use crate::ticker::Ticker;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use std::cell::{Cell, RefCell};
use std::io::Write;
use std::rc::Rc;

/// Clock that only moves when told to
#[derive(Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// Replays the given symbols in a loop
pub struct ScriptedSymbols {
    indices: Vec<usize>,
    pos: usize,
}

impl ScriptedSymbols {
    pub fn new(symbols: &str) -> Self {
        let indices = symbols
            .bytes()
            .map(|b| {
                ALPHABET
                    .iter()
                    .position(|&a| a == b)
                    .unwrap_or_else(|| panic!("'{}' is not a code symbol", b as char))
            })
            .collect::<Vec<_>>();
        assert!(!indices.is_empty());
        Self { indices, pos: 0 }
    }

    /// One compact code per generation, in order
    pub fn codes(codes: &[&str]) -> Self {
        Self::new(&codes.concat())
    }
}

impl SymbolSource for ScriptedSymbols {
    fn pick(&mut self, n: usize) -> usize {
        let idx = self.indices[self.pos % self.indices.len()];
        self.pos += 1;
        assert!(idx < n);
        idx
    }
}

/// Everything the manager rendered, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Shown {
    Code(Option<String>),
    Countdown(Countdown),
    History(Vec<HistoryRow>),
    Stats(Stats),
    Toast(Severity, String),
    CopyFeedback(bool),
    Pulse,
}

#[derive(Clone, Default)]
pub struct RecordingDisplay {
    shown: Rc<RefCell<Vec<Shown>>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn codes(&self) -> Vec<Option<String>> {
        self.shown
            .borrow()
            .iter()
            .filter_map(|s| match s {
                Shown::Code(c) => Some(c.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn countdowns(&self) -> Vec<Countdown> {
        self.shown
            .borrow()
            .iter()
            .filter_map(|s| match s {
                Shown::Countdown(c) => Some(c.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn toasts(&self) -> Vec<(Severity, String)> {
        self.shown
            .borrow()
            .iter()
            .filter_map(|s| match s {
                Shown::Toast(sev, msg) => Some((*sev, msg.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn feedback(&self) -> Vec<bool> {
        self.shown
            .borrow()
            .iter()
            .filter_map(|s| match s {
                Shown::CopyFeedback(active) => Some(*active),
                _ => None,
            })
            .collect()
    }

    pub fn pulses(&self) -> usize {
        self.shown
            .borrow()
            .iter()
            .filter(|s| matches!(s, Shown::Pulse))
            .count()
    }

    pub fn last_stats(&self) -> Option<Stats> {
        self.shown.borrow().iter().rev().find_map(|s| match s {
            Shown::Stats(stats) => Some(*stats),
            _ => None,
        })
    }

    pub fn last_history(&self) -> Option<Vec<HistoryRow>> {
        self.shown.borrow().iter().rev().find_map(|s| match s {
            Shown::History(rows) => Some(rows.clone()),
            _ => None,
        })
    }
}

impl Display for RecordingDisplay {
    fn show_code(&mut self, code: Option<&crate::code::Code>) {
        self.shown
            .borrow_mut()
            .push(Shown::Code(code.map(|c| c.to_string())));
    }

    fn show_countdown(&mut self, countdown: &Countdown) {
        self.shown
            .borrow_mut()
            .push(Shown::Countdown(countdown.clone()));
    }

    fn show_history(&mut self, rows: &[HistoryRow]) {
        self.shown.borrow_mut().push(Shown::History(rows.to_vec()));
    }

    fn show_stats(&mut self, stats: Stats) {
        self.shown.borrow_mut().push(Shown::Stats(stats));
    }

    fn toast(&mut self, severity: Severity, message: &str) {
        self.shown
            .borrow_mut()
            .push(Shown::Toast(severity, message.to_string()));
    }

    fn copy_feedback(&mut self, active: bool) {
        self.shown.borrow_mut().push(Shown::CopyFeedback(active));
    }

    fn pulse(&mut self) {
        self.shown.borrow_mut().push(Shown::Pulse);
    }
}

#[derive(Default)]
struct TickerState {
    running: bool,
    starts: usize,
    cancels: usize,
}

/// Ticker that records calls instead of spawning a thread
#[derive(Clone, Default)]
pub struct CountingTicker {
    state: Rc<RefCell<TickerState>>,
}

impl CountingTicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starts(&self) -> usize {
        self.state.borrow().starts
    }

    /// Running tasks cancelled, by `stop` or by a restart
    pub fn cancels(&self) -> usize {
        self.state.borrow().cancels
    }
}

impl Ticker for CountingTicker {
    fn start(&mut self) {
        self.stop();
        let mut state = self.state.borrow_mut();
        state.running = true;
        state.starts += 1;
    }

    fn stop(&mut self) {
        let mut state = self.state.borrow_mut();
        if state.running {
            state.running = false;
            state.cancels += 1;
        }
    }

    fn is_running(&self) -> bool {
        self.state.borrow().running
    }
}

/// Always gives the same answer and counts questions
#[derive(Clone)]
pub struct FixedConfirm {
    answer: bool,
    asked: Rc<Cell<usize>>,
}

impl FixedConfirm {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: Rc::new(Cell::new(0)),
        }
    }

    pub fn asked(&self) -> usize {
        self.asked.get()
    }
}

impl Confirm for FixedConfirm {
    fn confirm(&self, _question: &str) -> bool {
        self.asked.set(self.asked.get() + 1);
        self.answer
    }
}

/// Store whose writes always fail
pub struct FailingStore;

impl HistoryStore for FailingStore {
    fn load(&self) -> History {
        History::new(crate::history::DEFAULT_LIMIT)
    }

    fn save(&self, _history: &History) -> Result<()> {
        Err(anyhow!("disk full"))
    }
}

impl HistoryStore for Rc<MemoryStore> {
    fn load(&self) -> History {
        (**self).load()
    }

    fn save(&self, history: &History) -> Result<()> {
        (**self).save(history)
    }
}

/// In-memory writer whose contents stay readable after being boxed
#[derive(Clone, Default)]
pub struct SharedBuf {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl SharedBuf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.borrow()).to_string()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Clipboard that remembers what it was given
pub struct RecordingClipboard {
    written: std::sync::Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingClipboard {
    pub fn new() -> Self {
        Self {
            written: std::sync::Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// Every write is refused, as when the platform denies access
    pub fn failing() -> Self {
        Self {
            written: std::sync::Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn written(&self) -> Vec<String> {
        self.written.lock().unwrap().clone()
    }
}

impl crate::clipboard::Clipboard for RecordingClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        if self.fail {
            return Err(anyhow!("clipboard access denied"));
        }
        self.written.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
