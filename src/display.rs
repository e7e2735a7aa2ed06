//! Display sink for the widget state, and its terminal implementation.

use crate::code::Code;
use crate::history::{HistoryRow, Stats, Status};
use std::io::{self, Write};

/// Toast severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Info => "info",
            Severity::Warning => "warning",
        }
    }
}

/// What the countdown shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Countdown {
    /// `MM:SS` remaining; `urgent` when under the urgency threshold
    Running { text: String, urgent: bool },
    Expired,
}

impl Countdown {
    /// Format remaining milliseconds as `MM:SS` (minutes are not capped)
    pub fn running(remaining_ms: i64, urgent_minutes: i64) -> Self {
        let minutes = remaining_ms / 60_000;
        let seconds = (remaining_ms % 60_000) / 1000;
        Countdown::Running {
            text: format!("{:02}:{:02}", minutes, seconds),
            urgent: minutes < urgent_minutes,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Countdown::Running { text, .. } => text,
            Countdown::Expired => "EXPIRED",
        }
    }
}

/// Opaque sink the manager renders into
pub trait Display {
    fn show_code(&mut self, code: Option<&Code>);
    fn show_countdown(&mut self, countdown: &Countdown);
    /// An empty slice means the empty-state placeholder
    fn show_history(&mut self, rows: &[HistoryRow]);
    fn show_stats(&mut self, stats: Stats);
    fn toast(&mut self, severity: Severity, message: &str);
    /// Copy control label/style override while `active`
    fn copy_feedback(&mut self, active: bool);
    /// Short visual cue after a new code
    fn pulse(&mut self);
}

const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const REVERSE: &str = "\x1b[7m";
const RESET: &str = "\x1b[0m";

/// Line-oriented terminal output.
///
/// The per-second countdown goes to the terminal title so it does not
/// interleave with the prompt; only urgency and expiry changes are printed.
pub struct TerminalDisplay {
    color: bool,
    last_urgent: bool,
}

impl TerminalDisplay {
    pub fn new(color: bool) -> Self {
        Self {
            color,
            last_urgent: false,
        }
    }

    fn paint(&self, style: &str, text: &str) -> String {
        if self.color {
            format!("{}{}{}", style, text, RESET)
        } else {
            text.to_string()
        }
    }

    fn copy_label(active: bool) -> &'static str {
        if active {
            "Copy: copied!"
        } else {
            "Copy: ready"
        }
    }

    fn set_title(&self, title: &str) {
        if self.color {
            print!("\x1b]0;{}\x07", title);
            io::stdout().flush().ok();
        }
    }
}

impl Display for TerminalDisplay {
    fn show_code(&mut self, code: Option<&Code>) {
        match code {
            Some(code) => println!("Code: {}", self.paint(BOLD, code.as_str())),
            None => println!("Code: ----"),
        }
    }

    fn show_countdown(&mut self, countdown: &Countdown) {
        self.set_title(&format!("vcode {}", countdown.text()));
        match countdown {
            Countdown::Running { text, urgent } => {
                if *urgent && !self.last_urgent {
                    println!("{}", self.paint(YELLOW, &format!("Expires in {}", text)));
                }
                self.last_urgent = *urgent;
            }
            Countdown::Expired => {
                println!("{}", self.paint(RED, "Code EXPIRED - press Enter for a new one"));
                self.last_urgent = false;
            }
        }
    }

    fn show_history(&mut self, rows: &[HistoryRow]) {
        if rows.is_empty() {
            println!("History: no codes generated yet");
            return;
        }
        println!("History:");
        for row in rows {
            let status = match row.status {
                Status::Valid => self.paint(GREEN, row.status.as_str()),
                Status::Expired => self.paint(RED, row.status.as_str()),
            };
            println!("  {}  {}  {}", row.code, row.time_label, status);
        }
    }

    fn show_stats(&mut self, stats: Stats) {
        println!("Total: {}  Valid: {}", stats.total, stats.valid);
    }

    fn toast(&mut self, severity: Severity, message: &str) {
        let style = match severity {
            Severity::Success => GREEN,
            Severity::Error => RED,
            Severity::Info => CYAN,
            Severity::Warning => YELLOW,
        };
        let line = format!("[{}] {}", severity.as_str(), message);
        match severity {
            Severity::Error | Severity::Warning => eprintln!("{}", self.paint(style, &line)),
            _ => println!("{}", self.paint(style, &line)),
        }
    }

    fn copy_feedback(&mut self, active: bool) {
        let style = if active { CYAN } else { RESET };
        println!("{}", self.paint(style, Self::copy_label(active)));
    }

    fn pulse(&mut self) {
        if self.color {
            println!("{}", self.paint(REVERSE, "  new code  "));
        }
    }
}
