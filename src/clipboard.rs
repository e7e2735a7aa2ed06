//! Write-only access to the system clipboard through platform helpers.
//!
//! The text is piped into a helper command (`pbcopy`, `clip`, `wl-copy`,
//! `xclip`), or into a command configured by the user.

use anyhow::{anyhow, bail, Context, Result};
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Default time allowed for the helper to exit
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<()>;
}

/// Clipboard backed by an external helper process
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandClipboard {
    /// Use a command line such as `xclip -selection clipboard`
    pub fn from_command_line(command: &str, timeout: Duration) -> Result<Self> {
        let mut words = shell_words::split(command)
            .with_context(|| format!("Invalid clipboard command: {}", command))?;
        if words.is_empty() {
            bail!("Clipboard command must not be empty");
        }
        let program = words.remove(0);
        Ok(Self {
            program,
            args: words,
            timeout,
        })
    }

    /// Pick the helper for the current platform
    pub fn detect(timeout: Duration) -> Self {
        let (program, args): (&str, &[&str]) = if cfg!(target_os = "macos") {
            ("pbcopy", &[])
        } else if cfg!(target_os = "windows") {
            ("clip", &[])
        } else if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            ("wl-copy", &[])
        } else {
            ("xclip", &["-selection", "clipboard"])
        };
        Self {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            timeout,
        }
    }

    pub fn describe(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, shell_words::join(&self.args))
        }
    }
}

impl Clipboard for CommandClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start clipboard helper: {}", self.program))?;

        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| anyhow!("Clipboard helper has no stdin"))?;
            stdin
                .write_all(text.as_bytes())
                .context("Failed to write to clipboard helper")?;
            // stdin dropped here so the helper sees EOF
        }

        match child.wait_timeout(self.timeout)? {
            Some(status) if status.success() => Ok(()),
            Some(status) => Err(anyhow!(
                "Clipboard helper {} exited with {}",
                self.program,
                status
            )),
            None => {
                let _ = child.kill();
                let _ = child.wait();
                Err(anyhow!(
                    "Clipboard helper {} timed out after {}ms",
                    self.program,
                    self.timeout.as_millis()
                ))
            }
        }
    }
}
