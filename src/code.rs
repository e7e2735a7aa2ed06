//! Verification code value type and symbol sources.
//!
//! A code is 8 symbols drawn from `[A-Z0-9]`, shown as `XXXX-XXXX`.
//! Uniqueness across generations is not checked.

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Symbols a code is drawn from
pub const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of symbols in a code (hyphen excluded)
pub const SYMBOLS: usize = 8;

const GROUP: usize = 4;

static CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{4}-[A-Z0-9]{4}$").expect("static regex"));

/// Source of symbol indices. Injected so tests can script exact codes.
pub trait SymbolSource {
    /// Pick an index in `0..n`
    fn pick(&mut self, n: usize) -> usize;
}

/// Uniform, non-cryptographic thread-local source
pub struct RandomSymbols {
    rng: rand::rngs::ThreadRng,
}

impl RandomSymbols {
    pub fn new() -> Self {
        Self { rng: rand::rng() }
    }
}

impl Default for RandomSymbols {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolSource for RandomSymbols {
    fn pick(&mut self, n: usize) -> usize {
        self.rng.random_range(0..n)
    }
}

/// A formatted `XXXX-XXXX` code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Code(String);

impl Code {
    /// Draw a fresh code from the given source
    pub fn generate(source: &mut dyn SymbolSource) -> Self {
        let mut text = String::with_capacity(SYMBOLS + 1);
        for i in 0..SYMBOLS {
            if i == GROUP {
                text.push('-');
            }
            let idx = source.pick(ALPHABET.len()) % ALPHABET.len();
            text.push(ALPHABET[idx] as char);
        }
        Code(text)
    }

    /// Parse and validate a formatted code
    pub fn parse(s: &str) -> Result<Self> {
        if CODE_RE.is_match(s) {
            Ok(Code(s.to_string()))
        } else {
            Err(anyhow!("invalid code '{}', expected XXXX-XXXX", s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The code without its separator, as placed on the clipboard
    pub fn compact(&self) -> String {
        self.0.replace('-', "")
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Code {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self> {
        Code::parse(&s)
    }
}

impl From<Code> for String {
    fn from(code: Code) -> Self {
        code.0
    }
}
