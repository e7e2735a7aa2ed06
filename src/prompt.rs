use std::io::{self, BufRead, Write};

/// Synchronous yes/no question gating destructive actions
pub trait Confirm {
    fn confirm(&self, question: &str) -> bool;
}

/// Asks on stdout and reads the answer from stdin
pub struct StdinConfirm {
    auto_yes: bool,
}

impl StdinConfirm {
    pub fn new(auto_yes: bool) -> Self {
        Self { auto_yes }
    }
}

impl Confirm for StdinConfirm {
    fn confirm(&self, question: &str) -> bool {
        if self.auto_yes {
            return true;
        }

        print!("{} [y/N]: ", question);
        io::stdout().flush().ok();

        read_answer(&mut io::stdin().lock())
    }
}

/// `y` or `yes` (any case) confirms; anything else, including a read error, declines
fn read_answer(input: &mut impl BufRead) -> bool {
    let mut line = String::new();
    if input.read_line(&mut line).is_ok() {
        let line = line.trim().to_lowercase();
        line == "y" || line == "yes"
    } else {
        false
    }
}
