//! Operator confirmation before a write

use crate::common::Result;
use std::io::{BufRead, Stdout, Write};

/// Decides whether a previewed change may be written
pub trait Confirmer {
    /// `diff` is the rendered patch. The caller has already shown it to the
    /// operator, so implementations only use it to decide, not to display.
    fn confirm(&mut self, database: &str, diff: &str) -> Result<bool>;
}

impl<C: Confirmer + ?Sized> Confirmer for &mut C {
    fn confirm(&mut self, database: &str, diff: &str) -> Result<bool> {
        (**self).confirm(database, diff)
    }
}

/// Interactive prompt: only `yes` (or `y`) confirms
pub struct TerminalConfirmer<R, W> {
    input: R,
    output: W,
}

impl TerminalConfirmer<std::io::StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalConfirmer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirmer for TerminalConfirmer<R, W> {
    fn confirm(&mut self, database: &str, _diff: &str) -> Result<bool> {
        write!(
            self.output,
            "Applying to {}, type 'yes' to confirm: ",
            database
        )?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        let answer = answer.trim().to_ascii_lowercase();
        Ok(answer == "yes" || answer == "y")
    }
}

/// Confirms everything (`--yes`)
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

impl Confirmer for AutoConfirm {
    fn confirm(&mut self, _database: &str, _diff: &str) -> Result<bool> {
        Ok(true)
    }
}
