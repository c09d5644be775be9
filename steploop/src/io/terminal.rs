//! Line-oriented terminal prompts.
//!
//! The REPL, the confirmation gate and `run_query` all block on a single line
//! of user input through the [`Prompter`] trait, so tests can script answers.

use std::io::{self, BufRead, StdinLock, Stdout, Write};

use anyhow::{Context, Result};

/// Source of interactive user answers.
pub trait Prompter {
    /// Show `prompt` and read one line without its line terminator.
    ///
    /// Returns `None` once input is exhausted.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Prompter over any reader/writer pair; [`StdioPrompter::stdio`] binds the terminal.
pub struct StdioPrompter<R, W> {
    input: R,
    output: W,
}

impl StdioPrompter<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> StdioPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Prompter for StdioPrompter<R, W> {
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        self.output
            .write_all(prompt.as_bytes())
            .context("write prompt")?;
        self.output.flush().context("flush prompt")?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).context("read input line")?;
        if read == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }
}
