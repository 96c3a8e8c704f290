//! User prompts
//!
//! Git runs hooks with stdin attached to a pipe or `/dev/null`, so the
//! terminal prompt talks to the controlling terminal directly.

use anyhow::{bail, Context, Result};
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use tracing::debug;

/// How many times a question is repeated on invalid input.
const MAX_ATTEMPTS: usize = 3;

/// Asks the user to pick one of a set of options.
pub trait Prompt {
    /// Show `message` with `hint` and the slash separated `short_options`
    /// (e.g. `"Y/a/n/d"`; the uppercase option is the default).
    ///
    /// Returns the chosen short option in lowercase.
    fn show_prompt_options(
        &mut self,
        message: &str,
        hint: &str,
        short_options: &str,
        long_options: &[&str],
    ) -> Result<String>;

    /// Whether answers can be obtained at all.
    fn is_interactive(&self) -> bool {
        true
    }
}

/// Options split from `"Y/a/n/d"`.
fn split_options(short_options: &str) -> Vec<&str> {
    short_options.split('/').filter(|o| !o.is_empty()).collect()
}

/// The uppercase option, lowercased.
pub fn default_answer(short_options: &str) -> Option<String> {
    split_options(short_options)
        .into_iter()
        .find(|o| o.to_lowercase() != *o)
        .map(str::to_lowercase)
}

/// Normalize `answer` against the options, applying the default on empty input.
pub fn match_answer(answer: &str, short_options: &str) -> Option<String> {
    let answer = answer.trim();
    if answer.is_empty() {
        return default_answer(short_options);
    }

    let lowered = answer.to_lowercase();
    split_options(short_options)
        .into_iter()
        .any(|o| o.to_lowercase() == lowered)
        .then_some(lowered)
}

/// Prompt on the controlling terminal (`/dev/tty`).
pub struct TerminalPrompt {
    input: BufReader<File>,
    output: File,
}

impl TerminalPrompt {
    /// Open the controlling terminal, failing when there is none.
    pub fn open() -> Result<Self> {
        let input = File::open("/dev/tty").context("No controlling terminal to show prompt")?;
        let output = OpenOptions::new()
            .write(true)
            .open("/dev/tty")
            .context("No controlling terminal to show prompt")?;
        Ok(Self {
            input: BufReader::new(input),
            output,
        })
    }
}

impl Prompt for TerminalPrompt {
    fn show_prompt_options(
        &mut self,
        message: &str,
        hint: &str,
        short_options: &str,
        _long_options: &[&str],
    ) -> Result<String> {
        let question = format!("{message} {hint} [{short_options}]: ");

        for attempt in 1..=MAX_ATTEMPTS {
            write!(self.output, "{question}")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                bail!("Could not read from terminal");
            }

            if let Some(answer) = match_answer(&line, short_options) {
                return Ok(answer);
            }

            if attempt < MAX_ATTEMPTS {
                writeln!(
                    self.output,
                    "Answer '{}' not in '{short_options}', try again ...",
                    line.trim()
                )?;
            }
        }

        match default_answer(short_options) {
            Some(answer) => {
                writeln!(
                    self.output,
                    "Could not get answer in '{short_options}', taking default '{answer}'"
                )?;
                Ok(answer)
            }
            None => bail!("No valid answer in '{short_options}' after {MAX_ATTEMPTS} attempts"),
        }
    }
}

/// Prompt for non-interactive runs; every question fails.
#[derive(Debug, Default)]
pub struct NoPrompt;

impl Prompt for NoPrompt {
    fn show_prompt_options(
        &mut self,
        message: &str,
        _hint: &str,
        _short_options: &str,
        _long_options: &[&str],
    ) -> Result<String> {
        debug!("Non-interactive, not asking: {message}");
        bail!("Prompt not available in non-interactive mode")
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Prompt answering from a fixed queue, recording every question asked.
///
/// Used by tests and by callers that already know the answers.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    pub answers: VecDeque<String>,
    pub asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn show_prompt_options(
        &mut self,
        message: &str,
        _hint: &str,
        short_options: &str,
        _long_options: &[&str],
    ) -> Result<String> {
        self.asked.push(message.to_string());
        let Some(answer) = self.answers.pop_front() else {
            bail!("No scripted answer left for: {message}");
        };
        match match_answer(&answer, short_options) {
            Some(answer) => Ok(answer),
            None => bail!("Scripted answer '{answer}' not in '{short_options}'"),
        }
    }
}

/// Terminal prompt when possible, otherwise [`NoPrompt`].
pub fn create_prompt(non_interactive: bool) -> Box<dyn Prompt> {
    if non_interactive {
        return Box::new(NoPrompt);
    }
    match TerminalPrompt::open() {
        Ok(prompt) => Box::new(prompt),
        Err(e) => {
            debug!("Falling back to non-interactive prompt: {e:#}");
            Box::new(NoPrompt)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_answer_is_uppercase_option() {
        assert_eq!(default_answer("Y/a/n/d"), Some("y".to_string()));
        assert_eq!(default_answer("y/N"), Some("n".to_string()));
        assert_eq!(default_answer("y/n"), None);
    }

    #[test]
    fn test_match_answer() {
        assert_eq!(match_answer("", "Y/a/n/d"), Some("y".to_string()));
        assert_eq!(match_answer("A\n", "Y/a/n/d"), Some("a".to_string()));
        assert_eq!(match_answer("d", "Y/a/n/d"), Some("d".to_string()));
        assert_eq!(match_answer("maybe", "Y/a/n/d"), None);
        assert_eq!(match_answer("", "y/n"), None);
    }

    #[test]
    fn test_scripted_prompt_records_questions() {
        let mut prompt = ScriptedPrompt::new(["N", ""]);

        let first = prompt
            .show_prompt_options("First?", "(yes, No)", "y/N", &["Yes", "No"])
            .unwrap();
        let second = prompt
            .show_prompt_options("Second?", "(Yes, all, no, disable)", "Y/a/n/d", &[])
            .unwrap();

        assert_eq!(first, "n");
        assert_eq!(second, "y");
        assert_eq!(prompt.asked, vec!["First?", "Second?"]);
        assert!(prompt
            .show_prompt_options("Third?", "", "y/N", &[])
            .is_err());
    }

    #[test]
    fn test_no_prompt_is_not_interactive() {
        let mut prompt = NoPrompt;
        assert!(!prompt.is_interactive());
        assert!(prompt.show_prompt_options("Q?", "", "y/N", &[]).is_err());
    }
}
