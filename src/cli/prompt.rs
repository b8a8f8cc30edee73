//! Operator prompts.
//!
//! The session never reads stdin directly; it asks a `Prompter`. The stdin
//! implementation backs the real CLI and `ScriptedPrompter` replays canned
//! answers in tests.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};

/// Answers accepted as "yes" (compared case-insensitively)
pub const AFFIRMATIVE: [&str; 4] = ["yes", "y", "да", "д"];

pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    AFFIRMATIVE.contains(&answer.as_str())
}

/// Source of operator answers
pub trait Prompter {
    /// Ask a free-text question; the answer is returned trimmed
    fn ask(&mut self, question: &str) -> Result<String>;

    /// Ask a yes/no question
    fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{} (yes/no)", question))?;
        Ok(is_affirmative(&answer))
    }
}

impl<P: Prompter + ?Sized> Prompter for &mut P {
    fn ask(&mut self, question: &str) -> Result<String> {
        (**self).ask(question)
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        (**self).confirm(question)
    }
}

/// Reads answers from standard input
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn ask(&mut self, question: &str) -> Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{}: ", question)?;
        stdout.flush()?;

        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;
        if read == 0 {
            bail!("Input closed");
        }

        Ok(line.trim().to_string())
    }
}

/// Replays a fixed list of answers and records the questions asked
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
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

    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, question: &str) -> Result<String> {
        self.asked.push(question.to_string());
        match self.answers.pop_front() {
            Some(answer) => Ok(answer.trim().to_string()),
            None => bail!("No scripted answer for: {}", question),
        }
    }
}
