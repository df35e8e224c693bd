//! Interactive prompt abstraction.
//!
//! Everything in the core that needs an answer from the user (password
//! entry, y/n confirmations) goes through the `Prompt` trait so it can be
//! driven by a real terminal or by a scripted list of answers.

use std::collections::VecDeque;

use zeroize::Zeroizing;

use crate::errors::{Result, VaultError};

/// Source of interactive answers.
pub trait Prompt {
    /// Ask a question and return the raw answer.
    fn ask(&mut self, message: &str) -> Result<String>;

    /// Ask for a secret. Implementations must not echo or log the answer.
    fn ask_password(&mut self, message: &str) -> Result<Zeroizing<String>>;
}

/// Parse a y/n style answer.
///
/// Returns `Some(true)` for "y", `Some(false)` for "n" and `None` for
/// anything else, ignoring case and surrounding whitespace.
pub fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "y" => Some(true),
        "n" => Some(false),
        _ => None,
    }
}

/// A prompt that replays a fixed list of answers in order.
///
/// Every question consumes one answer, whether it is a plain question or
/// a password. Running out of answers is reported as a cancelled
/// operation, the same way a closed terminal would be.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    asked: Vec<String>,
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

    /// Every question asked so far, in order.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    /// Number of answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self, message: &str) -> Result<String> {
        self.asked.push(message.to_string());
        self.answers.pop_front().ok_or(VaultError::UserCancelled)
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, message: &str) -> Result<String> {
        self.next(message)
    }

    fn ask_password(&mut self, message: &str) -> Result<Zeroizing<String>> {
        self.next(message).map(Zeroizing::new)
    }
}
