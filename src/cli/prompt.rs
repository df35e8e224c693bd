//! Terminal-backed `Prompt`.

use dialoguer::{Input, Password};
use zeroize::Zeroizing;

use super::PASSWORD_ENV;
use crate::errors::{Result, VaultError};
use crate::prompt::Prompt;

/// Asks on the terminal via `dialoguer`.
///
/// If `BLUEJAY_PASSWORD` is set and non-empty it answers every password
/// question (CI/CD friendly); confirmations are still asked.
#[derive(Default)]
pub struct TerminalPrompt {
    env_password: Option<Zeroizing<String>>,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        let env_password = std::env::var(PASSWORD_ENV)
            .ok()
            .filter(|pw| !pw.is_empty())
            .map(Zeroizing::new);
        Self { env_password }
    }
}

impl Prompt for TerminalPrompt {
    fn ask(&mut self, message: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(message)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| VaultError::CommandFailed(format!("failed to read answer: {e}")))
    }

    fn ask_password(&mut self, message: &str) -> Result<Zeroizing<String>> {
        if let Some(pw) = &self.env_password {
            return Ok(pw.clone());
        }

        let pw = Password::new()
            .with_prompt(message)
            .allow_empty_password(true)
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
        Ok(Zeroizing::new(pw))
    }
}
