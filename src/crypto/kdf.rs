//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! The salt is a constant embedded in the binary, so one password always
//! yields the same key for every artifact.  Artifacts carry no salt of
//! their own; changing either constant makes every existing artifact
//! unreadable.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::keys::{DerivedKey, KEY_LEN};
use crate::errors::{Result, VaultError};
use crate::prompt::Prompt;

/// Embedded PBKDF2 salt (24 ASCII bytes).
const PBKDF2_SALT: &[u8] = b"bluejayhostbadsaltedinit";

/// PBKDF2 iteration count.
const PBKDF2_ITERATIONS: u32 = 40_000;

/// Number of password + confirmation attempts before giving up.
pub const PASSWORD_RETRIES: u32 = 3;

/// Passwords must be strictly shorter than this many characters.
pub const PASSWORD_MAX_LEN: usize = 1024;

const ENTER_PROMPT: &str = "Enter encryption password";
const VERIFY_PROMPT: &str = "Verify encryption password";

/// Why a password entry was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PasswordRejection {
    #[error("Password can't be empty")]
    Empty,

    #[error("Password can't be longer than {max} chars", max = PASSWORD_MAX_LEN - 1)]
    TooLong,

    #[error("Passwords don't match")]
    Mismatch,
}

/// Check a password and its confirmation.
///
/// Emptiness and length are judged on the first entry, before the two
/// entries are compared.
pub fn check_password(
    password: &str,
    confirmation: &str,
) -> std::result::Result<(), PasswordRejection> {
    if password.is_empty() {
        return Err(PasswordRejection::Empty);
    }
    if password.chars().count() >= PASSWORD_MAX_LEN {
        return Err(PasswordRejection::TooLong);
    }
    if password != confirmation {
        return Err(PasswordRejection::Mismatch);
    }
    Ok(())
}

/// Derive the 32-byte key for `password`.
pub fn derive_key(password: &[u8]) -> DerivedKey {
    let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(password, PBKDF2_SALT, PBKDF2_ITERATIONS, &mut bytes[..]);
    DerivedKey::new(*bytes)
}

/// Obtain a password interactively and derive the operation key from it.
///
/// Asks for the password and its confirmation up to `PASSWORD_RETRIES`
/// times.  Fails with `NoKey` once the budget is spent.  Errors from the
/// prompt itself (e.g. a closed terminal) are returned as-is.
pub fn derive_interactive(prompt: &mut dyn Prompt) -> Result<DerivedKey> {
    for attempt in 1..=PASSWORD_RETRIES {
        let password = prompt.ask_password(ENTER_PROMPT)?;
        let confirmation = prompt.ask_password(VERIFY_PROMPT)?;

        match check_password(&password, &confirmation) {
            Ok(()) => {
                tracing::debug!("password accepted on attempt {attempt}");
                return Ok(derive_key(password.as_bytes()));
            }
            Err(rejection) => {
                tracing::warn!(
                    "{rejection} ({} attempt(s) left)",
                    PASSWORD_RETRIES - attempt
                );
            }
        }
    }

    tracing::error!("Failed to get encryption key");
    Err(VaultError::NoKey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompt;

    #[test]
    fn check_password_distinguishes_rejections() {
        assert_eq!(check_password("", ""), Err(PasswordRejection::Empty));
        let long = "x".repeat(PASSWORD_MAX_LEN);
        assert_eq!(check_password(&long, &long), Err(PasswordRejection::TooLong));
        assert_eq!(check_password("abc", "abd"), Err(PasswordRejection::Mismatch));
        assert_eq!(check_password("abc", "abc"), Ok(()));
    }

    #[test]
    fn password_just_under_limit_is_accepted() {
        let pw = "x".repeat(PASSWORD_MAX_LEN - 1);
        assert!(check_password(&pw, &pw).is_ok());
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = derive_key(b"hunter2");
        let b = derive_key(b"hunter2");
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_passwords_give_different_keys() {
        let a = derive_key(b"hunter2");
        let b = derive_key(b"hunter3");
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn interactive_accepts_matching_entries() {
        let mut prompt = ScriptedPrompt::new(["secret", "secret"]);
        let key = derive_interactive(&mut prompt).unwrap();
        assert_eq!(key.as_bytes(), derive_key(b"secret").as_bytes());
        assert_eq!(prompt.asked(), [ENTER_PROMPT, VERIFY_PROMPT]);
    }

    #[test]
    fn interactive_retries_after_mismatch() {
        let mut prompt = ScriptedPrompt::new(["one", "two", "", "", "ok", "ok"]);
        let key = derive_interactive(&mut prompt).unwrap();
        assert_eq!(key.as_bytes(), derive_key(b"ok").as_bytes());
        assert_eq!(prompt.remaining(), 0);
    }

    #[test]
    fn interactive_gives_up_after_three_failures() {
        let mut prompt = ScriptedPrompt::new(["a", "b", "c", "d", "e", "f", "g", "g"]);
        let result = derive_interactive(&mut prompt);
        assert!(matches!(result, Err(VaultError::NoKey)));
        // The fourth pair is never asked for.
        assert_eq!(prompt.remaining(), 2);
    }

    #[test]
    fn interactive_propagates_prompt_failure() {
        let mut prompt = ScriptedPrompt::new(["only-one"]);
        assert!(matches!(
            derive_interactive(&mut prompt),
            Err(VaultError::UserCancelled)
        ));
    }
}
