use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("Email is required")]
    EmailRequired,
    #[error("Enter a valid email")]
    EmailInvalid,
    #[error("Password is required")]
    PasswordRequired,
    #[error("Minimum 6 characters")]
    PasswordTooShort,
    #[error("Please enter a note.")]
    EmptyNote,
}

/// Validate login credentials before they are sent. All failures are
/// reported, one per field at most.
pub fn validate_login(username: &str, password: &str) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if username.trim().is_empty() {
        errors.push(ValidationError::EmailRequired);
    } else if !EMAIL_RE.is_match(username) {
        errors.push(ValidationError::EmailInvalid);
    }

    if password.trim().is_empty() {
        errors.push(ValidationError::PasswordRequired);
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(ValidationError::PasswordTooShort);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Trim note content, rejecting it when nothing is left.
pub fn validate_note(content: &str) -> Result<&str, ValidationError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyNote)
    } else {
        Ok(trimmed)
    }
}
