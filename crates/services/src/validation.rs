//! Input rules shared by the services. Every helper returns the trimmed value.

use domains::{DomainError, DomainResult};
use once_cell::sync::Lazy;
use regex::Regex;

pub const USERNAME_MIN_CHARS: usize = 2;
pub const USERNAME_MAX_CHARS: usize = 50;
pub const EMAIL_MAX_CHARS: usize = 100;
pub const PASSWORD_MIN_CHARS: usize = 4;
pub const TITLE_MAX_CHARS: usize = 255;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex"));

/// Trims `value` and rejects it when nothing is left.
pub fn required(field: &str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

pub fn username(value: &str) -> DomainResult<String> {
    let name = required("username", value)?;
    let len = name.chars().count();
    if len < USERNAME_MIN_CHARS {
        return Err(DomainError::validation(format!(
            "username must be at least {USERNAME_MIN_CHARS} characters"
        )));
    }
    if len > USERNAME_MAX_CHARS {
        return Err(DomainError::validation(format!(
            "username must be at most {USERNAME_MAX_CHARS} characters"
        )));
    }
    Ok(name)
}

pub fn email(value: &str) -> DomainResult<String> {
    let email = required("email", value)?;
    if email.chars().count() > EMAIL_MAX_CHARS || !EMAIL_RE.is_match(&email) {
        return Err(DomainError::validation("email is not a valid address"));
    }
    Ok(email)
}

/// Passwords are not trimmed; only blank ones are rejected as missing.
pub fn password(value: &str) -> DomainResult<&str> {
    if value.trim().is_empty() {
        return Err(DomainError::validation("password is required"));
    }
    if value.chars().count() < PASSWORD_MIN_CHARS {
        return Err(DomainError::validation(format!(
            "password must be at least {PASSWORD_MIN_CHARS} characters"
        )));
    }
    Ok(value)
}

pub fn title(value: &str) -> DomainResult<String> {
    let title = required("title", value)?;
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(DomainError::validation(format!(
            "title must be at most {TITLE_MAX_CHARS} characters"
        )));
    }
    Ok(title)
}
