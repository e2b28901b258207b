//! Structural validation shared by user and member drafts.
//!
//! # Invariants
//! - Lengths count Unicode scalar values of the trimmed input.
//! - The email pattern is deliberately permissive; passing it does not make
//!   an address deliverable or RFC 5322 compliant.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

const EMAIL_MAX_CHARS: usize = 255;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

/// Caller-fixable rule violation. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("{field} must be between {min} and {max} characters")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
    },
    #[error("{field} must not exceed {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("invalid email format")]
    InvalidEmail,
    #[error("invalid {entity} id: {id}")]
    InvalidId { entity: &'static str, id: i64 },
    #[error("start date must not be after end date")]
    InvalidRange,
}

/// Returns whether `email` matches the local@domain.tld pattern.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub(crate) fn validate_required_text(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required { field });
    }
    let chars = trimmed.chars().count();
    if chars < min || chars > max {
        return Err(ValidationError::Length { field, min, max });
    }
    Ok(())
}

pub(crate) fn validate_email(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required { field: "email" });
    }
    if trimmed.chars().count() > EMAIL_MAX_CHARS {
        return Err(ValidationError::TooLong {
            field: "email",
            max: EMAIL_MAX_CHARS,
        });
    }
    if !is_valid_email(trimmed) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

pub(crate) fn validate_optional_max(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(text) if text.chars().count() > max => Err(ValidationError::TooLong { field, max }),
        _ => Ok(()),
    }
}

pub(crate) fn require_positive_id(entity: &'static str, id: i64) -> Result<(), ValidationError> {
    if id <= 0 {
        return Err(ValidationError::InvalidId { entity, id });
    }
    Ok(())
}

/// Accepts `start == end`; there is no upper bound on the range width.
pub(crate) fn validate_range(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if start > end {
        return Err(ValidationError::InvalidRange);
    }
    Ok(())
}
