//! Field-level input validation shared by request and donor models.

use thiserror::Error;

/// Malformed input, reported against the offending field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field}: {reason}")]
pub struct ValidationError {
    /// Field name as exposed to callers (camelCase)
    pub field: String,
    /// Human-readable reason
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trim a required text field, rejecting blanks.
pub(crate) fn required_text(field: &str, value: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    Ok(trimmed.to_string())
}

/// Normalize optional free text: blank becomes `None`, length capped in chars.
pub(crate) fn optional_text(
    field: &str,
    value: Option<&str>,
    max_chars: usize,
) -> ValidationResult<Option<String>> {
    let Some(text) = value.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    if text.chars().count() > max_chars {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_chars),
        ));
    }
    Ok(Some(text.to_string()))
}

/// Comparison key for free-text places: trimmed, Unicode lowercase.
pub(crate) fn fold_case(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Validate a phone number: optional leading `+`, digits with common
/// separators, 7 to 15 digits in total.
pub(crate) fn phone_number(field: &str, value: &str) -> ValidationResult<String> {
    let phone = required_text(field, value)?;
    let body = phone.strip_prefix('+').unwrap_or(&phone);

    let mut digits = 0usize;
    for c in body.chars() {
        match c {
            '0'..='9' => digits += 1,
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return Err(ValidationError::new(field, "contains invalid characters")),
        }
    }

    if !(7..=15).contains(&digits) {
        return Err(ValidationError::new(field, "must contain 7 to 15 digits"));
    }
    Ok(phone)
}
