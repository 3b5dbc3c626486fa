//! Validation Utilities

use std::collections::HashSet;

use uuid::Uuid;
use validator::ValidationErrors;

use super::error::AppError;

/// Maximum length of a user name, login or chat name, in characters.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum length of a message text, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 3000;

/// Convert validation errors to AppError
pub fn validation_error(errors: ValidationErrors) -> AppError {
    let message = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let reason = e.message.clone().map(|m| m.to_string()).unwrap_or_default();
                format!("{}: {}", field, reason)
            })
        })
        .next()
        .unwrap_or_else(|| "Validation failed".into());

    AppError::Validation(message)
}

/// Returns the trimmed value, or a validation error naming `field` when the
/// value is blank or longer than `max` characters.
pub fn require_text<'a>(field: &str, value: &'a str, max: usize) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} can't be empty", field)));
    }
    if trimmed.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(trimmed)
}

/// Like [`require_text`] but keeps the value as given: whitespace counts
/// towards the length and is preserved.
pub fn require_content<'a>(field: &str, value: &'a str, max: usize) -> Result<&'a str, AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} can't be empty", field)));
    }
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(value)
}

/// Treats `None` and whitespace-only strings the same way.
pub fn has_value(value: Option<&str>) -> bool {
    value.map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// Comparison key for case-insensitive uniqueness of names and logins.
pub fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Drops repeated ids, keeping the first occurrence of each.
pub fn unique_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
