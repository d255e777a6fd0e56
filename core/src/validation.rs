//! Field-level validation at the engine boundary.
//!
//! Validation never blocks computation. A settlement is always computed
//! from whatever values are present; field errors only block export and
//! ledger mutation.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const TAX_ID_DIGITS: usize = 11;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field:   String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field:   field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Join field errors for error messages and logs.
pub fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Push a "required" error when `value` is blank.
pub fn require(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "required"));
    }
}

/// Tax ids are accepted with or without punctuation ("123.456.789-09"),
/// but must carry exactly eleven digits.
pub fn check_tax_id(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "required"));
        return;
    }
    let digits = value.chars().filter(char::is_ascii_digit).count();
    let stray = value
        .chars()
        .any(|c| !(c.is_ascii_digit() || matches!(c, '.' | '-' | ' ')));
    if digits != TAX_ID_DIGITS || stray {
        errors.push(FieldError::new(
            field,
            format!("must contain exactly {TAX_ID_DIGITS} digits"),
        ));
    }
}
