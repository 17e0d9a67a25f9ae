//! Field validators for survey forms.
//!
//! Validators are pure predicates over raw form values. Section controllers
//! feed their results into a [`Validation`] so a submission reports every
//! problem at once instead of stopping at the first.

use serde_json::Value;

/// Read a form value as a number.
///
/// JSON numbers are taken as-is; strings are trimmed and parsed. NaN never
/// counts as a number.
pub fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if n.is_nan() {
        None
    } else {
        Some(n)
    }
}

/// Read a form value as text. Numbers and booleans use their display form.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// True iff the value is numeric and within the inclusive bounds.
pub fn validate_numeric(value: &Value, min: Option<f64>, max: Option<f64>) -> bool {
    let Some(n) = as_number(value) else {
        return false;
    };
    if let Some(min) = min {
        if n < min {
            return false;
        }
    }
    if let Some(max) = max {
        if n > max {
            return false;
        }
    }
    true
}

/// Like [`validate_numeric`], but an empty value passes.
pub fn validate_optional_numeric(value: &Value, min: Option<f64>, max: Option<f64>) -> bool {
    is_blank(value) || validate_numeric(value, min, max)
}

/// True iff the value is a number in `[0, 100]`.
pub fn validate_percentage(value: &Value) -> bool {
    validate_numeric(value, Some(0.0), Some(100.0))
}

/// True iff the value coerces to text of at least `min_length` characters.
pub fn validate_text(value: &Value, min_length: usize) -> bool {
    as_text(value).is_some_and(|s| s.chars().count() >= min_length)
}

/// True iff the value is a number with no fractional part that fits an
/// integer column.
pub fn validate_integer(value: &Value) -> bool {
    as_number(value).is_some_and(|n| n.fract() == 0.0 && n.abs() < i64::MAX as f64)
}

/// Every message produced by a failed check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .messages.join("; "))]
pub struct ValidationErrors {
    pub messages: Vec<String>,
}

/// Accumulates failed checks.
#[derive(Debug, Default)]
pub struct Validation {
    messages: Vec<String>,
}

impl Validation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` unless `ok`. Returns `ok`.
    pub fn check(&mut self, ok: bool, message: impl Into<String>) -> bool {
        if !ok {
            self.messages.push(message.into());
        }
        ok
    }

    pub fn is_ok(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.messages.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                messages: self.messages,
            })
        }
    }
}
