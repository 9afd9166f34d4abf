//! Reusable field validators
//!
//! Each builder returns a check over one field value. Checks that do not
//! apply to the value's kind let it pass; `required` is the only check that
//! rejects null.

use crate::core::field::FieldValue;
use regex::Regex;

/// A compiled check over a single field
pub type FieldCheck = Box<dyn Fn(&str, &FieldValue) -> Result<(), String> + Send + Sync>;

/// Validator: field is required (not null)
pub fn required() -> impl Fn(&str, &FieldValue) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &FieldValue| {
        if value.is_null() {
            Err(format!("'{}' is required", field))
        } else {
            Ok(())
        }
    }
}

/// Validator: number must be strictly positive
pub fn positive() -> impl Fn(&str, &FieldValue) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &FieldValue| match value.as_float() {
        Some(num) if num <= 0.0 => Err(format!(
            "'{}' must be positive (value: {})",
            field, value
        )),
        _ => Ok(()),
    }
}

/// Validator: string length (in characters) must be within range
pub fn string_length(
    min: Option<usize>,
    max: Option<usize>,
) -> impl Fn(&str, &FieldValue) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &FieldValue| {
        let Some(s) = value.as_string() else {
            return Ok(());
        };
        let len = s.chars().count();
        if let Some(min) = min.filter(|min| len < *min) {
            return Err(format!(
                "'{}' must be at least {} characters (currently: {})",
                field, min, len
            ));
        }
        if let Some(max) = max.filter(|max| len > *max) {
            return Err(format!(
                "'{}' must not exceed {} characters (currently: {})",
                field, max, len
            ));
        }
        Ok(())
    }
}

/// Validator: number must lie within an inclusive range
pub fn range(
    min: Option<f64>,
    max: Option<f64>,
) -> impl Fn(&str, &FieldValue) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &FieldValue| {
        let Some(num) = value.as_float() else {
            return Ok(());
        };
        if let Some(min) = min.filter(|min| num < *min) {
            return Err(format!("'{}' must be at least {} (value: {})", field, min, value));
        }
        if let Some(max) = max.filter(|max| num > *max) {
            return Err(format!("'{}' must not exceed {} (value: {})", field, max, value));
        }
        Ok(())
    }
}

/// Validator: value must be in allowed list
pub fn in_list(
    allowed: Vec<String>,
) -> impl Fn(&str, &FieldValue) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &FieldValue| {
        let Some(text) = value.to_text() else {
            return Ok(());
        };
        if allowed.contains(&text) {
            Ok(())
        } else {
            Err(format!(
                "'{}' must be one of {:?} (value: {})",
                field, allowed, text
            ))
        }
    }
}

/// Validator: text must match a regular expression
pub fn pattern(regex: Regex) -> impl Fn(&str, &FieldValue) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &FieldValue| match value.as_string() {
        Some(s) if !regex.is_match(s) => Err(format!(
            "'{}' must match pattern {} (value: {})",
            field,
            regex.as_str(),
            s
        )),
        _ => Ok(()),
    }
}
