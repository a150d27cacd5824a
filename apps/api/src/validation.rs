use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// Field-level validation failures, keyed by field name.
///
/// Ordered so error bodies are stable across requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Folds another set of failures into this one.
    pub fn extend(&mut self, other: ValidationErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    #[cfg(test)]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[cfg(test)]
    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Converts into `Err(self)` when any failure was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Records that a required text field is blank and returns the trimmed value.
    pub fn required(&mut self, field: &str, value: &str) -> String {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.add(field, "This field is required.");
        }
        trimmed.to_string()
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) {
        let len = value.chars().count();
        if len > max {
            self.add(
                field,
                format!("Ensure this field has no more than {max} characters (it has {len})."),
            );
        }
    }

    /// Requires a date to be present, returning it when it is.
    pub fn required_date(&mut self, field: &str, value: Option<NaiveDate>) -> Option<NaiveDate> {
        if value.is_none() {
            self.add(field, "This field is required.");
        }
        value
    }

    /// Enforces `start < end` when both dates are set.
    pub fn date_order(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        if let (Some(start), Some(end)) = (start, end) {
            if start >= end {
                self.add("end_date", "Start date must be before end date.");
            }
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if value.is_empty() {
            return;
        }
        let valid = match value.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !value.chars().any(char::is_whitespace)
                    && !domain.contains('@')
            }
            None => false,
        };
        if !valid {
            self.add(field, "Enter a valid email address.");
        }
    }

    pub fn url(&mut self, field: &str, value: &str) {
        match url::Url::parse(value) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => {}
            _ => self.add(field, "Enter a valid URL."),
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Trims an optional text field, mapping blank input to `None`.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Turns an unchecked write payload into the checked form the store accepts.
///
/// Create, replace and patch all go through the same implementation.
pub trait Validate {
    type Output;

    fn validate(self) -> Result<Self::Output, ValidationErrors>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_date_order_rejects_equal_dates() {
        let mut errors = ValidationErrors::new();
        errors.date_order(Some(date("2020-01-01")), Some(date("2020-01-01")));
        assert!(errors.has("end_date"));
    }

    #[test]
    fn test_date_order_ignores_open_range() {
        let mut errors = ValidationErrors::new();
        errors.date_order(Some(date("2020-01-01")), None);
        errors.date_order(None, Some(date("2020-01-01")));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_required_trims_input() {
        let mut errors = ValidationErrors::new();
        assert_eq!(errors.required("name", "  MIT "), "MIT");
        assert!(errors.is_empty());
        errors.required("degree", "   ");
        assert_eq!(errors.messages("degree"), ["This field is required."]);
    }

    #[test]
    fn test_email_shapes() {
        let mut errors = ValidationErrors::new();
        errors.email("email", "john@example.com");
        assert!(errors.is_empty());
        for bad in ["john", "john@", "@example.com", "john@example", "jo hn@example.com"] {
            let mut errors = ValidationErrors::new();
            errors.email("email", bad);
            assert!(errors.has("email"), "expected {bad} to be rejected");
        }
    }

    #[test]
    fn test_url_requires_http_scheme() {
        let mut errors = ValidationErrors::new();
        errors.url("url", "https://github.com/johndoe");
        assert!(errors.is_empty());
        errors.url("url", "ftp://example.com");
        errors.url("url", "not a url");
        assert_eq!(errors.messages("url").len(), 2);
    }

    #[test]
    fn test_extend_merges_messages() {
        let mut errors = ValidationErrors::single("profile", "missing");
        let mut other = ValidationErrors::single("profile", "again");
        other.add("name", "blank");
        errors.extend(other);
        assert_eq!(errors.messages("profile"), ["missing", "again"]);
        assert!(errors.has("name"));
    }

    #[test]
    fn test_display_joins_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("b", "second");
        errors.add("a", "first");
        assert_eq!(errors.to_string(), "a: first; b: second");
    }
}
