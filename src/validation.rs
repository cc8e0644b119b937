//! Payload validation.
//!
//! Request bodies arrive as untyped JSON. A [`Payload`] walks the fields a
//! schema cares about and records one [`ValidationError`] per violated field,
//! so a single response can describe every problem with the input.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use validator::{ValidationError, ValidationErrors};

use crate::models::object_id::ObjectId;

/// Machine-readable violation kinds reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    Required,
    InvalidType,
    InvalidEnum,
    TooSmall,
    TooBig,
    NotInteger,
    InvalidFormat,
    InvalidDate,
    InvalidJson,
}

impl ViolationKind {
    pub fn code(self) -> &'static str {
        match self {
            ViolationKind::Required => "required",
            ViolationKind::InvalidType => "invalid_type",
            ViolationKind::InvalidEnum => "invalid_enum",
            ViolationKind::TooSmall => "too_small",
            ViolationKind::TooBig => "too_big",
            ViolationKind::NotInteger => "not_integer",
            ViolationKind::InvalidFormat => "invalid_format",
            ViolationKind::InvalidDate => "invalid_date",
            ViolationKind::InvalidJson => "invalid_json",
        }
    }
}

/// Whether a field must be present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

/// Build a violation carrying its message and, when known, the rejected value.
pub fn violation(kind: ViolationKind, message: impl Into<String>, value: Option<&Value>) -> ValidationError {
    let mut error = ValidationError::new(kind.code());
    error.message = Some(Cow::Owned(message.into()));
    if let Some(value) = value {
        error.add_param(Cow::Borrowed("value"), value);
    }
    error
}

/// Single-field failure, for inputs that are not part of a JSON body.
pub fn single(field: &'static str, error: ValidationError) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(field, error);
    errors
}

/// Validate an identifier taken from the request path.
pub fn path_id(field: &'static str, raw: &str) -> Result<ObjectId, ValidationErrors> {
    ObjectId::parse(raw).map_err(|_| {
        single(
            field,
            violation(
                ViolationKind::InvalidFormat,
                "Invalid book ID format",
                Some(&Value::String(raw.to_string())),
            ),
        )
    })
}

/// Field-by-field reader over a JSON object body
pub struct Payload<'a> {
    fields: &'a Map<String, Value>,
    errors: ValidationErrors,
}

impl<'a> Payload<'a> {
    /// Wrap a request body. Anything other than a JSON object is rejected outright.
    pub fn new(body: &'a Value) -> Result<Self, ValidationErrors> {
        match body {
            Value::Object(fields) => Ok(Self {
                fields,
                errors: ValidationErrors::new(),
            }),
            other => Err(single(
                "body",
                violation(
                    ViolationKind::InvalidType,
                    "Request body must be a JSON object",
                    Some(other),
                ),
            )),
        }
    }

    /// Errors collected so far
    pub fn into_errors(self) -> ValidationErrors {
        self.errors
    }

    fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|value| !value.is_null())
    }

    fn reject(&mut self, field: &'static str, error: ValidationError) {
        self.errors.add(field, error);
    }

    fn present(&mut self, field: &'static str, label: &str, presence: Presence) -> Option<Value> {
        match self.get(field).cloned() {
            Some(value) => Some(value),
            None => {
                if presence == Presence::Required {
                    self.reject(
                        field,
                        violation(ViolationKind::Required, format!("{} is required", label), None),
                    );
                }
                None
            }
        }
    }

    /// Non-empty text, trimmed
    pub fn text(&mut self, field: &'static str, label: &str, presence: Presence) -> Option<String> {
        let value = self.present(field, label, presence)?;
        match value.as_str().map(str::trim) {
            Some("") => {
                let mut error = violation(
                    ViolationKind::TooSmall,
                    format!("{} cannot be empty", label),
                    Some(&value),
                );
                error.add_param(Cow::Borrowed("min"), &1);
                self.reject(field, error);
                None
            }
            Some(text) => Some(text.to_string()),
            None => {
                self.reject(
                    field,
                    violation(
                        ViolationKind::InvalidType,
                        format!("{} must be a string", label),
                        Some(&value),
                    ),
                );
                None
            }
        }
    }

    /// Optional text that may be empty
    pub fn free_text(&mut self, field: &'static str, label: &str) -> Option<String> {
        let value = self.present(field, label, Presence::Optional)?;
        match value.as_str() {
            Some(text) => Some(text.trim().to_string()),
            None => {
                self.reject(
                    field,
                    violation(
                        ViolationKind::InvalidType,
                        format!("{} must be a string", label),
                        Some(&value),
                    ),
                );
                None
            }
        }
    }

    /// One of a fixed set of literals, parsed into `T`
    pub fn one_of<T>(
        &mut self,
        field: &'static str,
        label: &str,
        presence: Presence,
        allowed: &[&str],
    ) -> Option<T>
    where
        T: for<'s> TryFrom<&'s str>,
    {
        let value = self.present(field, label, presence)?;
        let parsed = value.as_str().and_then(|text| T::try_from(text).ok());
        if parsed.is_none() {
            self.reject(
                field,
                violation(
                    ViolationKind::InvalidEnum,
                    format!("{} must be one of: {}", label, allowed.join(", ")),
                    Some(&value),
                ),
            );
        }
        parsed
    }

    /// Whole number within `[min, i32::MAX]`
    pub fn integer(
        &mut self,
        field: &'static str,
        label: &str,
        presence: Presence,
        min: i64,
        min_message: &str,
    ) -> Option<i32> {
        let value = self.present(field, label, presence)?;
        let number = match value.as_number() {
            Some(number) => number,
            None => {
                self.reject(
                    field,
                    violation(
                        ViolationKind::InvalidType,
                        format!("{} must be a number", label),
                        Some(&value),
                    ),
                );
                return None;
            }
        };

        let Some(whole) = number.as_f64().filter(|f| f.is_finite() && f.fract() == 0.0) else {
            self.reject(
                field,
                violation(
                    ViolationKind::NotInteger,
                    format!("{} must be an integer", label),
                    Some(&value),
                ),
            );
            return None;
        };

        // Bounds are compared in f64, where every i32 is exact.
        if whole < min as f64 {
            let mut error = violation(ViolationKind::TooSmall, min_message, Some(&value));
            error.add_param(Cow::Borrowed("min"), &min);
            self.reject(field, error);
            return None;
        }

        if whole > f64::from(i32::MAX) {
            let mut error = violation(
                ViolationKind::TooBig,
                format!("{} is too large", label),
                Some(&value),
            );
            error.add_param(Cow::Borrowed("max"), &i32::MAX);
            self.reject(field, error);
            return None;
        }

        Some(whole as i32)
    }

    pub fn boolean(&mut self, field: &'static str, label: &str) -> Option<bool> {
        let value = self.present(field, label, Presence::Optional)?;
        let flag = value.as_bool();
        if flag.is_none() {
            self.reject(
                field,
                violation(
                    ViolationKind::InvalidType,
                    format!("{} must be a boolean", label),
                    Some(&value),
                ),
            );
        }
        flag
    }

    /// Identifier given as a JSON string
    pub fn object_id(&mut self, field: &'static str, label: &str, presence: Presence) -> Option<ObjectId> {
        let value = self.present(field, label, presence)?;
        let id = value.as_str().and_then(|text| ObjectId::parse(text).ok());
        if id.is_none() {
            self.reject(
                field,
                violation(
                    ViolationKind::InvalidFormat,
                    format!("Invalid {} ID format", label.to_lowercase()),
                    Some(&value),
                ),
            );
        }
        id
    }

    /// Calendar date given as text
    pub fn date(&mut self, field: &'static str, label: &str, presence: Presence) -> Option<DateTime<Utc>> {
        let value = self.present(field, label, presence)?;
        let date = value.as_str().and_then(parse_date);
        if date.is_none() {
            self.reject(
                field,
                violation(
                    ViolationKind::InvalidDate,
                    format!("A valid {} is required", label.to_lowercase()),
                    Some(&value),
                ),
            );
        }
        date
    }
}

/// Parse the date forms clients send: RFC 3339, RFC 2822, bare dates and
/// offset-less date-times (taken as UTC).
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(text) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(date.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    fn codes(errors: &ValidationErrors) -> Vec<(String, String)> {
        let mut codes: Vec<(String, String)> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter()
                    .map(move |e| (field.to_string(), e.code.to_string()))
                    .collect::<Vec<_>>()
            })
            .collect();
        codes.sort();
        codes
    }

    #[test]
    fn test_non_object_body_is_rejected() {
        let body = json!([1, 2, 3]);
        let errors = Payload::new(&body).err().unwrap();
        assert_eq!(codes(&errors), vec![("body".to_string(), "invalid_type".to_string())]);
    }

    #[test]
    fn test_collects_every_violation() {
        let body = json!({ "title": "", "count": "three", "flag": "yes" });
        let mut payload = Payload::new(&body).unwrap();
        assert!(payload.text("title", "Title", Presence::Required).is_none());
        assert!(payload.text("author", "Author", Presence::Required).is_none());
        assert!(payload.integer("count", "Count", Presence::Required, 0, "too small").is_none());
        assert!(payload.boolean("flag", "Flag").is_none());

        let errors = payload.into_errors();
        assert_eq!(
            codes(&errors),
            vec![
                ("author".to_string(), "required".to_string()),
                ("count".to_string(), "invalid_type".to_string()),
                ("flag".to_string(), "invalid_type".to_string()),
                ("title".to_string(), "too_small".to_string()),
            ]
        );
    }

    #[test]
    fn test_null_counts_as_absent() {
        let body = json!({ "title": null });
        let mut payload = Payload::new(&body).unwrap();
        assert!(payload.text("title", "Title", Presence::Optional).is_none());
        assert!(payload.into_errors().is_empty());
    }

    #[test]
    fn test_integer_rules() {
        let body = json!({ "a": 2.0, "b": 2.5, "c": -1, "d": 5_000_000_000i64 });
        let mut payload = Payload::new(&body).unwrap();
        assert_eq!(payload.integer("a", "A", Presence::Required, 0, "min"), Some(2));
        assert_eq!(payload.integer("b", "B", Presence::Required, 0, "min"), None);
        assert_eq!(payload.integer("c", "C", Presence::Required, 0, "C must be positive"), None);
        assert_eq!(payload.integer("d", "D", Presence::Required, 0, "min"), None);

        let errors = payload.into_errors();
        let field_errors = errors.field_errors();
        assert_eq!(field_errors["b"][0].code, "not_integer");
        let too_small = &field_errors["c"][0];
        assert_eq!(too_small.code, "too_small");
        assert_eq!(too_small.params["min"], json!(0));
        assert_eq!(too_small.params["value"], json!(-1));
        assert_eq!(too_small.message.as_deref(), Some("C must be positive"));
        assert_eq!(field_errors["d"][0].code, "too_big");
    }

    #[test]
    fn test_whole_numbers_beyond_i64_are_out_of_range() {
        let body = json!({ "a": 1e19, "b": 10_000_000_000_000_000_000u64, "c": -1e19 });
        let mut payload = Payload::new(&body).unwrap();
        assert_eq!(payload.integer("a", "A", Presence::Required, 0, "min"), None);
        assert_eq!(payload.integer("b", "B", Presence::Required, 0, "min"), None);
        assert_eq!(payload.integer("c", "C", Presence::Required, 0, "min"), None);

        let errors = payload.into_errors();
        let field_errors = errors.field_errors();
        assert_eq!(field_errors["a"][0].code, "too_big");
        assert_eq!(field_errors["a"][0].params["max"], json!(i32::MAX));
        assert_eq!(field_errors["b"][0].code, "too_big");
        assert_eq!(field_errors["c"][0].code, "too_small");
    }

    #[test]
    fn test_text_is_trimmed() {
        let body = json!({ "title": "  Dune  ", "description": "" });
        let mut payload = Payload::new(&body).unwrap();
        assert_eq!(payload.text("title", "Title", Presence::Required).as_deref(), Some("Dune"));
        assert_eq!(payload.free_text("description", "Description").as_deref(), Some(""));
    }

    #[test]
    fn test_path_id() {
        assert!(path_id("bookId", "64b7f0c2a1e4d3f2b1c0a9e8").is_ok());
        let errors = path_id("bookId", "123").err().unwrap();
        let field_errors = errors.field_errors();
        assert_eq!(field_errors["bookId"][0].code, "invalid_format");
        assert_eq!(field_errors["bookId"][0].params["value"], json!("123"));
    }

    #[test]
    fn test_parse_date_forms() {
        let bare = parse_date("2025-01-01").unwrap();
        assert_eq!((bare.year(), bare.month(), bare.day(), bare.hour()), (2025, 1, 1, 0));

        let offset = parse_date("2025-01-01T10:00:00+02:00").unwrap();
        assert_eq!(offset.hour(), 8);

        assert!(parse_date("2025-01-01T10:00:00").is_some());
        assert!(parse_date("2025-01-01T10:00:00.250").is_some());
        assert!(parse_date("Wed, 01 Jan 2025 10:00:00 +0000").is_some());
        assert!(parse_date("not a date").is_none());
        assert!(parse_date("2025-13-01").is_none());
    }
}
