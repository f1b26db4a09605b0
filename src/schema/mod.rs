//! Record schemas and validation
//!
//! Every persisted entity is validated in two places: when a caller hands in
//! untrusted input, and when a document is read back from disk. Both paths go
//! through [`FieldReader`], which walks a `serde_json::Value` and collects an
//! error for every offending field rather than stopping at the first one.

pub mod assignment;
pub mod question;
pub mod student;

pub use assignment::{Assignment, AssignmentUpdate, AssignmentWrite, NewAssignment};
pub use question::{NewQuestion, Question, QuestionUpdate, QuestionWrite};
pub use student::{NewStudent, Student, StudentUpdate, StudentWrite};

use chrono::{DateTime, TimeDelta, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Grade labels accepted for students and assignments
pub const GRADE_LEVELS: &[&str] = &[
    "K", "1st", "2nd", "3rd", "4th", "5th", "6th", "7th", "8th", "9th", "10th", "11th", "12th",
];

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{3,}$").expect("valid username regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub fn is_valid_username(value: &str) -> bool {
    USERNAME_RE.is_match(value)
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

pub fn is_grade_level(value: &str) -> bool {
    GRADE_LEVELS.contains(&value)
}

/// Field path → message for every constraint a value violates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single error attached to the whole value
    pub fn root(message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add("$", message);
        errors
    }

    /// Record an error; the first message reported for a field is kept.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .fields
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "{}", rendered.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Typed accessor over a JSON object that accumulates field errors.
///
/// Required readers report "is required" for a missing or `null` field and
/// return `None`; optional readers treat missing, `null` and blank strings as
/// absent. When the input is not an object every read returns `None` and only
/// the root error is reported.
pub struct FieldReader<'a> {
    object: Option<&'a Map<String, Value>>,
    errors: ValidationErrors,
}

impl<'a> FieldReader<'a> {
    pub fn new(raw: &'a Value) -> Self {
        match raw.as_object() {
            Some(object) => Self {
                object: Some(object),
                errors: ValidationErrors::new(),
            },
            None => Self {
                object: None,
                errors: ValidationErrors::root("expected an object"),
            },
        }
    }

    fn value(&self, field: &str) -> Option<&'a Value> {
        self.object
            .and_then(|object| object.get(field))
            .filter(|value| !value.is_null())
    }

    fn missing(&mut self, field: &str) {
        if self.object.is_some() {
            self.errors.add(field, "is required");
        }
    }

    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    fn string(&mut self, field: &str) -> Option<&'a str> {
        match self.value(field)? {
            Value::String(s) => Some(s.as_str()),
            _ => {
                self.errors.add(field, "must be a string");
                None
            }
        }
    }

    /// Non-blank string, returned verbatim; records trim it when built
    pub fn required_string(&mut self, field: &str) -> Option<String> {
        if self.value(field).is_none() {
            self.missing(field);
            return None;
        }
        let value = self.string(field)?;
        if value.trim().is_empty() {
            self.errors.add(field, "must not be empty");
            return None;
        }
        Some(value.to_string())
    }

    /// String kept verbatim; blank means absent
    pub fn optional_string(&mut self, field: &str) -> Option<String> {
        let value = self.string(field)?;
        if value.trim().is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    pub fn required_uuid(&mut self, field: &str) -> Option<Uuid> {
        if self.value(field).is_none() {
            self.missing(field);
            return None;
        }
        let raw = self.string(field)?;
        match Uuid::parse_str(raw) {
            Ok(id) => Some(id),
            Err(_) => {
                self.errors.add(field, "must be a UUID");
                None
            }
        }
    }

    pub fn optional_timestamp(&mut self, field: &str) -> Option<DateTime<Utc>> {
        let raw = self.string(field)?;
        match DateTime::parse_from_rfc3339(raw) {
            Ok(parsed) => Some(parsed.with_timezone(&Utc)),
            Err(_) => {
                self.errors.add(field, "must be an ISO-8601 timestamp");
                None
            }
        }
    }

    pub fn required_timestamp(&mut self, field: &str) -> Option<DateTime<Utc>> {
        if self.value(field).is_none() {
            self.missing(field);
            return None;
        }
        self.optional_timestamp(field)
    }

    pub fn optional_u32(&mut self, field: &str) -> Option<u32> {
        let value = self.value(field)?;
        match value.as_u64().and_then(|n| u32::try_from(n).ok()) {
            Some(n) => Some(n),
            None => {
                self.errors.add(field, "must be a non-negative integer");
                None
            }
        }
    }

    pub fn optional_f64(&mut self, field: &str) -> Option<f64> {
        let value = self.value(field)?;
        match value.as_f64().filter(|n| n.is_finite()) {
            Some(n) => Some(n),
            None => {
                self.errors.add(field, "must be a number");
                None
            }
        }
    }

    /// List of strings; absent means empty
    pub fn string_list(&mut self, field: &str) -> Vec<String> {
        let Some(value) = self.value(field) else {
            return Vec::new();
        };
        let Some(items) = value.as_array() else {
            self.errors.add(field, "must be a list of strings");
            return Vec::new();
        };

        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match item.as_str() {
                Some(s) => out.push(s.to_string()),
                None => self
                    .errors
                    .add(format!("{}[{}]", field, index), "must be a string"),
            }
        }
        out
    }

    /// Finish reading: run `check` on a fully-read value and return it only if
    /// no field reported an error.
    pub fn finish<T>(
        mut self,
        value: Option<T>,
        check: impl FnOnce(&T, &mut ValidationErrors),
    ) -> Result<T, ValidationErrors> {
        match value {
            Some(value) => {
                check(&value, &mut self.errors);
                self.errors.into_result().map(|_| value)
            }
            None => {
                if self.errors.is_empty() {
                    self.errors.add("$", "incomplete record");
                }
                Err(self.errors)
            }
        }
    }
}

/// Deserialize a closed update shape, reporting failures per field.
///
/// Every field of an update shape is optional, so each entry of the input can
/// be checked on its own to find which ones are unknown or mistyped.
pub(crate) fn parse_update<T: DeserializeOwned>(raw: &Value) -> Result<T, ValidationErrors> {
    let Some(object) = raw.as_object() else {
        return Err(ValidationErrors::root("expected an object"));
    };

    let whole_err = match serde_json::from_value::<T>(raw.clone()) {
        Ok(update) => return Ok(update),
        Err(e) => e,
    };

    let mut errors = ValidationErrors::new();
    for (field, value) in object {
        let mut single = Map::new();
        single.insert(field.clone(), value.clone());
        if let Err(e) = serde_json::from_value::<T>(Value::Object(single)) {
            errors.add(field.as_str(), field_error_message(&e));
        }
    }
    if errors.is_empty() {
        errors.add("$", whole_err.to_string());
    }
    Err(errors)
}

fn field_error_message(err: &serde_json::Error) -> String {
    let message = err.to_string();
    if message.starts_with("unknown field") {
        "is not an updatable field".to_string()
    } else {
        message
    }
}

pub(crate) fn check_not_blank(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "must not be empty");
    }
}

pub(crate) fn check_grade(errors: &mut ValidationErrors, field: &str, value: &str) {
    if !is_grade_level(value) {
        errors.add(field, format!("must be one of {}", GRADE_LEVELS.join(", ")));
    }
}

pub(crate) fn check_optional_email(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
) {
    if let Some(email) = value {
        if !is_valid_email(email) {
            errors.add(field, "must be a valid email address");
        }
    }
}

/// Required strings are stored trimmed.
pub(crate) fn normalize_required(value: &str) -> String {
    value.trim().to_string()
}

/// Blank optional strings are stored as absent.
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Timestamp for a mutation of a record last written at `previous`.
///
/// Always strictly later than `previous`, even within one clock tick.
pub fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + TimeDelta::microseconds(1)
    }
}

/// Tri-state field for update shapes: missing → `None`, `null` → `Some(None)`.
pub(crate) fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
