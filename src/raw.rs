//! Read-only view over one untyped backend record.
//!
//! The backend is loosely typed: amounts arrive as strings or numbers, flags
//! as booleans or `"true"`, timestamps as ISO strings or Unix seconds. All of
//! that tolerance lives here so the adapters read like field mappings.

use crate::errors::AdaptError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> Record<'a> {
    /// Wrap a value that must be a JSON object.
    pub fn new(value: Option<&'a Value>) -> Result<Self, AdaptError> {
        match value {
            None | Some(Value::Null) => Err(AdaptError::NullRecord),
            Some(Value::Object(fields)) => Ok(Record { fields }),
            Some(_) => Err(AdaptError::NotAnObject),
        }
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    /// Nested object, if present.
    pub fn child(&self, key: &str) -> Option<Record<'a>> {
        match self.get(key) {
            Some(Value::Object(fields)) => Some(Record { fields }),
            _ => None,
        }
    }

    /// Array of nested values; anything else is empty.
    pub fn list(&self, key: &str) -> &'a [Value] {
        match self.get(key) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// Non-empty string form of a scalar field. Numbers and booleans are
    /// rendered, empty strings count as absent.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// First non-empty of several fields.
    pub fn first_text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.text(k))
    }

    /// Like [`Record::text`] but empty when absent.
    pub fn text_or_empty(&self, key: &str) -> String {
        self.text(key).unwrap_or_default()
    }

    pub fn require_text(&self, key: &'static str) -> Result<String, AdaptError> {
        self.text(key).ok_or(AdaptError::MissingField(key))
    }

    pub fn flag(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => matches!(s.as_str(), "true" | "1" | "t" | "y" | "Y"),
            Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            _ => false,
        }
    }

    /// Decimal amount. Absent or empty is `None`; a present value that does
    /// not parse is an error.
    pub fn decimal(&self, key: &'static str) -> Result<Option<Decimal>, AdaptError> {
        let invalid = |value: String| AdaptError::InvalidNumber { field: key, value };
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => parse_decimal(s.trim())
                .map(Some)
                .ok_or_else(|| invalid(s.clone())),
            Some(Value::Number(n)) => parse_decimal(&n.to_string())
                .map(Some)
                .ok_or_else(|| invalid(n.to_string())),
            Some(other) => Err(invalid(other.to_string())),
        }
    }

    /// Decimal amount defaulting to zero.
    pub fn decimal_or_zero(&self, key: &'static str) -> Result<Decimal, AdaptError> {
        Ok(self.decimal(key)?.unwrap_or(Decimal::ZERO))
    }

    /// Timestamp: strings are ISO-8601, numbers are Unix seconds.
    pub fn timestamp(&self, key: &'static str) -> Result<Option<DateTime<Utc>>, AdaptError> {
        let invalid = |value: String| AdaptError::InvalidDate { field: key, value };
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => parse_iso(s.trim())
                .map(Some)
                .ok_or_else(|| invalid(s.clone())),
            Some(Value::Number(n)) => {
                let secs = n.as_f64().ok_or_else(|| invalid(n.to_string()))?;
                from_unix_seconds(secs)
                    .map(Some)
                    .ok_or_else(|| invalid(n.to_string()))
            }
            Some(other) => Err(invalid(other.to_string())),
        }
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn from_unix_seconds(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let millis = (secs * 1000.0).round() as i64;
    DateTime::from_timestamp_millis(millis)
}
