//! Stored values, cast values and their display primitives.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::entity::Entity;
use crate::property::Property;

/// How many levels of entity-valued caption properties are followed before
/// a nested entity is rendered by its id.
pub const MAX_CAPTION_DEPTH: usize = 3;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// A value as held by an [`Entity`]: the raw string, or a resolved nested entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Entity(Arc<Entity>),
}

impl Value {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Entity(_) => None,
        }
    }

    #[must_use]
    pub fn as_entity(&self) -> Option<&Arc<Entity>> {
        match self {
            Self::Entity(e) => Some(e),
            Self::String(_) => None,
        }
    }

    /// Raw string for strings, the id for nested entities.
    #[must_use]
    pub fn raw(&self) -> &str {
        match self {
            Self::String(s) => s,
            Self::Entity(e) => e.id(),
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, Self::String(s) if s.is_empty())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Arc<Entity>> for Value {
    fn from(entity: Arc<Entity>) -> Self {
        Self::Entity(entity)
    }
}

/// A value after its property type's casting rule was applied.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    String(String),
    Number(f64),
    Date(DateValue),
    Entity(Arc<Entity>),
}

impl TypedValue {
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_date(&self) -> Option<&DateValue> {
        match self {
            Self::Date(d) => Some(d),
            _ => None,
        }
    }
}

/// A parsed date. Garbage input yields [`DateValue::INVALID`] rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateValue(Option<DateTime<Utc>>);

impl DateValue {
    pub const INVALID: Self = Self(None);

    /// Parses RFC 3339 timestamps, naive date-times, plain dates and
    /// year-month values. Naive inputs are taken as UTC.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Self(Some(dt.with_timezone(&Utc)));
        }
        for format in DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return Self(Some(naive.and_utc()));
            }
        }
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d"));
        match date {
            Ok(date) => Self(date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc())),
            Err(_) => Self::INVALID,
        }
    }

    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(Some(dt))
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    #[must_use]
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        self.0
    }

    /// ISO-8601 with millisecond precision, e.g. `1984-05-01T00:00:00.000Z`.
    #[must_use]
    pub fn to_iso_string(&self) -> Option<String> {
        self.0
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

/// The display form of a value: a string or a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Primitive {
    String(String),
    Number(f64),
}

impl Primitive {
    #[must_use]
    pub fn empty() -> Self {
        Self::String(String::new())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::String(s) if s.is_empty())
    }
}

impl Default for Primitive {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Self::Number(n) => {
                let magnitude = n.abs();
                if magnitude >= 1e21 || (magnitude > 0.0 && magnitude < 1e-6) {
                    // Exponent form with an explicit sign, e.g. `1e+21`, `1.5e-7`.
                    let formatted = format!("{n:e}");
                    match formatted.split_once('e') {
                        Some((mantissa, exp)) if !exp.starts_with('-') => {
                            write!(f, "{mantissa}e+{exp}")
                        }
                        _ => f.write_str(&formatted),
                    }
                } else {
                    write!(f, "{n}")
                }
            }
        }
    }
}

/// Reduces a value of `property` to its display primitive.
///
/// Absent and empty values render as `""`. Dates render as ISO-8601 (invalid
/// dates as `""`), nested entities as their caption. Never fails.
#[must_use]
pub fn get_primitive_value(property: &Property, value: Option<&Value>) -> Primitive {
    primitive_at_depth(property, value, 0)
}

pub(crate) fn primitive_at_depth(
    property: &Property,
    value: Option<&Value>,
    depth: usize,
) -> Primitive {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return Primitive::empty();
    };
    match property.cast(value) {
        TypedValue::String(s) => Primitive::String(s),
        TypedValue::Number(n) => Primitive::Number(n),
        TypedValue::Date(date) => Primitive::String(date.to_iso_string().unwrap_or_default()),
        TypedValue::Entity(entity) => Primitive::String(entity.caption_at_depth(depth + 1)),
    }
}

/// Parses the leading decimal literal of `raw`, ignoring trailing garbage.
///
/// Returns `NaN` when no literal is present.
#[must_use]
pub fn parse_float(raw: &str) -> f64 {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        return if bytes[0] == b'-' {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        let frac_digits = frac_end - end - 1;
        if digits + frac_digits > 0 {
            end = frac_end;
            digits += frac_digits;
        }
    }
    if digits == 0 {
        return f64::NAN;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().unwrap_or(f64::NAN)
}
