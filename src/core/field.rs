//! Field types, field values and the conversions between them

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

/// The declared type of a resource field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Integer,
    Float,
    Boolean,
    Uuid,
    DateTime,
    Date,
}

impl FieldType {
    /// Integer and float fields compare with each other
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float)
    }

    /// Whether two fields of these types can be compared field-to-field
    pub fn is_comparable_with(self, other: FieldType) -> bool {
        self == other || (self.is_numeric() && other.is_numeric())
    }

    /// Parse the raw text of a value into this type
    ///
    /// Integers widen into floats, temporal types accept RFC 3339 as well as
    /// plain `YYYY-MM-DD` dates, and booleans are matched case-insensitively.
    pub fn parse_text(self, raw: &str) -> Option<FieldValue> {
        match self {
            FieldType::Text => Some(FieldValue::String(raw.to_string())),
            FieldType::Integer => raw.trim().parse().ok().map(FieldValue::Integer),
            FieldType::Float => raw.trim().parse().ok().map(FieldValue::Float),
            FieldType::Boolean => {
                let raw = raw.trim();
                if raw.eq_ignore_ascii_case("true") {
                    Some(FieldValue::Boolean(true))
                } else if raw.eq_ignore_ascii_case("false") {
                    Some(FieldValue::Boolean(false))
                } else {
                    None
                }
            }
            FieldType::Uuid => Uuid::parse_str(raw.trim()).ok().map(FieldValue::Uuid),
            FieldType::DateTime => parse_datetime(raw.trim()).map(FieldValue::DateTime),
            FieldType::Date => parse_date(raw.trim()).map(FieldValue::Date),
        }
    }

    /// Convert a JSON payload value into this type, `None` when it does not fit
    pub fn value_from_json(self, value: &Value) -> Option<FieldValue> {
        if value.is_null() {
            return Some(FieldValue::Null);
        }

        match self {
            FieldType::Text => value.as_str().map(|s| FieldValue::String(s.to_string())),
            FieldType::Integer => value.as_i64().map(FieldValue::Integer),
            FieldType::Float => value.as_f64().map(FieldValue::Float),
            FieldType::Boolean => value.as_bool().map(FieldValue::Boolean),
            FieldType::Uuid | FieldType::DateTime | FieldType::Date => {
                value.as_str().and_then(|s| self.parse_text(s))
            }
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::Uuid => "uuid",
            FieldType::DateTime => "datetime",
            FieldType::Date => "date",
        };
        f.write_str(name)
    }
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    parse_date(raw)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    })
}

/// A polymorphic field value that can hold different types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    Null,
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a float, widening integers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get the value as a UUID if possible
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            FieldValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Order two values of compatible kinds
    ///
    /// Integers and floats compare numerically. Null and mismatched kinds are
    /// unordered.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::String(a), FieldValue::String(b)) => Some(a.cmp(b)),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => Some(a.cmp(b)),
            (FieldValue::Uuid(a), FieldValue::Uuid(b)) => Some(a.cmp(b)),
            (FieldValue::DateTime(a), FieldValue::DateTime(b)) => Some(a.cmp(b)),
            (FieldValue::Date(a), FieldValue::Date(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_float(), b.as_float()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            },
        }
    }

    /// Equality with numeric widening; null equals only null
    pub fn matches(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => true,
            (FieldValue::Null, _) | (_, FieldValue::Null) => false,
            _ => self.compare(other) == Some(Ordering::Equal),
        }
    }

    /// The value cast to text, as used by pattern matching
    pub fn to_text(&self) -> Option<String> {
        match self {
            FieldValue::String(s) => Some(s.clone()),
            FieldValue::Integer(i) => Some(i.to_string()),
            FieldValue::Float(f) => Some(f.to_string()),
            FieldValue::Boolean(b) => Some(b.to_string()),
            FieldValue::Uuid(u) => Some(u.to_string()),
            FieldValue::DateTime(dt) => Some(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            FieldValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            FieldValue::Null => None,
        }
    }

    /// Render the value as JSON
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Float(f) => Value::from(*f),
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Null => Value::Null,
            other => other.to_text().map(Value::String).unwrap_or(Value::Null),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Some(text) => f.write_str(&text),
            None => f.write_str("null"),
        }
    }
}

/// Maps a Rust field type onto its declared [`FieldType`]
///
/// Used by the resource declaration macro to build schemas at compile time.
pub trait FieldKind {
    const FIELD_TYPE: FieldType;
}

macro_rules! field_kind {
    ($($rust:ty => $kind:ident),* $(,)?) => {
        $(
            impl FieldKind for $rust {
                const FIELD_TYPE: FieldType = FieldType::$kind;
            }
        )*
    };
}

field_kind!(
    String => Text,
    i64 => Integer,
    i32 => Integer,
    i16 => Integer,
    u32 => Integer,
    f64 => Float,
    f32 => Float,
    bool => Boolean,
    Uuid => Uuid,
    DateTime<Utc> => DateTime,
    NaiveDate => Date,
);

impl<T: FieldKind> FieldKind for Option<T> {
    const FIELD_TYPE: FieldType = T::FIELD_TYPE;
}
