use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::models::RawRecord;

/// Date-ish shapes a stored document can carry. Stored JSON is classified
/// once here so the normalizer can dispatch with a plain `match`.
#[derive(Debug, Clone, PartialEq)]
pub enum RawDateLike {
    /// `{"seconds": i64, "nanoseconds": u32}`
    Timestamp(DateTime<Utc>),
    /// `{"$date": "<rfc3339>"}`
    NativeDate(DateTime<Utc>),
    Text(String),
    Absent,
    Other,
}

impl RawDateLike {
    pub fn classify(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => RawDateLike::Absent,
            Some(Value::String(s)) => RawDateLike::Text(s.clone()),
            Some(Value::Object(map)) => {
                if let Some(at) = timestamp_from_object(map) {
                    RawDateLike::Timestamp(at)
                } else if let Some(at) = native_date_from_object(map) {
                    RawDateLike::NativeDate(at)
                } else {
                    RawDateLike::Other
                }
            }
            Some(_) => RawDateLike::Other,
        }
    }
}

fn timestamp_from_object(map: &RawRecord) -> Option<DateTime<Utc>> {
    let seconds = map.get("seconds")?.as_i64()?;
    let nanos = match map.get("nanoseconds") {
        None | Some(Value::Null) => 0,
        Some(v) => u32::try_from(v.as_u64()?).ok()?,
    };
    DateTime::from_timestamp(seconds, nanos)
}

fn native_date_from_object(map: &RawRecord) -> Option<DateTime<Utc>> {
    let text = map.get("$date")?.as_str()?;
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Encodes an instant the way the store writes timestamps.
pub fn timestamp_value(at: DateTime<Utc>) -> Value {
    json!({
        "seconds": at.timestamp(),
        "nanoseconds": at.timestamp_subsec_nanos(),
    })
}

/// Loose numeric coercion for stored values: numbers as-is, booleans as
/// 1/0, text via `coerce_text_number`. NaN never comes back.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| !f.is_nan()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => coerce_text_number(s),
        _ => None,
    }
}

/// Numeric coercion for typed text. Surrounding whitespace is ignored and
/// blank text counts as zero.
pub fn coerce_text_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    let parsed = match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust accepts "inf"/"nan" spellings that a number input never produces
        t if t.chars().any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E')) => {
            return None;
        }
        t => t.parse::<f64>().ok()?,
    };
    (!parsed.is_nan()).then_some(parsed)
}
