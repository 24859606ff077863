use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::Value;

use crate::models::{CreatedAt, Listing, RawRecord};
use crate::raw::{RawDateLike, coerce_number};

/// Keys consulted in order; the first present, non-null one wins.
const START_DATE_KEYS: &[&str] = &["startDate", "eventStart"];
const END_DATE_KEYS: &[&str] = &["endDate", "eventEnd"];

static CALENDAR_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date pattern"));

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];

const NAIVE_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%Y.%m.%d",
    "%B %d, %Y",
    "%b %d, %Y",
];

/// True for ASCII `YYYY-MM-DD` shaped text.
pub fn is_calendar_date(text: &str) -> bool {
    CALENDAR_DATE.is_match(text)
}

pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// Reduces any date-ish value to a `YYYY-MM-DD` string, or `None` when it
/// cannot be read as a date.
pub fn normalize_date(value: &RawDateLike) -> Option<String> {
    match value {
        RawDateLike::Absent | RawDateLike::Other => None,
        RawDateLike::Timestamp(at) | RawDateLike::NativeDate(at) => Some(format_date(*at)),
        RawDateLike::Text(text) => normalize_date_text(text),
    }
}

pub fn normalize_date_value(value: Option<&Value>) -> Option<String> {
    normalize_date(&RawDateLike::classify(value))
}

fn normalize_date_text(text: &str) -> Option<String> {
    if is_calendar_date(text) {
        return Some(text.to_string());
    }
    parse_loose_date(text.trim()).map(|d| d.format("%Y-%m-%d").to_string())
}

fn parse_loose_date(text: &str) -> Option<NaiveDate> {
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return Some(d);
        }
    }
    None
}

fn first_present<'a>(raw: &'a RawRecord, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find(|value| !value.is_null())
}

fn text_field(raw: &RawRecord, key: &str) -> String {
    match raw.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn wage_field(raw: &RawRecord) -> f64 {
    match raw.get("wage") {
        None | Some(Value::Null) => 0.0,
        Some(value) => coerce_number(value).unwrap_or_else(|| {
            tracing::debug!(?value, "wage is not numeric, using 0");
            0.0
        }),
    }
}

fn created_at_field(raw: &RawRecord) -> Option<CreatedAt> {
    let value = raw.get("createdAt")?;
    match RawDateLike::classify(Some(value)) {
        RawDateLike::Absent => None,
        RawDateLike::Timestamp(at) | RawDateLike::NativeDate(at) => Some(CreatedAt::Instant(at)),
        RawDateLike::Text(_) | RawDateLike::Other => Some(CreatedAt::Raw(value.clone())),
    }
}

/// Builds the canonical listing for one stored document. Every field falls
/// back to a default instead of failing, so one bad document never hides
/// the others.
pub fn normalize_listing(raw: &RawRecord, id: &str) -> Listing {
    let start_date = normalize_date_value(first_present(raw, START_DATE_KEYS));
    let end_date = normalize_date_value(first_present(raw, END_DATE_KEYS));

    Listing {
        id: id.to_string(),
        title: text_field(raw, "title"),
        description: text_field(raw, "description"),
        keyword: text_field(raw, "keyword"),
        wage: wage_field(raw),
        start_date,
        end_date,
        created_at: created_at_field(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    fn text(s: &str) -> RawDateLike {
        RawDateLike::Text(s.to_string())
    }

    #[test]
    fn test_normalize_date_fast_path() {
        assert_eq!(normalize_date(&text("2025-09-20")), Some("2025-09-20".to_string()));
        // shape match is enough, no reparse
        assert_eq!(normalize_date(&text("2025-13-45")), Some("2025-13-45".to_string()));
    }

    #[test]
    fn test_normalize_date_rejects_garbage() {
        assert_eq!(normalize_date(&text("not-a-date")), None);
        assert_eq!(normalize_date(&text("")), None);
        assert_eq!(normalize_date(&RawDateLike::Absent), None);
        assert_eq!(normalize_date(&RawDateLike::Other), None);
        assert_eq!(normalize_date_value(Some(&json!(0))), None);
        // full-width digits are not ASCII dates
        assert_eq!(normalize_date(&text("２０２５-０９-２０")), None);
    }

    #[test]
    fn test_normalize_date_parses_other_text() {
        assert_eq!(
            normalize_date(&text("2025-09-20T23:30:00Z")),
            Some("2025-09-20".to_string())
        );
        assert_eq!(
            normalize_date(&text("2025-09-21T01:00:00+09:00")),
            Some("2025-09-20".to_string())
        );
        assert_eq!(normalize_date(&text("2025/09/20")), Some("2025-09-20".to_string()));
        assert_eq!(normalize_date(&text(" 2025-09-20 ")), Some("2025-09-20".to_string()));
        assert_eq!(normalize_date(&text("2025-9-5")), Some("2025-09-05".to_string()));
        assert_eq!(normalize_date(&text("09/20/2025")), Some("2025-09-20".to_string()));
        assert_eq!(
            normalize_date(&text("2025-09-20 08:15:00")),
            Some("2025-09-20".to_string())
        );
    }

    #[test]
    fn test_normalize_date_timestamps() {
        let at = Utc.with_ymd_and_hms(2025, 9, 20, 15, 0, 0).unwrap();
        assert_eq!(normalize_date(&RawDateLike::Timestamp(at)), Some("2025-09-20".to_string()));
        assert_eq!(normalize_date(&RawDateLike::NativeDate(at)), Some("2025-09-20".to_string()));
        assert_eq!(
            normalize_date_value(Some(&json!({"seconds": 1758326400, "nanoseconds": 5}))),
            Some("2025-09-20".to_string())
        );
    }

    #[test]
    fn test_normalize_date_idempotent() {
        let inputs = [
            text("2025-09-20"),
            text("2025/01/02"),
            text("2024-02-29T12:00:00Z"),
            text("March 3, 2025"),
            RawDateLike::Timestamp(Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap()),
        ];
        for input in inputs {
            let once = normalize_date(&input).expect("input should normalize");
            assert_eq!(normalize_date(&text(&once)), Some(once.clone()), "input: {:?}", input);
        }
    }

    #[test]
    fn test_normalize_listing_full_record() {
        let raw = record(json!({
            "title": "Cafe staff",
            "description": "Weekend shifts",
            "keyword": "cafe",
            "wage": 1200,
            "startDate": "2025-09-01",
            "endDate": {"seconds": 1758326400, "nanoseconds": 0},
            "createdAt": {"seconds": 1756684800, "nanoseconds": 0},
        }));
        let listing = normalize_listing(&raw, "abc123");

        assert_eq!(listing.id, "abc123");
        assert_eq!(listing.title, "Cafe staff");
        assert_eq!(listing.description, "Weekend shifts");
        assert_eq!(listing.keyword, "cafe");
        assert_eq!(listing.wage, 1200.0);
        assert_eq!(listing.start_date.as_deref(), Some("2025-09-01"));
        assert_eq!(listing.end_date.as_deref(), Some("2025-09-20"));
        assert_eq!(
            listing.created_at,
            Some(CreatedAt::Instant(Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap()))
        );
    }

    #[test]
    fn test_normalize_listing_empty_record() {
        let listing = normalize_listing(&RawRecord::new(), "empty");
        assert_eq!(listing.id, "empty");
        assert_eq!(listing.title, "");
        assert_eq!(listing.description, "");
        assert_eq!(listing.keyword, "");
        assert_eq!(listing.wage, 0.0);
        assert_eq!(listing.start_date, None);
        assert_eq!(listing.end_date, None);
        assert_eq!(listing.created_at, None);
    }

    #[test]
    fn test_normalize_listing_malformed_fields_degrade() {
        let raw = record(json!({
            "title": null,
            "description": ["not", "text"],
            "keyword": 42,
            "wage": "lots",
            "startDate": "someday",
            "endDate": 17,
            "createdAt": null,
        }));
        let listing = normalize_listing(&raw, "bad");
        assert_eq!(listing.title, "");
        assert_eq!(listing.description, "");
        assert_eq!(listing.keyword, "42");
        assert_eq!(listing.wage, 0.0);
        assert_eq!(listing.start_date, None);
        assert_eq!(listing.end_date, None);
        assert_eq!(listing.created_at, None);
    }

    #[test]
    fn test_normalize_listing_wage_coercion() {
        let wage = |v: Value| normalize_listing(&record(json!({ "wage": v })), "w").wage;
        assert_eq!(wage(json!("1500")), 1500.0);
        assert_eq!(wage(json!(" 980 ")), 980.0);
        assert_eq!(wage(json!(null)), 0.0);
        assert_eq!(wage(json!("abc")), 0.0);
        // passed through without clamping
        assert_eq!(wage(json!(-300)), -300.0);
    }

    #[test]
    fn test_normalize_listing_legacy_event_keys() {
        let raw = record(json!({
            "eventStart": "2025-10-01",
            "eventEnd": "2025-10-03T18:00:00Z",
        }));
        let listing = normalize_listing(&raw, "legacy");
        assert_eq!(listing.start_date.as_deref(), Some("2025-10-01"));
        assert_eq!(listing.end_date.as_deref(), Some("2025-10-03"));
    }

    #[test]
    fn test_normalize_listing_primary_key_wins() {
        let raw = record(json!({
            "startDate": "2025-10-02",
            "eventStart": "2025-10-01",
            "endDate": null,
            "eventEnd": "2025-10-05",
        }));
        let listing = normalize_listing(&raw, "both");
        assert_eq!(listing.start_date.as_deref(), Some("2025-10-02"));
        // null primary falls through to the legacy key
        assert_eq!(listing.end_date.as_deref(), Some("2025-10-05"));
    }

    #[test]
    fn test_normalize_listing_created_at_passthrough() {
        let raw = record(json!({ "createdAt": "2025-09-01T10:00:00Z" }));
        assert_eq!(
            normalize_listing(&raw, "s").created_at,
            Some(CreatedAt::Raw(json!("2025-09-01T10:00:00Z")))
        );

        let raw = record(json!({ "createdAt": {"$date": "2025-09-01T10:00:00Z"} }));
        assert_eq!(
            normalize_listing(&raw, "d").created_at,
            Some(CreatedAt::Instant(Utc.with_ymd_and_hms(2025, 9, 1, 10, 0, 0).unwrap()))
        );

        let raw = record(json!({ "createdAt": 1700000000 }));
        assert_eq!(
            normalize_listing(&raw, "n").created_at,
            Some(CreatedAt::Raw(json!(1700000000)))
        );
    }
}
