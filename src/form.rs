use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Value, json};
use thiserror::Error;

use crate::models::{PostForm, RawRecord};
use crate::normalize::is_calendar_date;
use crate::raw::{coerce_text_number, timestamp_value};

#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("wage must be a number, got '{0}'")]
    InvalidWage(String),

    #[error("{field} must be a YYYY-MM-DD date, got '{value}'")]
    InvalidDate { field: &'static str, value: String },
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, FormError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FormError::Missing(field));
    }
    Ok(trimmed)
}

fn check_date(value: &str, field: &'static str) -> Result<(), FormError> {
    let value = required(value, field)?;
    // chrono alone would also take "2025-9-5"
    if is_calendar_date(value) && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() {
        return Ok(());
    }
    Err(FormError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

fn optional_date(value: &str) -> Value {
    match value.trim() {
        "" => Value::Null,
        s => match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            Ok(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            Err(_) => Value::String(s.to_string()),
        },
    }
}

impl PostForm {
    /// Title, wage and both dates are required; keyword and description
    /// may be left blank.
    pub fn validate(&self) -> Result<(), FormError> {
        required(&self.title, "title")?;
        let wage = required(&self.wage, "wage")?;
        if coerce_text_number(wage).is_none_or(|w| !w.is_finite()) {
            return Err(FormError::InvalidWage(wage.to_string()));
        }
        check_date(&self.start_date, "start date")?;
        check_date(&self.end_date, "end date")?;
        Ok(())
    }

    /// Document written to the store for this form.
    pub fn to_payload(&self, now: DateTime<Utc>) -> RawRecord {
        let wage = coerce_text_number(&self.wage).unwrap_or(0.0);
        let payload = json!({
            "title": self.title,
            "description": self.description,
            "keyword": self.keyword,
            "wage": wage,
            "startDate": optional_date(&self.start_date),
            "endDate": optional_date(&self.end_date),
            "createdAt": timestamp_value(now),
        });
        match payload {
            Value::Object(map) => map,
            _ => RawRecord::new(),
        }
    }

    pub fn summary(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Title", self.title.as_str()),
            ("Keyword", self.keyword.as_str()),
            ("Description", self.description.as_str()),
            ("Wage", self.wage.as_str()),
            ("Start", self.start_date.as_str()),
            ("End", self.end_date.as_str()),
        ]
    }
}
