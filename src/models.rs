use chrono::{DateTime, Utc};
use serde::Serialize;

/// Untyped document as stored, before normalization.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub description: String,
    pub keyword: String,
    pub wage: f64,
    pub start_date: Option<String>, // "YYYY-MM-DD"
    pub end_date: Option<String>,   // "YYYY-MM-DD"
    pub created_at: Option<CreatedAt>,
}

/// When a listing was posted. Stored timestamps become an `Instant`; any
/// other stored value is carried as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CreatedAt {
    Instant(DateTime<Utc>),
    Raw(serde_json::Value),
}

impl CreatedAt {
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            CreatedAt::Instant(at) => Some(*at),
            CreatedAt::Raw(_) => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            CreatedAt::Instant(at) => at.format("%Y-%m-%d %H:%M:%S").to_string(),
            CreatedAt::Raw(serde_json::Value::String(s)) => s.clone(),
            CreatedAt::Raw(other) => other.to_string(),
        }
    }
}

/// Search constraints exactly as typed into the filter inputs. Empty text
/// means the axis is inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub keyword: String,
    pub min_wage: String,
    pub date: String, // "YYYY-MM-DD"
}

impl FilterCriteria {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.keyword.is_empty() && self.min_wage.is_empty() && self.date.is_empty()
    }
}

/// Submission form state, all fields as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostForm {
    pub title: String,
    pub keyword: String,
    pub description: String,
    pub wage: String,
    pub start_date: String,
    pub end_date: String,
}
