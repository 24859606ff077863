use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::{FilterCriteria, Listing};
use crate::raw::coerce_text_number;

fn at_time(date: &str, h: u32, m: u32, s: u32) -> Option<NaiveDateTime> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some(day.and_time(NaiveTime::from_hms_opt(h, m, s)?))
}

fn keyword_matches(listing: &Listing, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    let haystack = [
        listing.keyword.as_str(),
        listing.title.as_str(),
        listing.description.as_str(),
    ]
    .into_iter()
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase();

    haystack.contains(&needle)
}

fn wage_matches(listing: &Listing, min_wage: &str) -> bool {
    if min_wage.is_empty() {
        return true;
    }
    // a floor we cannot read rejects everything rather than being ignored
    match coerce_text_number(min_wage) {
        Some(floor) => listing.wage >= floor,
        None => false,
    }
}

fn date_matches(listing: &Listing, date: &str) -> bool {
    if date.is_empty() {
        return true;
    }
    let (Some(start), Some(end)) = (&listing.start_date, &listing.end_date) else {
        // containment can't be shown for an open-ended listing
        return false;
    };

    // mid-day probe against a whole-day window keeps the edges inclusive
    let Some(probe) = at_time(date, 12, 0, 0) else {
        return true;
    };
    if let Some(start) = at_time(start, 0, 0, 0) {
        if probe < start {
            return false;
        }
    }
    if let Some(end) = at_time(end, 23, 59, 59) {
        if probe > end {
            return false;
        }
    }
    true
}

/// Keyword, then minimum wage, then date containment. Inactive (empty)
/// criteria always pass.
pub fn matches(listing: &Listing, criteria: &FilterCriteria) -> bool {
    keyword_matches(listing, &criteria.keyword)
        && wage_matches(listing, &criteria.min_wage)
        && date_matches(listing, &criteria.date)
}

pub fn filter_listings<'a>(listings: &'a [Listing], criteria: &FilterCriteria) -> Vec<&'a Listing> {
    listings.iter().filter(|l| matches(l, criteria)).collect()
}
