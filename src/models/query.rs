//! Sorting and date-range primitives shared across all list endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

use crate::errors::AppError;

/// Explicit sort key requested via `?sort=`.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    CreatedAt,
    Title,
    Priority,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Sort query parameters. Without `sort` each entity uses its default ordering.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ListSort {
    pub sort: Option<SortField>,
    #[serde(default)]
    pub order: SortOrder,
}

impl ListSort {
    /// Apply the requested direction to an ordering computed in ascending terms.
    pub fn directed(&self, ascending: std::cmp::Ordering) -> std::cmp::Ordering {
        match self.order {
            SortOrder::Asc => ascending,
            SortOrder::Desc => ascending.reverse(),
        }
    }
}

/// Which side of a range a date-only value is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

/// Parse an RFC 3339 timestamp or a `YYYY-MM-DD` date.
///
/// A bare date expands to the first millisecond of the day for `Start` and the
/// last millisecond for `End`, so an end date is inclusive.
pub fn parse_date_bound(raw: &str, bound: Bound) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{raw}': expected YYYY-MM-DD or RFC 3339"))?;
    let naive = match bound {
        Bound::Start => date.and_hms_milli_opt(0, 0, 0, 0),
        Bound::End => date.and_hms_milli_opt(23, 59, 59, 999),
    }
    .ok_or_else(|| format!("Invalid date '{raw}'"))?;
    Ok(naive.and_utc())
}

/// `deserialize_with` helper for optional range starts in query strings.
pub fn deserialize_start_bound<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_bound(deserializer, Bound::Start)
}

/// `deserialize_with` helper for optional range ends in query strings.
pub fn deserialize_end_bound<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_bound(deserializer, Bound::End)
}

fn deserialize_bound<'de, D>(deserializer: D, bound: Bound) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date_bound(value, bound)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Raw `?start=&end=` query for the date filter endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Inclusive creation-date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRangeQuery {
    /// Both ends are required and `start` must not be after `end`.
    pub fn into_range(self) -> Result<DateRange, AppError> {
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return Err(AppError::Validation(
                "Both 'start' and 'end' dates are required".to_string(),
            ));
        };
        let start = parse_date_bound(&start, Bound::Start).map_err(AppError::Validation)?;
        let end = parse_date_bound(&end, Bound::End).map_err(AppError::Validation)?;
        if start > end {
            return Err(AppError::Validation(
                "'start' must not be after 'end'".to_string(),
            ));
        }
        Ok(DateRange { start, end })
    }
}

impl DateRange {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}
