use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::transaction::PaymentMethod;

/// Inclusive range of instants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// Filters for listing a user's income or expense records
#[derive(Debug, Clone, Default)]
pub struct TransactionFilters {
    pub date_range: Option<DateRange>,
    /// Only records dated on or after this instant
    pub since: Option<DateTime<Utc>>,
    pub category_id: Option<Uuid>,
    pub payment_method: Option<PaymentMethod>,
    /// Maximum number of records, most recent first
    pub limit: Option<i64>,
}

/// Query string accepted by the income and expense list endpoints
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub category_id: Option<Uuid>,
    pub payment_method: Option<PaymentMethod>,
}

/// Query string carrying a date range
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// A date query value that is neither RFC 3339 nor `YYYY-MM-DD`
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid date format")]
pub struct InvalidDate;

/// Parse an RFC 3339 instant, or a bare `YYYY-MM-DD` date as UTC midnight
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Build a range from optional query values.
///
/// Returns `Ok(None)` unless both ends are present.
pub fn parse_date_range(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Option<DateRange>, InvalidDate> {
    match (start, end) {
        (Some(start), Some(end)) => {
            let start = parse_instant(start).ok_or(InvalidDate)?;
            let end = parse_instant(end).ok_or(InvalidDate)?;
            Ok(Some(DateRange { start, end }))
        }
        _ => Ok(None),
    }
}
