use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::DashboardError;

/// Fallback calendar window used when a caller omits one or both dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Inclusive `[start, end]` timestamp bounds in the dataset's local calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl QueryRange {
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }

    /// A reversed range is accepted and simply matches nothing.
    pub fn is_reversed(&self) -> bool {
        self.start > self.end
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date()
    }
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::default())
}

/// Last microsecond of the day, the finest instant a Postgres `TIMESTAMP` holds.
/// Saturates on the last representable date instead of overflowing.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date)
        .checked_add_signed(Duration::days(1) - Duration::microseconds(1))
        .unwrap_or(NaiveDateTime::MAX)
}

pub fn normalize(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    defaults: &DateWindow,
) -> QueryRange {
    QueryRange {
        start: start_of_day(start.unwrap_or(defaults.start)),
        end: end_of_day(end.unwrap_or(defaults.end)),
    }
}

/// Parses a calendar date out of a `YYYY-MM-DD` string, an RFC 3339 timestamp
/// (its UTC date), or a naive `YYYY-MM-DDTHH:MM:SS` timestamp.
pub fn parse_date_param(param: &'static str, raw: &str) -> Result<NaiveDate, DashboardError> {
    let value = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(stamp.with_timezone(&Utc).date_naive());
    }
    if let Ok(stamp) = value.parse::<NaiveDateTime>() {
        return Ok(stamp.date());
    }

    Err(DashboardError::InvalidDate {
        param,
        value: raw.to_string(),
    })
}

/// Resolves the raw `startDate`/`endDate` parameters into a range. Empty
/// strings count as absent; anything else that fails to parse is rejected.
pub fn resolve(
    start: Option<&str>,
    end: Option<&str>,
    defaults: &DateWindow,
) -> Result<QueryRange, DashboardError> {
    let start = match start.filter(|value| !value.trim().is_empty()) {
        Some(value) => Some(parse_date_param("startDate", value)?),
        None => None,
    };
    let end = match end.filter(|value| !value.trim().is_empty()) {
        Some(value) => Some(parse_date_param("endDate", value)?),
        None => None,
    };

    let range = normalize(start, end, defaults);
    if range.is_reversed() {
        tracing::warn!(
            start = %range.start_date(),
            end = %range.end_date(),
            "start date is after end date; aggregates will be empty"
        );
    }
    Ok(range)
}
