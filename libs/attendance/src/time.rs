//! Calendar helpers: reporting periods and display formatting.
//!
//! Stored instants are always UTC. Periods are half-open instant ranges built
//! from UTC calendar dates; the display zone only affects rendering.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};

use crate::error::{AttendanceResult, BadRequest};

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Half-open range `[start, end)` of UTC instants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// `[first day of month, first day of next month)`, rolling December over
/// into January of the next year.
pub fn month_period(year: i32, month: u32) -> AttendanceResult<TimeRange> {
    let invalid = || BadRequest::InvalidPeriod { year, month };

    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;

    Ok(TimeRange {
        start: midnight_utc(first),
        end: midnight_utc(next),
    })
}

/// Both dates inclusive, as `[from 00:00, to + 1 day 00:00)`.
pub fn date_span(from: NaiveDate, to: NaiveDate) -> AttendanceResult<TimeRange> {
    if from > to {
        return Err(BadRequest::InvalidRange.into());
    }
    let after = to.succ_opt().ok_or(BadRequest::InvalidRange)?;
    Ok(TimeRange {
        start: midnight_utc(from),
        end: midnight_utc(after),
    })
}

/// e.g. "October 2026"
pub fn month_label(period: &TimeRange) -> String {
    period.start.format("%B %Y").to_string()
}

/// Fixed-offset zone used when instants are shown to people
#[derive(Debug, Clone, Copy)]
pub struct DisplayZone {
    offset: FixedOffset,
}

impl DisplayZone {
    /// Falls back to UTC when the offset is outside +/- 24h.
    pub fn from_offset_minutes(minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix());
        Self { offset }
    }

    pub fn format(&self, instant: DateTime<Utc>) -> String {
        instant.with_timezone(&self.offset).format(DISPLAY_FORMAT).to_string()
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Default for DisplayZone {
    fn default() -> Self {
        Self::from_offset_minutes(330)
    }
}
