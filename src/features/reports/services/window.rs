//! Reporting window resolution.
//!
//! A window is an inclusive `[start, end]` pair of instants. Without explicit
//! dates it covers the calendar week (Monday 00:00:00.000 through Sunday
//! 23:59:59.999) of the caller's local clock.

use chrono::{
    DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};

use crate::core::error::{AppError, Result};
use crate::shared::validation::ISO_DATE_REGEX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Inclusive on both ends
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }

    /// Monday..Sunday week of `instant`, computed on `instant`'s own calendar.
    pub fn week_containing<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        let tz = instant.timezone();
        let today = instant.date_naive();

        // Sunday is 6 days from Monday, so it reaches back to the previous Monday
        let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        let next_monday = monday + Duration::days(7);

        let start = to_utc(&tz, monday.and_time(NaiveTime::MIN));
        let end = to_utc(&tz, next_monday.and_time(NaiveTime::MIN)) - Duration::milliseconds(1);

        Self { start, end }
    }

    /// First day of the window on the local calendar
    pub fn local_start_date(&self) -> NaiveDate {
        self.start.with_timezone(&Local).date_naive()
    }

    /// Last day of the window on the local calendar
    pub fn local_end_date(&self) -> NaiveDate {
        self.end.with_timezone(&Local).date_naive()
    }

    /// `YYYY-MM-DD` of the start instant in UTC, used in stored file names
    /// so they do not depend on the server's time zone.
    pub fn file_stamp(&self) -> String {
        self.start.date_naive().format("%Y-%m-%d").to_string()
    }
}

/// Resolve the window for a generation request.
///
/// Both bounds given: used verbatim. Otherwise the week containing `now`.
/// Any bound that is present must parse, even when it ends up unused.
pub fn resolve<Tz: TimeZone>(
    start: Option<&str>,
    end: Option<&str>,
    now: &DateTime<Tz>,
) -> Result<ReportWindow> {
    let start = non_blank(start).map(parse_boundary).transpose()?;
    let end = non_blank(end).map(parse_boundary).transpose()?;

    match (start, end) {
        (Some(start), Some(end)) => Ok(ReportWindow::new(start, end)),
        (None, None) => Ok(ReportWindow::week_containing(now)),
        _ => {
            tracing::warn!("Only one window bound supplied, using the current week");
            Ok(ReportWindow::week_containing(now))
        }
    }
}

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (UTC midnight).
pub fn parse_boundary(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();

    if ISO_DATE_REGEX.is_match(value) {
        return NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(|date| date.and_time(NaiveTime::MIN).and_utc())
            .map_err(|e| AppError::Validation(format!("Invalid date '{}': {}", value, e)));
    }

    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            AppError::Validation(format!(
                "Invalid date '{}': expected RFC 3339 or YYYY-MM-DD",
                value
            ))
        })
}

/// `dd/mm/yyyy`
pub fn format_day(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// Local times skipped by a DST jump resolve to the first valid instant after the gap
fn to_utc<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| local.and_utc())
}
