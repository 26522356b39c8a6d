//! Calendar utilities for day-granular rate lookups.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Calendar constants.
pub mod constants {
    /// Lookback window when nothing has been backfilled yet (non-monthly series).
    pub const DEFAULT_LOOKBACK_DAYS: i64 = 15;

    /// Lookback window when nothing has been backfilled yet (monthly series).
    pub const MONTHLY_LOOKBACK_DAYS: i64 = 45;
}

/// Source of "today" for date-relative decisions.
pub trait Clock: Send + Sync {
    /// The current processing date.
    fn today(&self) -> NaiveDate;
}

/// Wall clock, in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        to_day(Utc::now())
    }
}

/// A clock pinned to one day.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Truncate a timestamp to its UTC day.
pub fn to_day(timestamp: DateTime<Utc>) -> NaiveDate {
    timestamp.date_naive()
}

/// First and last day of the calendar month containing `date`.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_day(1).unwrap_or(date);
    let last = next_month_start(first)
        .and_then(|next| next.pred_opt())
        .unwrap_or(first);
    (first, last)
}

/// Whether two dates fall in the same calendar month.
pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// First day of every calendar month intersecting `[from, to]`, oldest first.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    let mut months = Vec::new();
    if from > to {
        return months;
    }

    let (mut cursor, _) = month_bounds(from);
    while cursor <= to {
        months.push(cursor);
        match next_month_start(cursor) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    months
}

/// `date` shifted back by `days`, saturating at the earliest representable date.
pub fn days_before(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_sub_signed(Duration::days(days))
        .unwrap_or(NaiveDate::MIN)
}

fn next_month_start(first: NaiveDate) -> Option<NaiveDate> {
    if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    }
}
