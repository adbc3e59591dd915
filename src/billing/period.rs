//! Billing periods and day-granular proration.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

use super::BillingError;

/// A calendar month used as the billing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UsagePeriod {
    year: i32,
    month: u32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl UsagePeriod {
    /// Create a period for the given year and month (1-12).
    pub fn new(year: i32, month: u32) -> Result<Self, BillingError> {
        let invalid =
            || BillingError::InvalidInput(format!("invalid billing period {year}-{month:02}"));

        if !(1..=12).contains(&month) {
            return Err(invalid());
        }

        let (next_year, next_month) = if month == 12 {
            (year.checked_add(1).ok_or_else(invalid)?, 1)
        } else {
            (year, month + 1)
        };

        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(invalid)?
            .and_utc();
        let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(invalid)?
            .and_utc();

        Ok(Self {
            year,
            month,
            start,
            end,
        })
    }

    /// The period containing the given instant.
    pub fn containing(at: DateTime<Utc>) -> Result<Self, BillingError> {
        Self::new(at.year(), at.month())
    }

    /// The last fully closed period before the given instant.
    pub fn previous_closed(now: DateTime<Utc>) -> Result<Self, BillingError> {
        Self::containing(now)?.previous()
    }

    /// The period immediately before this one.
    pub fn previous(&self) -> Result<Self, BillingError> {
        if self.month == 1 {
            let year = self.year.checked_sub(1).ok_or_else(|| {
                BillingError::InvalidInput(format!("no billing period before {self}"))
            })?;
            Self::new(year, 12)
        } else {
            Self::new(self.year, self.month - 1)
        }
    }

    /// The period immediately after this one.
    pub fn next(&self) -> Result<Self, BillingError> {
        if self.month == 12 {
            let year = self.year.checked_add(1).ok_or_else(|| {
                BillingError::InvalidInput(format!("no billing period after {self}"))
            })?;
            Self::new(year, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    /// Billing year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Billing month (1-12).
    pub fn month(&self) -> u32 {
        self.month
    }

    /// First instant of the period.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// First instant after the period (start of the next month).
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Number of calendar days in the period.
    pub fn days(&self) -> u32 {
        (self.end - self.start).num_days() as u32
    }

    /// The full window covered by this period.
    pub fn window(&self) -> BillingWindow {
        BillingWindow {
            start: self.start,
            end: self.end,
        }
    }

    /// Whether the period has ended at the given instant.
    pub fn is_closed(&self, now: DateTime<Utc>) -> bool {
        self.end <= now
    }
}

impl fmt::Display for UsagePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// A half-open time window `[start, end)` that usage is charged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BillingWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl BillingWindow {
    /// Create a window; `start` must be strictly before `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, BillingError> {
        if start >= end {
            return Err(BillingError::InvalidInput(format!(
                "billing window start {start} is not before end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Start of the window.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// End of the window (exclusive).
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Number of calendar days the window touches.
    pub fn days(&self) -> u32 {
        self.overlap_days(self.start, None)
    }

    /// Number of UTC calendar days during which an object stored over
    /// `[from, until)` was present inside this window.
    ///
    /// A day counts if the object was stored for any part of it. `until`
    /// of `None` means the object is still stored. A deletion at or after
    /// the window end is the same as no deletion.
    pub fn overlap_days(&self, from: DateTime<Utc>, until: Option<DateTime<Utc>>) -> u32 {
        let begin = from.max(self.start);
        let finish = until.map_or(self.end, |u| u.min(self.end));

        if finish <= begin {
            return 0;
        }

        let first_day = begin.date_naive();
        let last_day = (finish - Duration::nanoseconds(1)).date_naive();
        ((last_day - first_day).num_days() + 1) as u32
    }
}
