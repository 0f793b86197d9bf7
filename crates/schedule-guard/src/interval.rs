//! Date-range x time-range intervals.
//!
//! [`Interval`] carries the raw strings as they sit in a stored record.
//! [`ParsedInterval`] is the comparable form; building one is the only place
//! where an interval can be judged malformed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::parse::{parse_date, parse_time};

/// One schedule's validity window, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Interval {
    pub id: String,
    /// `dd/MM/yyyy`
    pub start_date: String,
    /// `dd/MM/yyyy`
    pub end_date: String,
    /// `h:mm AM/PM` or `HH:mm`
    pub start_time: String,
    /// `h:mm AM/PM` or `HH:mm`
    pub end_time: String,
    pub active: bool,
}

impl Default for Interval {
    fn default() -> Self {
        Self::new("", "", "", "", "")
    }
}

impl Interval {
    /// Build an active interval from its four raw fields.
    pub fn new(
        id: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            active: true,
        }
    }

    /// Parse all four fields into comparable values.
    ///
    /// # Errors
    /// - `InvalidDate` / `InvalidTime` when a field does not parse.
    /// - `InvalidRange` when `start_date > end_date` or `start_time >= end_time`.
    pub fn parse(&self) -> Result<ParsedInterval> {
        let start_date = parse_date(&self.start_date)?;
        let end_date = parse_date(&self.end_date)?;
        let start_minute = parse_time(&self.start_time)?;
        let end_minute = parse_time(&self.end_time)?;
        ParsedInterval::new(start_date, end_date, start_minute, end_minute)
    }
}

/// A well-formed interval: `start_date <= end_date` and `start_minute < end_minute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedInterval {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Minutes since midnight.
    pub start_minute: u16,
    /// Minutes since midnight, exclusive.
    pub end_minute: u16,
}

impl ParsedInterval {
    /// # Errors
    /// Returns `ScheduleError::InvalidRange` if either range is inverted or the
    /// time range is empty.
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        start_minute: u16,
        end_minute: u16,
    ) -> Result<Self> {
        if start_date > end_date {
            return Err(ScheduleError::InvalidRange(format!(
                "start date {} is after end date {}",
                start_date, end_date
            )));
        }
        if start_minute >= end_minute {
            return Err(ScheduleError::InvalidRange(format!(
                "start minute {} is not before end minute {}",
                start_minute, end_minute
            )));
        }
        Ok(Self {
            start_date,
            end_date,
            start_minute,
            end_minute,
        })
    }

    /// Closed test: ranges sharing a single boundary date overlap.
    pub fn dates_overlap(&self, other: &ParsedInterval) -> bool {
        self.start_date <= other.end_date && self.end_date >= other.start_date
    }

    /// Open test: a class ending exactly when another starts does not overlap.
    pub fn times_overlap(&self, other: &ParsedInterval) -> bool {
        self.start_minute < other.end_minute && self.end_minute > other.start_minute
    }

    /// A true conflict needs both dimensions to overlap.
    pub fn overlaps(&self, other: &ParsedInterval) -> bool {
        self.dates_overlap(other) && self.times_overlap(other)
    }

    pub fn covers_date(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Number of calendar dates both intervals are active on (inclusive), 0 if disjoint.
    pub fn overlap_days(&self, other: &ParsedInterval) -> i64 {
        if !self.dates_overlap(other) {
            return 0;
        }
        let start = self.start_date.max(other.start_date);
        let end = self.end_date.min(other.end_date);
        (end - start).num_days() + 1
    }

    /// Shared time-of-day minutes on each common date, 0 if the windows only touch.
    pub fn overlap_minutes(&self, other: &ParsedInterval) -> i64 {
        if !self.times_overlap(other) {
            return 0;
        }
        let start = self.start_minute.max(other.start_minute);
        let end = self.end_minute.min(other.end_minute);
        i64::from(end - start)
    }
}
