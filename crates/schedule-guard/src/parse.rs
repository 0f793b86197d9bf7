//! Parsing of stored date and time-of-day strings.
//!
//! Dates are always `dd/MM/yyyy`. Times were written by two generations of the
//! class form, so both `h:mm AM/PM` and `HH:mm` appear in stored records; the
//! 12-hour shape is tried first.

use chrono::{NaiveDate, NaiveTime, Timelike};

use crate::error::{Result, ScheduleError};

const DATE_FORMAT: &str = "%d/%m/%Y";
const TIME_12H_FORMAT: &str = "%I:%M %p";
const TIME_24H_FORMAT: &str = "%H:%M";

/// Minutes in a day; valid minute-of-day values are `0..MINUTES_PER_DAY`.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Parse a `dd/MM/yyyy` calendar date.
///
/// Day and month may be one or two digits, the year must be four. Anything
/// else (ISO dates, two-digit years, trailing text, `31/02/2024`) is rejected.
///
/// # Errors
/// Returns `ScheduleError::InvalidDate` for any other shape or a non-existent date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let trimmed = s.trim();
    if !has_date_shape(trimmed) {
        return Err(ScheduleError::InvalidDate(s.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| ScheduleError::InvalidDate(s.to_string()))
}

fn has_date_shape(s: &str) -> bool {
    let parts: Vec<&str> = s.split('/').collect();
    let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());

    parts.len() == 3
        && parts.iter().all(|p| all_digits(p))
        && parts[0].len() <= 2
        && parts[1].len() <= 2
        && parts[2].len() == 4
}

/// Parse a time of day into minutes since midnight (`0..=1439`).
///
/// Tries 12-hour `h:mm AM/PM` first ("6:00 PM" -> 1080), then 24-hour
/// `HH:mm` ("18:00" -> 1080).
///
/// # Errors
/// Returns `ScheduleError::InvalidTime` if neither format matches.
pub fn parse_time(s: &str) -> Result<u16> {
    let trimmed = s.trim();
    let time = NaiveTime::parse_from_str(trimmed, TIME_12H_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(trimmed, TIME_24H_FORMAT))
        .map_err(|_| ScheduleError::InvalidTime(s.to_string()))?;

    Ok((time.hour() * 60 + time.minute()) as u16)
}

/// Render minutes since midnight as `h:mm AM/PM`.
///
/// Values past the end of the day wrap around.
pub fn format_time(minutes: u16) -> String {
    let minutes = minutes % MINUTES_PER_DAY;
    let (hour, minute) = (minutes / 60, minutes % 60);
    let meridiem = if hour < 12 { "AM" } else { "PM" };
    let hour12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", hour12, minute, meridiem)
}
