//! Support utilities: date parsing, currency-code normalization, and
//! decimal rounding helpers shared across modules.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

/// Date input errors
#[derive(Debug, thiserror::Error)]
pub enum DateError {
    /// Input string is not an ISO calendar date or datetime
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// The requested date is not present in the historic series
    #[error("Rate not found for date: {date}")]
    RateNotFound {
        /// The date that was requested
        date: NaiveDate,
    },
}

/// Parse a calendar date from ISO `YYYY-MM-DD` or an ISO datetime with a
/// `Z` designator.
///
/// Datetime inputs are truncated to their UTC calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate, DateError> {
    let input = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }

    Err(DateError::InvalidDate(input.to_string()))
}

/// Build a calendar date from year, month, and day components.
///
/// Rejects impossible dates (Feb 31 and the like).
pub fn date_from_ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate, DateError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| DateError::InvalidDate(format!("{year:04}-{month:02}-{day:02}")))
}

/// Normalize a currency-code input to its canonical upper-case form.
///
/// Returns `None` for inputs that are not three ASCII letters; lookups
/// treat those as not-found rather than failing loudly.
pub fn normalize_code(input: &str) -> Option<String> {
    let code = input.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(code.to_ascii_uppercase())
    } else {
        None
    }
}

/// Round a decimal to `round` fractional digits, keeping the scale fixed
/// so that string rendering carries exactly `round` digits.
///
/// `None` leaves the value untouched.
pub fn round_value(value: Decimal, round: Option<u32>) -> Decimal {
    match round {
        Some(places) => {
            let mut rounded = value.round_dp(places);
            rounded.rescale(places);
            rounded
        }
        None => value,
    }
}

/// Current UTC instant truncated to millisecond resolution.
pub fn now_ms() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
