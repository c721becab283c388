//! Duration literal parsing.
//!
//! Literals are one or more `<integer> <unit>` terms, optionally joined with
//! `and`: `"30 sec"`, `"7 d"`, `"1 hour and 30 min"`. A bare integer is
//! read as milliseconds.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{Error, Result};

const SECOND_MS: u64 = 1_000;
const MINUTE_MS: u64 = 60 * SECOND_MS;
const HOUR_MS: u64 = 60 * MINUTE_MS;
const DAY_MS: u64 = 24 * HOUR_MS;
const WEEK_MS: u64 = 7 * DAY_MS;
/// Average month as used by the aggregation engine's time constants.
const MONTH_MS: u64 = 2_630_000_000;
/// Average year as used by the aggregation engine's time constants.
const YEAR_MS: u64 = 31_556_900_000;

/// Shape of a whole literal: terms separated by whitespace or `and`.
static LITERAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*\d+\s*[a-z]*(?:\s*(?:\s+and\s+)?\d+\s*[a-z]*)*\s*$")
        .expect("invalid duration literal pattern")
});

/// A single `<integer><unit>` term.
static TERM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*([a-zA-Z]*)").expect("invalid duration term pattern"));

pub const fn seconds(n: u64) -> u64 {
    n * SECOND_MS
}

pub const fn minutes(n: u64) -> u64 {
    n * MINUTE_MS
}

pub const fn hours(n: u64) -> u64 {
    n * HOUR_MS
}

pub const fn days(n: u64) -> u64 {
    n * DAY_MS
}

pub const fn years(n: u64) -> u64 {
    n * YEAR_MS
}

fn unit_millis(unit: &str) -> Option<u64> {
    let millis = match unit.to_ascii_lowercase().as_str() {
        "" | "ms" | "millis" | "millisec" | "millisecond" | "milliseconds" => 1,
        "s" | "sec" | "secs" | "second" | "seconds" => SECOND_MS,
        "m" | "min" | "mins" | "minute" | "minutes" => MINUTE_MS,
        "h" | "hr" | "hour" | "hours" => HOUR_MS,
        "d" | "day" | "days" => DAY_MS,
        "w" | "week" | "weeks" => WEEK_MS,
        "mo" | "month" | "months" => MONTH_MS,
        "y" | "yr" | "year" | "years" => YEAR_MS,
        _ => return None,
    };
    Some(millis)
}

/// Parses a duration literal into milliseconds.
pub fn parse_millis(literal: &str) -> Result<u64> {
    if !LITERAL_REGEX.is_match(literal) {
        return Err(Error::invalid_duration(literal));
    }

    let mut total: u64 = 0;
    for caps in TERM_REGEX.captures_iter(literal) {
        let amount: u64 = caps[1]
            .parse()
            .map_err(|_| Error::invalid_duration(literal))?;
        let factor = unit_millis(&caps[2]).ok_or_else(|| Error::invalid_duration(literal))?;
        total = amount
            .checked_mul(factor)
            .and_then(|ms| total.checked_add(ms))
            .ok_or_else(|| Error::invalid_duration(literal))?;
    }

    Ok(total)
}
