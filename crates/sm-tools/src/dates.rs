//! Date filters for message search
//!
//! Accepts `YYYY-MM-DD` or a relative offset such as `7d`, `2w`, `1m`, `1y`
//! (a month counts as 30 days and a year as 365).

use std::sync::LazyLock;

use chrono::{Duration, Local, NaiveDate};
use regex::Regex;

const DATE_FORMAT: &str = "%Y-%m-%d";

static RELATIVE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([0-9]+)([dmwy])$").expect("relative date pattern"));

/// Resolve a relative offset against `today`
pub fn parse_relative_date_from(input: &str, today: NaiveDate) -> Option<String> {
    let caps = RELATIVE_DATE.captures(input)?;
    let amount: i64 = caps[1].parse().ok()?;
    let days_per_unit = match caps[2].to_ascii_lowercase().as_str() {
        "d" => 1,
        "w" => 7,
        "m" => 30,
        "y" => 365,
        _ => return None,
    };

    let offset = Duration::try_days(amount.checked_mul(days_per_unit)?)?;
    let target = today.checked_sub_signed(offset)?;
    Some(target.format(DATE_FORMAT).to_string())
}

/// Relative or absolute date as `YYYY-MM-DD`, `None` when neither form matches
pub fn parse_date(input: &str) -> Option<String> {
    parse_date_from(input, Local::now().date_naive())
}

pub fn parse_date_from(input: &str, today: NaiveDate) -> Option<String> {
    parse_relative_date_from(input, today).or_else(|| {
        NaiveDate::parse_from_str(input, DATE_FORMAT)
            .ok()
            .map(|d| d.format(DATE_FORMAT).to_string())
    })
}
