//! Text helpers shared by the scrapers and the normalizer.
//!
//! - Numeric coercion for statistic cells
//! - Score and date parsing for calendar rows
//! - String truncation for logging

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Score;

static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,2}/\d{1,2}/\d{4})").unwrap());

/// Read a statistic cell as a count; anything that is not a plain number
/// counts as zero.
pub fn coerce_count(text: &str) -> u32 {
    let text = text.trim();
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return 0;
    }
    text.parse().unwrap_or(0)
}

/// Parse a result cell such as `3 - 1`.
///
/// A dash or an empty cell means the match has not been played. Anything
/// that does not split into exactly two numbers is treated the same way, so a
/// score is either complete or absent.
pub fn parse_score(result: &str) -> Option<Score> {
    let result = result.trim();
    if result.is_empty() || result == "-" {
        return None;
    }
    let mut parts = result.split('-');
    let home = parts.next()?.trim().parse().ok()?;
    let away = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Score { home, away })
}

/// First `d/m/yyyy` date found in a cell.
pub fn extract_date(text: &str) -> Option<String> {
    DATE_PATTERN
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// Turn a `d/m/yyyy` date (padding optional) into a calendar date.
pub fn parse_day_month_year(text: &str) -> Option<NaiveDate> {
    let mut parts = text.trim().split('/');
    let day = parts.next()?.trim().parse().ok()?;
    let month = parts.next()?.trim().parse().ok()?;
    let year = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at `max` bytes (backing off to a char boundary) with
/// an ellipsis and a count of the dropped bytes.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}
