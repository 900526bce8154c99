//! Cron normalization, parsing, and minute truncation helpers.

use std::str::FromStr;

use chrono::{DateTime, TimeZone, Timelike};
use chrono_tz::Tz;
use cron::Schedule;

use crate::error::ObserverError;

/// Day names in standard cron order, Sunday first.
const WEEKDAYS: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// Normalize a 5-field cron expression to 6-field by prepending "0 " for seconds.
///
/// The `cron` crate requires 6 fields: `sec min hour day-of-month month day-of-week`.
/// Configuration uses standard 5-field cron: `min hour day-of-month month day-of-week`.
/// The two disagree on weekday numbers (standard cron: 0 or 7 = Sunday, 1 = Monday;
/// `cron` crate: 1 = Sunday), so a 5-field day-of-week is rewritten as day names.
/// 6- and 7-field expressions are passed through in the `cron` crate's dialect.
pub fn normalize_cron(expr: &str) -> String {
    let trimmed = expr.trim();
    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    match fields.as_slice() {
        [minute, hour, day, month, weekday] => {
            let weekday = weekday_field(weekday).unwrap_or_else(|| weekday.to_string());
            format!("0 {minute} {hour} {day} {month} {weekday}")
        }
        // Already 6/7-field or malformed; let the parser decide.
        _ => trimmed.to_string(),
    }
}

/// Rewrite a standard day-of-week field as a list of day names.
///
/// Returns `None` for anything unrecognized, leaving the parser to reject it.
fn weekday_field(field: &str) -> Option<String> {
    if field == "*" || field == "?" {
        return Some(field.to_string());
    }
    let mut days = [false; 7];
    for item in field.split(',') {
        mark_weekdays(item, &mut days)?;
    }
    let names: Vec<&str> = WEEKDAYS
        .iter()
        .zip(days)
        .filter_map(|(name, on)| on.then_some(*name))
        .collect();
    Some(names.join(","))
}

/// Mark the days one list item (`N`, `N-M`, `*/S`, `N-M/S`, `N/S`) selects.
fn mark_weekdays(item: &str, days: &mut [bool; 7]) -> Option<()> {
    let (range, step) = match item.split_once('/') {
        Some((range, step)) => (range, step.parse::<usize>().ok().filter(|s| *s > 0)?),
        None => (item, 1),
    };
    let (start, end) = if range == "*" {
        (0, 6)
    } else if let Some((from, to)) = range.split_once('-') {
        (weekday_value(from)?, weekday_value(to)?)
    } else {
        let day = weekday_value(range)?;
        (day, if item.contains('/') { 6 } else { day })
    };
    if start > end {
        return None;
    }
    for day in (start..=end).step_by(step) {
        days[day % 7] = true;
    }
    Some(())
}

/// `0`..=`7` (both 0 and 7 are Sunday) or a three-letter day name.
fn weekday_value(token: &str) -> Option<usize> {
    match token.parse::<usize>() {
        Ok(n) => (n <= 7).then_some(n),
        Err(_) => WEEKDAYS.iter().position(|d| d.eq_ignore_ascii_case(token)),
    }
}

/// Parse a 5-, 6-, or 7-field cron expression.
pub fn parse_schedule(expr: &str) -> Result<Schedule, ObserverError> {
    Schedule::from_str(&normalize_cron(expr)).map_err(|e| ObserverError::InvalidCron {
        expr: expr.to_string(),
        reason: e.to_string(),
    })
}

/// Resolve an IANA timezone name such as `Asia/Kolkata`.
pub fn parse_timezone(name: &str) -> Result<Tz, ObserverError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ObserverError::InvalidTimezone(name.to_string()))
}

/// Drop seconds and sub-second precision.
pub(crate) fn truncate_to_minute<Z: TimeZone>(dt: &DateTime<Z>) -> DateTime<Z> {
    dt.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or_else(|| dt.clone())
}
