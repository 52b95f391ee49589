//! Caller-supplied lookback window for the ad-hoc amount delta.
//!
//! Accepts ISO-8601 durations restricted to exact units (`P2W`, `P1D`,
//! `PT36H`, `P1DT12H30M`, `PT0.5S`) or a plain non-negative number of
//! seconds (`"3600"`, `"90.25"`). Calendar years and months are rejected
//! because their length depends on the anchor date.

use std::fmt;
use std::str::FromStr;

use chrono::TimeDelta;

use crate::error::GatewayError;

const MILLIS_PER_SECOND: i64 = 1_000;
const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;
const MILLIS_PER_WEEK: i64 = 7 * MILLIS_PER_DAY;

/// Longest accepted lookback, in days.
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;

const DATE_UNITS: &[(char, i64)] = &[('W', MILLIS_PER_WEEK), ('D', MILLIS_PER_DAY)];
const TIME_UNITS: &[(char, i64)] = &[
    ('H', MILLIS_PER_HOUR),
    ('M', MILLIS_PER_MINUTE),
    ('S', MILLIS_PER_SECOND),
];

/// A non-negative duration looking back from "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Lookback(TimeDelta);

impl Lookback {
    /// Wraps a duration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidDuration`] for negative durations or
    /// durations above [`MAX_LOOKBACK_DAYS`].
    pub fn new(duration: TimeDelta) -> Result<Self, GatewayError> {
        if duration < TimeDelta::zero() {
            return Err(GatewayError::InvalidDuration(
                "duration must not be negative".to_string(),
            ));
        }
        if duration > TimeDelta::days(MAX_LOOKBACK_DAYS) {
            return Err(GatewayError::InvalidDuration(format!(
                "duration exceeds {MAX_LOOKBACK_DAYS} days"
            )));
        }
        Ok(Self(duration))
    }

    /// Lookback of a whole number of seconds, clamped to the accepted range.
    #[must_use]
    pub fn from_secs_saturating(secs: u64) -> Self {
        let max = TimeDelta::days(MAX_LOOKBACK_DAYS);
        let secs = i64::try_from(secs).unwrap_or(i64::MAX);
        let duration = TimeDelta::try_seconds(secs).map_or(max, |d| d.min(max));
        Self(duration)
    }

    /// The wrapped duration.
    #[must_use]
    pub const fn duration(&self) -> TimeDelta {
        self.0
    }
}

impl Default for Lookback {
    fn default() -> Self {
        Self(TimeDelta::hours(24))
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.0.num_milliseconds();
        let (secs, frac) = (millis / 1_000, millis % 1_000);
        if frac == 0 {
            write!(f, "{secs}s")
        } else {
            let frac = format!("{:03}", frac.unsigned_abs());
            write!(f, "{secs}.{}s", frac.trim_end_matches('0'))
        }
    }
}

impl FromStr for Lookback {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_ascii_uppercase();
        let millis = if input.starts_with('P') {
            parse_iso8601(&input)
        } else {
            scale(&input, MILLIS_PER_SECOND)
        }
        .map_err(|reason| GatewayError::InvalidDuration(format!("{s:?}: {reason}")))?;

        let duration = TimeDelta::try_milliseconds(millis).ok_or_else(|| {
            GatewayError::InvalidDuration(format!("{s:?}: duration out of range"))
        })?;
        Self::new(duration)
    }
}

fn parse_iso8601(input: &str) -> Result<i64, String> {
    let body = input.strip_prefix('P').unwrap_or(input);
    if body.is_empty() {
        return Err("empty duration".to_string());
    }
    let (date, time) = match body.split_once('T') {
        Some((_, "")) => return Err("time designator without components".to_string()),
        Some((date, time)) => (date, Some(time)),
        None => (body, None),
    };
    if date.contains('Y') || date.contains('M') {
        return Err("calendar years and months are not supported".to_string());
    }

    let date_millis = parse_section(date, DATE_UNITS)?;
    let time_millis = match time {
        Some(time) => parse_section(time, TIME_UNITS)?,
        None => 0,
    };
    date_millis
        .checked_add(time_millis)
        .ok_or_else(|| "duration out of range".to_string())
}

/// Parses `<number><designator>` pairs; designators must follow `units` order.
fn parse_section(section: &str, units: &[(char, i64)]) -> Result<i64, String> {
    let mut total: i64 = 0;
    let mut number = String::new();
    let mut next_unit = 0usize;

    for ch in section.chars() {
        if ch.is_ascii_digit() || ch == '.' {
            number.push(ch);
            continue;
        }
        let offset = units
            .iter()
            .skip(next_unit)
            .position(|(designator, _)| *designator == ch)
            .ok_or_else(|| format!("unexpected designator '{ch}'"))?;
        let index = next_unit + offset;
        let Some((_, unit_millis)) = units.get(index) else {
            return Err(format!("unexpected designator '{ch}'"));
        };
        total = total
            .checked_add(scale(&number, *unit_millis)?)
            .ok_or_else(|| "duration out of range".to_string())?;
        number.clear();
        next_unit = index + 1;
    }

    if !number.is_empty() {
        return Err(format!("missing designator after {number}"));
    }
    Ok(total)
}

/// Converts a decimal number of `unit_millis` units to milliseconds.
/// Fractions are only meaningful for seconds and keep millisecond precision.
fn scale(number: &str, unit_millis: i64) -> Result<i64, String> {
    if number.is_empty() {
        return Err("missing value".to_string());
    }
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("invalid number {number}"));
    }
    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("invalid number {number}"));
    }
    if !fraction.is_empty() && unit_millis != MILLIS_PER_SECOND {
        return Err("fractions are only supported for seconds".to_string());
    }

    let whole: i64 = whole
        .parse()
        .map_err(|_| format!("invalid number {number}"))?;
    let millis: String = fraction.chars().chain("000".chars()).take(3).collect();
    let millis: i64 = millis
        .parse()
        .map_err(|_| format!("invalid number {number}"))?;

    whole
        .checked_mul(unit_millis)
        .and_then(|w| w.checked_add(millis))
        .ok_or_else(|| "duration out of range".to_string())
}
