//! Signed time interval usable as a `RANGE` window-frame bound.

use std::fmt;

use chrono::TimeDelta;

/// Direction of a frame bound relative to the current row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeType {
    /// Bound lies in the past of the current row.
    Preceding,
    /// Bound lies in the future of the current row.
    Following,
}

/// A clock duration used as a window-frame bound.
///
/// Direction and magnitude share one signed value measured in whole
/// seconds: [`RangeType::Preceding`] intervals are negative and
/// [`RangeType::Following`] intervals are positive. This keeps the value
/// compatible with the sign convention of plain row offsets while staying
/// a distinct type that frame interpretation can recognise.
///
/// Zero or negative input durations are accepted as-is. The direction is
/// kept alongside the signed value, so a zero-length interval still
/// renders with the direction it was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeInterval {
    seconds: i64,
    range_type: RangeType,
}

impl RangeInterval {
    /// Creates an interval of `delta` in the given direction.
    ///
    /// Sub-second precision is truncated.
    #[must_use]
    pub fn new(delta: TimeDelta, range_type: RangeType) -> Self {
        let magnitude = delta.num_seconds();
        let seconds = match range_type {
            RangeType::Preceding => magnitude.saturating_neg(),
            RangeType::Following => magnitude,
        };
        Self {
            seconds,
            range_type,
        }
    }

    /// Shorthand for an interval of `delta` before the current row.
    #[must_use]
    pub fn preceding(delta: TimeDelta) -> Self {
        Self::new(delta, RangeType::Preceding)
    }

    /// Shorthand for an interval of `delta` after the current row.
    #[must_use]
    pub fn following(delta: TimeDelta) -> Self {
        Self::new(delta, RangeType::Following)
    }

    /// Signed distance in seconds (negative for preceding).
    #[must_use]
    pub const fn seconds(&self) -> i64 {
        self.seconds
    }

    /// Unsigned distance in seconds.
    #[must_use]
    pub const fn magnitude(&self) -> u64 {
        self.seconds.unsigned_abs()
    }

    /// Direction the interval was built with.
    #[must_use]
    pub const fn range_type(&self) -> RangeType {
        self.range_type
    }

    /// Signed distance as a [`TimeDelta`], for in-process frame evaluation.
    #[must_use]
    pub fn as_time_delta(&self) -> TimeDelta {
        TimeDelta::seconds(self.seconds)
    }
}

impl fmt::Display for RangeInterval {
    /// Renders the magnitude as an explicit interval literal, e.g.
    /// `INTERVAL '86400 seconds'`. The direction keyword is added by the
    /// enclosing frame clause.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INTERVAL '{} seconds'", self.magnitude())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preceding_is_negative() {
        let interval = RangeInterval::preceding(TimeDelta::hours(24));
        assert_eq!(interval.seconds(), -86_400);
        assert_eq!(interval.magnitude(), 86_400);
        assert_eq!(interval.range_type(), RangeType::Preceding);
    }

    #[test]
    fn following_is_positive() {
        let interval = RangeInterval::new(TimeDelta::minutes(90), RangeType::Following);
        assert_eq!(interval.seconds(), 5_400);
        assert_eq!(interval.range_type(), RangeType::Following);
    }

    #[test]
    fn renders_interval_literal_not_bare_number() {
        let interval = RangeInterval::preceding(TimeDelta::hours(48));
        assert_eq!(interval.to_string(), "INTERVAL '172800 seconds'");
    }

    #[test]
    fn truncates_sub_second_precision() {
        let interval = RangeInterval::following(TimeDelta::milliseconds(2_500));
        assert_eq!(interval.seconds(), 2);
    }

    #[test]
    fn zero_duration_is_not_rejected() {
        let interval = RangeInterval::preceding(TimeDelta::zero());
        assert_eq!(interval.seconds(), 0);
        assert_eq!(interval.to_string(), "INTERVAL '0 seconds'");
    }

    #[test]
    fn zero_duration_keeps_direction() {
        let preceding = RangeInterval::preceding(TimeDelta::zero());
        let following = RangeInterval::following(TimeDelta::zero());
        assert_eq!(preceding.range_type(), RangeType::Preceding);
        assert_eq!(following.range_type(), RangeType::Following);
        assert_ne!(preceding, following);
    }

    #[test]
    fn round_trips_to_time_delta() {
        let interval = RangeInterval::preceding(TimeDelta::hours(72));
        assert_eq!(interval.as_time_delta(), TimeDelta::hours(-72));
    }
}
