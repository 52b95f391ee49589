//! Window specifications and frame-bound interpretation.
//!
//! Callers describe a frame as a `(start, end)` tuple of optional
//! [`FrameEdge`]s, mirroring how row-offset frames are usually written:
//! `None` is unbounded, `0` is the current row, negative offsets precede
//! and positive offsets follow. [`RangeInterval`] edges are picked out
//! before that numeric interpretation runs, so a time distance is never
//! mistaken for a row count.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};

use super::RangeInterval;

/// Errors raised while rendering or evaluating a window frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// A plain offset was applied to a timestamp ordering key.
    #[error("offset {offset} has no time unit and cannot bound a timestamp range")]
    UnitlessOffset {
        /// Offset magnitude.
        offset: u64,
    },

    /// A `ROWS` frame cannot be decided from timestamps alone.
    #[error("ROWS frames cannot be evaluated against a timestamp key")]
    RowsFrame,

    /// A `RANGE` frame with an offset bound needs exactly one ordering column.
    #[error("RANGE frame with an offset bound needs exactly one ORDER BY column, got {0}")]
    RangeOrdering(usize),

    /// Applying the bound overflowed the timestamp range.
    #[error("frame bound is outside the representable timestamp range")]
    OutOfRange,
}

/// A frame bound as supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEdge {
    /// Row (or key) offset: `0` current row, negative preceding, positive following.
    Offset(i64),
    /// Clock distance from the current row's ordering key.
    Interval(RangeInterval),
}

impl From<i64> for FrameEdge {
    fn from(offset: i64) -> Self {
        Self::Offset(offset)
    }
}

impl From<RangeInterval> for FrameEdge {
    fn from(interval: RangeInterval) -> Self {
        Self::Interval(interval)
    }
}

/// An interpreted frame bound, ready for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameBound {
    /// `UNBOUNDED PRECEDING`.
    UnboundedPreceding,
    /// `n PRECEDING`.
    Preceding(u64),
    /// `CURRENT ROW`.
    CurrentRow,
    /// `n FOLLOWING`.
    Following(u64),
    /// `UNBOUNDED FOLLOWING`.
    UnboundedFollowing,
    /// `INTERVAL '…' PRECEDING|FOLLOWING`.
    Interval(RangeInterval),
}

impl FrameBound {
    const fn is_offset(&self) -> bool {
        matches!(
            self,
            Self::Preceding(_) | Self::Following(_) | Self::Interval(_)
        )
    }
}

impl fmt::Display for FrameBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnboundedPreceding => f.write_str("UNBOUNDED PRECEDING"),
            Self::Preceding(n) => write!(f, "{n} PRECEDING"),
            Self::CurrentRow => f.write_str("CURRENT ROW"),
            Self::Following(n) => write!(f, "{n} FOLLOWING"),
            Self::UnboundedFollowing => f.write_str("UNBOUNDED FOLLOWING"),
            Self::Interval(interval) => match interval.range_type() {
                super::RangeType::Preceding => write!(f, "{interval} PRECEDING"),
                super::RangeType::Following => write!(f, "{interval} FOLLOWING"),
            },
        }
    }
}

/// Frame units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameUnits {
    /// Physical row offsets.
    Rows,
    /// Offsets on the ordering key.
    Range,
}

impl fmt::Display for FrameUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rows => f.write_str("ROWS"),
            Self::Range => f.write_str("RANGE"),
        }
    }
}

#[derive(Clone, Copy)]
enum Side {
    Start,
    End,
}

/// A `ROWS|RANGE BETWEEN start AND end` frame clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowFrame {
    units: FrameUnits,
    start: FrameBound,
    end: FrameBound,
}

impl WindowFrame {
    /// Builds a `ROWS` frame from a `(start, end)` tuple.
    #[must_use]
    pub fn rows(range: (Option<FrameEdge>, Option<FrameEdge>)) -> Self {
        Self::interpret(FrameUnits::Rows, range)
    }

    /// Builds a `RANGE` frame from a `(start, end)` tuple.
    #[must_use]
    pub fn range(range: (Option<FrameEdge>, Option<FrameEdge>)) -> Self {
        Self::interpret(FrameUnits::Range, range)
    }

    /// `RANGE BETWEEN <interval> AND CURRENT ROW`.
    #[must_use]
    pub fn trailing(interval: RangeInterval) -> Self {
        Self::range((Some(interval.into()), Some(FrameEdge::Offset(0))))
    }

    fn interpret(units: FrameUnits, (start, end): (Option<FrameEdge>, Option<FrameEdge>)) -> Self {
        Self {
            units,
            start: interpret_edge(start, Side::Start),
            end: interpret_edge(end, Side::End),
        }
    }

    /// Frame units.
    #[must_use]
    pub const fn units(&self) -> FrameUnits {
        self.units
    }

    /// Interpreted start bound.
    #[must_use]
    pub const fn start(&self) -> FrameBound {
        self.start
    }

    /// Interpreted end bound.
    #[must_use]
    pub const fn end(&self) -> FrameBound {
        self.end
    }

    /// Renders the frame clause.
    #[must_use]
    pub fn to_sql(&self) -> String {
        format!("{} BETWEEN {} AND {}", self.units, self.start, self.end)
    }

    /// Decides whether a row keyed at `candidate` falls inside this frame
    /// when evaluated for the row keyed at `current`.
    ///
    /// Both ends are inclusive, and rows sharing the current key are peers
    /// of `CURRENT ROW`, matching `RANGE` semantics.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::RowsFrame`] for `ROWS` frames,
    /// [`FrameError::UnitlessOffset`] when a plain offset bound is used
    /// against the timestamp key, and [`FrameError::OutOfRange`] when the
    /// bound overflows.
    pub fn admits(
        &self,
        current: DateTime<Utc>,
        candidate: DateTime<Utc>,
    ) -> Result<bool, FrameError> {
        if self.units == FrameUnits::Rows {
            return Err(FrameError::RowsFrame);
        }
        let after_start = match self.start {
            FrameBound::UnboundedPreceding => true,
            FrameBound::UnboundedFollowing => false,
            FrameBound::CurrentRow => candidate >= current,
            FrameBound::Interval(interval) => candidate >= shift(current, interval)?,
            FrameBound::Preceding(offset) | FrameBound::Following(offset) => {
                return Err(FrameError::UnitlessOffset { offset });
            }
        };
        let before_end = match self.end {
            FrameBound::UnboundedFollowing => true,
            FrameBound::UnboundedPreceding => false,
            FrameBound::CurrentRow => candidate <= current,
            FrameBound::Interval(interval) => candidate <= shift(current, interval)?,
            FrameBound::Preceding(offset) | FrameBound::Following(offset) => {
                return Err(FrameError::UnitlessOffset { offset });
            }
        };
        Ok(after_start && before_end)
    }
}

fn shift(at: DateTime<Utc>, interval: RangeInterval) -> Result<DateTime<Utc>, FrameError> {
    at.checked_add_signed(interval.as_time_delta())
        .ok_or(FrameError::OutOfRange)
}

fn interpret_edge(edge: Option<FrameEdge>, side: Side) -> FrameBound {
    match edge {
        // Interval edges must bypass the numeric path below.
        Some(FrameEdge::Interval(interval)) => FrameBound::Interval(interval),
        Some(FrameEdge::Offset(offset)) => interpret_offset(offset),
        None => match side {
            Side::Start => FrameBound::UnboundedPreceding,
            Side::End => FrameBound::UnboundedFollowing,
        },
    }
}

fn interpret_offset(offset: i64) -> FrameBound {
    match offset.cmp(&0) {
        Ordering::Equal => FrameBound::CurrentRow,
        Ordering::Less => FrameBound::Preceding(offset.unsigned_abs()),
        Ordering::Greater => FrameBound::Following(offset.unsigned_abs()),
    }
}

/// An `OVER (…)` clause.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowSpec {
    partition_by: Vec<String>,
    order_by: Vec<String>,
    frame: Option<WindowFrame>,
}

impl WindowSpec {
    /// Starts a window partitioned by `column`.
    #[must_use]
    pub fn partition_by(column: impl Into<String>) -> Self {
        Self {
            partition_by: vec![column.into()],
            ..Self::default()
        }
    }

    /// Appends an ordering term, e.g. `"created_at ASC"`.
    #[must_use]
    pub fn order_by(mut self, term: impl Into<String>) -> Self {
        self.order_by.push(term.into());
        self
    }

    /// Sets the frame clause.
    #[must_use]
    pub fn frame(mut self, frame: WindowFrame) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Renders the `OVER (…)` clause.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::RangeOrdering`] when a `RANGE` frame with an
    /// offset bound is combined with anything but a single ordering term.
    pub fn to_sql(&self) -> Result<String, FrameError> {
        let mut parts = Vec::with_capacity(3);
        if !self.partition_by.is_empty() {
            parts.push(format!("PARTITION BY {}", self.partition_by.join(", ")));
        }
        if !self.order_by.is_empty() {
            parts.push(format!("ORDER BY {}", self.order_by.join(", ")));
        }
        if let Some(frame) = &self.frame {
            let offset_bound = frame.start.is_offset() || frame.end.is_offset();
            if frame.units == FrameUnits::Range && offset_bound && self.order_by.len() != 1 {
                return Err(FrameError::RangeOrdering(self.order_by.len()));
            }
            parts.push(frame.to_sql());
        }
        Ok(format!("OVER ({})", parts.join(" ")))
    }
}
