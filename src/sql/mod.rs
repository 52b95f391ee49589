//! SQL building blocks for the pool statistics engine.
//!
//! The store only natively understands row-count offsets as window-frame
//! bounds. [`RangeInterval`] carries a clock duration instead, and
//! [`WindowFrame`] dispatches on it before any numeric offset handling so
//! the duration is rendered as an `INTERVAL` literal rather than a row count.

pub mod range_interval;
pub mod statistic_query;
pub mod view;
pub mod window;

pub use range_interval::{RangeInterval, RangeType};
pub use statistic_query::PoolStatisticQuery;
pub use view::ViewDefinition;
pub use window::{FrameBound, FrameEdge, FrameError, FrameUnits, WindowFrame, WindowSpec};
