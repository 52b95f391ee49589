//! Domain layer: identifiers, pools, contributions and the statistics
//! evaluated over them.

pub mod contribution;
pub mod ids;
pub mod lookback;
pub mod page;
pub mod pool;
pub mod statistic;

pub use contribution::Contribution;
pub use ids::{ContributionId, PoolId, UserId};
pub use lookback::Lookback;
pub use page::{Page, Paged};
pub use pool::{Pool, RiskStatus};
pub use statistic::{HORIZONS, Horizon, PoolAmountDelta, PoolVolumes};
