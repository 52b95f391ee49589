//! Contributions: a user's stake into a pool at a point in time.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{ContributionId, PoolId, UserId};

/// One deposit/update event of a user into a pool.
///
/// Contributions are append-mostly. The amount of an existing record may
/// be updated in place, but `created_at` never changes: it is the ordering
/// key of every time-windowed statistic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Contribution {
    /// Contribution identifier; breaks ties between equal timestamps.
    pub id: ContributionId,
    /// Contributing user.
    pub user_id: UserId,
    /// Owning pool.
    pub pool_id: PoolId,
    /// Staked amount.
    #[schema(value_type = String, example = "1000.50")]
    pub amount: BigDecimal,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last amount update.
    pub updated_at: DateTime<Utc>,
}

impl Contribution {
    /// Creates a contribution timestamped now.
    #[must_use]
    pub fn new(user_id: UserId, pool_id: PoolId, amount: BigDecimal) -> Self {
        let now = Utc::now();
        Self {
            id: ContributionId::new(),
            user_id,
            pool_id,
            amount,
            created_at: now,
            updated_at: now,
        }
    }

    /// Total order within a pool: creation time, then identifier.
    #[must_use]
    pub fn ordering_key(&self) -> (DateTime<Utc>, ContributionId) {
        (self.created_at, self.id)
    }
}
