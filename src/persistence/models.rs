//! Database rows and their conversion into domain types.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use crate::domain::{
    Contribution, ContributionId, Pool, PoolAmountDelta, PoolId, PoolVolumes, RiskStatus, UserId,
};

/// A row of the `pool` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PoolRow {
    /// Pool identifier.
    pub id: PoolId,
    /// Token symbol.
    pub token: String,
    /// Risk classification.
    pub risk_status: RiskStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<PoolRow> for Pool {
    fn from(row: PoolRow) -> Self {
        Self {
            id: row.id,
            token: row.token,
            risk_status: row.risk_status,
            created_at: row.created_at,
        }
    }
}

/// A row of the `user_pool` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContributionRow {
    /// Contribution identifier.
    pub id: ContributionId,
    /// Contributing user.
    pub user_id: UserId,
    /// Owning pool.
    pub pool_id: PoolId,
    /// Staked amount.
    pub amount: BigDecimal,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<ContributionRow> for Contribution {
    fn from(row: ContributionRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            pool_id: row.pool_id,
            amount: row.amount,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A row of `pool_statistic_view`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PoolVolumesRow {
    /// Pool identifier.
    pub id: PoolId,
    /// Token symbol.
    pub token: String,
    /// Risk classification.
    pub risk_status: RiskStatus,
    /// Latest minus earliest-ever amount.
    pub volume: BigDecimal,
    /// 24 hour volume.
    pub volume_24: BigDecimal,
    /// 48 hour volume.
    pub volume_48: BigDecimal,
    /// 72 hour volume.
    pub volume_72: BigDecimal,
}

impl From<PoolVolumesRow> for PoolVolumes {
    fn from(row: PoolVolumesRow) -> Self {
        Self {
            pool_id: row.id,
            token: row.token,
            risk_status: row.risk_status,
            volume: row.volume,
            volume_24: row.volume_24,
            volume_48: row.volume_48,
            volume_72: row.volume_72,
        }
    }
}

/// A row of the ad-hoc amount delta query.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AmountDeltaRow {
    /// Pool identifier.
    pub id: PoolId,
    /// Token symbol.
    pub token: String,
    /// Risk classification.
    pub risk_status: RiskStatus,
    /// Pool creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Sum of all contribution amounts.
    pub total_amount: BigDecimal,
    /// Lookback delta.
    pub amount_delta: BigDecimal,
}

impl From<AmountDeltaRow> for PoolAmountDelta {
    fn from(row: AmountDeltaRow) -> Self {
        Self {
            pool: Pool {
                id: row.id,
                token: row.token,
                risk_status: row.risk_status,
                created_at: row.created_at,
            },
            total_amount: row.total_amount,
            amount_delta: row.amount_delta,
        }
    }
}
