//! Pool-related DTOs for create and statistics operations.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{PoolAmountDelta, RiskStatus};

/// Request body for `POST /pools`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePoolRequest {
    /// Token symbol, e.g. `"BTC"`.
    pub token: String,
    /// Risk classification. Defaults to `low`.
    #[serde(default = "default_risk_status")]
    pub risk_status: RiskStatus,
}

fn default_risk_status() -> RiskStatus {
    RiskStatus::Low
}

/// Query parameters of `GET /pools/pool_statistic`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatisticQuery {
    /// Lookback as an ISO-8601 duration (`P1D`, `PT36H`) or seconds.
    /// Defaults to the configured lookback.
    pub delta: Option<String>,
}

/// One row of `GET /pools/pool_statistic`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PoolStatisticResponse {
    /// Pool token symbol.
    pub token: String,
    /// Pool risk classification.
    pub risk_status: RiskStatus,
    /// Sum of every contribution amount of the pool.
    #[schema(value_type = String, example = "1250.00")]
    pub total_amount: BigDecimal,
    /// Latest amount minus the earliest amount inside the lookback.
    #[schema(value_type = String, example = "100")]
    pub amount_delta_per_day: BigDecimal,
}

impl From<PoolAmountDelta> for PoolStatisticResponse {
    fn from(row: PoolAmountDelta) -> Self {
        Self {
            token: row.pool.token,
            risk_status: row.pool.risk_status,
            total_amount: row.total_amount,
            amount_delta_per_day: row.amount_delta,
        }
    }
}
