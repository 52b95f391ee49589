//! Contribution ("user pool") request bodies.

use bigdecimal::BigDecimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{PoolId, UserId};

/// Request body for `POST /user_pools`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateContributionRequest {
    /// Contributing user.
    pub user_id: UserId,
    /// Target pool.
    pub pool_id: PoolId,
    /// Staked amount as a decimal string.
    #[schema(value_type = String, example = "100.5")]
    pub amount: BigDecimal,
}

/// Request body for `PATCH /user_pools/{id}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateContributionRequest {
    /// New amount as a decimal string.
    #[schema(value_type = String, example = "150")]
    pub amount: BigDecimal,
}
