//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::dto::{
    CreateContributionRequest, CreatePoolRequest, PoolStatisticResponse,
    UpdateContributionRequest,
};
use super::handlers::{contribution, pool, system};
use crate::domain::{Contribution, Pool, PoolVolumes, RiskStatus};
use crate::error::{ErrorBody, ErrorResponse};

/// Aggregated OpenAPI description of every endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "margin-gateway",
        description = "Margin pools, user contributions and windowed volume statistics."
    ),
    paths(
        pool::create_pool,
        pool::list_pools,
        pool::get_pool,
        pool::pool_statistic,
        pool::pool_volumes,
        contribution::create_contribution,
        contribution::list_contributions,
        contribution::get_contribution,
        contribution::update_contribution,
        system::health_handler,
    ),
    components(schemas(
        Pool,
        RiskStatus,
        Contribution,
        PoolVolumes,
        CreatePoolRequest,
        CreateContributionRequest,
        UpdateContributionRequest,
        PoolStatisticResponse,
        ErrorResponse,
        ErrorBody,
        system::HealthResponse,
    )),
    tags(
        (name = "Pools", description = "Pool management"),
        (name = "Contributions", description = "User stakes into pools"),
        (name = "Statistics", description = "Volume and amount-delta statistics"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;
