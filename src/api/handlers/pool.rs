//! Pool handlers: create, list, get and the statistics reads.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    CreatePoolRequest, PageResponse, PaginationParams, PoolStatisticResponse, StatisticQuery,
};
use crate::app_state::AppState;
use crate::domain::{Lookback, Pool, PoolId, PoolVolumes};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /pools`: Create a new pool.
///
/// # Errors
///
/// Returns [`GatewayError`] on a blank token or store failure.
#[utoipa::path(
    post,
    path = "/api/v1/pools",
    tag = "Pools",
    summary = "Create a pool",
    request_body = CreatePoolRequest,
    responses(
        (status = 201, description = "Pool created", body = Pool),
        (status = 400, description = "Invalid request", body = ErrorResponse),
    )
)]
pub async fn create_pool(
    State(state): State<AppState>,
    Json(req): Json<CreatePoolRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let pool = state
        .pool_service
        .create_pool(&req.token, req.risk_status)
        .await?;
    Ok((StatusCode::CREATED, Json(pool)))
}

/// `GET /pools`: List pools ordered by token.
///
/// # Errors
///
/// Returns [`GatewayError`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/pools",
    tag = "Pools",
    summary = "List pools",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated pool list", body = PageResponse<Pool>),
    )
)]
pub async fn list_pools(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PageResponse<Pool>>, GatewayError> {
    let paged = state.pool_service.list_pools(params.page()).await?;
    Ok(Json(paged.into()))
}

/// `GET /pools/{id}`: Get a pool.
///
/// # Errors
///
/// Returns [`GatewayError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}",
    tag = "Pools",
    summary = "Get a pool",
    params(("id" = uuid::Uuid, Path, description = "Pool identifier")),
    responses(
        (status = 200, description = "Pool", body = Pool),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn get_pool(
    State(state): State<AppState>,
    Path(id): Path<PoolId>,
) -> Result<Json<Pool>, GatewayError> {
    Ok(Json(state.pool_service.get_pool(id).await?))
}

/// `GET /pools/pool_statistic`: Total amount and lookback delta per pool.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidDuration`] for a malformed `delta`, or a
/// store error.
#[utoipa::path(
    get,
    path = "/api/v1/pools/pool_statistic",
    tag = "Statistics",
    summary = "Amount delta per pool",
    description = "For every pool: the sum of all contribution amounts and the latest amount minus the earliest amount created within `delta` of now. Pools without contributions report zeros.",
    params(StatisticQuery),
    responses(
        (status = 200, description = "One row per pool", body = Vec<PoolStatisticResponse>),
        (status = 400, description = "Malformed duration", body = ErrorResponse),
    )
)]
pub async fn pool_statistic(
    State(state): State<AppState>,
    Query(query): Query<StatisticQuery>,
) -> Result<Json<Vec<PoolStatisticResponse>>, GatewayError> {
    let lookback = query
        .delta
        .as_deref()
        .map(str::parse::<Lookback>)
        .transpose()?;
    let rows = state.pool_service.pool_statistics(lookback).await?;
    Ok(Json(rows.into_iter().map(PoolStatisticResponse::from).collect()))
}

/// `GET /pools/volumes`: Windowed 24h/48h/72h volumes per pool.
///
/// # Errors
///
/// Returns [`GatewayError`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/pools/volumes",
    tag = "Statistics",
    summary = "Windowed pool volumes",
    description = "Latest contribution amount minus the earliest one overall and within the last 24, 48 and 72 hours, read from `pool_statistic_view`.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated volumes", body = PageResponse<PoolVolumes>),
    )
)]
pub async fn pool_volumes(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PageResponse<PoolVolumes>>, GatewayError> {
    let paged = state.pool_service.pool_volumes(params.page()).await?;
    Ok(Json(paged.into()))
}

/// Pool routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pools", post(create_pool).get(list_pools))
        .route("/pools/pool_statistic", get(pool_statistic))
        .route("/pools/volumes", get(pool_volumes))
        .route("/pools/{id}", get(get_pool))
}
