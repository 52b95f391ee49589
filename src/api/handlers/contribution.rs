//! Contribution handlers, served under `/user_pools`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    CreateContributionRequest, PageResponse, PaginationParams, UpdateContributionRequest,
};
use crate::app_state::AppState;
use crate::domain::{Contribution, ContributionId};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /user_pools`: Record a contribution.
///
/// # Errors
///
/// Returns [`GatewayError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    post,
    path = "/api/v1/user_pools",
    tag = "Contributions",
    summary = "Create a contribution",
    request_body = CreateContributionRequest,
    responses(
        (status = 201, description = "Contribution created", body = Contribution),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn create_contribution(
    State(state): State<AppState>,
    Json(req): Json<CreateContributionRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let contribution = state
        .pool_service
        .create_contribution(req.user_id, req.pool_id, req.amount)
        .await?;
    Ok((StatusCode::CREATED, Json(contribution)))
}

/// `GET /user_pools`: List contributions in creation order.
///
/// # Errors
///
/// Returns [`GatewayError`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/user_pools",
    tag = "Contributions",
    summary = "List contributions",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated contributions", body = PageResponse<Contribution>),
    )
)]
pub async fn list_contributions(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PageResponse<Contribution>>, GatewayError> {
    let paged = state.pool_service.list_contributions(params.page()).await?;
    Ok(Json(paged.into()))
}

/// `GET /user_pools/{id}`: Get a contribution.
///
/// # Errors
///
/// Returns [`GatewayError::ContributionNotFound`] if it does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/user_pools/{id}",
    tag = "Contributions",
    summary = "Get a contribution",
    params(("id" = uuid::Uuid, Path, description = "Contribution identifier")),
    responses(
        (status = 200, description = "Contribution", body = Contribution),
        (status = 404, description = "Contribution not found", body = ErrorResponse),
    )
)]
pub async fn get_contribution(
    State(state): State<AppState>,
    Path(id): Path<ContributionId>,
) -> Result<Json<Contribution>, GatewayError> {
    Ok(Json(state.pool_service.get_contribution(id).await?))
}

/// `PATCH /user_pools/{id}`: Replace a contribution's amount.
///
/// # Errors
///
/// Returns [`GatewayError::ContributionNotFound`] if it does not exist.
#[utoipa::path(
    patch,
    path = "/api/v1/user_pools/{id}",
    tag = "Contributions",
    summary = "Update a contribution amount",
    description = "The creation timestamp is kept, so the contribution stays in the same statistic windows.",
    params(("id" = uuid::Uuid, Path, description = "Contribution identifier")),
    request_body = UpdateContributionRequest,
    responses(
        (status = 200, description = "Updated contribution", body = Contribution),
        (status = 404, description = "Contribution not found", body = ErrorResponse),
    )
)]
pub async fn update_contribution(
    State(state): State<AppState>,
    Path(id): Path<ContributionId>,
    Json(req): Json<UpdateContributionRequest>,
) -> Result<Json<Contribution>, GatewayError> {
    Ok(Json(
        state
            .pool_service
            .update_contribution(id, req.amount)
            .await?,
    ))
}

/// Contribution routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/user_pools",
            post(create_contribution).get(list_contributions),
        )
        .route(
            "/user_pools/{id}",
            get(get_contribution).patch(update_contribution),
        )
}
