//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` and the
//! optional Swagger UI live at the root.

pub mod dto;
pub mod handlers;
pub mod openapi;

use axum::Router;

use crate::app_state::AppState;

pub use openapi::ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());
    with_swagger_ui(router)
}

#[cfg(feature = "swagger-ui")]
fn with_swagger_ui(router: Router<AppState>) -> Router<AppState> {
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;

    router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(not(feature = "swagger-ui"))]
fn with_swagger_ui(router: Router<AppState>) -> Router<AppState> {
    router
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use bigdecimal::BigDecimal;
    use chrono::{TimeDelta, Utc};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::{Contribution, Lookback, Pool, RiskStatus, UserId};
    use crate::persistence::{MemoryStore, PoolStore};
    use crate::service::PoolService;

    fn app(store: &Arc<MemoryStore>) -> Router {
        let store: Arc<dyn PoolStore> = Arc::<MemoryStore>::clone(store);
        let service = PoolService::new(store, Lookback::default());
        build_router().with_state(AppState::new(service))
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let body = body.map_or_else(Body::empty, |v| Body::from(v.to_string()));
        let Ok(request) = builder.body(body) else {
            panic!("valid request");
        };
        let Ok(response) = app.oneshot(request).await else {
            panic!("router is infallible");
        };
        let status = response.status();
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("readable body");
        };
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn seed_pool(store: &MemoryStore, token: &str) -> Pool {
        let Ok(pool) = store.create_pool(Pool::new(token, RiskStatus::Medium)).await else {
            panic!("pool created");
        };
        pool
    }

    async fn seed_contribution(store: &MemoryStore, pool: &Pool, amount: &str, hours_ago: i64) {
        let Ok(amount) = BigDecimal::from_str(amount) else {
            panic!("valid decimal");
        };
        let mut contribution = Contribution::new(UserId::new(), pool.id, amount);
        contribution.created_at = Utc::now() - TimeDelta::hours(hours_ago);
        tokio_test::assert_ok!(store.create_contribution(contribution).await);
    }

    #[tokio::test]
    async fn health_is_served_at_root() {
        let store = Arc::new(MemoryStore::new());
        let (status, body) = send(app(&store), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn pool_lifecycle() {
        let store = Arc::new(MemoryStore::new());
        let (status, created) = send(
            app(&store),
            Method::POST,
            "/api/v1/pools",
            Some(json!({"token": "BTC", "risk_status": "high"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["risk_status"], "high");
        let Some(id) = created["id"].as_str() else {
            panic!("pool id in response");
        };

        let (status, fetched) =
            send(app(&store), Method::GET, &format!("/api/v1/pools/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["token"], "BTC");

        let missing = uuid::Uuid::new_v4();
        let (status, body) =
            send(app(&store), Method::GET, &format!("/api/v1/pools/{missing}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], 2001);
    }

    #[tokio::test]
    async fn pools_are_paginated() {
        let store = Arc::new(MemoryStore::new());
        seed_pool(&store, "BTC").await;
        seed_pool(&store, "ETH").await;
        let (status, body) =
            send(app(&store), Method::GET, "/api/v1/pools?limit=1&offset=1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(body["items"][0]["token"], "ETH");
    }

    #[tokio::test]
    async fn contribution_to_unknown_pool_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let (status, body) = send(
            app(&store),
            Method::POST,
            "/api/v1/user_pools",
            Some(json!({
                "user_id": uuid::Uuid::new_v4(),
                "pool_id": uuid::Uuid::new_v4(),
                "amount": "10"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], 2001);
    }

    #[tokio::test]
    async fn contribution_amount_can_be_patched() {
        let store = Arc::new(MemoryStore::new());
        let pool = seed_pool(&store, "BTC").await;
        let (status, created) = send(
            app(&store),
            Method::POST,
            "/api/v1/user_pools",
            Some(json!({"user_id": uuid::Uuid::new_v4(), "pool_id": pool.id, "amount": "10.5"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["amount"], "10.5");
        let Some(id) = created["id"].as_str() else {
            panic!("contribution id in response");
        };

        let (status, updated) = send(
            app(&store),
            Method::PATCH,
            &format!("/api/v1/user_pools/{id}"),
            Some(json!({"amount": "42"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["amount"], "42");
        assert_eq!(updated["created_at"], created["created_at"]);

        let missing = uuid::Uuid::new_v4();
        let (status, body) = send(
            app(&store),
            Method::PATCH,
            &format!("/api/v1/user_pools/{missing}"),
            Some(json!({"amount": "1"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], 2002);
    }

    #[tokio::test]
    async fn volumes_report_every_pool() {
        let store = Arc::new(MemoryStore::new());
        let btc = seed_pool(&store, "BTC").await;
        seed_pool(&store, "ETH").await;
        seed_contribution(&store, &btc, "100", 80).await;
        seed_contribution(&store, &btc, "150", 60).await;
        seed_contribution(&store, &btc, "200", 36).await;
        seed_contribution(&store, &btc, "300", 1).await;

        let (status, body) = send(app(&store), Method::GET, "/api/v1/pools/volumes", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        let btc_row = &body["items"][0];
        assert_eq!(btc_row["token"], "BTC");
        assert_eq!(btc_row["volume"], "200");
        assert_eq!(btc_row["volume_24"], "0");
        assert_eq!(btc_row["volume_48"], "100");
        assert_eq!(btc_row["volume_72"], "150");
        let eth_row = &body["items"][1];
        assert_eq!(eth_row["token"], "ETH");
        assert_eq!(eth_row["volume"], "0");
    }

    #[tokio::test]
    async fn pool_statistic_uses_requested_delta() {
        let store = Arc::new(MemoryStore::new());
        let btc = seed_pool(&store, "BTC").await;
        seed_pool(&store, "ETH").await;
        seed_contribution(&store, &btc, "50", 50).await;
        seed_contribution(&store, &btc, "80", 30).await;
        seed_contribution(&store, &btc, "120", 1).await;

        let (status, day) =
            send(app(&store), Method::GET, "/api/v1/pools/pool_statistic", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(day[0]["token"], "BTC");
        assert_eq!(day[0]["total_amount"], "250");
        assert_eq!(day[0]["amount_delta_per_day"], "0");
        assert_eq!(day[1]["token"], "ETH");
        assert_eq!(day[1]["total_amount"], "0");
        assert_eq!(day[1]["risk_status"], "medium");

        let (status, two_days) = send(
            app(&store),
            Method::GET,
            "/api/v1/pools/pool_statistic?delta=P2D",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(two_days[0]["amount_delta_per_day"], "40");
    }

    #[tokio::test]
    async fn malformed_delta_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let (status, body) = send(
            app(&store),
            Method::GET,
            "/api/v1/pools/pool_statistic?delta=P1M",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 1002);
    }
}
