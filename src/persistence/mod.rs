//! Persistence layer: pool and contribution storage plus statistics.
//!
//! [`PoolStore`] is the seam between the service and the storage engine.
//! [`PostgresStore`] is the production implementation and serves the
//! volume figures from the `pool_statistic_view` view. [`MemoryStore`]
//! keeps everything in process and evaluates the same windows in Rust.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use bigdecimal::BigDecimal;

use crate::domain::{
    Contribution, ContributionId, Lookback, Page, Paged, Pool, PoolAmountDelta, PoolId,
    PoolVolumes,
};
use crate::error::GatewayError;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Storage operations needed by the gateway.
///
/// Listings are ordered deterministically: pools by `(token, id)`,
/// contributions by `(created_at, id)`.
#[async_trait]
pub trait PoolStore: Send + Sync + std::fmt::Debug {
    /// Prepares the schema and the statistics view. Idempotent.
    async fn setup(&self) -> Result<(), GatewayError>;

    /// Removes the statistics view and the schema. Idempotent.
    async fn teardown(&self) -> Result<(), GatewayError>;

    /// Stores a new pool.
    async fn create_pool(&self, pool: Pool) -> Result<Pool, GatewayError>;

    /// Fetches a pool by id.
    async fn get_pool(&self, id: PoolId) -> Result<Option<Pool>, GatewayError>;

    /// Lists pools.
    async fn list_pools(&self, page: Page) -> Result<Paged<Pool>, GatewayError>;

    /// Stores a new contribution.
    ///
    /// Fails with [`GatewayError::PoolNotFound`] when the pool is missing.
    async fn create_contribution(
        &self,
        contribution: Contribution,
    ) -> Result<Contribution, GatewayError>;

    /// Fetches a contribution by id.
    async fn get_contribution(
        &self,
        id: ContributionId,
    ) -> Result<Option<Contribution>, GatewayError>;

    /// Replaces the amount of a contribution, keeping its `created_at`.
    async fn update_contribution_amount(
        &self,
        id: ContributionId,
        amount: BigDecimal,
    ) -> Result<Option<Contribution>, GatewayError>;

    /// Lists contributions.
    async fn list_contributions(&self, page: Page) -> Result<Paged<Contribution>, GatewayError>;

    /// Windowed volumes per pool, ordered by token then pool id.
    async fn pool_volumes(&self, page: Page) -> Result<Paged<PoolVolumes>, GatewayError>;

    /// Total amount and lookback delta for every pool.
    async fn amount_deltas(&self, lookback: Lookback)
    -> Result<Vec<PoolAmountDelta>, GatewayError>;
}
