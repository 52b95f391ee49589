//! Pool service: validates requests and orchestrates the store.

use std::sync::Arc;

use bigdecimal::BigDecimal;

use crate::domain::{
    Contribution, ContributionId, Lookback, Page, Paged, Pool, PoolAmountDelta, PoolId,
    PoolVolumes, RiskStatus, UserId,
};
use crate::error::GatewayError;
use crate::persistence::PoolStore;

/// Orchestration layer for pool and contribution operations.
///
/// Stateless coordinator over a shared [`PoolStore`]. Every mutation
/// validates its input, checks referenced entities, writes through the
/// store and logs the outcome.
#[derive(Debug, Clone)]
pub struct PoolService {
    store: Arc<dyn PoolStore>,
    default_lookback: Lookback,
}

impl PoolService {
    /// Creates a new `PoolService`.
    #[must_use]
    pub fn new(store: Arc<dyn PoolStore>, default_lookback: Lookback) -> Self {
        Self {
            store,
            default_lookback,
        }
    }

    /// Lookback applied when a statistics caller gives none.
    #[must_use]
    pub const fn default_lookback(&self) -> Lookback {
        self.default_lookback
    }

    /// Creates a new pool.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for a blank token, or a
    /// store error.
    pub async fn create_pool(
        &self,
        token: &str,
        risk_status: RiskStatus,
    ) -> Result<Pool, GatewayError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "token must not be empty".to_string(),
            ));
        }
        let pool = self.store.create_pool(Pool::new(token, risk_status)).await?;
        tracing::info!(pool_id = %pool.id, token = %pool.token, risk_status = %pool.risk_status, "pool created");
        Ok(pool)
    }

    /// Fetches a pool.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PoolNotFound`] if the pool does not exist.
    pub async fn get_pool(&self, pool_id: PoolId) -> Result<Pool, GatewayError> {
        self.store
            .get_pool(pool_id)
            .await?
            .ok_or(GatewayError::PoolNotFound(*pool_id.as_uuid()))
    }

    /// Lists pools ordered by token.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn list_pools(&self, page: Page) -> Result<Paged<Pool>, GatewayError> {
        self.store.list_pools(page).await
    }

    /// Records a user's contribution to a pool.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PoolNotFound`] if the pool does not exist.
    pub async fn create_contribution(
        &self,
        user_id: UserId,
        pool_id: PoolId,
        amount: BigDecimal,
    ) -> Result<Contribution, GatewayError> {
        self.get_pool(pool_id).await?;
        let contribution = self
            .store
            .create_contribution(Contribution::new(user_id, pool_id, amount))
            .await?;
        tracing::info!(
            contribution_id = %contribution.id,
            %pool_id,
            %user_id,
            amount = %contribution.amount,
            "contribution created"
        );
        Ok(contribution)
    }

    /// Fetches a contribution.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ContributionNotFound`] if it does not exist.
    pub async fn get_contribution(
        &self,
        contribution_id: ContributionId,
    ) -> Result<Contribution, GatewayError> {
        self.store
            .get_contribution(contribution_id)
            .await?
            .ok_or(GatewayError::ContributionNotFound(
                *contribution_id.as_uuid(),
            ))
    }

    /// Replaces a contribution's amount. Its `created_at` is kept.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ContributionNotFound`] if it does not exist.
    pub async fn update_contribution(
        &self,
        contribution_id: ContributionId,
        amount: BigDecimal,
    ) -> Result<Contribution, GatewayError> {
        let contribution = self
            .store
            .update_contribution_amount(contribution_id, amount)
            .await?
            .ok_or(GatewayError::ContributionNotFound(
                *contribution_id.as_uuid(),
            ))?;
        tracing::info!(%contribution_id, amount = %contribution.amount, "contribution updated");
        Ok(contribution)
    }

    /// Lists contributions in creation order.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn list_contributions(
        &self,
        page: Page,
    ) -> Result<Paged<Contribution>, GatewayError> {
        self.store.list_contributions(page).await
    }

    /// Windowed 24h/48h/72h volumes for a page of pools.
    ///
    /// # Errors
    ///
    /// Returns a store error; no partial result is produced.
    pub async fn pool_volumes(&self, page: Page) -> Result<Paged<PoolVolumes>, GatewayError> {
        self.store.pool_volumes(page).await
    }

    /// Total amount and lookback delta for every pool.
    ///
    /// Uses the configured default when `lookback` is `None`.
    ///
    /// # Errors
    ///
    /// Returns a store error; no partial result is produced.
    pub async fn pool_statistics(
        &self,
        lookback: Option<Lookback>,
    ) -> Result<Vec<PoolAmountDelta>, GatewayError> {
        let lookback = lookback.unwrap_or(self.default_lookback);
        tracing::debug!(%lookback, "computing pool amount deltas");
        self.store.amount_deltas(lookback).await
    }
}
