//! In-process store used when PostgreSQL persistence is disabled.
//!
//! Pools and contributions live behind one [`tokio::sync::RwLock`], so a
//! statistics read always works on a consistent snapshot: a contribution
//! is either fully visible to every window or not at all.

use std::collections::HashMap;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use tokio::sync::RwLock;

use super::PoolStore;
use crate::domain::statistic::{compute_amount_deltas, compute_volumes};
use crate::domain::{
    Contribution, ContributionId, Lookback, Page, Paged, Pool, PoolAmountDelta, PoolId,
    PoolVolumes,
};
use crate::error::GatewayError;

#[derive(Debug, Default)]
struct State {
    pools: HashMap<PoolId, Pool>,
    contributions: HashMap<ContributionId, Contribution>,
}

impl State {
    fn sorted_pools(&self) -> Vec<Pool> {
        let mut pools: Vec<Pool> = self.pools.values().cloned().collect();
        pools.sort_by(|a, b| (&a.token, a.id).cmp(&(&b.token, b.id)));
        pools
    }

    fn contributions(&self) -> Vec<Contribution> {
        self.contributions.values().cloned().collect()
    }
}

/// Store keeping all data in memory.
///
/// Contributions keep the `created_at` they are handed, which lets
/// callers replay history.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn total(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

#[async_trait]
impl PoolStore for MemoryStore {
    async fn setup(&self) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn teardown(&self) -> Result<(), GatewayError> {
        let mut state = self.state.write().await;
        state.contributions.clear();
        state.pools.clear();
        Ok(())
    }

    async fn create_pool(&self, pool: Pool) -> Result<Pool, GatewayError> {
        let mut state = self.state.write().await;
        if state.pools.contains_key(&pool.id) {
            return Err(GatewayError::InvalidRequest(format!(
                "pool {} already exists",
                pool.id
            )));
        }
        state.pools.insert(pool.id, pool.clone());
        Ok(pool)
    }

    async fn get_pool(&self, id: PoolId) -> Result<Option<Pool>, GatewayError> {
        Ok(self.state.read().await.pools.get(&id).cloned())
    }

    async fn list_pools(&self, page: Page) -> Result<Paged<Pool>, GatewayError> {
        let state = self.state.read().await;
        Ok(Paged {
            items: page.slice(state.sorted_pools()),
            total: total(state.pools.len()),
        })
    }

    async fn create_contribution(
        &self,
        contribution: Contribution,
    ) -> Result<Contribution, GatewayError> {
        let mut state = self.state.write().await;
        if !state.pools.contains_key(&contribution.pool_id) {
            return Err(GatewayError::PoolNotFound(*contribution.pool_id.as_uuid()));
        }
        if state.contributions.contains_key(&contribution.id) {
            return Err(GatewayError::InvalidRequest(format!(
                "contribution {} already exists",
                contribution.id
            )));
        }
        state
            .contributions
            .insert(contribution.id, contribution.clone());
        Ok(contribution)
    }

    async fn get_contribution(
        &self,
        id: ContributionId,
    ) -> Result<Option<Contribution>, GatewayError> {
        Ok(self.state.read().await.contributions.get(&id).cloned())
    }

    async fn update_contribution_amount(
        &self,
        id: ContributionId,
        amount: BigDecimal,
    ) -> Result<Option<Contribution>, GatewayError> {
        let mut state = self.state.write().await;
        Ok(state.contributions.get_mut(&id).map(|contribution| {
            contribution.amount = amount;
            contribution.updated_at = Utc::now();
            contribution.clone()
        }))
    }

    async fn list_contributions(&self, page: Page) -> Result<Paged<Contribution>, GatewayError> {
        let state = self.state.read().await;
        let mut contributions = state.contributions();
        contributions.sort_by_key(Contribution::ordering_key);
        Ok(Paged {
            items: page.slice(contributions),
            total: total(state.contributions.len()),
        })
    }

    async fn pool_volumes(&self, page: Page) -> Result<Paged<PoolVolumes>, GatewayError> {
        let state = self.state.read().await;
        let volumes = compute_volumes(
            &state.sorted_pools(),
            &state.contributions(),
            Utc::now(),
        )?;
        Ok(Paged {
            total: total(volumes.len()),
            items: page.slice(volumes),
        })
    }

    async fn amount_deltas(
        &self,
        lookback: Lookback,
    ) -> Result<Vec<PoolAmountDelta>, GatewayError> {
        let state = self.state.read().await;
        Ok(compute_amount_deltas(
            &state.sorted_pools(),
            &state.contributions(),
            lookback,
            Utc::now(),
        ))
    }
}
