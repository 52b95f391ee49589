//! PostgreSQL implementation of the persistence layer.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::PoolStore;
use super::models::{AmountDeltaRow, ContributionRow, PoolRow, PoolVolumesRow};
use crate::config::GatewayConfig;
use crate::domain::{
    Contribution, ContributionId, Lookback, Page, Paged, Pool, PoolAmountDelta, PoolId,
    PoolVolumes,
};
use crate::error::GatewayError;
use crate::sql::statistic_query::POOL_STATISTIC_VIEW;
use crate::sql::{PoolStatisticQuery, ViewDefinition};

/// Reversible migrations creating the `pool` and `user_pool` tables.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const POOL_COLUMNS: &str = "id, token, risk_status, created_at";
const CONTRIBUTION_COLUMNS: &str = "id, user_id, pool_id, amount, created_at, updated_at";

/// Applied state of the schema, as reported by `margin-schema status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaStatus {
    /// Versions of the migrations recorded as applied.
    pub applied: Vec<i64>,
    /// Versions of known migrations not applied yet.
    pub pending: Vec<i64>,
    /// Whether the statistics view exists.
    pub view_present: bool,
}

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized from the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if the database cannot
    /// be reached within the configured timeout.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(config.connect_timeout())
            .connect(&config.database_url)
            .await?;
        tracing::info!(
            max_connections = config.database_max_connections,
            "connected to postgres"
        );
        Ok(Self::new(pool))
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Definition of `pool_statistic_view`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if the query cannot be rendered.
    pub fn statistic_view() -> Result<ViewDefinition, GatewayError> {
        Ok(ViewDefinition::new(
            POOL_STATISTIC_VIEW,
            PoolStatisticQuery::view_select()?,
        ))
    }

    /// Reports applied and pending migrations and the view state.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn schema_status(&self) -> Result<SchemaStatus, GatewayError> {
        let tracked =
            sqlx::query_scalar::<_, bool>("SELECT to_regclass('_sqlx_migrations') IS NOT NULL")
                .fetch_one(&self.pool)
                .await?;
        let applied = if tracked {
            sqlx::query_scalar::<_, i64>("SELECT version FROM _sqlx_migrations WHERE success ORDER BY version")
                .fetch_all(&self.pool)
                .await?
        } else {
            Vec::new()
        };
        let pending = MIGRATOR
            .iter()
            .filter(|m| !m.migration_type.is_down_migration())
            .map(|m| m.version)
            .filter(|version| !applied.contains(version))
            .collect();
        let view_present = Self::statistic_view()?.exists(&self.pool).await?;
        Ok(SchemaStatus {
            applied,
            pending,
            view_present,
        })
    }
}

fn bounds(page: Page) -> (i64, i64) {
    (
        i64::from(page.limit),
        i64::try_from(page.offset).unwrap_or(i64::MAX),
    )
}

fn total(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

#[async_trait]
impl PoolStore for PostgresStore {
    async fn setup(&self) -> Result<(), GatewayError> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;
        let created = Self::statistic_view()?.create_if_absent(&self.pool).await?;
        tracing::info!(view_created = created, "schema ready");
        Ok(())
    }

    async fn teardown(&self) -> Result<(), GatewayError> {
        let dropped = Self::statistic_view()?.drop_if_present(&self.pool).await?;
        MIGRATOR
            .undo(&self.pool, 0)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;
        tracing::info!(view_dropped = dropped, "schema removed");
        Ok(())
    }

    async fn create_pool(&self, pool: Pool) -> Result<Pool, GatewayError> {
        let row = sqlx::query_as::<_, PoolRow>(&format!(
            "INSERT INTO pool (id, token, risk_status) VALUES ($1, $2, $3) \
             RETURNING {POOL_COLUMNS}"
        ))
        .bind(pool.id)
        .bind(&pool.token)
        .bind(pool.risk_status)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn get_pool(&self, id: PoolId) -> Result<Option<Pool>, GatewayError> {
        let row = sqlx::query_as::<_, PoolRow>(&format!(
            "SELECT {POOL_COLUMNS} FROM pool WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Pool::from))
    }

    async fn list_pools(&self, page: Page) -> Result<Paged<Pool>, GatewayError> {
        let (limit, offset) = bounds(page);
        let rows = sqlx::query_as::<_, PoolRow>(&format!(
            "SELECT {POOL_COLUMNS} FROM pool ORDER BY token ASC, id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        let count = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM pool")
            .fetch_one(&self.pool)
            .await?;
        Ok(Paged {
            items: rows.into_iter().map(Pool::from).collect(),
            total: total(count),
        })
    }

    async fn create_contribution(
        &self,
        contribution: Contribution,
    ) -> Result<Contribution, GatewayError> {
        let pool_id = contribution.pool_id;
        let row = sqlx::query_as::<_, ContributionRow>(&format!(
            "INSERT INTO user_pool (id, user_id, pool_id, amount) VALUES ($1, $2, $3, $4) \
             RETURNING {CONTRIBUTION_COLUMNS}"
        ))
        .bind(contribution.id)
        .bind(contribution.user_id)
        .bind(pool_id)
        .bind(&contribution.amount)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                GatewayError::PoolNotFound(*pool_id.as_uuid())
            }
            _ => GatewayError::PersistenceError(e.to_string()),
        })?;
        Ok(row.into())
    }

    async fn get_contribution(
        &self,
        id: ContributionId,
    ) -> Result<Option<Contribution>, GatewayError> {
        let row = sqlx::query_as::<_, ContributionRow>(&format!(
            "SELECT {CONTRIBUTION_COLUMNS} FROM user_pool WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Contribution::from))
    }

    async fn update_contribution_amount(
        &self,
        id: ContributionId,
        amount: BigDecimal,
    ) -> Result<Option<Contribution>, GatewayError> {
        let row = sqlx::query_as::<_, ContributionRow>(&format!(
            "UPDATE user_pool SET amount = $2, updated_at = now() WHERE id = $1 \
             RETURNING {CONTRIBUTION_COLUMNS}"
        ))
        .bind(id)
        .bind(&amount)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Contribution::from))
    }

    async fn list_contributions(&self, page: Page) -> Result<Paged<Contribution>, GatewayError> {
        let (limit, offset) = bounds(page);
        let rows = sqlx::query_as::<_, ContributionRow>(&format!(
            "SELECT {CONTRIBUTION_COLUMNS} FROM user_pool \
             ORDER BY created_at ASC, id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        let count = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM user_pool")
            .fetch_one(&self.pool)
            .await?;
        Ok(Paged {
            items: rows.into_iter().map(Contribution::from).collect(),
            total: total(count),
        })
    }

    async fn pool_volumes(&self, page: Page) -> Result<Paged<PoolVolumes>, GatewayError> {
        let (limit, offset) = bounds(page);
        let rows = sqlx::query_as::<_, PoolVolumesRow>(&PoolStatisticQuery::volumes_page_select())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        let count = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM pool")
            .fetch_one(&self.pool)
            .await?;
        Ok(Paged {
            items: rows.into_iter().map(PoolVolumes::from).collect(),
            total: total(count),
        })
    }

    async fn amount_deltas(
        &self,
        lookback: Lookback,
    ) -> Result<Vec<PoolAmountDelta>, GatewayError> {
        let rows = sqlx::query_as::<_, AmountDeltaRow>(PoolStatisticQuery::amount_delta_select())
            .bind(lookback.duration())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(PoolAmountDelta::from).collect())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn page_bounds_fit_bigint() {
        assert_eq!(bounds(Page::new(10, 20)), (10, 20));
        assert_eq!(bounds(Page::new(10, u64::MAX)).1, i64::MAX);
    }

    #[test]
    fn statistic_view_is_named() {
        let Ok(view) = PostgresStore::statistic_view() else {
            panic!("view renders");
        };
        assert_eq!(view.name(), POOL_STATISTIC_VIEW);
        assert!(view.create_statement().starts_with("CREATE VIEW pool_statistic_view AS WITH"));
    }

    #[test]
    fn migrations_are_reversible() {
        assert!(MIGRATOR.iter().any(|m| m.migration_type.is_down_migration()));
    }

    mod live {
        //! Runs the statistics queries against a scratch database created
        //! per test from `DATABASE_URL`. Enabled with the `postgres-tests`
        //! feature.

        use std::str::FromStr;

        use bigdecimal::BigDecimal;
        use chrono::TimeDelta;
        use sqlx::PgPool;

        use crate::domain::{
            Contribution, ContributionId, Lookback, Page, Pool, PoolVolumes, RiskStatus, UserId,
        };
        use crate::persistence::{PoolStore, PostgresStore};

        fn amount(value: &str) -> BigDecimal {
            let Ok(amount) = BigDecimal::from_str(value) else {
                panic!("valid amount {value}");
            };
            amount
        }

        async fn ready(pool: PgPool) -> PostgresStore {
            let store = PostgresStore::new(pool);
            tokio_test::assert_ok!(store.setup().await);
            store
        }

        async fn seed_pool(store: &PostgresStore, token: &str) -> Pool {
            let Ok(pool) = store.create_pool(Pool::new(token, RiskStatus::Low)).await else {
                panic!("pool {token} created");
            };
            pool
        }

        async fn seed(
            store: &PostgresStore,
            pool: &Pool,
            id: Option<u128>,
            value: &str,
            age: TimeDelta,
        ) -> Contribution {
            let mut contribution = Contribution::new(UserId::new(), pool.id, amount(value));
            if let Some(id) = id {
                contribution.id = ContributionId::from_uuid(uuid::Uuid::from_u128(id));
            }
            let Ok(stored) = store.create_contribution(contribution).await else {
                panic!("contribution created");
            };
            backdate(store, &[stored.id], age).await;
            stored
        }

        /// Moves `created_at` of every listed row to one shared `now() - age`.
        async fn backdate(store: &PostgresStore, ids: &[ContributionId], age: TimeDelta) {
            let ids: Vec<uuid::Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
            let result = sqlx::query(
                "UPDATE user_pool SET created_at = now() - $2::interval WHERE id = ANY($1)",
            )
            .bind(ids)
            .bind(age)
            .execute(store.pool())
            .await;
            tokio_test::assert_ok!(result);
        }

        async fn volumes(store: &PostgresStore) -> Vec<PoolVolumes> {
            let Ok(page) = store.pool_volumes(Page::default()).await else {
                panic!("view readable");
            };
            page.items
        }

        fn row<'a>(rows: &'a [PoolVolumes], token: &str) -> &'a PoolVolumes {
            let Some(row) = rows.iter().find(|r| r.token == token) else {
                panic!("{token} missing from the view");
            };
            row
        }

        #[sqlx::test(migrations = "./migrations")]
        #[cfg_attr(not(feature = "postgres-tests"), ignore = "needs DATABASE_URL")]
        async fn view_reports_windowed_volumes(pool: PgPool) {
            let store = ready(pool).await;
            let btc = seed_pool(&store, "BTC").await;
            seed_pool(&store, "ETH").await;
            let ada = seed_pool(&store, "ADA").await;
            seed(&store, &btc, None, "100", TimeDelta::hours(80)).await;
            seed(&store, &btc, None, "150", TimeDelta::hours(50)).await;
            seed(&store, &btc, None, "200", TimeDelta::hours(20)).await;
            seed(&store, &btc, None, "300", TimeDelta::hours(1)).await;
            seed(&store, &ada, None, "100", TimeDelta::hours(200)).await;
            seed(&store, &ada, None, "400", TimeDelta::hours(100)).await;

            let rows = volumes(&store).await;
            let tokens: Vec<&str> = rows.iter().map(|r| r.token.as_str()).collect();
            assert_eq!(tokens, ["ADA", "BTC", "ETH"]);

            let btc_row = row(&rows, "BTC");
            assert_eq!(btc_row.volume, amount("200"));
            assert_eq!(btc_row.volume_24, amount("100"));
            assert_eq!(btc_row.volume_48, amount("100"));
            assert_eq!(btc_row.volume_72, amount("150"));

            let eth_row = row(&rows, "ETH");
            for value in [
                &eth_row.volume,
                &eth_row.volume_24,
                &eth_row.volume_48,
                &eth_row.volume_72,
            ] {
                assert_eq!(value, &amount("0"));
            }

            let ada_row = row(&rows, "ADA");
            assert_eq!(ada_row.volume, amount("300"));
            assert_eq!(ada_row.volume_24, amount("400"));
            assert_eq!(ada_row.volume_48, amount("400"));
            assert_eq!(ada_row.volume_72, amount("400"));
        }

        #[sqlx::test(migrations = "./migrations")]
        #[cfg_attr(not(feature = "postgres-tests"), ignore = "needs DATABASE_URL")]
        async fn horizon_edge_is_inclusive(pool: PgPool) {
            let store = ready(pool).await;
            let xrp = seed_pool(&store, "XRP").await;
            let day = TimeDelta::hours(24);
            seed(&store, &xrp, None, "10", day + TimeDelta::seconds(1)).await;
            seed(&store, &xrp, None, "40", day - TimeDelta::seconds(2)).await;
            seed(&store, &xrp, None, "100", TimeDelta::zero()).await;

            let rows = volumes(&store).await;
            let xrp_row = row(&rows, "XRP");
            assert_eq!(xrp_row.volume, amount("90"));
            assert_eq!(xrp_row.volume_24, amount("60"));
            assert_eq!(xrp_row.volume_48, amount("90"));
        }

        #[sqlx::test(migrations = "./migrations")]
        #[cfg_attr(not(feature = "postgres-tests"), ignore = "needs DATABASE_URL")]
        async fn equal_timestamps_resolve_by_id(pool: PgPool) {
            let store = ready(pool).await;
            let dot = seed_pool(&store, "DOT").await;
            let second = seed(&store, &dot, Some(2), "20", TimeDelta::hours(2)).await;
            let first = seed(&store, &dot, Some(1), "10", TimeDelta::hours(2)).await;
            backdate(&store, &[first.id, second.id], TimeDelta::hours(2)).await;
            seed(&store, &dot, None, "50", TimeDelta::hours(1)).await;

            for _ in 0..3 {
                let rows = volumes(&store).await;
                let dot_row = row(&rows, "DOT");
                assert_eq!(dot_row.volume, amount("40"));
                assert_eq!(dot_row.volume_24, amount("40"));
            }
        }

        #[sqlx::test(migrations = "./migrations")]
        #[cfg_attr(not(feature = "postgres-tests"), ignore = "needs DATABASE_URL")]
        async fn repeated_reads_are_identical(pool: PgPool) {
            let store = ready(pool).await;
            let btc = seed_pool(&store, "BTC").await;
            seed(&store, &btc, None, "100", TimeDelta::hours(30)).await;
            seed(&store, &btc, None, "175", TimeDelta::hours(2)).await;

            let first = volumes(&store).await;
            let second = volumes(&store).await;
            assert_eq!(first, second);
        }

        #[sqlx::test(migrations = "./migrations")]
        #[cfg_attr(not(feature = "postgres-tests"), ignore = "needs DATABASE_URL")]
        async fn amount_deltas_follow_lookback(pool: PgPool) {
            let store = ready(pool).await;
            let btc = seed_pool(&store, "BTC").await;
            seed_pool(&store, "ETH").await;
            seed(&store, &btc, None, "50", TimeDelta::hours(50)).await;
            seed(&store, &btc, None, "80", TimeDelta::hours(30)).await;
            seed(&store, &btc, None, "120", TimeDelta::hours(1)).await;

            let Ok(day) = store.amount_deltas(Lookback::default()).await else {
                panic!("deltas computed");
            };
            let Ok(two_days) = store
                .amount_deltas(Lookback::from_secs_saturating(2 * 86_400))
                .await
            else {
                panic!("deltas computed");
            };
            let ([btc_day, eth_day], [btc_two_days, _]) = (day.as_slice(), two_days.as_slice())
            else {
                panic!("one row per pool");
            };
            assert_eq!(btc_day.pool.token, "BTC");
            assert_eq!(btc_day.total_amount, amount("250"));
            assert_eq!(btc_day.amount_delta, amount("0"));
            assert_eq!(btc_two_days.amount_delta, amount("40"));
            assert_eq!(eth_day.total_amount, amount("0"));
            assert_eq!(eth_day.amount_delta, amount("0"));
        }

        #[sqlx::test(migrations = false)]
        #[cfg_attr(not(feature = "postgres-tests"), ignore = "needs DATABASE_URL")]
        async fn setup_and_teardown_are_idempotent(pool: PgPool) {
            let store = PostgresStore::new(pool);
            tokio_test::assert_ok!(store.setup().await);
            tokio_test::assert_ok!(store.setup().await);
            let Ok(status) = store.schema_status().await else {
                panic!("status readable");
            };
            assert!(status.view_present);
            assert!(status.pending.is_empty());

            tokio_test::assert_ok!(store.teardown().await);
            tokio_test::assert_ok!(store.teardown().await);
            let Ok(status) = store.schema_status().await else {
                panic!("status readable");
            };
            assert!(!status.view_present);
            assert!(status.applied.is_empty());
        }
    }
}
