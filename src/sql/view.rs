//! Named database views with idempotent create/drop hooks.

use sqlx::PgPool;

/// Existence check against the catalog, scoped to the current schema.
const VIEW_EXISTS: &str = "SELECT EXISTS (\
     SELECT 1 FROM pg_catalog.pg_views \
     WHERE schemaname = current_schema() AND viewname = $1)";

/// Serialises concurrent create/drop attempts for the same view name.
const VIEW_LOCK: &str = "SELECT pg_advisory_xact_lock(hashtext($1))";

/// A query materialised as a named view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDefinition {
    name: String,
    select: String,
}

impl ViewDefinition {
    /// Creates a definition for view `name` over `select`.
    #[must_use]
    pub fn new(name: impl Into<String>, select: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            select: select.into(),
        }
    }

    /// View name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `CREATE VIEW` statement.
    #[must_use]
    pub fn create_statement(&self) -> String {
        format!("CREATE VIEW {} AS {}", self.name, self.select)
    }

    /// `DROP VIEW` statement.
    #[must_use]
    pub fn drop_statement(&self) -> String {
        format!("DROP VIEW {}", self.name)
    }

    /// Returns `true` if the view exists in the current schema.
    ///
    /// # Errors
    ///
    /// Propagates any database error.
    pub async fn exists(&self, pool: &PgPool) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(VIEW_EXISTS)
            .bind(&self.name)
            .fetch_one(pool)
            .await
    }

    /// Creates the view unless it already exists.
    ///
    /// Returns `true` when the view was created by this call.
    ///
    /// # Errors
    ///
    /// Propagates any database error.
    pub async fn create_if_absent(&self, pool: &PgPool) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query(VIEW_LOCK)
            .bind(&self.name)
            .execute(&mut *tx)
            .await?;

        let exists = sqlx::query_scalar::<_, bool>(VIEW_EXISTS)
            .bind(&self.name)
            .fetch_one(&mut *tx)
            .await?;
        if exists {
            tx.commit().await?;
            tracing::debug!(view = %self.name, "view already present");
            return Ok(false);
        }

        let statement = self.create_statement();
        sqlx::query(&statement).execute(&mut *tx).await?;
        tx.commit().await?;

        tracing::info!(view = %self.name, "view created");
        Ok(true)
    }

    /// Drops the view if it exists.
    ///
    /// Returns `true` when the view was dropped by this call.
    ///
    /// # Errors
    ///
    /// Propagates any database error.
    pub async fn drop_if_present(&self, pool: &PgPool) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query(VIEW_LOCK)
            .bind(&self.name)
            .execute(&mut *tx)
            .await?;

        let exists = sqlx::query_scalar::<_, bool>(VIEW_EXISTS)
            .bind(&self.name)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            tx.commit().await?;
            tracing::debug!(view = %self.name, "view already absent");
            return Ok(false);
        }

        let statement = self.drop_statement();
        sqlx::query(&statement).execute(&mut *tx).await?;
        tx.commit().await?;

        tracing::info!(view = %self.name, "view dropped");
        Ok(true)
    }
}
