//! Builds the pool statistics queries.
//!
//! The volume query runs in one pass over `user_pool`:
//!
//! 1. `ranked` numbers each pool's contributions by `(created_at, id)`.
//! 2. `anchored` adds one row per pool stamped `now()` that carries no
//!    amount. Horizon frames are evaluated on this row, so
//!    `RANGE BETWEEN <H> PRECEDING AND CURRENT ROW` covers exactly the
//!    contributions in `[now - H, now]`.
//! 3. `windowed` takes the latest/earliest amounts over the whole
//!    partition and the lowest-ranked amount inside each horizon frame.
//! 4. The final select keeps only the anchor row of each pool and joins
//!    it from `pool`, so pools without contributions still appear.
//!
//! A horizon with no contribution inside it reads its earliest amount as
//! zero, so `volume_H` is then the latest amount itself.
//!
//! `min(ARRAY[seq, amount])` picks the lowest-ranked row's amount, which
//! keeps equal timestamps deterministic: a `RANGE` frame with an offset
//! allows only one ordering column, so `first_value` could return any
//! peer.

use super::window::{FrameError, WindowFrame, WindowSpec};
use crate::domain::HORIZONS;

/// Name of the view exposing the windowed volumes.
pub const POOL_STATISTIC_VIEW: &str = "pool_statistic_view";

/// Query builder for the statistics engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolStatisticQuery;

impl PoolStatisticQuery {
    /// `SELECT` materialised as [`POOL_STATISTIC_VIEW`].
    ///
    /// Columns: `id, token, risk_status, volume, volume_24, volume_48,
    /// volume_72`. Volumes are never null, and all are zero for a pool
    /// without contributions.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] if a window clause cannot be rendered.
    pub fn view_select() -> Result<String, FrameError> {
        let whole_partition = WindowFrame::rows((None, None));
        let latest = WindowSpec::partition_by("pool_id")
            .order_by("seq DESC NULLS LAST")
            .frame(whole_partition)
            .to_sql()?;
        let earliest = WindowSpec::partition_by("pool_id")
            .order_by("seq ASC NULLS LAST")
            .frame(whole_partition)
            .to_sql()?;

        let mut horizon_columns = Vec::with_capacity(HORIZONS.len());
        let mut volume_columns = Vec::with_capacity(HORIZONS.len());
        for horizon in HORIZONS {
            let over = WindowSpec::partition_by("pool_id")
                .order_by("created_at ASC")
                .frame(horizon.frame())
                .to_sql()?;
            let hours = horizon.hours();
            horizon_columns.push(format!(
                "(min(ranked_amount) {over})[2] AS earliest_amount_{hours}"
            ));
            volume_columns.push(format!(
                "COALESCE(w.latest_amount, 0) - COALESCE(w.earliest_amount_{hours}, 0) AS volume_{hours}"
            ));
        }

        Ok(format!(
            "WITH ranked AS (\
                 SELECT pool_id, amount, created_at, \
                        row_number() OVER (PARTITION BY pool_id ORDER BY created_at ASC, id ASC) AS seq \
                 FROM user_pool\
             ), \
             anchored AS (\
                 SELECT pool_id, amount, created_at, seq, \
                        ARRAY[seq::numeric, amount] AS ranked_amount, FALSE AS is_anchor \
                 FROM ranked \
                 UNION ALL \
                 SELECT id, NULL::numeric, now(), NULL::bigint, NULL::numeric[], TRUE \
                 FROM pool\
             ), \
             windowed AS (\
                 SELECT pool_id, is_anchor, \
                        first_value(amount) {latest} AS latest_amount, \
                        first_value(amount) {earliest} AS earliest_amount, \
                        {horizons} \
                 FROM anchored\
             ) \
             SELECT p.id, p.token, p.risk_status, \
                    COALESCE(w.latest_amount - w.earliest_amount, 0) AS volume, \
                    {volumes} \
             FROM pool p \
             LEFT JOIN windowed w ON w.pool_id = p.id AND w.is_anchor",
            horizons = horizon_columns.join(", "),
            volumes = volume_columns.join(", "),
        ))
    }

    /// Page of the view ordered by token then id; binds `$1` limit, `$2` offset.
    #[must_use]
    pub fn volumes_page_select() -> String {
        format!(
            "SELECT id, token, risk_status, volume, volume_24, volume_48, volume_72 \
             FROM {POOL_STATISTIC_VIEW} ORDER BY token ASC, id ASC LIMIT $1 OFFSET $2"
        )
    }

    /// Per-pool total amount and lookback delta; binds `$1` as the lookback
    /// interval.
    ///
    /// The delta is `latest amount − earliest amount created in
    /// [now − $1, now]`, zero when either is missing.
    #[must_use]
    pub const fn amount_delta_select() -> &'static str {
        "SELECT p.id, p.token, p.risk_status, p.created_at, \
                COALESCE(SUM(up.amount), 0) AS total_amount, \
                COALESCE(latest.amount - earliest.amount, 0) AS amount_delta \
         FROM pool p \
         LEFT JOIN LATERAL (\
             SELECT amount FROM user_pool \
             WHERE pool_id = p.id \
             ORDER BY created_at DESC, id DESC LIMIT 1\
         ) latest ON TRUE \
         LEFT JOIN LATERAL (\
             SELECT amount FROM user_pool \
             WHERE pool_id = p.id AND created_at >= now() - $1::interval AND created_at <= now() \
             ORDER BY created_at ASC, id ASC LIMIT 1\
         ) earliest ON TRUE \
         LEFT JOIN user_pool up ON up.pool_id = p.id \
         GROUP BY p.id, latest.amount, earliest.amount \
         ORDER BY p.token ASC, p.id ASC"
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn view_sql() -> String {
        let Ok(sql) = PoolStatisticQuery::view_select() else {
            panic!("view query renders");
        };
        sql
    }

    #[test]
    fn horizon_frames_use_interval_literals() {
        let sql = view_sql();
        for seconds in [86_400, 172_800, 259_200] {
            let clause = format!(
                "ORDER BY created_at ASC RANGE BETWEEN INTERVAL '{seconds} seconds' PRECEDING AND CURRENT ROW"
            );
            assert!(sql.contains(&clause), "missing frame for {seconds}s");
        }
        assert!(!sql.contains("BETWEEN 86400 PRECEDING"));
    }

    #[test]
    fn exposes_all_volume_columns() {
        let sql = view_sql();
        for column in [
            "AS volume,",
            "AS volume_24",
            "AS volume_48",
            "AS volume_72",
        ] {
            assert!(sql.contains(column), "missing {column}");
        }
    }

    #[test]
    fn volumes_are_coalesced_to_zero() {
        let sql = view_sql();
        assert!(sql.contains("COALESCE(w.latest_amount - w.earliest_amount, 0)"));
        assert!(sql.contains("COALESCE(w.latest_amount, 0) - COALESCE(w.earliest_amount_24, 0)"));
    }

    #[test]
    fn every_pool_is_kept_with_one_anchor_row() {
        let sql = view_sql();
        assert!(sql.contains("FROM pool p LEFT JOIN windowed w ON w.pool_id = p.id AND w.is_anchor"));
        assert!(sql.contains("SELECT id, NULL::numeric, now(), NULL::bigint, NULL::numeric[], TRUE FROM pool"));
    }

    #[test]
    fn ties_are_ranked_by_identity() {
        let sql = view_sql();
        assert!(sql.contains("ORDER BY created_at ASC, id ASC) AS seq"));
    }

    #[test]
    fn amount_delta_is_parameterised_and_outer_joined() {
        let sql = PoolStatisticQuery::amount_delta_select();
        assert!(sql.contains("now() - $1::interval"));
        assert!(sql.contains("COALESCE(SUM(up.amount), 0) AS total_amount"));
        assert!(sql.contains("LEFT JOIN user_pool up"));
    }

    #[test]
    fn page_select_reads_from_view() {
        let sql = PoolStatisticQuery::volumes_page_select();
        assert!(sql.contains("FROM pool_statistic_view"));
        assert!(sql.ends_with("LIMIT $1 OFFSET $2"));
    }
}
