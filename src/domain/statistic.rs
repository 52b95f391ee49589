//! Per-pool volume statistics evaluated in-process.
//!
//! These functions compute exactly what the `pool_statistic_view` query
//! and the ad-hoc delta query compute in PostgreSQL, over an in-memory
//! snapshot. The horizon frames are the same [`WindowFrame`] values the
//! SQL builder renders, evaluated with [`WindowFrame::admits`] against a
//! "now" anchor.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{Contribution, Lookback, Pool, PoolId, RiskStatus};
use crate::sql::{FrameError, RangeInterval, WindowFrame};

/// Fixed look-back horizons exposed as `volume_24/48/72`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Horizon {
    /// Last 24 hours.
    Day,
    /// Last 48 hours.
    TwoDays,
    /// Last 72 hours.
    ThreeDays,
}

/// All horizons, shortest first.
pub const HORIZONS: [Horizon; 3] = [Horizon::Day, Horizon::TwoDays, Horizon::ThreeDays];

impl Horizon {
    /// Horizon length in hours.
    #[must_use]
    pub const fn hours(self) -> i64 {
        match self {
            Self::Day => 24,
            Self::TwoDays => 48,
            Self::ThreeDays => 72,
        }
    }

    /// Horizon length.
    #[must_use]
    pub fn duration(self) -> TimeDelta {
        TimeDelta::hours(self.hours())
    }

    /// `RANGE BETWEEN <hours> PRECEDING AND CURRENT ROW` over the
    /// contribution timestamp.
    #[must_use]
    pub fn frame(self) -> WindowFrame {
        WindowFrame::trailing(RangeInterval::preceding(self.duration()))
    }
}

/// Windowed volume figures for one pool.
///
/// Every field is `latest amount − reference amount`. `volume` is zero
/// when the pool has no contributions. A horizon without contributions
/// inside it takes zero as its reference, so its volume equals the latest
/// amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PoolVolumes {
    /// Pool identifier.
    pub pool_id: PoolId,
    /// Pool token symbol.
    pub token: String,
    /// Pool risk classification.
    pub risk_status: RiskStatus,
    /// Latest minus earliest-ever amount.
    #[schema(value_type = String)]
    pub volume: BigDecimal,
    /// Latest minus earliest amount within 24 hours.
    #[schema(value_type = String)]
    pub volume_24: BigDecimal,
    /// Latest minus earliest amount within 48 hours.
    #[schema(value_type = String)]
    pub volume_48: BigDecimal,
    /// Latest minus earliest amount within 72 hours.
    #[schema(value_type = String)]
    pub volume_72: BigDecimal,
}

impl PoolVolumes {
    /// Volume for the given horizon.
    #[must_use]
    pub const fn volume_for(&self, horizon: Horizon) -> &BigDecimal {
        match horizon {
            Horizon::Day => &self.volume_24,
            Horizon::TwoDays => &self.volume_48,
            Horizon::ThreeDays => &self.volume_72,
        }
    }
}

/// Two-point amount delta over a caller-chosen lookback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolAmountDelta {
    /// The pool.
    pub pool: Pool,
    /// Sum of every contribution amount of the pool.
    pub total_amount: BigDecimal,
    /// Latest amount minus the earliest amount inside the lookback.
    pub amount_delta: BigDecimal,
}

/// Contributions selected for one pool by the volume windows.
#[derive(Debug, Clone, Copy, Default)]
pub struct VolumeWindow<'a> {
    /// Most recent contribution.
    pub latest: Option<&'a Contribution>,
    /// Earliest contribution, no time restriction.
    pub earliest: Option<&'a Contribution>,
    /// Earliest contribution within 24 hours of now.
    pub earliest_24: Option<&'a Contribution>,
    /// Earliest contribution within 48 hours of now.
    pub earliest_48: Option<&'a Contribution>,
    /// Earliest contribution within 72 hours of now.
    pub earliest_72: Option<&'a Contribution>,
}

impl<'a> VolumeWindow<'a> {
    /// Earliest contribution within `horizon`.
    #[must_use]
    pub const fn earliest_within(&self, horizon: Horizon) -> Option<&'a Contribution> {
        match horizon {
            Horizon::Day => self.earliest_24,
            Horizon::TwoDays => self.earliest_48,
            Horizon::ThreeDays => self.earliest_72,
        }
    }

    fn volumes(&self, pool: &Pool) -> PoolVolumes {
        PoolVolumes {
            pool_id: pool.id,
            token: pool.token.clone(),
            risk_status: pool.risk_status,
            volume: difference(self.latest, self.earliest),
            volume_24: horizon_volume(self.latest, self.earliest_24),
            volume_48: horizon_volume(self.latest, self.earliest_48),
            volume_72: horizon_volume(self.latest, self.earliest_72),
        }
    }
}

/// Selects latest, earliest and per-horizon earliest contributions of one
/// pool, anchored at `now`.
///
/// Ties on `created_at` are broken by contribution id, so repeated
/// evaluation over the same data always selects the same rows.
///
/// # Errors
///
/// Returns a [`FrameError`] if a horizon bound cannot be applied to `now`.
pub fn evaluate_pool<'a>(
    contributions: &[&'a Contribution],
    now: DateTime<Utc>,
) -> Result<VolumeWindow<'a>, FrameError> {
    let mut ordered = contributions.to_vec();
    ordered.sort_by_key(|c| c.ordering_key());

    let earliest_within = |horizon: Horizon| -> Result<Option<&'a Contribution>, FrameError> {
        let frame = horizon.frame();
        for contribution in &ordered {
            if frame.admits(now, contribution.created_at)? {
                return Ok(Some(*contribution));
            }
        }
        Ok(None)
    };

    Ok(VolumeWindow {
        latest: ordered.last().copied(),
        earliest: ordered.first().copied(),
        earliest_24: earliest_within(Horizon::Day)?,
        earliest_48: earliest_within(Horizon::TwoDays)?,
        earliest_72: earliest_within(Horizon::ThreeDays)?,
    })
}

/// Computes [`PoolVolumes`] for every pool, including pools without
/// contributions. Output is ordered by token, then pool id.
///
/// # Errors
///
/// Returns a [`FrameError`] if a horizon bound cannot be applied to `now`.
pub fn compute_volumes(
    pools: &[Pool],
    contributions: &[Contribution],
    now: DateTime<Utc>,
) -> Result<Vec<PoolVolumes>, FrameError> {
    let by_pool = group_by_pool(contributions);
    let mut rows = pools
        .iter()
        .map(|pool| {
            let owned = by_pool.get(&pool.id).map_or(&[][..], Vec::as_slice);
            evaluate_pool(owned, now).map(|window| window.volumes(pool))
        })
        .collect::<Result<Vec<_>, _>>()?;
    rows.sort_by(|a, b| (&a.token, a.pool_id).cmp(&(&b.token, b.pool_id)));
    Ok(rows)
}

/// Computes the total amount and the lookback delta for every pool,
/// including pools without contributions. Output is ordered by token, then
/// pool id.
#[must_use]
pub fn compute_amount_deltas(
    pools: &[Pool],
    contributions: &[Contribution],
    lookback: Lookback,
    now: DateTime<Utc>,
) -> Vec<PoolAmountDelta> {
    let by_pool = group_by_pool(contributions);
    let window_start = now
        .checked_sub_signed(lookback.duration())
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let mut rows: Vec<PoolAmountDelta> = pools
        .iter()
        .map(|pool| {
            let owned = by_pool.get(&pool.id).map_or(&[][..], Vec::as_slice);
            let total_amount = owned
                .iter()
                .fold(BigDecimal::from(0), |acc, c| acc + &c.amount);
            let latest = owned.iter().copied().max_by_key(|c| c.ordering_key());
            let earliest_in_window = owned
                .iter()
                .copied()
                .filter(|c| c.created_at >= window_start && c.created_at <= now)
                .min_by_key(|c| c.ordering_key());
            PoolAmountDelta {
                pool: pool.clone(),
                total_amount,
                amount_delta: difference(latest, earliest_in_window),
            }
        })
        .collect();
    rows.sort_by(|a, b| (&a.pool.token, a.pool.id).cmp(&(&b.pool.token, b.pool.id)));
    rows
}

fn group_by_pool(contributions: &[Contribution]) -> HashMap<PoolId, Vec<&Contribution>> {
    let mut by_pool: HashMap<PoolId, Vec<&Contribution>> = HashMap::new();
    for contribution in contributions {
        by_pool
            .entry(contribution.pool_id)
            .or_default()
            .push(contribution);
    }
    by_pool
}

fn difference(latest: Option<&Contribution>, reference: Option<&Contribution>) -> BigDecimal {
    match (latest, reference) {
        (Some(latest), Some(reference)) => &latest.amount - &reference.amount,
        _ => BigDecimal::from(0),
    }
}

fn horizon_volume(latest: Option<&Contribution>, reference: Option<&Contribution>) -> BigDecimal {
    match (latest, reference) {
        (Some(latest), Some(reference)) => &latest.amount - &reference.amount,
        (Some(latest), None) => latest.amount.clone(),
        (None, _) => BigDecimal::from(0),
    }
}
