//! Pools and their risk classification.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::PoolId;

/// Risk classification assigned to a pool by an administrator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "pool_risk_status", rename_all = "lowercase")]
pub enum RiskStatus {
    /// Low risk.
    Low,
    /// Medium risk.
    Medium,
    /// High risk.
    High,
}

impl RiskStatus {
    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown risk status: {other}")),
        }
    }
}

/// A pool users can contribute to.
///
/// `id` and `token` never change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Pool {
    /// Pool identifier.
    pub id: PoolId,
    /// Token symbol, e.g. `"BTC"`.
    pub token: String,
    /// Current risk classification.
    pub risk_status: RiskStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Pool {
    /// Creates a pool with a fresh identifier, timestamped now.
    #[must_use]
    pub fn new(token: impl Into<String>, risk_status: RiskStatus) -> Self {
        Self {
            id: PoolId::new(),
            token: token.into(),
            risk_status,
            created_at: Utc::now(),
        }
    }
}
