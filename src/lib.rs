//! # margin-gateway
//!
//! REST back-office for margin pools and the users' contributions into
//! them, with time-windowed volume statistics computed in PostgreSQL.
//!
//! Per pool, the statistics report the latest contribution amount minus
//! the earliest one, overall and within the last 24, 48 and 72 hours.
//! They are served from the `pool_statistic_view` view, built from
//! `RANGE BETWEEN INTERVAL '…' PRECEDING AND CURRENT ROW` window frames.
//! A second read computes a two-point amount delta over a caller-chosen
//! lookback.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── PoolService (service/)
//!     │
//!     ├── PoolStore (persistence/)
//!     │     ├── PostgresStore ── pool_statistic_view (sql/)
//!     │     └── MemoryStore ──── statistic evaluator (domain/)
//!     │
//!     └── PostgreSQL
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod sql;
