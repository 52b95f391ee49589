//! Service layer: business logic orchestration.
//!
//! [`PoolService`] validates requests, checks cross-entity references and
//! delegates storage and statistics to a [`crate::persistence::PoolStore`].

pub mod pool_service;

pub use pool_service::PoolService;
