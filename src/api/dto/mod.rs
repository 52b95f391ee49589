//! Data Transfer Objects for REST request/response serialization.
//!
//! All decimal amounts are serialized as JSON strings to prevent
//! precision loss.

pub mod common_dto;
pub mod contribution_dto;
pub mod pool_dto;

pub use common_dto::*;
pub use contribution_dto::*;
pub use pool_dto::*;
