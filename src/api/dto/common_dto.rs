//! Shared DTO types used across multiple endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::page::DEFAULT_LIMIT;
use crate::domain::{Page, Paged};

/// Pagination query parameters for list endpoints.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Items per page, clamped to 1..=100. Defaults to 25.
    pub limit: Option<u32>,
    /// Items to skip. Defaults to 0.
    pub offset: Option<u64>,
}

impl PaginationParams {
    /// Converts to a clamped [`Page`].
    #[must_use]
    pub fn page(&self) -> Page {
        Page::new(
            self.limit.unwrap_or(DEFAULT_LIMIT),
            self.offset.unwrap_or(0),
        )
    }
}

/// One page of a listing plus its total size.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PageResponse<T> {
    /// Items in the requested window.
    pub items: Vec<T>,
    /// Total number of items.
    pub total: u64,
}

impl<T> From<Paged<T>> for PageResponse<T> {
    fn from(paged: Paged<T>) -> Self {
        Self {
            items: paged.items,
            total: paged.total,
        }
    }
}
