//! Offset pagination shared by the list operations.

/// Default number of items per page.
pub const DEFAULT_LIMIT: u32 = 25;

/// Upper bound on items per page.
pub const MAX_LIMIT: u32 = 100;

/// A `limit`/`offset` window over an ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Maximum number of items to return.
    pub limit: u32,
    /// Number of items to skip.
    pub offset: u64,
}

impl Page {
    /// Creates a page, clamping `limit` into `1..=MAX_LIMIT`.
    #[must_use]
    pub fn new(limit: u32, offset: u64) -> Self {
        Self {
            limit: limit.clamp(1, MAX_LIMIT),
            offset,
        }
    }

    /// Applies the window to an already ordered iterator.
    pub fn slice<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(usize::try_from(self.offset).unwrap_or(usize::MAX))
            .take(self.limit as usize)
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT, 0)
    }
}

/// One page of results plus the total size of the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paged<T> {
    /// Items in the requested window.
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(Page::new(0, 0).limit, 1);
        assert_eq!(Page::new(500, 0).limit, MAX_LIMIT);
        assert_eq!(Page::default().limit, DEFAULT_LIMIT);
    }

    #[test]
    fn slice_skips_and_takes() {
        let page = Page::new(2, 1);
        assert_eq!(page.slice(1..=5), vec![2, 3]);
    }

    #[test]
    fn slice_past_end_is_empty() {
        let page = Page::new(10, 50);
        assert!(page.slice(0..3).is_empty());
    }
}
