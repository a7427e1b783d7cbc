//! Pagination types for list endpoints.
//!
//! Pages are 0-based. A page and its total are always produced by the same
//! filter, so `total` never drifts from what `content` was drawn from.

use serde::{Deserialize, Serialize};

/// Default page size.
pub const DEFAULT_PAGE_SIZE: u64 = 20;
/// Maximum page size.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (0-based).
    pub page: u64,
    /// Number of items per page.
    pub size: u64,
}

impl PageRequest {
    /// Create a new page request, clamping the size into `1..=MAX_PAGE_SIZE`.
    pub fn new(page: u64, size: u64) -> Self {
        Self {
            page,
            size: size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Calculate the `OFFSET` value, capped at `i64::MAX`.
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size).min(i64::MAX as u64)
    }

    /// Return the `LIMIT` value.
    pub fn limit(&self) -> u64 {
        self.size
    }

    /// `OFFSET` as bound to a SQL `BIGINT` parameter.
    pub fn sql_offset(&self) -> i64 {
        i64::try_from(self.offset()).unwrap_or(i64::MAX)
    }

    /// `LIMIT` as bound to a SQL `BIGINT` parameter.
    pub fn sql_limit(&self) -> i64 {
        i64::try_from(self.limit()).unwrap_or(i64::MAX)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    /// The items on this page.
    pub content: Vec<T>,
    /// Current page number (0-based).
    pub page: u64,
    /// Number of items per page.
    pub size: u64,
    /// Total number of matching items across all pages.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u64,
    /// Whether there is a next page.
    pub has_next: bool,
    /// Whether there is a previous page.
    pub has_previous: bool,
}

impl<T> PageResponse<T> {
    /// Create a new paginated response.
    pub fn new(content: Vec<T>, request: PageRequest, total: u64) -> Self {
        let total_pages = total.div_ceil(request.size.max(1));
        Self {
            content,
            page: request.page,
            size: request.size,
            total,
            total_pages,
            has_next: request.page.saturating_add(1) < total_pages,
            has_previous: request.page > 0,
        }
    }

    /// Convert the items while keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResponse<U> {
        PageResponse {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total: self.total,
            total_pages: self.total_pages,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}
