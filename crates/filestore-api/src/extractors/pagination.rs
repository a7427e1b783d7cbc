//! Pagination query parameter extractor.

use serde::Deserialize;

use filestore_core::types::pagination::DEFAULT_PAGE_SIZE;
use filestore_core::types::PageRequest;

/// Query parameters shared by the paged listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    /// Page number (0-based).
    pub page: Option<u64>,
    /// Items per page, clamped to `1..=100`.
    pub size: Option<u64>,
    /// `field[,asc|desc]`.
    pub sort: Option<String>,
}

impl PaginationParams {
    /// Convert to the service-layer page request.
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(0), self.size.unwrap_or(DEFAULT_PAGE_SIZE))
    }

    /// The sort expression, if one was given.
    pub fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_clamping() {
        let params = PaginationParams::default();
        assert_eq!(params.page_request(), PageRequest::new(0, 20));

        let params = PaginationParams {
            page: Some(3),
            size: Some(500),
            sort: Some("name,asc".into()),
        };
        let request = params.page_request();
        assert_eq!(request.page, 3);
        assert_eq!(request.size, 100);
        assert_eq!(params.sort(), Some("name,asc"));
    }
}
