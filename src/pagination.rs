//! Common functionality for paging list endpoints.

use serde::{Deserialize, Serialize};

/// The page size limits applied to list requests.
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The page size to use when not specified in a request.
    pub default_page_size: u64,
    /// The largest page size a request may ask for. Larger values are
    /// clamped, not rejected.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// The `page`/`per_page` query parameters shared by list endpoints.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PageParams {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl PageParams {
    /// Resolve the raw parameters against `config`, clamping out-of-range
    /// values instead of rejecting them.
    pub fn resolve(&self, config: &PaginationConfig) -> PageRequest {
        let page = self.page.unwrap_or(config.default_page).max(1);
        let per_page = self
            .per_page
            .unwrap_or(config.default_page_size)
            .clamp(1, config.max_page_size);

        PageRequest { page, per_page }
    }
}

/// A resolved page request: page number (1-based) and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    /// The number of rows to skip for this page.
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.per_page
    }
}

/// The response envelope for list endpoints.
#[derive(Debug, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub pages: u64,
}

impl<T> Page<T> {
    /// Wrap one page of `items` out of `total` matching rows.
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            per_page: request.per_page,
            pages: total.div_ceil(request.per_page),
        }
    }
}
