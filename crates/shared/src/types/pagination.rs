//! Pagination types for list endpoints.
//!
//! List endpoints accept `page` (1-based) and `pageSize`. When neither is
//! given the full set is returned unpaginated.

use serde::{Deserialize, Serialize};

const DEFAULT_PAGE: u64 = 1;
const DEFAULT_PAGE_SIZE: u64 = 10;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// Page number (1-indexed).
    pub page: Option<u64>,
    /// Number of items per page.
    pub page_size: Option<u64>,
}

impl PageRequest {
    /// Creates a request for the given page and page size.
    #[must_use]
    pub const fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    /// A request for the whole, unpaginated set.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            page: None,
            page_size: None,
        }
    }

    /// Returns true if either parameter was supplied.
    #[must_use]
    pub const fn is_paginated(&self) -> bool {
        self.page.is_some() || self.page_size.is_some()
    }

    /// Page number, clamped to at least 1.
    #[must_use]
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(DEFAULT_PAGE).max(1)
    }

    /// Page size, clamped to at least 1.
    #[must_use]
    pub fn page_size(&self) -> u64 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1)
    }

    /// Calculates the offset for database queries.
    #[must_use]
    pub fn offset(&self) -> u64 {
        (self.page() - 1).saturating_mul(self.page_size())
    }

    /// Returns the limit for database queries.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.page_size()
    }

    /// Returns `(offset, limit)` when paginated, `None` for the full set.
    #[must_use]
    pub fn window(&self) -> Option<(u64, u64)> {
        self.is_paginated().then(|| (self.offset(), self.limit()))
    }
}

/// Response wrapper for list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// The items in the current page (or the full set).
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total_count: u64,
    /// Items per page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,
    /// Current page number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u64>,
    /// Total number of pages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
}

impl<T> Page<T> {
    /// Builds a response for the given request.
    ///
    /// `totalPages = ceil(totalCount / pageSize)`.
    #[must_use]
    pub fn new(items: Vec<T>, total_count: u64, request: &PageRequest) -> Self {
        if !request.is_paginated() {
            return Self::unpaginated(items, total_count);
        }
        let page_size = request.page_size();
        Self {
            items,
            total_count,
            page_size: Some(page_size),
            current_page: Some(request.page()),
            total_pages: Some(total_count.div_ceil(page_size)),
        }
    }

    /// Builds a response holding the full set.
    #[must_use]
    pub fn unpaginated(items: Vec<T>, total_count: u64) -> Self {
        Self {
            items,
            total_count,
            page_size: None,
            current_page: None,
            total_pages: None,
        }
    }

    /// Maps the items while keeping the pagination metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page_size: self.page_size,
            current_page: self.current_page,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod tests;
