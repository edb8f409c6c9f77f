//! Page-number pagination helpers.

use serde::{Deserialize, Serialize};

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Maximum page size a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query parameters for paginated list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    pub page_size: Option<u32>,
}

fn default_page() -> u32 {
    1
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: None,
        }
    }
}

impl PageQuery {
    /// Effective page number (1-based; zero is clamped to 1).
    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    /// Effective page size, clamped to `[1, MAX_PAGE_SIZE]`.
    pub fn effective_page_size(&self, default: u32) -> u32 {
        self.page_size
            .unwrap_or(default)
            .clamp(1, MAX_PAGE_SIZE.max(default))
    }

    /// SQL OFFSET for the current page.
    pub fn offset(&self, page_size: u32) -> i64 {
        i64::from(self.page() - 1) * i64::from(page_size)
    }
}

/// Wrapper for paginated list responses.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub count: i64,
    pub page: u32,
    pub page_size: u32,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(count: i64, query: &PageQuery, page_size: u32, results: Vec<T>) -> Self {
        Self {
            count,
            page: query.page(),
            page_size,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults() {
        let q = PageQuery::default();
        assert_eq!(q.page(), 1);
        assert_eq!(q.effective_page_size(DEFAULT_PAGE_SIZE), DEFAULT_PAGE_SIZE);
        assert_eq!(q.offset(DEFAULT_PAGE_SIZE), 0);
    }

    #[test]
    fn test_page_zero_clamped() {
        let q = PageQuery {
            page: 0,
            page_size: None,
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.offset(10), 0);
    }

    #[test]
    fn test_page_size_clamped_to_max() {
        let q = PageQuery {
            page: 1,
            page_size: Some(10_000),
        };
        assert_eq!(q.effective_page_size(DEFAULT_PAGE_SIZE), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_large_default_allowed() {
        // The geojson endpoint uses a default page size above MAX_PAGE_SIZE.
        let q = PageQuery::default();
        assert_eq!(q.effective_page_size(1000), 1000);
    }

    #[test]
    fn test_offset_for_later_page() {
        let q = PageQuery {
            page: 3,
            page_size: Some(25),
        };
        let size = q.effective_page_size(DEFAULT_PAGE_SIZE);
        assert_eq!(size, 25);
        assert_eq!(q.offset(size), 50);
    }

    #[test]
    fn test_query_deserialization() {
        let q: PageQuery = serde_json::from_str(r#"{"page": 2, "page_size": 30}"#).unwrap();
        assert_eq!(q.page(), 2);
        assert_eq!(q.effective_page_size(DEFAULT_PAGE_SIZE), 30);
    }
}
