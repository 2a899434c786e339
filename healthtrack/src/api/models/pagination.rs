//! Page-based pagination types shared by every listing.
//!
//! Listings take a 1-based page number (`current`) and a page size (`size`) and answer with a
//! [`PageResponse`] whose metadata is derived from a distinct-parent count, never from the number
//! of rows a join happened to return.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::config::PaginationConfig;
use crate::errors::{Error, Result};

/// Page requested when the caller does not name one.
pub const DEFAULT_CURRENT: i64 = 1;

/// Page parameters as received from a caller.
///
/// Numbers are accepted as JSON numbers or strings (query strings). A missing `current` defaults
/// to the first page and a missing `size` to the configured default. An explicit `null` page
/// number is kept as missing and rejected by [`PageRequest::resolve`].
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PageRequest {
    /// 1-based page number
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>", no_default)]
    pub current: Option<i64>,

    /// Number of parent records per page
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>", no_default)]
    pub size: Option<i64>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            current: Some(DEFAULT_CURRENT),
            size: None,
        }
    }
}

impl PageRequest {
    pub fn new(current: i64, size: i64) -> Self {
        Self {
            current: Some(current),
            size: Some(size),
        }
    }

    /// Check the parameters against the configured bounds.
    pub fn resolve(&self, bounds: &PaginationConfig) -> Result<Page> {
        let current = self.current.ok_or_else(|| Error::InvalidPageParameter {
            message: "current is required".to_string(),
        })?;
        let size = self.size.unwrap_or(bounds.default_size);

        if current < 1 {
            return Err(Error::InvalidPageParameter {
                message: format!("current must be at least 1, got {current}"),
            });
        }
        if current > bounds.max_current {
            return Err(Error::InvalidPageParameter {
                message: format!("current must be at most {}, got {current}", bounds.max_current),
            });
        }
        if size < 1 || size < bounds.min_size || size > bounds.max_size {
            return Err(Error::InvalidPageParameter {
                message: format!("size must be between {} and {}, got {size}", bounds.min_size.max(1), bounds.max_size),
            });
        }

        Ok(Page { current, size })
    }
}

/// Validated page parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub current: i64,
    pub size: i64,
}

impl Page {
    /// Number of rows to skip: `(current - 1) * size`
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.current - 1) * self.size
    }

    #[inline]
    pub fn limit(&self) -> i64 {
        self.size
    }
}

/// `ceil(total / size)`, or 0 when `size` is 0.
pub fn total_pages(total: i64, size: i64) -> i64 {
    if size <= 0 || total <= 0 {
        return 0;
    }
    (total + size - 1) / size
}

/// One page of parent records with their nested children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub current: i64,
    pub size: i64,
    /// Distinct parent records matching the filter
    pub total: i64,
    pub pages: i64,
    pub has_previous: bool,
    pub has_next: bool,
    pub data_list: Vec<T>,
}

impl<T> PageResponse<T> {
    pub fn new(page: Page, total: i64, data_list: Vec<T>) -> Self {
        let pages = total_pages(total, page.size);
        Self {
            current: page.current,
            size: page.size,
            total,
            pages,
            has_previous: page.current > 1,
            has_next: page.current < pages,
            data_list,
        }
    }

    /// The explicit empty page returned when nothing matches the filter.
    pub fn empty() -> Self {
        Self {
            current: 0,
            size: 0,
            total: 0,
            pages: 0,
            has_previous: false,
            has_next: false,
            data_list: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> PaginationConfig {
        PaginationConfig::default()
    }

    #[test]
    fn test_default_values() {
        let page = PageRequest::default().resolve(&bounds()).unwrap();
        assert_eq!(page.current, 1);
        assert_eq!(page.size, 15);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_offset() {
        let page = PageRequest::new(3, 10).resolve(&bounds()).unwrap();
        assert_eq!(page.offset(), 20);
        assert_eq!(page.limit(), 10);
    }

    #[test]
    fn test_rejects_missing_current() {
        let request = PageRequest {
            current: None,
            size: Some(10),
        };
        assert!(matches!(request.resolve(&bounds()), Err(Error::InvalidPageParameter { .. })));
    }

    #[test]
    fn test_rejects_out_of_range() {
        for (current, size) in [(0, 10), (-1, 10), (1, 0), (1, -5), (1, 51), (1001, 10)] {
            let result = PageRequest::new(current, size).resolve(&bounds());
            assert!(
                matches!(result, Err(Error::InvalidPageParameter { .. })),
                "current={current} size={size} should be rejected"
            );
        }
    }

    #[test]
    fn test_respects_configured_min_size() {
        let bounds = PaginationConfig {
            min_size: 15,
            ..PaginationConfig::default()
        };
        assert!(PageRequest::new(1, 10).resolve(&bounds).is_err());
        assert!(PageRequest::new(1, 15).resolve(&bounds).is_ok());
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 0), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(2, 1), 2);
    }

    #[test]
    fn test_total_pages_matches_ceil_for_small_values() {
        for total in 0..60 {
            for size in 1..20 {
                let expected = (total as f64 / size as f64).ceil() as i64;
                assert_eq!(total_pages(total, size), expected, "total={total} size={size}");
            }
        }
    }

    #[test]
    fn test_response_navigation_flags() {
        let first: PageResponse<()> = PageResponse::new(Page { current: 1, size: 2 }, 5, vec![]);
        assert_eq!(first.pages, 3);
        assert!(!first.has_previous);
        assert!(first.has_next);

        let last: PageResponse<()> = PageResponse::new(Page { current: 3, size: 2 }, 5, vec![]);
        assert!(last.has_previous);
        assert!(!last.has_next);

        // Asking past the end keeps the metadata consistent
        let beyond: PageResponse<()> = PageResponse::new(Page { current: 9, size: 2 }, 5, vec![]);
        assert!(beyond.has_previous);
        assert!(!beyond.has_next);
    }

    #[test]
    fn test_empty_page() {
        let empty: PageResponse<u8> = PageResponse::empty();
        assert_eq!(empty.total, 0);
        assert_eq!(empty.pages, 0);
        assert!(empty.data_list.is_empty());
        assert!(!empty.has_next && !empty.has_previous);
    }

    #[test]
    fn test_deserialize_from_strings_and_defaults() {
        let request: PageRequest = serde_json::from_str(r#"{"current": "2", "size": "20"}"#).unwrap();
        assert_eq!(request, PageRequest::new(2, 20));

        let request: PageRequest = serde_json::from_str(r#"{"current": 4}"#).unwrap();
        assert_eq!(request.current, Some(4));

        let request: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, PageRequest::default());

        let request: PageRequest = serde_json::from_str(r#"{"current": null}"#).unwrap();
        assert_eq!(request.current, None);
    }

    #[test]
    fn test_response_serializes_camel_case() {
        let response: PageResponse<u8> = PageResponse::new(Page { current: 1, size: 10 }, 1, vec![7]);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["hasNext"], false);
        assert_eq!(json["dataList"][0], 7);
    }
}
