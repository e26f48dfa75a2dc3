//! Pagination types for directory listings.

use serde::{Deserialize, Serialize};

/// Default page size.
const DEFAULT_PAGE_SIZE: u64 = 20;
/// Maximum page size.
const MAX_PAGE_SIZE: u64 = 100;

/// Request parameters for paginated listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-based). Out-of-range values are clamped, never errors,
    /// matching what anonymous link recipients expect from a `?page=` knob.
    #[serde(default = "default_page")]
    pub page: u64,
    /// Number of items per page.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

impl PageRequest {
    /// Create a new page request with clamped values.
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Index of the first item on this page.
    pub fn offset(&self) -> u64 {
        (self.page.saturating_sub(1)) * self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T: Serialize> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Current page number (1-based).
    pub page: u64,
    /// Number of items per page.
    pub page_size: u64,
    /// Total number of items across all pages.
    pub total_items: u64,
    /// Total number of pages.
    pub total_pages: u64,
    /// Whether there is a next page.
    pub has_next: bool,
    /// Whether there is a previous page.
    pub has_previous: bool,
}

impl<T: Serialize> PageResponse<T> {
    /// Paginate an in-memory item list. The page number is clamped into
    /// range rather than rejected.
    pub fn paginate(all: Vec<T>, request: &PageRequest) -> Self {
        let total_items = all.len() as u64;
        let page_size = request.page_size.clamp(1, MAX_PAGE_SIZE);
        let total_pages = if total_items == 0 {
            1
        } else {
            total_items.div_ceil(page_size)
        };
        let page = request.page.clamp(1, total_pages);

        let start = ((page - 1) * page_size) as usize;
        let items: Vec<T> = all
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();

        Self {
            items,
            page,
            page_size,
            total_items,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginates_and_clamps() {
        let items: Vec<u32> = (0..45).collect();
        let page = PageResponse::paginate(items.clone(), &PageRequest::new(2, 20));
        assert_eq!(page.items, (20..40).collect::<Vec<u32>>());
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next);
        assert!(page.has_previous);

        // Requesting far past the end lands on the last page.
        let page = PageResponse::paginate(items, &PageRequest::new(99, 20));
        assert_eq!(page.page, 3);
        assert_eq!(page.items, (40..45).collect::<Vec<u32>>());
    }

    #[test]
    fn empty_listing_is_one_page() {
        let page = PageResponse::paginate(Vec::<u32>::new(), &PageRequest::default());
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next);
    }
}
