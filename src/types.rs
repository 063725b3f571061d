/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// A normalized pagination window. Construct through [`PageRequest::normalize`]
/// so that every listing entry point applies the same defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// Non-positive or missing values fall back to page 1 and `default_page_size`.
    /// `max_page_size`, when set, caps oversized requests.
    pub fn normalize(
        page: Option<i64>,
        page_size: Option<i64>,
        default_page_size: i64,
        max_page_size: Option<i64>,
    ) -> Self {
        let page = match page {
            Some(p) if p >= 1 => p,
            _ => DEFAULT_PAGE,
        };

        let default_page_size = if default_page_size >= 1 { default_page_size } else { DEFAULT_PAGE_SIZE };
        let mut page_size = match page_size {
            Some(s) if s >= 1 => s,
            _ => default_page_size,
        };

        if let Some(max) = max_page_size.filter(|m| *m >= 1) {
            if page_size > max {
                tracing::debug!("Page size {} exceeds max {}, capping to max", page_size, max);
                page_size = max;
            }
        }

        Self { page, page_size }
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        self.page_size.saturating_mul(self.page - 1)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: DEFAULT_PAGE, page_size: DEFAULT_PAGE_SIZE }
    }
}

/// Pagination metadata returned alongside every listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub total_data: i64,
    pub total_pages: i64,
    pub page: i64,
    pub page_size: i64,
}

impl Meta {
    pub fn new(page: PageRequest, total_data: i64) -> Self {
        Self {
            total_data,
            total_pages: Self::count_total_pages(page.page, page.page_size, total_data),
            page: page.page,
            page_size: page.page_size,
        }
    }

    /// ceil(total_rows / page_size); zero rows means zero pages.
    pub fn count_total_pages(_page: i64, page_size: i64, total_rows: i64) -> i64 {
        if total_rows <= 0 || page_size <= 0 {
            return 0;
        }
        total_rows / page_size + i64::from(total_rows % page_size != 0)
    }
}
