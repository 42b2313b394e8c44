//! Page/offset pagination for list endpoints.

use serde::{Deserialize, Serialize};

const MAX_PER_PAGE: u32 = 100;
const DEFAULT_PER_PAGE: u32 = 20;

/// Clamped pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-indexed
    pub page: u32,
    /// 1..=100
    pub per_page: u32,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// SQL OFFSET, as bound to the query.
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    /// SQL LIMIT, as bound to the query.
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

/// One page of results plus the total across all pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    /// At least 1, even for an empty listing.
    pub pages: u32,
    pub has_next: bool,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, page: Pagination) -> Self {
        let pages = page_count(total, page.per_page);
        Self {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
            pages,
            has_next: page.page < pages,
        }
    }
}

fn page_count(total: i64, per_page: u32) -> u32 {
    let total = u64::try_from(total).unwrap_or(0);
    let pages = total.div_ceil(u64::from(per_page.max(1)));
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

/// `?page=&per_page=` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl From<PaginationParams> for Pagination {
    fn from(params: PaginationParams) -> Self {
        Self::new(
            params.page.unwrap_or(1),
            params.per_page.unwrap_or(DEFAULT_PER_PAGE),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_of(total: i64, page: u32, per_page: u32) -> Paginated<()> {
        Paginated::new(vec![], total, Pagination::new(page, per_page))
    }

    #[test]
    fn offset_calculation() {
        assert_eq!(Pagination::new(1, 10).offset(), 0);
        assert_eq!(Pagination::new(2, 10).offset(), 10);
        assert_eq!(Pagination::new(3, 25).offset(), 50);
    }

    #[test]
    fn clamps_out_of_range_values() {
        assert_eq!(Pagination::new(0, 10).page, 1);
        assert_eq!(Pagination::new(1, 0).per_page, 1);
        assert_eq!(Pagination::new(1, 999).per_page, 100);
    }

    #[test]
    fn params_fill_defaults() {
        let p: Pagination = PaginationParams::default().into();
        assert_eq!(p, Pagination::new(1, 20));
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_of(0, 1, 10).pages, 1);
        assert_eq!(page_of(25, 1, 10).pages, 3);
        assert_eq!(page_of(100, 1, 10).pages, 10);
    }

    #[test]
    fn has_next() {
        assert!(page_of(30, 1, 10).has_next);
        assert!(page_of(30, 2, 10).has_next);
        assert!(!page_of(30, 3, 10).has_next);
        assert!(!page_of(0, 1, 10).has_next);
    }
}
