//! Pagination helpers shared by every list endpoint

use serde::{Deserialize, Serialize};

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

/// One page of results plus the unpaged total
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// Normalized page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub per_page: i64,
}

impl PageWindow {
    /// Pages are 1-based; `per_page` is clamped to `1..=MAX_PER_PAGE`.
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    /// Saturates instead of overflowing on absurd page numbers
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn wrap<T>(&self, items: Vec<T>, total: i64) -> Paginated<T> {
        Paginated {
            items,
            total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let w = PageWindow::new(None, None);
        assert_eq!(w, PageWindow { page: 1, per_page: 20 });
        assert_eq!(w.offset(), 0);
    }

    #[test]
    fn test_clamping() {
        let w = PageWindow::new(Some(0), Some(1000));
        assert_eq!(w.page, 1);
        assert_eq!(w.per_page, MAX_PER_PAGE);
        let w = PageWindow::new(Some(3), Some(-5));
        assert_eq!(w.per_page, 1);
        assert_eq!(w.offset(), 2);
    }

    #[test]
    fn test_offset_saturates_on_huge_page() {
        let w = PageWindow::new(Some(i64::MAX), Some(20));
        assert_eq!(w.offset(), i64::MAX);
        let w = PageWindow::new(Some(i64::MAX), Some(1));
        assert_eq!(w.offset(), i64::MAX - 1);
    }

    #[test]
    fn test_wrap() {
        let page = PageWindow::new(Some(2), Some(10)).wrap(vec![1, 2, 3], 13);
        assert_eq!(page.total, 13);
        assert_eq!(page.page, 2);
        assert_eq!(page.items.len(), 3);
    }
}
