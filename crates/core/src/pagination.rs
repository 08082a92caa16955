pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Page position and server totals for the call list. Pages are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total_count: u64,
    pub has_next_page: bool,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
            total_count: 0,
            has_next_page: false,
        }
    }
}

impl Pagination {
    /// `max(1, ceil(total_count / per_page))`.
    pub fn total_pages(&self) -> u64 {
        let per_page = u64::from(self.per_page.max(1));
        self.total_count.div_ceil(per_page).max(1)
    }

    /// Server offset for the current page.
    pub fn offset(&self) -> u64 {
        offset_for(self.page, self.per_page)
    }

    /// 1-based record range shown on the current page.
    pub fn range(&self) -> PageRange {
        let per_page = u64::from(self.per_page);
        let page = u64::from(self.page.max(1));
        PageRange {
            start: (page - 1) * per_page + 1,
            end: (page * per_page).min(self.total_count),
            total: self.total_count,
        }
    }
}

/// Offset of the first record on `page` (1-indexed).
pub fn offset_for(page: u32, per_page: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(per_page)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl std::fmt::Display for PageRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}–{} of {}", self.start, self.end, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(page: u32, per_page: u32, total_count: u64) -> Pagination {
        Pagination {
            page,
            per_page,
            total_count,
            has_next_page: false,
        }
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(at(1, 10, 42).total_pages(), 5);
        assert_eq!(at(1, 10, 40).total_pages(), 4);
        assert_eq!(at(1, 25, 1).total_pages(), 1);
    }

    #[test]
    fn total_pages_never_below_one() {
        assert_eq!(at(1, 10, 0).total_pages(), 1);
        assert_eq!(at(1, 0, 0).total_pages(), 1);
    }

    #[test]
    fn last_page_range_is_clamped_to_total() {
        assert_eq!(at(5, 10, 42).range().to_string(), "41–42 of 42");
        assert_eq!(at(1, 10, 42).range().to_string(), "1–10 of 42");
    }

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(at(1, 10, 0).offset(), 0);
        assert_eq!(at(3, 25, 0).offset(), 50);
        assert_eq!(offset_for(0, 10), 0);
    }
}
