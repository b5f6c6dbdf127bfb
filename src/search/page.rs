//! Pagination state for a result list.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Default number of results per page
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Current page (1-based) and fixed page size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    page: usize,
    page_size: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PageState {
    /// Start on page 1; a zero page size is bumped to 1
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Current page (1-based)
    pub fn page(&self) -> usize {
        self.page
    }

    /// Results per page
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// `ceil(total / page_size)`, 0 for an empty result list
    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.page_size)
    }

    /// Back to page 1
    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Keep the page within `[1, max(total_pages, 1)]`
    pub fn clamp(&mut self, total: usize) {
        let last = self.total_pages(total).max(1);
        self.page = self.page.clamp(1, last);
    }

    /// Advance one page; returns false on the last page
    pub fn next(&mut self, total: usize) -> bool {
        if self.page < self.total_pages(total) {
            self.page += 1;
            true
        } else {
            false
        }
    }

    /// Go back one page; returns false on page 1
    pub fn previous(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to a page, clamped to the valid range
    pub fn go_to(&mut self, page: usize, total: usize) {
        self.page = page;
        self.clamp(total);
    }

    /// Index range of the visible slice
    pub fn slice(&self, total: usize) -> Range<usize> {
        let start = ((self.page - 1) * self.page_size).min(total);
        let end = (self.page * self.page_size).min(total);
        start..end
    }
}
