//! Display pagination, independent of the server's own page size.

use std::num::NonZeroUsize;

/// Page size and 1-based cursor of one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    page_size: NonZeroUsize,
    current_page: usize,
}

impl PaginationState {
    pub fn new(page_size: NonZeroUsize) -> Self {
        Self { page_size, current_page: 1 }
    }
    pub fn page_size(&self) -> NonZeroUsize {
        self.page_size
    }
    pub fn current_page(&self) -> usize {
        self.current_page
    }
    /// Moves the cursor; it is clamped whenever a slice is taken.
    pub fn with_page(self, current_page: usize) -> Self {
        Self { current_page, ..self }
    }
    pub fn with_page_size(self, page_size: NonZeroUsize) -> Self {
        Self { page_size, ..self }
    }
    pub fn reset(self) -> Self {
        self.with_page(1)
    }
    /// Cursor clamped into `[1, total_pages]` for `count` items.
    pub fn clamped(self, count: usize) -> Self {
        let last = total_pages(count, self.page_size);
        self.with_page(self.current_page.clamp(1, last))
    }
}

/// One displayed page of a filtered dataset.
#[derive(Debug, PartialEq, Eq)]
pub struct PageSlice<'a, T> {
    pub items: &'a [T],
    pub page: usize,
    pub total_pages: usize,
    pub total_count: usize,
}

/// `max(1, ceil(count / page_size))`
pub fn total_pages(count: usize, page_size: NonZeroUsize) -> usize {
    count.div_ceil(page_size.get()).max(1)
}

pub fn paginate<T>(items: &[T], state: PaginationState) -> PageSlice<'_, T> {
    let total_count = items.len();
    let size = state.page_size.get();
    let total = total_pages(total_count, state.page_size);
    let page = state.current_page.clamp(1, total);
    let start = ((page - 1) * size).min(total_count);
    let end = (start + size).min(total_count);
    PageSlice { items: &items[start..end], page, total_pages: total, total_count }
}
