//! Page arithmetic and the state of the pagination controls.

use std::ops::RangeInclusive;

use crate::types::{Page, PAGE_SIZE};

/// Number of pages needed to show `count` items.
pub fn total_pages(count: u64) -> u32 {
    u32::try_from(count.div_ceil(PAGE_SIZE)).unwrap_or(u32::MAX)
}

/// Previous/next buttons plus one button per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationControls {
    pub current: u32,
    pub total_pages: u32,
    pub previous_enabled: bool,
    pub next_enabled: bool,
}

impl PaginationControls {
    /// Controls for `page` shown as page number `current`, or `None` when
    /// everything fits on one page.
    pub fn for_page<T>(page: &Page<T>, current: u32) -> Option<Self> {
        let total_pages = total_pages(page.count);
        if total_pages <= 1 {
            return None;
        }
        Some(Self {
            current,
            total_pages,
            previous_enabled: page.previous.is_some() && current > 1,
            next_enabled: page.next.is_some() && current < total_pages,
        })
    }

    /// Page numbers that get a button.
    pub fn pages(&self) -> RangeInclusive<u32> {
        1..=self.total_pages
    }

    pub fn previous(&self) -> Option<u32> {
        self.previous_enabled.then(|| self.current - 1)
    }

    pub fn next(&self) -> Option<u32> {
        self.next_enabled.then(|| self.current + 1)
    }
}
