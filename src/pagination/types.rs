//! Pagination state
//!
//! Everything the inventory stream remembers between requests.

use super::sizer::PageSizer;
use crate::page::ItemPage;

/// What a failed request did to the pagination state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// The request was larger than the floor; size was halved, nothing counted
    Shrunk {
        /// Size of the next request
        page_size: u32,
    },
    /// The request was at the floor; the consecutive error counter grew
    Counted {
        /// Counter value after this failure
        consecutive_errors: u32,
    },
}

impl FailureOutcome {
    /// Whether this failure counted toward the error budget
    pub fn is_counted(&self) -> bool {
        matches!(self, Self::Counted { .. })
    }
}

/// Tracks pagination state during iteration
#[derive(Debug, Clone)]
pub struct PaginationState {
    /// Cursor for the next request, `None` for the first page
    pub cursor: Option<String>,
    /// Whether the server reported more items
    pub more_items: bool,
    /// Failures counted at the floor page size
    pub consecutive_errors: u32,
    /// Target page size
    pub sizer: PageSizer,
}

impl PaginationState {
    /// Create the state for a fresh inventory with the given page size cap
    pub fn new(max_page_size: u32) -> Self {
        Self {
            cursor: None,
            more_items: true,
            consecutive_errors: 0,
            sizer: PageSizer::new(max_page_size),
        }
    }

    /// Number of items to request next
    pub fn page_size(&self) -> u32 {
        self.sizer.current()
    }

    /// Whether the error budget is used up
    pub fn errors_exhausted(&self, max_sequential_errors: u32) -> bool {
        self.consecutive_errors >= max_sequential_errors
    }

    /// Advance past a successfully fetched page
    pub fn record_success(&mut self, page: &ItemPage, reset_errors: bool) {
        self.sizer.grow();
        self.more_items = !page.is_last();
        self.cursor = page.last_asset_id().map(str::to_string);
        if reset_errors {
            self.consecutive_errors = 0;
        }
    }

    /// Register a failed request. The cursor is left untouched.
    pub fn record_failure(&mut self) -> FailureOutcome {
        if self.sizer.shrink() {
            self.consecutive_errors += 1;
            FailureOutcome::Counted {
                consecutive_errors: self.consecutive_errors,
            }
        } else {
            FailureOutcome::Shrunk {
                page_size: self.sizer.current(),
            }
        }
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new(super::sizer::DEFAULT_MAX_PAGE_SIZE)
    }
}
