//! Pagination module
//!
//! Adaptive page sizing and cursor tracking for inventory requests.
//!
//! # Overview
//!
//! Inventory requests start small and double after every successful page, up
//! to the server's ceiling. A failed request halves the size again, never
//! going below the floor. Only failures at the floor count toward the error
//! budget; failures from larger sizes are treated as the server refusing a
//! request that was too large.

mod sizer;
mod types;

pub use sizer::{PageSizer, DEFAULT_MAX_PAGE_SIZE, MIN_PAGE_SIZE, PAGE_SIZE_GROWTH_FACTOR};
pub use types::{FailureOutcome, PaginationState};
