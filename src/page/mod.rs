//! Inventory page module
//!
//! A page is the immutable result of one inventory request: the raw assets,
//! the raw descriptions, whether more items remain, and the cursor for the
//! next request.
//!
//! # Overview
//!
//! Assets and descriptions arrive as two parallel arrays. The composer joins
//! them on `(classid, instanceid)` into [`SteamItem`](crate::types::SteamItem)
//! records, preserving asset order.

mod composer;
mod types;

pub use composer::{compose_items, DescriptionIndex};
pub use types::ItemPage;
