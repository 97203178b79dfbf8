// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # steam-inventory-stream
//!
//! Lazily fetches a Steam community inventory page by page and hands out
//! every asset joined with its description.
//!
//! ## Features
//!
//! - **Pull-driven**: nothing is requested until the stream is polled, and
//!   the next page waits for the consumer
//! - **Adaptive page size**: grows on success, halves on failure
//! - **Error budget**: gives up after repeated failures at the minimum size
//! - **Pluggable transport**: anything implementing [`InventoryFetcher`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use steam_inventory_stream::{InventoryConfig, InventoryStream, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = InventoryConfig::builder()
//!         .steam_id("76561198000000000")
//!         .app_id(730)
//!         .context_id("2")
//!         .build()?;
//!
//!     let mut stream = InventoryStream::steam(config)?;
//!     while let Some(batch) = stream.next().await {
//!         for item in batch? {
//!             println!("{} x{}", item.market_hash_name, item.amount);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │        InventoryStream: Stream<Item = Vec<SteamItem>>      │
//! └───────────────────────────────────────────────────────────┘
//!          │                    │                     │
//! ┌────────┴───────┐  ┌─────────┴────────┐  ┌─────────┴───────┐
//! │   Pagination   │  │       HTTP       │  │      Page       │
//! ├────────────────┤  ├──────────────────┤  ├─────────────────┤
//! │ Cursor         │  │ SteamClient      │  │ Asset join      │
//! │ Page size      │  │ Rate limit       │  │ Description map │
//! │ Error budget   │  │ Shape checks     │  │                 │
//! └────────────────┘  └──────────────────┘  └─────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)] // TODO: Document Description and SteamItem fields

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Inventory data model
pub mod types;

/// Steam HTTP client and fetch capability
pub mod http;

/// Cursor, page size and error budget tracking
pub mod pagination;

/// Inventory pages and the asset/description join
pub mod page;

/// The inventory stream
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use engine::{InventoryConfig, InventoryStats, InventoryStream, RetryBackoff};
pub use http::{HttpClientConfig, InventoryFetcher, PageRequest, SteamClient};
pub use page::ItemPage;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
