//! HTTP module
//!
//! The remote side of an inventory stream: one request for one page.
//!
//! # Features
//!
//! - **Fetch Capability**: [`InventoryFetcher`] is the only thing the engine
//!   needs from the network, so tests and alternative transports can plug in
//! - **Steam Client**: [`SteamClient`] talks to the public community inventory
//!   endpoint and validates the response shape
//! - **Rate Limiting**: Token bucket rate limiter using governor, shareable
//!   across clients to cap process-wide request rate

mod client;
mod fetcher;
mod rate_limit;

pub use client::{HttpClientConfig, HttpClientConfigBuilder, SteamClient, DEFAULT_BASE_URL};
pub use fetcher::{InventoryFetcher, PageRequest};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
