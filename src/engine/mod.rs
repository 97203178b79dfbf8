//! Execution engine module
//!
//! Drives page requests for one inventory and hands out the resolved items.
//!
//! # Overview
//!
//! The engine module provides:
//! - `InventoryStream` - a [`Stream`] of item batches, one batch per page
//! - `InventoryConfig` - validated configuration for a stream
//! - `InventoryStats` - progress counters
//!
//! The stream is pull-driven. Nothing is requested until it is polled, and
//! after a batch is handed out the next request waits for the next poll.
//! Polling while a request is in flight resumes that request instead of
//! starting another, so at most one request exists per stream. Dropping the
//! stream drops the in-flight request.
//!
//! ```text
//!            poll                 page ok
//!   Idle ──────────────▶ Fetching ─────────▶ Idle (batch emitted)
//!    │ ▲                    │
//!    │ └────────────────────┘ page failed (size halved, maybe counted)
//!    │
//!    ├── no more items ─────▶ Finished
//!    └── budget exhausted ──▶ Failed ("Failed to load steam inventory")
//! ```

mod types;

pub use types::{
    InventoryConfig, InventoryConfigBuilder, InventoryStats, RetryBackoff, DEFAULT_LANGUAGE,
    DEFAULT_MAX_SEQUENTIAL_ERRORS,
};

use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, InventoryFetcher, PageRequest, SteamClient};
use crate::page::ItemPage;
use crate::pagination::{FailureOutcome, PaginationState};
use crate::types::SteamItem;
use futures::stream::{self, FusedStream, Stream, StreamExt};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use tracing::{debug, error, info, warn};

type PageFuture = Pin<Box<dyn Future<Output = Result<ItemPage>> + Send>>;

/// Lifecycle of an inventory stream
enum StreamState {
    /// Waiting to be polled; the next poll decides whether to fetch
    Idle,
    /// A page request is in flight
    Fetching(PageFuture),
    /// The last page was emitted
    Finished,
    /// A terminal error was emitted
    Failed,
}

/// Lazily fetched inventory, one `Vec<SteamItem>` per page
pub struct InventoryStream {
    fetcher: Arc<dyn InventoryFetcher>,
    config: InventoryConfig,
    pagination: PaginationState,
    state: StreamState,
    stats: InventoryStats,
    /// Failed requests since the last successful page
    retries_in_row: u32,
    last_error: Option<String>,
}

impl InventoryStream {
    /// Create a stream that fetches pages through `fetcher`
    pub fn new(config: InventoryConfig, fetcher: impl InventoryFetcher + 'static) -> Self {
        Self::with_shared_fetcher(config, Arc::new(fetcher))
    }

    /// Create a stream on a fetcher shared with other streams
    pub fn with_shared_fetcher(config: InventoryConfig, fetcher: Arc<dyn InventoryFetcher>) -> Self {
        let pagination = PaginationState::new(config.max_page_size());
        Self {
            fetcher,
            config,
            pagination,
            state: StreamState::Idle,
            stats: InventoryStats::new(),
            retries_in_row: 0,
            last_error: None,
        }
    }

    /// Create a stream against the public Steam community endpoint
    pub fn steam(config: InventoryConfig) -> Result<Self> {
        Ok(Self::new(config, SteamClient::new()?))
    }

    /// Create a stream against a Steam-compatible endpoint
    pub fn steam_with_config(config: InventoryConfig, http: HttpClientConfig) -> Result<Self> {
        Ok(Self::new(config, SteamClient::with_config(http)?))
    }

    /// Get the configuration
    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    /// Get statistics
    pub fn stats(&self) -> &InventoryStats {
        &self.stats
    }

    /// Number of items the next request asks for
    pub fn page_size(&self) -> u32 {
        self.pagination.page_size()
    }

    /// Failures counted toward the error budget
    pub fn consecutive_errors(&self) -> u32 {
        self.pagination.consecutive_errors
    }

    /// Whether a request is currently in flight
    pub fn is_fetching(&self) -> bool {
        matches!(self.state, StreamState::Fetching(_))
    }

    /// Flatten the page batches into single items
    pub fn into_items(self) -> impl Stream<Item = Result<SteamItem>> + Send {
        self.flat_map(|batch| {
            let items: Vec<Result<SteamItem>> = match batch {
                Ok(items) => items.into_iter().map(Ok).collect(),
                Err(e) => vec![Err(e)],
            };
            stream::iter(items)
        })
    }

    /// Fetch the whole inventory
    pub async fn collect_all(mut self) -> Result<Vec<SteamItem>> {
        let mut items = Vec::new();
        while let Some(batch) = self.next().await {
            items.extend(batch?);
        }
        Ok(items)
    }

    fn next_request(&self) -> PageRequest {
        PageRequest {
            steam_id: self.config.steam_id().to_string(),
            app_id: self.config.app_id(),
            context_id: self.config.context_id().to_string(),
            language: self.config.language().to_string(),
            start_asset_id: self.pagination.cursor.clone(),
            count: self.pagination.page_size(),
        }
    }

    fn start_fetch(&self) -> PageFuture {
        let request = self.next_request();
        let delay = self
            .config
            .retry_backoff()
            .map(|backoff| backoff.delay(self.retries_in_row))
            .unwrap_or_default();

        debug!(
            steam_id = %request.steam_id,
            cursor = ?request.start_asset_id,
            count = request.count,
            ?delay,
            "Requesting inventory page"
        );

        let fetcher = Arc::clone(&self.fetcher);
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            fetcher.fetch_page(&request).await
        })
    }

    fn handle_page(&mut self, page: ItemPage) -> Result<Vec<SteamItem>> {
        let items = match page.items() {
            Ok(items) => items,
            Err(e) => {
                error!(steam_id = %self.config.steam_id(), error = %e, "Inventory page is inconsistent");
                self.state = StreamState::Failed;
                return Err(e);
            }
        };

        self.pagination
            .record_success(&page, self.config.reset_errors_on_success());
        self.retries_in_row = 0;
        self.stats.add_page(items.len());
        if let Some(total) = page.total_inventory_count() {
            self.stats.total_inventory_count = Some(total);
        }

        debug!(
            items = items.len(),
            more_items = self.pagination.more_items,
            next_count = self.pagination.page_size(),
            "Inventory page fetched"
        );
        Ok(items)
    }

    fn handle_failure(&mut self, err: Error) {
        self.stats.add_failure();
        self.retries_in_row += 1;

        match self.pagination.record_failure() {
            FailureOutcome::Shrunk { page_size } => {
                warn!(error = %err, next_count = page_size, "Inventory request failed, shrinking page size");
            }
            FailureOutcome::Counted { consecutive_errors } => {
                warn!(
                    error = %err,
                    consecutive_errors,
                    max_sequential_errors = self.config.max_sequential_errors(),
                    "Inventory request failed at minimum page size"
                );
            }
        }
        self.last_error = Some(err.to_string());
    }
}

impl Stream for InventoryStream {
    type Item = Result<Vec<SteamItem>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            match &mut this.state {
                StreamState::Finished | StreamState::Failed => return Poll::Ready(None),
                StreamState::Idle => {
                    if !this.pagination.more_items {
                        info!(
                            steam_id = %this.config.steam_id(),
                            pages = this.stats.pages_fetched,
                            items = this.stats.items_emitted,
                            "Inventory fully loaded"
                        );
                        this.state = StreamState::Finished;
                        return Poll::Ready(None);
                    }

                    if this
                        .pagination
                        .errors_exhausted(this.config.max_sequential_errors())
                    {
                        let attempts = this.pagination.consecutive_errors;
                        error!(
                            steam_id = %this.config.steam_id(),
                            attempts,
                            last_error = ?this.last_error,
                            "Giving up on inventory"
                        );
                        this.state = StreamState::Failed;
                        return Poll::Ready(Some(Err(Error::InventoryLoadFailed {
                            attempts,
                            last_error: this.last_error.take(),
                        })));
                    }

                    this.state = StreamState::Fetching(this.start_fetch());
                }
                StreamState::Fetching(fetch) => {
                    let outcome = ready!(fetch.as_mut().poll(cx));
                    this.state = StreamState::Idle;

                    match outcome {
                        Ok(page) => return Poll::Ready(Some(this.handle_page(page))),
                        Err(err) => this.handle_failure(err),
                    }
                }
            }
        }
    }
}

impl FusedStream for InventoryStream {
    fn is_terminated(&self) -> bool {
        matches!(self.state, StreamState::Finished | StreamState::Failed)
    }
}

impl std::fmt::Debug for InventoryStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryStream")
            .field("config", &self.config)
            .field("pagination", &self.pagination)
            .field("stats", &self.stats)
            .field("is_fetching", &self.is_fetching())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
