//! Fetch capability used by the inventory stream

use crate::error::Result;
use crate::page::ItemPage;
use async_trait::async_trait;
use std::sync::Arc;

/// Parameters for a single page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// 64-bit SteamID of the inventory owner
    pub steam_id: String,
    /// Application id
    pub app_id: u32,
    /// Context id within the application
    pub context_id: String,
    /// Language for descriptions
    pub language: String,
    /// Last asset id of the previous page, `None` for the first page
    pub start_asset_id: Option<String>,
    /// Number of assets to request
    pub count: u32,
}

/// Fetches one page of an inventory.
///
/// Every failure is reported as an `Err`; the caller decides whether to retry.
#[async_trait]
pub trait InventoryFetcher: Send + Sync {
    /// Fetch the page described by `request`
    async fn fetch_page(&self, request: &PageRequest) -> Result<ItemPage>;
}

#[async_trait]
impl<T: InventoryFetcher + ?Sized> InventoryFetcher for Arc<T> {
    async fn fetch_page(&self, request: &PageRequest) -> Result<ItemPage> {
        (**self).fetch_page(request).await
    }
}
