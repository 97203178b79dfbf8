//! Page type

use super::composer::compose_items;
use crate::error::Result;
use crate::types::{Asset, Description, OptionStringExt, SteamItem};

/// One fetched page of an inventory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPage {
    assets: Vec<Asset>,
    descriptions: Vec<Description>,
    is_last: bool,
    last_asset_id: Option<String>,
    total_inventory_count: Option<u64>,
}

impl ItemPage {
    /// Create a page.
    ///
    /// When the response carries no cursor, the last asset's id is used.
    pub fn new(
        assets: Vec<Asset>,
        descriptions: Vec<Description>,
        is_last: bool,
        last_asset_id: Option<String>,
    ) -> Self {
        let last_asset_id = last_asset_id
            .none_if_empty()
            .or_else(|| assets.last().map(|asset| asset.assetid.clone()));

        Self {
            assets,
            descriptions,
            is_last,
            last_asset_id,
            total_inventory_count: None,
        }
    }

    /// Attach the inventory size reported by the server
    #[must_use]
    pub fn with_total_count(mut self, total: Option<u64>) -> Self {
        self.total_inventory_count = total;
        self
    }

    /// Raw assets in server order
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Raw descriptions in server order
    pub fn descriptions(&self) -> &[Description] {
        &self.descriptions
    }

    /// Whether this is the final page of the inventory
    pub fn is_last(&self) -> bool {
        self.is_last
    }

    /// Cursor for the next request
    pub fn last_asset_id(&self) -> Option<&str> {
        self.last_asset_id.as_deref()
    }

    /// Total inventory size, if the server reported it
    pub fn total_inventory_count(&self) -> Option<u64> {
        self.total_inventory_count
    }

    /// Number of assets on this page
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the page holds no assets
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Join assets with their descriptions, in asset order
    pub fn items(&self) -> Result<Vec<SteamItem>> {
        compose_items(&self.assets, &self.descriptions)
    }
}
