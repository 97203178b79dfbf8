//! Common types used throughout steam-inventory-stream
//!
//! This module contains the inventory data model as Steam delivers it
//! (assets and descriptions) and the resolved item records the stream emits.

use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

// ============================================================================
// Asset
// ============================================================================

/// One owned quantity of an item, as listed in a page's `assets` array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Application the item belongs to (e.g. 730)
    pub appid: u32,
    /// Inventory context within the application
    pub contextid: String,
    /// Unique instance identifier, also used as the pagination cursor
    pub assetid: String,
    /// Class identifier (first half of the description key)
    pub classid: String,
    /// Sub-instance identifier (second half of the description key)
    pub instanceid: String,
    /// Owned quantity as decimal text
    pub amount: String,
}

impl Asset {
    /// Key used to look up this asset's description
    pub fn description_key(&self) -> (&str, &str) {
        (&self.classid, &self.instanceid)
    }
}

// ============================================================================
// Description
// ============================================================================

/// Display and market metadata shared by all assets with the same
/// `(classid, instanceid)` pair
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Description {
    pub appid: u32,
    pub classid: String,
    pub instanceid: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub currency: bool,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub tradable: bool,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub item_type: String,
    #[serde(default)]
    pub market_name: String,
    #[serde(default)]
    pub market_hash_name: String,
    /// Whether the item is traded through buy/sell orders
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub commodity: bool,
    /// Trade restriction after buying from the market, in days
    #[serde(default)]
    pub market_tradable_restriction: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub marketable: bool,
}

impl Description {
    /// Key this description is stored under
    pub fn key(&self) -> (&str, &str) {
        (&self.classid, &self.instanceid)
    }
}

// ============================================================================
// Steam Item
// ============================================================================

/// An asset joined with its description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SteamItem {
    pub app_id: u32,
    pub context_id: String,
    pub asset_id: String,
    pub class_id: String,
    pub instance_id: String,
    pub amount: String,
    pub currency: bool,
    pub icon_url: String,
    pub tradable: bool,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub market_name: String,
    pub market_hash_name: String,
    pub commodity: bool,
    pub market_tradable_restriction: Option<u32>,
    pub marketable: bool,
}

impl SteamItem {
    /// Join an asset with its description.
    ///
    /// Fields present on both sides (`appid`, `classid`, `instanceid`) are
    /// taken from the asset.
    pub fn new(asset: &Asset, description: &Description) -> Self {
        Self {
            app_id: asset.appid,
            context_id: asset.contextid.clone(),
            asset_id: asset.assetid.clone(),
            class_id: asset.classid.clone(),
            instance_id: asset.instanceid.clone(),
            amount: asset.amount.clone(),
            currency: description.currency,
            icon_url: description.icon_url.clone(),
            tradable: description.tradable,
            name: description.name.clone(),
            item_type: description.item_type.clone(),
            market_name: description.market_name.clone(),
            market_hash_name: description.market_hash_name.clone(),
            commodity: description.commodity,
            market_tradable_restriction: description.market_tradable_restriction,
            marketable: description.marketable,
        }
    }
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Flag decoding
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl RawFlag {
    fn is_set(&self) -> bool {
        match self {
            RawFlag::Bool(value) => *value,
            RawFlag::Int(value) => *value != 0,
            RawFlag::Text(value) => !value.is_empty() && value != "0",
        }
    }
}

/// Decode a Steam `0 | 1` flag (booleans and numeric strings are tolerated)
pub(crate) fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawFlag>::deserialize(deserializer)?;
    Ok(raw.is_some_and(|flag| flag.is_set()))
}

/// Interpret a loosely typed JSON flag (`1`, `true`, `"1"`) as a boolean
pub(crate) fn json_flag(value: Option<&JsonValue>) -> bool {
    match value {
        Some(JsonValue::Bool(flag)) => *flag,
        Some(JsonValue::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(JsonValue::String(s)) => !s.is_empty() && s != "0",
        _ => false,
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}
