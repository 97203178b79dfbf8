//! Record composer
//!
//! Joins assets with descriptions keyed by `(classid, instanceid)`.

use crate::error::{Error, Result};
use crate::types::{Asset, Description, SteamItem};
use std::collections::HashMap;

/// Two-level description lookup: classid, then instanceid
#[derive(Debug, Default)]
pub struct DescriptionIndex<'a> {
    by_class: HashMap<&'a str, HashMap<&'a str, &'a Description>>,
}

impl<'a> DescriptionIndex<'a> {
    /// Index descriptions in one pass. A repeated key keeps the later entry.
    pub fn new(descriptions: &'a [Description]) -> Self {
        let mut by_class: HashMap<&str, HashMap<&str, &Description>> = HashMap::new();
        for description in descriptions {
            by_class
                .entry(description.classid.as_str())
                .or_default()
                .insert(description.instanceid.as_str(), description);
        }
        Self { by_class }
    }

    /// Look up the description for a `(classid, instanceid)` pair
    pub fn get(&self, class_id: &str, instance_id: &str) -> Option<&'a Description> {
        self.by_class.get(class_id)?.get(instance_id).copied()
    }

    /// Look up the description for an asset
    pub fn resolve(&self, asset: &Asset) -> Result<&'a Description> {
        let (class_id, instance_id) = asset.description_key();
        self.get(class_id, instance_id)
            .ok_or_else(|| Error::InconsistentPage {
                asset_id: asset.assetid.clone(),
                class_id: class_id.to_string(),
                instance_id: instance_id.to_string(),
            })
    }

    /// Number of distinct keys indexed
    pub fn len(&self) -> usize {
        self.by_class.values().map(HashMap::len).sum()
    }

    /// Whether no descriptions were indexed
    pub fn is_empty(&self) -> bool {
        self.by_class.is_empty()
    }
}

/// Compose items from a page's assets and descriptions.
///
/// Output order follows `assets`. An asset without a matching description
/// means the response is malformed and fails the whole page.
pub fn compose_items(assets: &[Asset], descriptions: &[Description]) -> Result<Vec<SteamItem>> {
    let index = DescriptionIndex::new(descriptions);

    assets
        .iter()
        .map(|asset| {
            let description = index.resolve(asset)?;
            Ok(SteamItem::new(asset, description))
        })
        .collect()
}
