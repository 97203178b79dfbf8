//! Steam community inventory client
//!
//! Performs exactly one request per page and turns every way a response can
//! be unusable into an error:
//! - transport failures
//! - non-200 status codes
//! - bodies that are not the expected JSON
//! - responses without `success`, `assets` or `descriptions`

use super::fetcher::{InventoryFetcher, PageRequest};
use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::error::{Error, Result};
use crate::page::ItemPage;
use crate::types::{json_flag, Asset, Description, JsonValue};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default Steam community host
pub const DEFAULT_BASE_URL: &str = "https://steamcommunity.com";

/// Configuration for the Steam client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL inventory paths are appended to
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            rate_limit: Some(RateLimiterConfig::default()),
            default_headers: HashMap::new(),
            user_agent: format!("steam-inventory-stream/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Raw inventory endpoint response
#[derive(Debug, Deserialize)]
pub(crate) struct InventoryResponse {
    #[serde(default)]
    success: Option<JsonValue>,
    #[serde(default)]
    more_items: Option<JsonValue>,
    #[serde(default)]
    last_assetid: Option<String>,
    #[serde(default)]
    total_inventory_count: Option<u64>,
    #[serde(default)]
    assets: Option<Vec<Asset>>,
    #[serde(default)]
    descriptions: Option<Vec<Description>>,
}

impl InventoryResponse {
    /// Validate the response shape and build a page
    pub(crate) fn into_page(self) -> Result<ItemPage> {
        if !json_flag(self.success.as_ref()) {
            return Err(Error::NoSuccess);
        }
        let assets = self.assets.ok_or(Error::MissingAssets)?;
        let descriptions = self.descriptions.ok_or(Error::MissingDescriptions)?;
        let is_last = !json_flag(self.more_items.as_ref());

        Ok(ItemPage::new(assets, descriptions, is_last, self.last_assetid)
            .with_total_count(self.total_inventory_count))
    }
}

/// Client for `GET /inventory/{steamid}/{appid}/{contextid}`
pub struct SteamClient {
    client: Client,
    config: HttpClientConfig,
    base_url: Url,
    rate_limiter: Option<RateLimiter>,
}

impl SteamClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::invalid_value(
                "base_url",
                format!("'{}' cannot be used as a base URL", config.base_url),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            base_url,
            rate_limiter,
        })
    }

    /// Replace the rate limiter, e.g. with one shared by other clients
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// URL of the inventory addressed by `request`, without query parameters
    pub fn inventory_url(&self, request: &PageRequest) -> Result<Url> {
        let app_id = request.app_id.to_string();
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::invalid_value("base_url", "cannot be used as a base URL"))?
            .pop_if_empty()
            .extend([
                "inventory",
                request.steam_id.as_str(),
                app_id.as_str(),
                request.context_id.as_str(),
            ]);
        Ok(url)
    }

    /// Query parameters for `request`; `start_assetid` is left out on the first page
    pub fn query_params(request: &PageRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("l", request.language.clone()),
            ("count", request.count.to_string()),
        ];
        if let Some(start) = &request.start_asset_id {
            params.push(("start_assetid", start.clone()));
        }
        params
    }

    async fn request_page(&self, request: &PageRequest) -> Result<ItemPage> {
        let url = self.inventory_url(request)?;

        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let mut req = self
            .client
            .get(url.clone())
            .query(&Self::query_params(request));
        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        let response = req.send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::http_status(status.as_u16(), body));
        }

        let body = response.text().await?;
        let parsed: InventoryResponse = serde_json::from_str(&body)
            .map_err(|e| Error::decode(format!("Unexpected inventory response: {e}")))?;
        let page = parsed.into_page()?;

        debug!(
            %url,
            assets = page.len(),
            is_last = page.is_last(),
            "Inventory page received"
        );
        Ok(page)
    }
}

#[async_trait]
impl InventoryFetcher for SteamClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<ItemPage> {
        self.request_page(request).await
    }
}

impl std::fmt::Debug for SteamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SteamClient")
            .field("config", &self.config)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}
