//! Engine types
//!
//! Configuration and statistics for the inventory stream.

use crate::error::{Error, Result};
use crate::pagination::DEFAULT_MAX_PAGE_SIZE;
use crate::types::{BackoffType, JsonValue};
use serde_json::Map;
use std::time::Duration;

/// Language used when none is configured
pub const DEFAULT_LANGUAGE: &str = "en";

/// Failures at the minimum page size tolerated before giving up
pub const DEFAULT_MAX_SEQUENTIAL_ERRORS: u32 = 5;

// ============================================================================
// Inventory Config
// ============================================================================

/// Validated configuration for one inventory stream.
///
/// Only obtainable through [`InventoryConfig::builder`] or
/// [`InventoryConfig::from_json`], both of which reject invalid values
/// before any request is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryConfig {
    steam_id: String,
    app_id: u32,
    context_id: String,
    language: String,
    max_sequential_errors: u32,
    max_page_size: u32,
    reset_errors_on_success: bool,
    retry_backoff: Option<RetryBackoff>,
}

impl InventoryConfig {
    /// Create a new config builder
    pub fn builder() -> InventoryConfigBuilder {
        InventoryConfigBuilder::default()
    }

    /// Build a config from loosely typed JSON.
    ///
    /// Recognised keys: `steam_id`, `app_id`, `context_id`, `language`,
    /// `max_sequential_errors`, `max_page_size`, `reset_errors_on_success`.
    /// Optional keys fall back to their defaults when absent; an explicit
    /// `null` is reported as missing.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::invalid_value("config", "must be a JSON object"))?;

        let steam_id = as_string("steam_id", required(object, "steam_id")?)?;
        let app_id = as_u32("app_id", required(object, "app_id")?)?;
        let context_id = as_string("context_id", required(object, "context_id")?)?;

        let mut builder = Self::builder()
            .steam_id(steam_id)
            .app_id(app_id)
            .context_id(context_id);

        if let Some(language) = optional(object, "language")? {
            builder = builder.language(as_string("language", language)?);
        }
        if let Some(max_errors) = optional(object, "max_sequential_errors")? {
            builder = builder.max_sequential_errors(as_u32("max_sequential_errors", max_errors)?);
        }
        if let Some(max_size) = optional(object, "max_page_size")? {
            builder = builder.max_page_size(as_u32("max_page_size", max_size)?);
        }
        if let Some(reset) = optional(object, "reset_errors_on_success")? {
            let reset = reset
                .as_bool()
                .ok_or_else(|| Error::invalid_value("reset_errors_on_success", "must be a boolean"))?;
            builder = builder.reset_errors_on_success(reset);
        }

        builder.build()
    }

    /// Owner of the inventory
    pub fn steam_id(&self) -> &str {
        &self.steam_id
    }

    /// Application id
    pub fn app_id(&self) -> u32 {
        self.app_id
    }

    /// Context id
    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    /// Description language
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Error budget
    pub fn max_sequential_errors(&self) -> u32 {
        self.max_sequential_errors
    }

    /// Page size ceiling
    pub fn max_page_size(&self) -> u32 {
        self.max_page_size
    }

    /// Whether a successful page clears the error counter
    pub fn reset_errors_on_success(&self) -> bool {
        self.reset_errors_on_success
    }

    /// Delay applied before retrying a failed request
    pub fn retry_backoff(&self) -> Option<&RetryBackoff> {
        self.retry_backoff.as_ref()
    }
}

fn required<'a>(object: &'a Map<String, JsonValue>, key: &str) -> Result<&'a JsonValue> {
    match object.get(key) {
        None | Some(JsonValue::Null) => Err(Error::missing_field(key)),
        Some(value) => Ok(value),
    }
}

fn optional<'a>(object: &'a Map<String, JsonValue>, key: &str) -> Result<Option<&'a JsonValue>> {
    match object.get(key) {
        None => Ok(None),
        Some(JsonValue::Null) => Err(Error::missing_field(key)),
        Some(value) => Ok(Some(value)),
    }
}

fn as_string(field: &str, value: &JsonValue) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::invalid_value(field, "must be a string"))
}

fn as_u32(field: &str, value: &JsonValue) -> Result<u32> {
    if !value.is_number() {
        return Err(Error::invalid_value(field, "must be a number"));
    }
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| Error::invalid_value(field, "must be a non-negative 32-bit integer"))
}

/// Builder for [`InventoryConfig`]
#[derive(Debug, Default)]
pub struct InventoryConfigBuilder {
    steam_id: Option<String>,
    app_id: Option<u32>,
    context_id: Option<String>,
    language: Option<String>,
    max_sequential_errors: Option<u32>,
    max_page_size: Option<u32>,
    reset_errors_on_success: bool,
    retry_backoff: Option<RetryBackoff>,
}

impl InventoryConfigBuilder {
    /// Set the owner's SteamID
    #[must_use]
    pub fn steam_id(mut self, steam_id: impl Into<String>) -> Self {
        self.steam_id = Some(steam_id.into());
        self
    }

    /// Set the application id
    #[must_use]
    pub fn app_id(mut self, app_id: u32) -> Self {
        self.app_id = Some(app_id);
        self
    }

    /// Set the context id
    #[must_use]
    pub fn context_id(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }

    /// Set the description language (default `en`)
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the error budget (default 5)
    #[must_use]
    pub fn max_sequential_errors(mut self, max: u32) -> Self {
        self.max_sequential_errors = Some(max);
        self
    }

    /// Set the page size ceiling (default 5000)
    #[must_use]
    pub fn max_page_size(mut self, max: u32) -> Self {
        self.max_page_size = Some(max);
        self
    }

    /// Clear the error counter after every successful page
    #[must_use]
    pub fn reset_errors_on_success(mut self, reset: bool) -> Self {
        self.reset_errors_on_success = reset;
        self
    }

    /// Wait before retrying a failed request
    #[must_use]
    pub fn retry_backoff(mut self, backoff: RetryBackoff) -> Self {
        self.retry_backoff = Some(backoff);
        self
    }

    /// Validate and build the config
    pub fn build(self) -> Result<InventoryConfig> {
        let steam_id = self.steam_id.ok_or_else(|| Error::missing_field("steam_id"))?;
        if steam_id.is_empty() {
            return Err(Error::invalid_value("steam_id", "must not be empty"));
        }

        let app_id = self.app_id.ok_or_else(|| Error::missing_field("app_id"))?;
        if app_id == 0 {
            return Err(Error::invalid_value("app_id", "must not be zero"));
        }

        let context_id = self
            .context_id
            .ok_or_else(|| Error::missing_field("context_id"))?;
        if context_id.is_empty() {
            return Err(Error::invalid_value("context_id", "must not be empty"));
        }

        let language = self
            .language
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        if language.is_empty() {
            return Err(Error::invalid_value("language", "must not be empty"));
        }

        let max_page_size = self.max_page_size.unwrap_or(DEFAULT_MAX_PAGE_SIZE);
        if max_page_size == 0 {
            return Err(Error::invalid_value(
                "max_page_size",
                "must be greater than zero",
            ));
        }

        Ok(InventoryConfig {
            steam_id,
            app_id,
            context_id,
            language,
            max_sequential_errors: self
                .max_sequential_errors
                .unwrap_or(DEFAULT_MAX_SEQUENTIAL_ERRORS),
            max_page_size,
            reset_errors_on_success: self.reset_errors_on_success,
            retry_backoff: self.retry_backoff,
        })
    }
}

// ============================================================================
// Retry Backoff
// ============================================================================

/// Delay between a failed request and its retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBackoff {
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
    /// Delay before the first retry
    pub initial: Duration,
    /// Upper bound for any delay
    pub max: Duration,
}

impl RetryBackoff {
    /// Create a backoff policy
    pub fn new(backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        Self {
            backoff_type,
            initial,
            max,
        }
    }

    /// Delay before retry number `attempt` (1 for the first retry)
    pub fn delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let step = attempt - 1;
        let delay = match self.backoff_type {
            BackoffType::Constant => self.initial,
            BackoffType::Linear => self.initial.saturating_mul(step + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(step);
                self.initial.saturating_mul(factor)
            }
        };

        std::cmp::min(delay, self.max)
    }
}

impl Default for RetryBackoff {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial: Duration::from_millis(500),
            max: Duration::from_secs(30),
        }
    }
}

// ============================================================================
// Inventory Stats
// ============================================================================

/// Counters describing a stream's progress
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryStats {
    /// Pages fetched successfully
    pub pages_fetched: usize,
    /// Items emitted to the consumer
    pub items_emitted: usize,
    /// Requests that failed, counted or not
    pub failed_requests: usize,
    /// Inventory size reported by the server
    pub total_inventory_count: Option<u64>,
}

impl InventoryStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a page and its items
    pub fn add_page(&mut self, items: usize) {
        self.pages_fetched += 1;
        self.items_emitted += items;
    }

    /// Record a failed request
    pub fn add_failure(&mut self) {
        self.failed_requests += 1;
    }
}
