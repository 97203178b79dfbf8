//! Error types for steam-inventory-stream
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for steam-inventory-stream
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Fetch Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Status code {status}")]
    HttpStatus { status: u16, body: String },

    #[error("No success")]
    NoSuccess,

    #[error("No assets")]
    MissingAssets,

    #[error("No descriptions")]
    MissingDescriptions,

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Data Integrity Errors
    // ============================================================================
    #[error(
        "Inconsistent page data: asset {asset_id} has no description for class {class_id} instance {instance_id}"
    )]
    InconsistentPage {
        asset_id: String,
        class_id: String,
        instance_id: String,
    },

    // ============================================================================
    // Terminal Errors
    // ============================================================================
    #[error("Failed to load steam inventory")]
    InventoryLoadFailed {
        /// Consecutive failures counted at the minimum page size
        attempts: u32,
        /// Message of the last fetch failure, if any fetch was attempted
        last_error: Option<String>,
    },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Name of the config field this error refers to, if any
    pub fn config_field(&self) -> Option<&str> {
        match self {
            Error::MissingConfigField { field } | Error::InvalidConfigValue { field, .. } => {
                Some(field)
            }
            _ => None,
        }
    }

    /// Check if this error came from fetching a page.
    ///
    /// The engine retries every fetch error the same way; the variant only
    /// changes the message carried into the terminal error.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            Error::Http(_)
                | Error::HttpStatus { .. }
                | Error::NoSuccess
                | Error::MissingAssets
                | Error::MissingDescriptions
                | Error::Decode { .. }
                | Error::InvalidUrl(_)
        )
    }

    /// Check if this error ends an inventory stream
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Error::InventoryLoadFailed { .. } | Error::InconsistentPage { .. }
        )
    }
}

/// Result type alias for steam-inventory-stream
pub type Result<T> = std::result::Result<T, Error>;
