//! CLI runner - streams the inventory to an output

use crate::cli::commands::{Cli, OutputFormat};
use crate::engine::{InventoryConfig, InventoryStats, InventoryStream};
use crate::error::{Error, Result};
use crate::http::HttpClientConfig;
use crate::types::JsonValue;
use futures::StreamExt;
use serde_json::{json, Map};
use std::fs;
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Stream the inventory to stdout
    pub async fn run(&self) -> Result<()> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.run_to(&mut out).await?;
        Ok(())
    }

    /// Stream the inventory to `out`, returning the stream's statistics
    pub async fn run_to<W: Write>(&self, out: &mut W) -> Result<InventoryStats> {
        let config = self.inventory_config()?;
        let mut stream = InventoryStream::steam_with_config(config, self.http_config())?;

        let start = Instant::now();
        let mut written = 0usize;

        'pages: while let Some(batch) = stream.next().await {
            for item in batch? {
                if self.cli.max_items.is_some_and(|max| written >= max) {
                    info!(max_items = written, "Item limit reached, stopping");
                    break 'pages;
                }
                let line = match self.cli.format {
                    OutputFormat::Json => serde_json::to_string(&item)?,
                    OutputFormat::Pretty => serde_json::to_string_pretty(&item)?,
                };
                writeln!(out, "{line}")?;
                written += 1;
            }
        }

        let stats = stream.stats().clone();
        let elapsed = start.elapsed();
        info!(
            items = written,
            pages = stats.pages_fetched,
            failed_requests = stats.failed_requests,
            elapsed_ms = elapsed.as_millis() as u64,
            "Inventory streamed"
        );

        if self.cli.format == OutputFormat::Pretty {
            let summary = json!({
                "items": written,
                "pages": stats.pages_fetched,
                "failed_requests": stats.failed_requests,
                "total_inventory_count": stats.total_inventory_count,
                "elapsed_ms": elapsed.as_millis() as u64,
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
        }

        Ok(stats)
    }

    /// Build the stream config from the config JSON with flags layered on top
    pub fn inventory_config(&self) -> Result<InventoryConfig> {
        let mut value = self.load_config()?;
        let object = value
            .as_object_mut()
            .ok_or_else(|| Error::invalid_value("config", "must be a JSON object"))?;
        self.apply_flags(object);
        InventoryConfig::from_json(&value)
    }

    /// HTTP client settings from the flags
    pub fn http_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder().timeout(Duration::from_secs(self.cli.timeout));
        if let Some(base_url) = &self.cli.base_url {
            builder = builder.base_url(base_url.clone());
        }
        if self.cli.no_rate_limit {
            builder = builder.no_rate_limit();
        }
        builder.build()
    }

    /// Load config JSON
    fn load_config(&self) -> Result<JsonValue> {
        // Inline config takes precedence
        if let Some(json_str) = &self.cli.config_json {
            return serde_json::from_str(json_str)
                .map_err(|e| Error::invalid_value("config", format!("Invalid config JSON: {e}")));
        }

        if let Some(path) = &self.cli.config {
            let content = fs::read_to_string(path).map_err(|e| {
                Error::invalid_value("config", format!("Failed to read config file: {e}"))
            })?;
            return serde_json::from_str(&content)
                .map_err(|e| Error::invalid_value("config", format!("Invalid config JSON: {e}")));
        }

        Ok(json!({}))
    }

    fn apply_flags(&self, object: &mut Map<String, JsonValue>) {
        let cli = &self.cli;
        if let Some(steam_id) = &cli.steam_id {
            object.insert("steam_id".into(), json!(steam_id));
        }
        if let Some(app_id) = cli.app_id {
            object.insert("app_id".into(), json!(app_id));
        }
        if let Some(context_id) = &cli.context_id {
            object.insert("context_id".into(), json!(context_id));
        }
        if let Some(language) = &cli.language {
            object.insert("language".into(), json!(language));
        }
        if let Some(max) = cli.max_sequential_errors {
            object.insert("max_sequential_errors".into(), json!(max));
        }
        if let Some(max) = cli.max_page_size {
            object.insert("max_page_size".into(), json!(max));
        }
        if cli.reset_errors_on_success {
            object.insert("reset_errors_on_success".into(), json!(true));
        }
    }
}
