//! Tests for engine module

use super::*;
use crate::types::{Asset, BackoffType, Description};
use async_trait::async_trait;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use test_case::test_case;
use tokio::sync::Semaphore;
use tokio_test::{assert_pending, assert_ready};

// ============================================================================
// Helpers
// ============================================================================

#[derive(Clone)]
enum Step {
    Page(ItemPage),
    Fail,
    Inconsistent,
}

/// Replays a fixed script of responses and records every request
struct ScriptedFetcher {
    steps: Mutex<VecDeque<Step>>,
    fallback: Step,
    requests: Mutex<Vec<PageRequest>>,
}

impl ScriptedFetcher {
    fn new(steps: Vec<Step>, fallback: Step) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            fallback,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn counts(&self) -> Vec<u32> {
        self.requests.lock().unwrap().iter().map(|r| r.count).collect()
    }

    fn cursors(&self) -> Vec<Option<String>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.start_asset_id.clone())
            .collect()
    }

    fn record(&self, request: &PageRequest) {
        self.requests.lock().unwrap().push(request.clone());
    }

    fn respond(&self) -> Result<ItemPage> {
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match step {
            Step::Page(page) => Ok(page),
            Step::Fail => Err(Error::http_status(500, "")),
            Step::Inconsistent => Ok(ItemPage::new(
                vec![asset("999", "404", "0")],
                vec![description("1", "0")],
                false,
                None,
            )),
        }
    }
}

#[async_trait]
impl InventoryFetcher for ScriptedFetcher {
    async fn fetch_page(&self, request: &PageRequest) -> Result<ItemPage> {
        self.record(request);
        self.respond()
    }
}

/// Holds every request until a permit is released
struct GatedFetcher {
    gate: Arc<Semaphore>,
    inner: Arc<ScriptedFetcher>,
}

#[async_trait]
impl InventoryFetcher for GatedFetcher {
    async fn fetch_page(&self, request: &PageRequest) -> Result<ItemPage> {
        self.inner.record(request);
        self.gate.acquire().await.unwrap().forget();
        self.inner.respond()
    }
}

fn asset(assetid: &str, classid: &str, instanceid: &str) -> Asset {
    Asset {
        appid: 730,
        contextid: "2".to_string(),
        assetid: assetid.to_string(),
        classid: classid.to_string(),
        instanceid: instanceid.to_string(),
        amount: "1".to_string(),
    }
}

fn description(classid: &str, instanceid: &str) -> Description {
    Description {
        appid: 730,
        classid: classid.to_string(),
        instanceid: instanceid.to_string(),
        name: format!("Item {classid}/{instanceid}"),
        ..Default::default()
    }
}

fn page(assetid: &str, more_items: bool) -> Step {
    Step::Page(ItemPage::new(
        vec![asset(assetid, "1", "0")],
        vec![description("1", "0")],
        !more_items,
        Some(assetid.to_string()),
    ))
}

fn config() -> InventoryConfig {
    InventoryConfig::builder()
        .steam_id("123")
        .app_id(123)
        .context_id("123")
        .build()
        .unwrap()
}

// ============================================================================
// InventoryConfig Tests
// ============================================================================

#[test]
fn test_config_defaults() {
    let config = config();
    assert_eq!(config.steam_id(), "123");
    assert_eq!(config.app_id(), 123);
    assert_eq!(config.context_id(), "123");
    assert_eq!(config.language(), DEFAULT_LANGUAGE);
    assert_eq!(config.max_sequential_errors(), DEFAULT_MAX_SEQUENTIAL_ERRORS);
    assert_eq!(config.max_page_size(), 5000);
    assert!(!config.reset_errors_on_success());
    assert!(config.retry_backoff().is_none());
}

#[test]
fn test_config_builder_overrides() {
    let config = InventoryConfig::builder()
        .steam_id("76561198000000000")
        .app_id(730)
        .context_id("2")
        .language("german")
        .max_sequential_errors(3)
        .max_page_size(2000)
        .reset_errors_on_success(true)
        .retry_backoff(RetryBackoff::default())
        .build()
        .unwrap();

    assert_eq!(config.language(), "german");
    assert_eq!(config.max_sequential_errors(), 3);
    assert_eq!(config.max_page_size(), 2000);
    assert!(config.reset_errors_on_success());
    assert_eq!(config.retry_backoff(), Some(&RetryBackoff::default()));
}

#[test]
fn test_config_builder_missing_fields() {
    let err = InventoryConfig::builder()
        .app_id(1)
        .context_id("2")
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::MissingConfigField { ref field } if field == "steam_id"));

    let err = InventoryConfig::builder()
        .steam_id("1")
        .context_id("2")
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::MissingConfigField { ref field } if field == "app_id"));

    let err = InventoryConfig::builder()
        .steam_id("1")
        .app_id(1)
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::MissingConfigField { ref field } if field == "context_id"));
}

#[test]
fn test_config_builder_invalid_values() {
    let base = || {
        InventoryConfig::builder()
            .steam_id("1")
            .app_id(1)
            .context_id("2")
    };

    let cases = [
        (base().steam_id(""), "steam_id"),
        (base().app_id(0), "app_id"),
        (base().context_id(""), "context_id"),
        (base().language(""), "language"),
        (base().max_page_size(0), "max_page_size"),
    ];

    for (builder, field) in cases {
        let err = builder.build().unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
        assert_eq!(err.config_field(), Some(field));
    }
}

#[test]
fn test_config_from_json_valid() {
    let config = InventoryConfig::from_json(&json!({
        "steam_id": "111",
        "app_id": 111,
        "context_id": "111"
    }))
    .unwrap();
    assert_eq!(config.language(), "en");
    assert_eq!(config.max_sequential_errors(), 5);
    assert_eq!(config.max_page_size(), 5000);

    let config = InventoryConfig::from_json(&json!({
        "steam_id": "111",
        "app_id": 111,
        "context_id": "111",
        "language": "french",
        "max_sequential_errors": 2,
        "max_page_size": 500,
        "reset_errors_on_success": true
    }))
    .unwrap();
    assert_eq!(config.language(), "french");
    assert_eq!(config.max_sequential_errors(), 2);
    assert_eq!(config.max_page_size(), 500);
    assert!(config.reset_errors_on_success());
}

#[test_case(json!({"app_id": 111, "context_id": "111"}), "steam_id", true ; "missing steam_id")]
#[test_case(json!({"steam_id": "111", "context_id": "111"}), "app_id", true ; "missing app_id")]
#[test_case(json!({"steam_id": "111", "app_id": 111}), "context_id", true ; "missing context_id")]
#[test_case(json!({"steam_id": "111", "app_id": 111, "context_id": "111", "language": null}), "language", true ; "null language")]
#[test_case(json!({"steam_id": "111", "app_id": 111, "context_id": "111", "max_sequential_errors": null}), "max_sequential_errors", true ; "null max_sequential_errors")]
#[test_case(json!({"steam_id": "111", "app_id": 111, "context_id": "111", "max_page_size": null}), "max_page_size", true ; "null max_page_size")]
#[test_case(json!({"steam_id": 111, "app_id": 111, "context_id": "111"}), "steam_id", false ; "numeric steam_id")]
#[test_case(json!({"steam_id": "111", "app_id": "111", "context_id": "111"}), "app_id", false ; "string app_id")]
#[test_case(json!({"steam_id": "111", "app_id": 111, "context_id": 111}), "context_id", false ; "numeric context_id")]
#[test_case(json!({"steam_id": "111", "app_id": 111, "context_id": "111", "language": 123}), "language", false ; "numeric language")]
#[test_case(json!({"steam_id": "111", "app_id": 111, "context_id": "111", "max_sequential_errors": "111"}), "max_sequential_errors", false ; "string max_sequential_errors")]
#[test_case(json!({"steam_id": "111", "app_id": 111, "context_id": "111", "max_page_size": "111"}), "max_page_size", false ; "string max_page_size")]
#[test_case(json!({"steam_id": "111", "app_id": -1, "context_id": "111"}), "app_id", false ; "negative app_id")]
fn test_config_from_json_errors(value: serde_json::Value, field: &str, missing: bool) {
    let err = InventoryConfig::from_json(&value).unwrap_err();

    assert_eq!(err.config_field(), Some(field));
    if missing {
        assert!(matches!(err, Error::MissingConfigField { .. }), "{err:?}");
    } else {
        assert!(matches!(err, Error::InvalidConfigValue { .. }), "{err:?}");
    }
}

#[test]
fn test_config_from_json_not_object() {
    let err = InventoryConfig::from_json(&json!(["123"])).unwrap_err();
    assert_eq!(err.config_field(), Some("config"));
}

// ============================================================================
// RetryBackoff Tests
// ============================================================================

#[test_case(BackoffType::Constant, &[0, 100, 100, 100] ; "constant")]
#[test_case(BackoffType::Linear, &[0, 100, 200, 300] ; "linear")]
#[test_case(BackoffType::Exponential, &[0, 100, 200, 400] ; "exponential")]
fn test_retry_backoff_delay(backoff_type: BackoffType, expected_ms: &[u64]) {
    let backoff = RetryBackoff::new(
        backoff_type,
        Duration::from_millis(100),
        Duration::from_secs(10),
    );

    for (attempt, want) in expected_ms.iter().enumerate() {
        assert_eq!(
            backoff.delay(attempt as u32),
            Duration::from_millis(*want)
        );
    }
}

#[test]
fn test_retry_backoff_capped() {
    let backoff = RetryBackoff::new(
        BackoffType::Exponential,
        Duration::from_secs(1),
        Duration::from_secs(5),
    );
    assert_eq!(backoff.delay(10), Duration::from_secs(5));
    assert_eq!(backoff.delay(u32::MAX), Duration::from_secs(5));
}

// ============================================================================
// InventoryStats Tests
// ============================================================================

#[test]
fn test_inventory_stats() {
    let mut stats = InventoryStats::new();
    stats.add_page(75);
    stats.add_page(10);
    stats.add_failure();

    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.items_emitted, 85);
    assert_eq!(stats.failed_requests, 1);
    assert_eq!(stats.total_inventory_count, None);
}

// ============================================================================
// InventoryStream Tests
// ============================================================================

#[tokio::test]
async fn test_stream_does_not_fetch_before_poll() {
    let fetcher = ScriptedFetcher::new(vec![], page("1", false));
    let stream = InventoryStream::new(config(), Arc::clone(&fetcher));

    tokio::task::yield_now().await;

    assert_eq!(fetcher.calls(), 0);
    assert!(!stream.is_fetching());
    assert!(!stream.is_terminated());
}

#[tokio::test]
async fn test_stream_two_pages() {
    let fetcher = ScriptedFetcher::new(vec![page("1", true), page("2", false)], Step::Fail);
    let mut stream = InventoryStream::new(config(), Arc::clone(&fetcher));

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].asset_id, "1");

    let second = stream.next().await.unwrap().unwrap();
    assert_eq!(second[0].asset_id, "2");

    assert!(stream.next().await.is_none());
    assert!(stream.is_terminated());
    assert!(stream.next().await.is_none());

    assert_eq!(fetcher.calls(), 2);
    assert_eq!(fetcher.counts(), vec![75, 150]);
    assert_eq!(fetcher.cursors(), vec![None, Some("1".to_string())]);
    assert_eq!(stream.stats().pages_fetched, 2);
    assert_eq!(stream.stats().items_emitted, 2);
    assert_eq!(stream.stats().failed_requests, 0);
}

#[tokio::test]
async fn test_stream_request_parameters() {
    let fetcher = ScriptedFetcher::new(vec![], page("1", false));
    let config = InventoryConfig::builder()
        .steam_id("76561198000000000")
        .app_id(753)
        .context_id("6")
        .language("german")
        .build()
        .unwrap();
    let stream = InventoryStream::new(config, Arc::clone(&fetcher));

    let items = stream.collect_all().await.unwrap();
    assert_eq!(items.len(), 1);

    let request = fetcher.requests.lock().unwrap()[0].clone();
    assert_eq!(request.steam_id, "76561198000000000");
    assert_eq!(request.app_id, 753);
    assert_eq!(request.context_id, "6");
    assert_eq!(request.language, "german");
}

#[test_case(5000, &[75, 150, 300, 600, 1200, 2400, 4800, 5000, 5000] ; "default cap")]
#[test_case(500, &[75, 150, 300, 500, 500] ; "small cap")]
#[tokio::test]
async fn test_stream_page_size_growth(max: u32, expected: &[u32]) {
    let mut steps: Vec<Step> = (0..expected.len() - 1)
        .map(|i| page(&i.to_string(), true))
        .collect();
    steps.push(page("last", false));

    let fetcher = ScriptedFetcher::new(steps, Step::Fail);
    let config = InventoryConfig::builder()
        .steam_id("1")
        .app_id(1)
        .context_id("1")
        .max_page_size(max)
        .build()
        .unwrap();
    let stream = InventoryStream::new(config, Arc::clone(&fetcher));

    let batches: Vec<_> = stream.collect().await;

    assert_eq!(batches.len(), expected.len());
    assert!(batches.iter().all(|b| b.is_ok()));
    assert_eq!(fetcher.counts(), expected.to_vec());
}

#[tokio::test]
async fn test_stream_fails_after_budget_at_floor() {
    let fetcher = ScriptedFetcher::new(vec![], Step::Fail);
    let mut stream = InventoryStream::new(config(), Arc::clone(&fetcher));

    let err = stream.next().await.unwrap().unwrap_err();

    assert_eq!(err.to_string(), "Failed to load steam inventory");
    match err {
        Error::InventoryLoadFailed {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 5);
            assert_eq!(last_error.as_deref(), Some("Status code 500"));
        }
        other => panic!("Expected InventoryLoadFailed, got {other:?}"),
    }

    assert_eq!(fetcher.calls(), 5);
    assert_eq!(fetcher.counts(), vec![75; 5]);
    assert!(stream.next().await.is_none());
    assert_eq!(fetcher.calls(), 5);
    assert_eq!(stream.stats().pages_fetched, 0);
    assert_eq!(stream.stats().failed_requests, 5);
}

#[tokio::test]
async fn test_stream_custom_budget() {
    let fetcher = ScriptedFetcher::new(vec![], Step::Fail);
    let config = InventoryConfig::builder()
        .steam_id("1")
        .app_id(1)
        .context_id("1")
        .max_sequential_errors(2)
        .build()
        .unwrap();
    let stream = InventoryStream::new(config, Arc::clone(&fetcher));

    let batches: Vec<_> = stream.collect().await;

    assert_eq!(batches.len(), 1);
    assert!(batches[0].is_err());
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn test_stream_zero_budget_fails_without_fetching() {
    let fetcher = ScriptedFetcher::new(vec![], page("1", false));
    let config = InventoryConfig::builder()
        .steam_id("1")
        .app_id(1)
        .context_id("1")
        .max_sequential_errors(0)
        .build()
        .unwrap();
    let mut stream = InventoryStream::new(config, Arc::clone(&fetcher));

    let err = stream.next().await.unwrap().unwrap_err();

    assert!(matches!(
        err,
        Error::InventoryLoadFailed {
            attempts: 0,
            last_error: None
        }
    ));
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_stream_page_then_failures() {
    let fetcher = ScriptedFetcher::new(vec![page("123", true)], Step::Fail);
    let mut stream = InventoryStream::new(config(), Arc::clone(&fetcher));

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first[0].asset_id, "123");

    let err = stream.next().await.unwrap().unwrap_err();
    assert_eq!(err.to_string(), "Failed to load steam inventory");
    assert!(stream.next().await.is_none());

    // one success, one uncounted failure at 150, five counted at 75
    assert_eq!(fetcher.calls(), 7);
    assert_eq!(fetcher.counts(), vec![75, 150, 75, 75, 75, 75, 75]);
    assert!(fetcher
        .cursors()
        .iter()
        .skip(1)
        .all(|c| c.as_deref() == Some("123")));
}

#[tokio::test]
async fn test_stream_single_failure_from_larger_size_not_counted() {
    let fetcher = ScriptedFetcher::new(
        vec![page("1", true), Step::Fail, page("2", false)],
        Step::Fail,
    );
    let mut stream = InventoryStream::new(config(), Arc::clone(&fetcher));

    assert!(stream.next().await.unwrap().is_ok());
    assert_eq!(stream.page_size(), 150);

    assert!(stream.next().await.unwrap().is_ok());
    assert_eq!(stream.consecutive_errors(), 0);
    assert!(stream.next().await.is_none());

    assert_eq!(fetcher.counts(), vec![75, 150, 75]);
    assert_eq!(
        fetcher.cursors(),
        vec![None, Some("1".to_string()), Some("1".to_string())]
    );
    assert_eq!(stream.stats().failed_requests, 1);
}

#[tokio::test]
async fn test_stream_errors_accumulate_across_successes() {
    let script = vec![
        Step::Fail,
        Step::Fail,
        Step::Fail,
        Step::Fail,
        page("1", true),
        Step::Fail,
        Step::Fail,
    ];
    let fetcher = ScriptedFetcher::new(script, page("2", false));
    let mut stream = InventoryStream::new(config(), Arc::clone(&fetcher));

    assert!(stream.next().await.unwrap().is_ok());
    assert_eq!(stream.consecutive_errors(), 4);

    let err = stream.next().await.unwrap().unwrap_err();
    assert!(matches!(err, Error::InventoryLoadFailed { attempts: 5, .. }));
    assert_eq!(fetcher.calls(), 7);
}

#[tokio::test]
async fn test_stream_reset_errors_on_success() {
    let script = vec![
        Step::Fail,
        Step::Fail,
        Step::Fail,
        Step::Fail,
        page("1", true),
        Step::Fail,
        Step::Fail,
    ];
    let fetcher = ScriptedFetcher::new(script, page("2", false));
    let config = InventoryConfig::builder()
        .steam_id("1")
        .app_id(1)
        .context_id("1")
        .reset_errors_on_success(true)
        .build()
        .unwrap();
    let stream = InventoryStream::new(config, Arc::clone(&fetcher));

    let items = stream.collect_all().await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(fetcher.calls(), 8);
}

#[tokio::test]
async fn test_stream_inconsistent_page_is_fatal() {
    let fetcher = ScriptedFetcher::new(vec![Step::Inconsistent], page("1", false));
    let mut stream = InventoryStream::new(config(), Arc::clone(&fetcher));

    let err = stream.next().await.unwrap().unwrap_err();

    assert!(matches!(err, Error::InconsistentPage { ref asset_id, .. } if asset_id == "999"));
    assert!(stream.next().await.is_none());
    assert!(stream.is_terminated());
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_stream_emits_empty_pages() {
    let empty = Step::Page(ItemPage::new(vec![], vec![], true, None));
    let fetcher = ScriptedFetcher::new(vec![empty], Step::Fail);
    let stream = InventoryStream::new(config(), Arc::clone(&fetcher));

    let batches: Vec<_> = stream.collect().await;

    assert_eq!(batches.len(), 1);
    assert!(batches[0].as_ref().unwrap().is_empty());
}

#[tokio::test]
async fn test_stream_waits_for_demand_between_pages() {
    let fetcher = ScriptedFetcher::new(
        vec![page("1", true), page("2", true), page("3", false)],
        Step::Fail,
    );
    let mut stream = InventoryStream::new(config(), Arc::clone(&fetcher));

    assert!(stream.next().await.unwrap().is_ok());
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(fetcher.calls(), 1);

    assert!(stream.next().await.unwrap().is_ok());
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn test_stream_repoll_resumes_in_flight_request() {
    let inner = ScriptedFetcher::new(vec![page("1", false)], Step::Fail);
    let gate = Arc::new(Semaphore::new(0));
    let mut stream = InventoryStream::new(
        config(),
        GatedFetcher {
            gate: Arc::clone(&gate),
            inner: Arc::clone(&inner),
        },
    );

    {
        let mut next = tokio_test::task::spawn(stream.next());
        assert_pending!(next.poll());
        assert_pending!(next.poll());
    }
    assert_eq!(inner.calls(), 1);
    assert!(stream.is_fetching());

    let mut next = tokio_test::task::spawn(stream.next());
    assert_pending!(next.poll());
    assert_eq!(inner.calls(), 1);

    gate.add_permits(1);
    let batch = assert_ready!(next.poll());
    assert_eq!(batch.unwrap().unwrap()[0].asset_id, "1");
    drop(next);

    assert!(stream.next().await.is_none());
    assert_eq!(inner.calls(), 1);
}

#[tokio::test]
async fn test_dropping_stream_cancels_request() {
    let inner = ScriptedFetcher::new(vec![], page("1", true));
    let gate = Arc::new(Semaphore::new(0));
    let mut stream = InventoryStream::new(
        config(),
        GatedFetcher {
            gate: Arc::clone(&gate),
            inner: Arc::clone(&inner),
        },
    );

    {
        let mut next = tokio_test::task::spawn(stream.next());
        assert_pending!(next.poll());
    }
    drop(stream);

    gate.add_permits(10);
    tokio::task::yield_now().await;

    assert_eq!(inner.calls(), 1);
    assert_eq!(gate.available_permits(), 10);
}

#[tokio::test]
async fn test_stream_into_items() {
    let fetcher = ScriptedFetcher::new(vec![page("1", true), page("2", false)], Step::Fail);
    let stream = InventoryStream::new(config(), Arc::clone(&fetcher));

    let items: Vec<_> = stream.into_items().collect().await;
    let ids: Vec<_> = items
        .into_iter()
        .map(|item| item.unwrap().asset_id)
        .collect();

    assert_eq!(ids, vec!["1".to_string(), "2".to_string()]);
}

#[tokio::test]
async fn test_stream_collect_all_propagates_failure() {
    let fetcher = ScriptedFetcher::new(vec![page("1", true)], Step::Fail);
    let stream = InventoryStream::new(config(), Arc::clone(&fetcher));

    let err = stream.collect_all().await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to load steam inventory");
}

#[tokio::test]
async fn test_stream_retry_backoff_still_retries() {
    let fetcher = ScriptedFetcher::new(vec![Step::Fail, Step::Fail], page("1", false));
    let config = InventoryConfig::builder()
        .steam_id("1")
        .app_id(1)
        .context_id("1")
        .retry_backoff(RetryBackoff::new(
            BackoffType::Constant,
            Duration::from_millis(1),
            Duration::from_millis(1),
        ))
        .build()
        .unwrap();
    let stream = InventoryStream::new(config, Arc::clone(&fetcher));

    let items = stream.collect_all().await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(fetcher.calls(), 3);
}
