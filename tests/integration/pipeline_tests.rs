//! End-to-end batch runs against a mock registry

use crate::{create_test_config, lookup_body, PROFILE_PAGE};
use registry_harvest::cache::{CacheError, CacheStore, FailureLedger, JsonFileCache, MemoryCache};
use registry_harvest::record::{
    FinancialLineItem, Founders, HarvestedRecord, Leadership, Procurement, StatusClass, TaxRegime,
    Website,
};
use registry_harvest::{run_batch, BatchDriver, CompanyRecord, HarvestError};
use std::fs;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INN: &str = "7707083893";
const PROFILE_PATH: &str = "/id/1027700132195-primer";

async fn mount_lookup(server: &MockServer, identifier: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/search/tips"))
        .and(query_param("query", identifier))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_profile(server: &MockServer, page: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PROFILE_PAGE)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map_or(0, |r| r.len())
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_harvest_single_company() {
    let server = MockServer::start().await;
    mount_lookup(&server, INN, lookup_body(PROFILE_PATH)).await;
    mount_profile(&server, PROFILE_PATH).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), "");

    let outcome = run_batch(&config, &ids(&[INN]), &CancellationToken::new())
        .await
        .expect("batch should succeed");

    assert_eq!(outcome.records.len(), 1);
    let harvested = &outcome.records[0];
    assert_eq!(harvested.identifier, INN);

    let record = &harvested.record;
    assert_eq!(record.tax_id.as_deref(), Some(INN));
    assert_eq!(record.registration_number.as_deref(), Some("1027700132195"));
    assert_eq!(record.short_name.as_deref(), Some("ООО Пример"));
    assert_eq!(record.status_class(), StatusClass::Active);
    assert_eq!(record.contacts.phones, vec!["+7 495 500-55-50"]);
    assert_eq!(record.activities.len(), 1);
    assert_eq!(record.leadership, Leadership::Absent);
    assert_eq!(
        record.founders,
        Founders::Founder {
            name: "Иванов Иван Иванович".to_string(),
            link: "/people/inn773600000000".to_string(),
            since: Some("с 12 мая 2019 г.".to_string()),
        }
    );
    assert_eq!(record.procurement, Procurement::NoParticipation);
    assert_eq!(
        record.tax_regime,
        Some(TaxRegime {
            value: Some("Общая система налогообложения (ОСН)".to_string()),
            comment: Some("по данным ФНС на 2024 год".to_string()),
        })
    );
    assert_eq!(
        record.sanctions.as_deref(),
        Some("Не входит в санкционные списки")
    );
    assert_eq!(
        record.contacts.websites,
        vec![Website {
            name: "primer.ru".to_string(),
            url: "https://primer.ru".to_string(),
        }]
    );

    let financials = record.financials.as_ref().expect("financials present");
    assert_eq!(
        financials.items,
        vec![FinancialLineItem {
            name: "Выручка".to_string(),
            value: "12 000".to_string(),
            change: None,
        }]
    );

    // Cache was written through
    let cache = JsonFileCache::open(&config.cache.path).unwrap();
    assert_eq!(cache.get(INN), Some(record));

    // Output holds the same record
    let written: Vec<HarvestedRecord> =
        serde_json::from_str(&fs::read_to_string(&config.output.path).unwrap()).unwrap();
    assert_eq!(written, outcome.records);

    assert_eq!(outcome.summary.fetched, 1);
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_second_run_is_served_from_cache() {
    let server = MockServer::start().await;
    mount_lookup(&server, INN, lookup_body(PROFILE_PATH)).await;
    mount_profile(&server, PROFILE_PATH).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), "");
    let batch = ids(&[INN]);

    let first = run_batch(&config, &batch, &CancellationToken::new())
        .await
        .unwrap();
    let requests_after_first = request_count(&server).await;

    let second = run_batch(&config, &batch, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(request_count(&server).await, requests_after_first);
    assert_eq!(second.records, first.records);
    assert_eq!(second.summary.from_cache, 1);
    assert_eq!(second.summary.fetched, 0);
}

#[tokio::test]
async fn test_output_follows_input_order() {
    let server = MockServer::start().await;
    mount_lookup(&server, "5001000000", lookup_body("/id/b")).await;
    mount_lookup(&server, "0000000000", "[]".to_string()).await;
    mount_lookup(&server, "6001000000", lookup_body("/id/d")).await;
    mount_profile(&server, "/id/b").await;
    mount_profile(&server, "/id/d").await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), "");

    // Seed the cache so the first identifier never touches the network
    let mut seeded = JsonFileCache::open(&config.cache.path).unwrap();
    seeded
        .put(
            INN,
            CompanyRecord {
                short_name: Some("Из кэша".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    drop(seeded);

    let batch = ids(&[INN, "5001000000", "0000000000", "6001000000"]);
    let outcome = run_batch(&config, &batch, &CancellationToken::new())
        .await
        .unwrap();

    let emitted: Vec<_> = outcome
        .records
        .iter()
        .map(|r| r.identifier.as_str())
        .collect();
    assert_eq!(emitted, vec![INN, "5001000000", "6001000000"]);
    assert_eq!(outcome.records[0].record.short_name.as_deref(), Some("Из кэша"));
    assert_eq!(outcome.summary.from_cache, 1);
    assert_eq!(outcome.summary.fetched, 2);
    assert_eq!(outcome.summary.unresolved, 1);
}

#[tokio::test]
async fn test_empty_lookup_leaves_cache_untouched() {
    let server = MockServer::start().await;
    mount_lookup(&server, "0000000000", "[]".to_string()).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), "");

    let outcome = run_batch(&config, &ids(&["0000000000"]), &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.summary.unresolved, 1);
    assert!(!std::path::Path::new(&config.cache.path).exists());
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_malformed_lookup_is_unresolved() {
    let server = MockServer::start().await;
    mount_lookup(&server, INN, "<html>captcha</html>".to_string()).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), "");

    let outcome = run_batch(&config, &ids(&[INN]), &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.summary.unresolved, 1);
}

#[tokio::test]
async fn test_rate_limited_profile_is_skipped() {
    let server = MockServer::start().await;
    mount_lookup(&server, INN, lookup_body("/id/throttled")).await;
    mount_lookup(&server, "5001000000", lookup_body(PROFILE_PATH)).await;
    Mock::given(method("GET"))
        .and(path("/id/throttled"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    mount_profile(&server, PROFILE_PATH).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), "");

    let outcome = run_batch(&config, &ids(&[INN, "5001000000"]), &CancellationToken::new())
        .await
        .unwrap();

    let emitted: Vec<_> = outcome.records.iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(emitted, vec!["5001000000"]);
    assert_eq!(outcome.summary.failed, 1);

    let cache = JsonFileCache::open(&config.cache.path).unwrap();
    assert!(!cache.contains(INN));
    assert!(cache.contains("5001000000"));
}

#[tokio::test]
async fn test_repeated_failing_identifier_is_tried_once() {
    let server = MockServer::start().await;
    mount_lookup(&server, INN, lookup_body("/id/throttled")).await;
    Mock::given(method("GET"))
        .and(path("/id/throttled"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), "");

    let outcome = run_batch(&config, &ids(&[INN, INN]), &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.summary.failed, 1);
    assert_eq!(outcome.summary.skipped_repeats, 1);
    // One lookup plus three profile attempts
    assert_eq!(request_count(&server).await, 4);
}

#[tokio::test]
async fn test_repeated_unresolved_identifier_is_looked_up_once() {
    let server = MockServer::start().await;
    mount_lookup(&server, "0000000000", "[]".to_string()).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), "");

    let outcome = run_batch(
        &config,
        &ids(&["0000000000", "0000000000"]),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.summary.unresolved, 1);
    assert_eq!(outcome.summary.skipped_repeats, 1);
    assert_eq!(outcome.summary.not_reached(), 0);
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_corrupt_cache_aborts_before_any_request() {
    let server = MockServer::start().await;
    mount_lookup(&server, INN, lookup_body(PROFILE_PATH)).await;
    mount_profile(&server, PROFILE_PATH).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), "");
    fs::write(&config.cache.path, "{ \"7707083893\": ").unwrap();

    let result = run_batch(&config, &ids(&[INN]), &CancellationToken::new()).await;

    assert!(matches!(
        result,
        Err(HarvestError::Cache(CacheError::Corrupt { .. }))
    ));
    assert_eq!(request_count(&server).await, 0);
    assert!(!std::path::Path::new(&config.output.path).exists());
}

#[tokio::test]
async fn test_foreign_cache_file_aborts_before_any_request() {
    let server = MockServer::start().await;
    mount_lookup(&server, INN, lookup_body(PROFILE_PATH)).await;
    mount_profile(&server, PROFILE_PATH).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), "");
    fs::write(
        &config.cache.path,
        r#"{"7707083893": {"ОГРН": "1027700132195", "Короткое название": "ООО Пример"}}"#,
    )
    .unwrap();

    let result = run_batch(&config, &ids(&[INN]), &CancellationToken::new()).await;

    assert!(matches!(
        result,
        Err(HarvestError::Cache(CacheError::Corrupt { .. }))
    ));
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_remembered_failures_are_skipped() {
    let server = MockServer::start().await;
    mount_lookup(&server, "0000000000", "[]".to_string()).await;

    let dir = TempDir::new().unwrap();
    let failed_path = dir.path().join("inn_failed.json");
    let extra = format!(
        "failed-policy = \"remember\"\nfailed-path = \"{}\"",
        failed_path.display()
    );
    let config = create_test_config(&server.uri(), dir.path(), &extra);
    let batch = ids(&["0000000000"]);

    let first = run_batch(&config, &batch, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first.summary.unresolved, 1);

    let ledger = FailureLedger::open(&failed_path).unwrap();
    assert!(ledger.contains("0000000000"));

    let second = run_batch(&config, &batch, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(second.summary.skipped_known_failures, 1);
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_session_rotates_on_cadence() {
    let server = MockServer::start().await;
    for id in ["1000000001", "1000000002", "1000000003"] {
        mount_lookup(&server, id, lookup_body(PROFILE_PATH)).await;
    }
    mount_profile(&server, PROFILE_PATH).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), dir.path(), "");
    config.session.rotate_every = 2;

    let mut driver = BatchDriver::new(config, MemoryCache::new()).unwrap();
    let outcome = driver
        .run(
            &ids(&["1000000001", "1000000002", "1000000003"]),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 3);
    assert_eq!(outcome.summary.sessions, 2);
    assert_eq!(driver.cache().len(), 3);
}

#[tokio::test]
async fn test_cache_hits_do_not_advance_rotation() {
    let server = MockServer::start().await;
    mount_lookup(&server, "1000000002", lookup_body(PROFILE_PATH)).await;
    mount_profile(&server, PROFILE_PATH).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), dir.path(), "");
    config.session.rotate_every = 1;

    let mut cache = MemoryCache::new();
    cache.put("1000000001", CompanyRecord::default()).unwrap();
    cache.put("1000000003", CompanyRecord::default()).unwrap();

    let mut driver = BatchDriver::new(config, cache).unwrap();
    let outcome = driver
        .run(
            &ids(&["1000000001", "1000000002", "1000000003"]),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 3);
    assert_eq!(outcome.summary.from_cache, 2);
    // Positions 1 and 3 are cache hits, so the first session is never used up
    assert_eq!(outcome.summary.sessions, 1);
}
