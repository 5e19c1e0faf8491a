//! Integration tests for the Redis dedup store and stream sink.
//!
//! These tests require a Redis instance running at `redis://127.0.0.1/`.
//! Tests are ignored by default - run with `cargo test --test redis_store -- --ignored`

#![cfg(feature = "redis-store")]

use request_dedup::{
    DedupStore, Identifier, Outcome, RedisDedupStore, RedisStoreConfig, RedisStreamSink,
    RequestDedupService, StreamSink,
};
use std::sync::Arc;
use std::time::Duration;

const REDIS_URL: &str = "redis://127.0.0.1/";

/// Check if Redis is available before running tests
async fn redis_available() -> bool {
    RedisDedupStore::connect(REDIS_URL).await.is_ok()
}

/// Create a test store with unique prefix, cleared of leftovers
async fn create_test_store(test_name: &str) -> RedisDedupStore {
    let config = RedisStoreConfig {
        key_prefix: format!("test:{}:request_id:", test_name),
        ..RedisStoreConfig::default()
    };

    let store = RedisDedupStore::connect_with_config(REDIS_URL, config)
        .await
        .expect("Failed to connect to Redis");
    let leftovers = store.list_tracked_keys().await.unwrap();
    store.delete(&leftovers).await;
    store
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_redis_mark_if_absent() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available at {}", REDIS_URL);
        return;
    }

    let store = create_test_store("mark").await;
    let ttl = Duration::from_secs(60);

    assert!(store.mark_if_absent(Identifier::new(1), ttl).await.unwrap());
    assert!(!store.mark_if_absent(Identifier::new(1), ttl).await.unwrap());
    assert!(store.mark_if_absent(Identifier::new(2), ttl).await.unwrap());

    let mut keys = store.list_tracked_keys().await.unwrap();
    keys.sort();
    assert_eq!(
        keys,
        vec!["test:mark:request_id:1", "test:mark:request_id:2"]
    );

    assert_eq!(store.delete(&keys).await, 2);
    assert!(store.list_tracked_keys().await.unwrap().is_empty());
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_redis_ttl_expiry() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available");
        return;
    }

    let store = create_test_store("ttl").await;

    assert!(store
        .mark_if_absent(Identifier::new(7), Duration::from_millis(100))
        .await
        .unwrap());
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert!(store.list_tracked_keys().await.unwrap().is_empty());
    assert!(store
        .mark_if_absent(Identifier::new(7), Duration::from_millis(100))
        .await
        .unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Requires Redis
async fn test_redis_concurrent_single_winner() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available");
        return;
    }

    let store = Arc::new(create_test_store("concurrent").await);
    let mut handles = Vec::new();
    for _ in 0..32 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .mark_if_absent(Identifier::new(42), Duration::from_secs(60))
                .await
                .unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);

    let keys = store.list_tracked_keys().await.unwrap();
    store.delete(&keys).await;
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_redis_prefix_isolation() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available");
        return;
    }

    let a = create_test_store("isolation_a").await;
    let b = create_test_store("isolation_b").await;
    let ttl = Duration::from_secs(60);

    a.mark_if_absent(Identifier::new(1), ttl).await.unwrap();
    assert!(b.list_tracked_keys().await.unwrap().is_empty());
    assert!(b.mark_if_absent(Identifier::new(1), ttl).await.unwrap());

    let keys = a.list_tracked_keys().await.unwrap();
    a.delete(&keys).await;
    let keys = b.list_tracked_keys().await.unwrap();
    b.delete(&keys).await;
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_redis_stream_sink_publish() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available");
        return;
    }

    let sink = RedisStreamSink::connect(REDIS_URL)
        .await
        .expect("Failed to connect to Redis")
        .with_max_len(100);

    sink.publish(
        "test:unique-request-count",
        b"Unique request count in last minute: 3".to_vec(),
    )
    .await
    .unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_redis_service_window() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available");
        return;
    }

    let store = create_test_store("service").await;
    let sink = RedisStreamSink::connect(REDIS_URL).await.unwrap();
    let service = RequestDedupService::builder()
        .with_sink(Arc::new(sink))
        .with_topic("test:service:unique-request-count")
        .with_background_aggregation(false)
        .build_with_store(store)
        .unwrap();

    assert_eq!(service.ingest("1", None).await, Outcome::Accepted);
    assert_eq!(service.ingest("1", None).await, Outcome::Duplicate);
    assert_eq!(service.ingest("2", None).await, Outcome::Accepted);

    let report = service.run_cycle().await.unwrap();
    assert_eq!(report.count, 2);
    assert_eq!(report.cleared, 2);
    assert_eq!(service.ingest("1", None).await, Outcome::Accepted);

    service.run_cycle().await.unwrap();
}
