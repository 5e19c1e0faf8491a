//! Example demonstrating the Redis-backed store and stream sink.
//!
//! Several service instances pointed at the same Redis share one dedup
//! window: an identifier accepted by one instance is a duplicate on all
//! others, and each count is published to a Redis stream.
//!
//! # Quick Start
//!
//! 1. Start Redis:
//!    ```bash
//!    docker run -p 6379:6379 redis:7-alpine
//!    ```
//!
//! 2. Run the example:
//!    ```bash
//!    cargo run --example redis
//!    ```
//!
//! 3. Read the published counts:
//!    ```bash
//!    redis-cli XRANGE unique-request-count - +
//!    ```
//!
//! Run two instances at the same time to see the shared window: the second
//! instance reports every identifier the first already accepted as a
//! duplicate.

use request_dedup::{
    Outcome, RedisDedupStore, RedisStoreConfig, RedisStreamSink, RequestDedupService,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string());

    let store = match RedisDedupStore::connect_with_config(&url, RedisStoreConfig::default()).await
    {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Failed to connect to Redis at {}: {}", url, e);
            eprintln!("Start one with: docker run -p 6379:6379 redis:7-alpine");
            std::process::exit(1);
        }
    };
    let sink = RedisStreamSink::connect(&url).await?;

    let service = RequestDedupService::builder()
        .with_interval(Duration::from_secs(10))
        .with_sink(Arc::new(sink))
        .with_drain_on_shutdown(true)
        .build_with_store(store)?;

    println!("=== Redis Dedup Example ===\n");
    let mut accepted = 0;
    for id in 1..=20 {
        // Every identifier is submitted twice
        for _ in 0..2 {
            if service.ingest(&id.to_string(), None).await == Outcome::Accepted {
                accepted += 1;
            }
        }
    }
    println!("Accepted {} of 40 requests", accepted);

    println!("Waiting for the next aggregation cycle...");
    tokio::time::sleep(Duration::from_secs(11)).await;

    service.shutdown().await?;
    println!("\n=== Example Complete ===");
    Ok(())
}
