//! Basic example: deduplicate requests and count them per window.
//!
//! Uses the in-memory store, a short 2-second window so the output appears
//! quickly, a channel-backed stream sink and a report log in the temp
//! directory.
//!
//! ```bash
//! cargo run --example basic
//! ```

use request_dedup::{ChannelSink, FileReportLog, RequestDedupService};
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

    let log_path = std::env::temp_dir().join("request_count.log");
    let (sink, mut records) = ChannelSink::new();

    let service = RequestDedupService::builder()
        .with_window(Duration::from_secs(2))
        .with_interval(Duration::from_secs(2))
        .with_sink(Arc::new(sink))
        .with_report_log(Arc::new(FileReportLog::new(&log_path)))
        .with_drain_on_shutdown(true)
        .build()?;

    let consumer = tokio::spawn(async move {
        while let Some(record) = records.recv().await {
            println!(
                "[{}] {}",
                record.topic,
                String::from_utf8_lossy(&record.payload)
            );
        }
    });

    println!("=== Window 1 ===");
    for id in ["1", "2", "1", "abc", "3", "+2"] {
        let outcome = service.ingest(id, None).await;
        println!("ingest({:>4}) -> {}", id, outcome);
    }

    tokio::time::sleep(Duration::from_millis(2500)).await;

    println!("\n=== Window 2 ===");
    for id in ["1", "4"] {
        let outcome = service.ingest(id, None).await;
        println!("ingest({:>4}) -> {}", id, outcome);
    }

    let metrics = service.metrics().snapshot();
    service.shutdown().await?;
    consumer.abort();

    println!("\n=== Metrics ===");
    println!("Accepted:   {}", metrics.accepted);
    println!("Duplicates: {}", metrics.duplicates);
    println!("Invalid:    {}", metrics.invalid);
    println!("\nReport log written to {}", log_path.display());

    Ok(())
}
