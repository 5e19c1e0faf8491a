//! Concurrent ingestion: exactly one caller wins per identifier per window.

use request_dedup::{Outcome, RequestDedupService};
use std::collections::HashMap;
use std::sync::Arc;

async fn ingest_concurrently(
    service: &Arc<RequestDedupService>,
    ids: Vec<String>,
) -> Vec<(String, Outcome)> {
    let handles: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let service = Arc::clone(service);
            tokio::spawn(async move {
                let outcome = service.ingest(&id, None).await;
                (id, outcome)
            })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    results
}

fn service() -> Arc<RequestDedupService> {
    Arc::new(
        RequestDedupService::builder()
            .with_background_aggregation(false)
            .build()
            .unwrap(),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_two_concurrent_requests_same_identifier() {
    let service = service();

    let results = ingest_concurrently(&service, vec!["42".to_string(), "42".to_string()]).await;
    let mut outcomes: Vec<_> = results.into_iter().map(|(_, o)| o).collect();
    outcomes.sort_by_key(|o| o.as_str());

    assert_eq!(outcomes, vec![Outcome::Accepted, Outcome::Duplicate]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_many_identifiers_many_copies() {
    let service = service();
    let copies = 20;
    let distinct = 50;

    let ids: Vec<String> = (0..copies)
        .flat_map(|_| (0..distinct).map(|id| id.to_string()))
        .collect();
    let results = ingest_concurrently(&service, ids).await;

    let mut accepted: HashMap<String, usize> = HashMap::new();
    for (id, outcome) in &results {
        match outcome {
            Outcome::Accepted => *accepted.entry(id.clone()).or_default() += 1,
            Outcome::Duplicate => {}
            other => panic!("unexpected outcome {} for {}", other, id),
        }
    }

    assert_eq!(accepted.len(), distinct);
    assert!(accepted.values().all(|&n| n == 1));
    assert_eq!(service.run_cycle().await.unwrap().count, distinct);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_ingest_during_cycle() {
    let service = service();

    for id in 0..1_000 {
        service.ingest(&id.to_string(), None).await;
    }

    let writer = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            let mut accepted = 0;
            for id in 1_000..2_000 {
                if service.ingest(&id.to_string(), None).await == Outcome::Accepted {
                    accepted += 1;
                }
            }
            accepted
        })
    };

    let first = service.run_cycle().await.unwrap();
    let accepted_by_writer = writer.await.unwrap();
    let second = service.run_cycle().await.unwrap();

    // Every identifier is counted by exactly one of the two cycles
    assert_eq!(accepted_by_writer, 1_000);
    assert_eq!(first.count + second.count, 2_000);
}
