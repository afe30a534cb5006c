// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end pipeline tests
//!
//! Drives payloads through `BatchConsumer` into a file-backed SQLite
//! collection and reads the documents back.

use logbatch::{
    BatchConsumer, ConsumerConfig, DocumentSink, DocumentStore, IdlePolicy, LineSource,
    RawEnvelope, SqliteStore, TerminationReason,
};
use std::time::Duration;
use tokio::sync::mpsc;

fn payload(id: u32) -> String {
    format!(
        r#"{{"idMembro":"member-{}","message":"event {}","timestamp":"2025-06-01T12:00:{:02}Z"}}"#,
        id,
        id,
        id % 60
    )
}

fn sqlite_store(dir: &tempfile::TempDir) -> (String, SqliteStore) {
    let path = dir.path().join("logbatch.db");
    let path = path.to_str().unwrap().to_string();
    let store = SqliteStore::new(&path, "logs").unwrap();
    (path, store)
}

#[tokio::test]
async fn test_line_input_is_persisted_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let (path, store) = sqlite_store(&dir);

    let mut input = String::new();
    for id in 0..23 {
        input.push_str(&payload(id));
        input.push('\n');
        if id == 7 {
            input.push_str("{not json}\n");
        }
    }

    let config = ConsumerConfig::builder().batch_size(10).build().unwrap();
    let consumer = BatchConsumer::new(
        config,
        LineSource::new(input.as_bytes()),
        DocumentSink::new(store),
    )
    .unwrap();

    let report = consumer.run().await;

    assert_eq!(report.termination, TerminationReason::SourceClosed);
    assert_eq!(report.stats.records_received, 24);
    assert_eq!(report.records_dropped(), 1);
    assert_eq!(report.batches_flushed(), 3);
    assert_eq!(report.stats.records_persisted, 23);

    let reopened = SqliteStore::new(&path, "logs").unwrap();
    let documents = reopened.load().unwrap();
    assert_eq!(documents.len(), 23);
    for (i, doc) in documents.iter().enumerate() {
        assert_eq!(doc.id, format!("member-{}", i));
        assert_eq!(doc.message, format!("event {}", i));
    }
}

#[tokio::test]
async fn test_invalid_utf8_line_is_dropped_and_input_continues() {
    let dir = tempfile::tempdir().unwrap();
    let (path, store) = sqlite_store(&dir);

    let mut input = Vec::new();
    input.extend_from_slice(payload(0).as_bytes());
    input.extend_from_slice(b"\n\xff\xfe garbage\n");
    for id in 1..3 {
        input.extend_from_slice(payload(id).as_bytes());
        input.extend_from_slice(b"\r\n");
    }

    let config = ConsumerConfig::builder().batch_size(10).build().unwrap();
    let consumer = BatchConsumer::new(
        config,
        LineSource::new(input.as_slice()),
        DocumentSink::new(store),
    )
    .unwrap();

    let report = consumer.run().await;

    assert_eq!(report.termination, TerminationReason::SourceClosed);
    assert_eq!(report.stats.records_received, 4);
    assert_eq!(report.records_dropped(), 1);
    assert_eq!(report.stats.records_persisted, 3);

    let reopened = SqliteStore::new(&path, "logs").unwrap();
    let ids: Vec<_> = reopened.load().unwrap().into_iter().map(|d| d.id).collect();
    assert_eq!(ids, vec!["member-0", "member-1", "member-2"]);
}

#[tokio::test(start_paused = true)]
async fn test_idle_run_persists_partial_batch() {
    let dir = tempfile::tempdir().unwrap();
    let (path, store) = sqlite_store(&dir);

    let (tx, rx) = mpsc::channel(32);
    let config = ConsumerConfig::builder()
        .batch_size(10)
        .idle_timeout(Duration::from_secs(3))
        .build()
        .unwrap();
    let consumer = BatchConsumer::new(config, rx, DocumentSink::new(store)).unwrap();

    for id in 0..12 {
        tx.send(RawEnvelope::new(payload(id), u64::from(id)))
            .await
            .unwrap();
    }

    let report = consumer.run().await;
    drop(tx);

    assert_eq!(report.termination, TerminationReason::IdleTimeout);
    assert_eq!(report.batches_flushed(), 2);
    assert!(report.elapsed >= Duration::from_secs(3));

    let reopened = SqliteStore::new(&path, "logs").unwrap();
    assert_eq!(reopened.count().unwrap(), 12);
}

#[tokio::test(start_paused = true)]
async fn test_keep_running_consumes_across_idle_periods() {
    let dir = tempfile::tempdir().unwrap();
    let (path, store) = sqlite_store(&dir);

    let (tx, rx) = mpsc::channel(32);
    let config = ConsumerConfig::builder()
        .batch_size(100)
        .idle_timeout(Duration::from_secs(1))
        .idle_policy(IdlePolicy::FlushAndContinue)
        .build()
        .unwrap();
    let consumer = BatchConsumer::new(config, rx, DocumentSink::new(store)).unwrap();

    tokio::spawn(async move {
        for burst in 0..3u32 {
            for i in 0..4u32 {
                let id = burst * 4 + i;
                tx.send(RawEnvelope::new(payload(id), u64::from(id)))
                    .await
                    .unwrap();
            }
            tokio::time::sleep(Duration::from_millis(2200)).await;
        }
    });

    let report = consumer.run().await;

    assert_eq!(report.termination, TerminationReason::SourceClosed);
    assert_eq!(report.batches_flushed(), 3);
    assert_eq!(report.stats.records_persisted, 12);

    let reopened = SqliteStore::new(&path, "logs").unwrap();
    assert_eq!(reopened.count().unwrap(), 12);
}
