// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Batching Queue Consumer
//!
//! Consumes log records from a queue subscription and persists them to a
//! document store in bounded batches.
//!
//! # Features
//!
//! - **Size-triggered flush** -- a full buffer is written immediately
//! - **Idle termination** -- a quiet period flushes the remainder and ends the run
//! - **Decode isolation** -- malformed payloads are logged and skipped
//! - **Best-effort sink** -- a failed batch is logged and dropped, later batches proceed
//!
//! # Architecture
//!
//! ```text
//! Inbound --> decode() --> BatchAccumulator --> Sink (DocumentSink)
//!                 ^                                  |
//!             IdleTimer                        DocumentStore
//!                                          (SqliteStore / MemoryStore)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use logbatch::{BatchConsumer, ConsumerConfig, DocumentSink, LineSource, SqliteStore};
//!
//! let config = ConsumerConfig::builder().batch_size(10).build()?;
//! let store = SqliteStore::new("logbatch.db", "logs")?;
//! let consumer = BatchConsumer::new(config, LineSource::stdin(), DocumentSink::new(store))?;
//!
//! let report = consumer.run().await;
//! println!("{} batches flushed", report.batches_flushed());
//! ```

pub mod accumulator;
pub mod config;
pub mod consumer;
pub mod inbound;
pub mod record;
pub mod sink;
pub mod sqlite;
pub mod store;
pub mod timer;

pub use accumulator::BatchAccumulator;
pub use config::{ConfigError, ConsumerConfig, IdlePolicy, ServiceConfig};
pub use consumer::{BatchConsumer, ConsumerState, ConsumerStats, RunReport, TerminationReason};
pub use inbound::{Inbound, LineSource};
pub use record::{decode, Batch, DecodeError, Document, RawEnvelope, Record};
pub use sink::{DocumentSink, Sink, SinkError};
pub use sqlite::SqliteStore;
pub use store::{DocumentStore, MemoryStore, StoreError};
pub use timer::IdleTimer;
