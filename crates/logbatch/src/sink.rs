// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Batch sink
//!
//! The consumer hands every flushed [`Batch`] to a [`Sink`] exactly once.
//! [`DocumentSink`] is the standard adapter: it projects records to
//! documents and performs one atomic `insert_many` per batch.

use crate::record::{Batch, Document};
use crate::store::{DocumentStore, StoreError};
use thiserror::Error;

/// Batch persistence errors.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to insert batch of {count} documents into '{collection}': {source}")]
    Insert {
        collection: String,
        count: usize,
        #[source]
        source: StoreError,
    },

    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

/// Abstract batch sink
pub trait Sink: Send {
    /// Persist one batch. Never called with an empty batch.
    fn insert(&mut self, batch: &Batch) -> Result<(), SinkError>;
}

/// Sink adapter over a [`DocumentStore`] collection.
pub struct DocumentSink<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> DocumentSink<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: DocumentStore> Sink for DocumentSink<S> {
    fn insert(&mut self, batch: &Batch) -> Result<(), SinkError> {
        let documents: Vec<Document> = batch.to_documents();

        self.store
            .insert_many(&documents)
            .map_err(|source| SinkError::Insert {
                collection: self.store.collection().to_string(),
                count: documents.len(),
                source,
            })?;

        tracing::debug!(
            "Inserted batch of {} documents into {}",
            documents.len(),
            self.store.collection()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::store::MemoryStore;

    #[test]
    fn test_document_sink_maps_batch_in_order() {
        let store = MemoryStore::new("logs").unwrap();
        let mut sink = DocumentSink::new(store.clone());

        let batch = Batch::from_records(vec![
            Record::new("1", "alpha", "t1"),
            Record::new("2", "beta", "t2"),
        ])
        .unwrap();

        sink.insert(&batch).unwrap();

        let batches = store.batches().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0][0].id, "1");
        assert_eq!(batches[0][0].message, "alpha");
        assert_eq!(batches[0][1].id, "2");
        assert_eq!(batches[0][1].timestamp, "t2");
    }

    #[test]
    fn test_document_sink_error_names_collection() {
        struct BrokenStore;

        impl DocumentStore for BrokenStore {
            fn insert_many(&self, _documents: &[Document]) -> Result<(), StoreError> {
                Err(StoreError::Poisoned)
            }
            fn count(&self) -> Result<usize, StoreError> {
                Ok(0)
            }
            fn load(&self) -> Result<Vec<Document>, StoreError> {
                Ok(Vec::new())
            }
            fn collection(&self) -> &str {
                "logs"
            }
        }

        let mut sink = DocumentSink::new(BrokenStore);
        let batch = Batch::from_records(vec![Record::new("1", "m", "t")]).unwrap();

        match sink.insert(&batch) {
            Err(SinkError::Insert {
                collection, count, ..
            }) => {
                assert_eq!(collection, "logs");
                assert_eq!(count, 1);
            }
            other => panic!("expected Insert error, got: {:?}", other),
        }
    }
}
