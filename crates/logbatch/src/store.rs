// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Document store abstraction
//!
//! Defines the trait for storage backends and an in-memory implementation.
//!
//! # Implementations
//!
//! - `SqliteStore` -- file-backed, one table per collection
//! - [`MemoryStore`] -- in-process, for tests and dry runs

use crate::record::Document;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Invalid collection name: {0:?}")]
    InvalidCollection(String),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Document store trait
///
/// Backend-agnostic interface over a single collection.
pub trait DocumentStore: Send {
    /// Insert a set of documents atomically.
    ///
    /// Either every document is stored, in order, or none is.
    fn insert_many(&self, documents: &[Document]) -> Result<(), StoreError>;

    /// Number of documents in the collection
    fn count(&self) -> Result<usize, StoreError>;

    /// Load every document in insertion order
    fn load(&self) -> Result<Vec<Document>, StoreError>;

    /// Collection name
    fn collection(&self) -> &str;
}

impl<S: DocumentStore + ?Sized> DocumentStore for Box<S> {
    fn insert_many(&self, documents: &[Document]) -> Result<(), StoreError> {
        (**self).insert_many(documents)
    }

    fn count(&self) -> Result<usize, StoreError> {
        (**self).count()
    }

    fn load(&self) -> Result<Vec<Document>, StoreError> {
        (**self).load()
    }

    fn collection(&self) -> &str {
        (**self).collection()
    }
}

/// Check that a collection name is usable as a storage identifier.
///
/// Accepts ASCII letters, digits and underscores, not starting with a digit.
pub fn validate_collection_name(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidCollection(name.to_string()))
    }
}

/// In-memory document store
///
/// Clones share the same collection, so a caller can keep a handle to
/// inspect what a consumer wrote.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    collection: String,
    batches: Arc<Mutex<Vec<Vec<Document>>>>,
}

impl MemoryStore {
    pub fn new(collection: &str) -> Result<Self, StoreError> {
        validate_collection_name(collection)?;
        Ok(Self {
            collection: collection.to_string(),
            batches: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Documents grouped by the `insert_many` call that stored them
    pub fn batches(&self) -> Result<Vec<Vec<Document>>, StoreError> {
        let batches = self.batches.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(batches.clone())
    }
}

impl DocumentStore for MemoryStore {
    fn insert_many(&self, documents: &[Document]) -> Result<(), StoreError> {
        if documents.is_empty() {
            return Ok(());
        }
        let mut batches = self.batches.lock().map_err(|_| StoreError::Poisoned)?;
        batches.push(documents.to_vec());
        Ok(())
    }

    fn count(&self) -> Result<usize, StoreError> {
        let batches = self.batches.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(batches.iter().map(Vec::len).sum())
    }

    fn load(&self) -> Result<Vec<Document>, StoreError> {
        let batches = self.batches.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(batches.iter().flatten().cloned().collect())
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}
