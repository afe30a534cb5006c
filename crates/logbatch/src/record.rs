// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record model and payload decoding
//!
//! ```text
//! RawEnvelope --decode()--> Record --(flush)--> Batch --to_documents()--> Vec<Document>
//! ```
//!
//! Wire payloads are JSON objects with three string fields:
//!
//! ```json
//! { "idMembro": "42", "message": "user logged in", "timestamp": "2025-06-01T12:00:00Z" }
//! ```
//!
//! `identifier` is accepted in place of `idMembro`. The timestamp is carried
//! as an opaque string and never parsed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw delivery handed over by an inbound source.
///
/// Dropped as soon as it has been decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEnvelope {
    /// Undecoded payload bytes
    pub payload: Vec<u8>,
    /// Source-assigned delivery number (monotonic per source)
    pub delivery_tag: u64,
}

impl RawEnvelope {
    /// Create an envelope from payload bytes and a delivery tag
    pub fn new(payload: impl Into<Vec<u8>>, delivery_tag: u64) -> Self {
        Self {
            payload: payload.into(),
            delivery_tag,
        }
    }
}

/// Payload decoding errors.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("empty payload")]
    Empty,

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decoded log record.
///
/// Fields are private so a record cannot change after decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "idMembro", alias = "identifier")]
    identifier: String,
    message: String,
    timestamp: String,
}

impl Record {
    /// Build a record from its three fields
    pub fn new(
        identifier: impl Into<String>,
        message: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            message: message.into(),
            timestamp: timestamp.into(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

/// Decode one payload into a [`Record`].
///
/// All-or-nothing: a payload missing any field, carrying a non-string value,
/// or not being a JSON object is rejected as a whole. Unknown fields are
/// ignored.
pub fn decode(payload: &[u8]) -> Result<Record, DecodeError> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::Empty);
    }

    // Derived struct deserializers also accept arrays; only objects are valid.
    let value: serde_json::Value = serde_json::from_slice(payload)?;
    if !value.is_object() {
        return Err(DecodeError::NotAnObject);
    }
    Ok(serde_json::from_value(value)?)
}

/// Storage-facing projection of a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "idMembro")]
    pub id: String,
    pub message: String,
    pub timestamp: String,
}

impl From<&Record> for Document {
    fn from(record: &Record) -> Self {
        Self {
            id: record.identifier.clone(),
            message: record.message.clone(),
            timestamp: record.timestamp.clone(),
        }
    }
}

/// Ordered, non-empty group of records collected between two flush points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    records: Vec<Record>,
}

impl Batch {
    /// Wrap records into a batch. Returns `None` for an empty vector.
    pub fn from_records(records: Vec<Record>) -> Option<Self> {
        if records.is_empty() {
            None
        } else {
            Some(Self { records })
        }
    }

    /// Number of records (always >= 1)
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false; present for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Map every record to its document, preserving order.
    pub fn to_documents(&self) -> Vec<Document> {
        self.records.iter().map(Document::from).collect()
    }
}
