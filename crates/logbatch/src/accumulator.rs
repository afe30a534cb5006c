// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Batching buffer for decoded records.
//!
//! Owned by a single consumer loop; there is no internal locking.

use crate::record::{Batch, Record};

/// Ordered, bounded buffer of records.
///
/// The buffer holds fewer than `batch_size` records, except right after the
/// append that reaches the threshold. The owner is expected to [`drain`]
/// at that point, before appending again.
///
/// [`drain`]: BatchAccumulator::drain
#[derive(Debug)]
pub struct BatchAccumulator {
    records: Vec<Record>,
    batch_size: usize,
}

impl BatchAccumulator {
    /// Create an empty accumulator with the given flush threshold.
    pub fn new(batch_size: usize) -> Self {
        Self {
            records: Vec::with_capacity(batch_size),
            batch_size,
        }
    }

    /// Append a record at the tail.
    pub fn append(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Number of buffered records.
    pub fn size(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True once the flush threshold has been reached.
    pub fn is_full(&self) -> bool {
        self.records.len() >= self.batch_size
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Take every buffered record, in arrival order, and reset to empty.
    ///
    /// Returns `None` when nothing is buffered.
    pub fn drain(&mut self) -> Option<Batch> {
        let records = std::mem::replace(&mut self.records, Vec::with_capacity(self.batch_size));
        Batch::from_records(records)
    }
}
