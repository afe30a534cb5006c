// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SQLite document store
//!
//! Each collection is a table; each document is kept as its JSON body so the
//! stored shape is exactly what the sink produced.

use crate::record::Document;
use crate::store::{validate_collection_name, DocumentStore, StoreError};
use rusqlite::{params, Connection};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

/// SQLite-backed document collection
///
/// Thread-safe via internal Mutex (SQLite Connection is not Sync).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE <collection> (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     member_id TEXT NOT NULL,
///     body TEXT NOT NULL,
///     inserted_at_ns INTEGER NOT NULL
/// );
/// CREATE INDEX idx_<collection>_member ON <collection>(member_id);
/// ```
pub struct SqliteStore {
    conn: Mutex<Connection>,
    collection: String,
}

impl SqliteStore {
    /// Open (or create) a file-based database and its collection table
    pub fn new(path: &str, collection: &str) -> Result<Self, StoreError> {
        validate_collection_name(collection)?;
        let conn = Connection::open(path)?;
        Self::with_connection(conn, collection)
    }

    /// Create an in-memory database (for testing)
    pub fn new_in_memory(collection: &str) -> Result<Self, StoreError> {
        validate_collection_name(collection)?;
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, collection)
    }

    fn with_connection(conn: Connection, collection: &str) -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(conn),
            collection: collection.to_string(),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;

        // Collection names are validated identifiers, safe to interpolate.
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    member_id TEXT NOT NULL,
                    body TEXT NOT NULL,
                    inserted_at_ns INTEGER NOT NULL
                )",
                self.collection
            ),
            [],
        )?;

        conn.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS idx_{0}_member ON {0}(member_id)",
                self.collection
            ),
            [],
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl DocumentStore for SqliteStore {
    fn insert_many(&self, documents: &[Document]) -> Result<(), StoreError> {
        if documents.is_empty() {
            return Ok(());
        }

        let now_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
            .min(i64::MAX as u128) as i64;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} (member_id, body, inserted_at_ns) VALUES (?1, ?2, ?3)",
                self.collection
            ))?;
            for doc in documents {
                let body = serde_json::to_string(doc)?;
                stmt.execute(params![doc.id, body, now_ns])?;
            }
        }
        tx.commit()?;

        Ok(())
    }

    fn count(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.collection),
            [],
            |row| row.get(0),
        )?;

        Ok(count.max(0) as usize)
    }

    fn load(&self) -> Result<Vec<Document>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT body FROM {} ORDER BY id ASC",
            self.collection
        ))?;

        let bodies = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(StoreError::from))
            .collect()
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}
