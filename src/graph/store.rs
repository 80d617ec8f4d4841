//! SQLite-backed join graph store.
//!
//! Persists user-defined join edges per connection. Edge identity is
//! `(connection, left_table, left_column, right_table, right_column)`
//! with all names normalized on write, so re-saving the same
//! relationship updates it in place.
//!
//! The handle is mutex-guarded so a store instance can be shared across
//! request tasks; writes are rare (UI actions) and reads are a single
//! indexed scan per report.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection};

use super::{normalize_table, Cardinality, EdgeSource, JoinEdge, JoinType};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("join store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A persisted join definition.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredJoin {
    pub connection_id: String,
    pub left_table: String,
    pub left_column: String,
    pub right_table: String,
    pub right_column: String,
    pub join_type: JoinType,
    pub cardinality: Cardinality,
}

impl StoredJoin {
    /// View this row as a resolver edge: source=stored, confidence 1.0.
    pub fn to_edge(&self) -> JoinEdge {
        JoinEdge {
            left_table: self.left_table.clone(),
            left_column: self.left_column.clone(),
            right_table: self.right_table.clone(),
            right_column: self.right_column.clone(),
            join_type: self.join_type,
            cardinality: self.cardinality,
            source: EdgeSource::Stored,
            confidence: 1.0,
        }
    }
}

/// SQLite-backed store of join definitions.
pub struct JoinStore {
    conn: Mutex<Connection>,
}

impl JoinStore {
    /// Open or create the store database at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init()?;
        Ok(store)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init()?;
        Ok(store)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn init(&self) -> StoreResult<()> {
        self.lock()?.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS join_edges (
                connection_id TEXT NOT NULL,
                left_table    TEXT NOT NULL,
                left_column   TEXT NOT NULL,
                right_table   TEXT NOT NULL,
                right_column  TEXT NOT NULL,
                join_type     TEXT NOT NULL DEFAULT 'INNER',
                cardinality   TEXT NOT NULL DEFAULT 'unknown',
                PRIMARY KEY (
                    connection_id,
                    left_table, left_column,
                    right_table, right_column
                )
            );
            ",
        )?;
        Ok(())
    }

    /// Insert or update a join definition. Names are normalized on write.
    /// Rejects self-joins (both sides the same table).
    pub fn upsert(&self, join: &StoredJoin) -> StoreResult<()> {
        let left_table = normalize_table(&join.left_table);
        let right_table = normalize_table(&join.right_table);
        if left_table == right_table {
            // Same-table rows cannot form a graph edge; refuse quietly
            // rather than poisoning later traversals.
            tracing::warn!(
                table = %left_table,
                "ignoring self-referencing join definition"
            );
            return Ok(());
        }

        self.lock()?.execute(
            "INSERT OR REPLACE INTO join_edges
             (connection_id, left_table, left_column, right_table, right_column, join_type, cardinality)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                join.connection_id,
                left_table,
                join.left_column.trim().to_lowercase(),
                right_table,
                join.right_column.trim().to_lowercase(),
                join.join_type.as_str(),
                join.cardinality.as_str(),
            ],
        )?;
        Ok(())
    }

    /// Delete a join definition. Returns whether a row was removed.
    pub fn remove(
        &self,
        connection_id: &str,
        left_table: &str,
        left_column: &str,
        right_table: &str,
        right_column: &str,
    ) -> StoreResult<bool> {
        let n = self.lock()?.execute(
            "DELETE FROM join_edges
             WHERE connection_id = ?1
               AND left_table = ?2 AND left_column = ?3
               AND right_table = ?4 AND right_column = ?5",
            params![
                connection_id,
                normalize_table(left_table),
                left_column.trim().to_lowercase(),
                normalize_table(right_table),
                right_column.trim().to_lowercase(),
            ],
        )?;
        Ok(n > 0)
    }

    /// All join definitions for a connection, in stable key order.
    pub fn list(&self, connection_id: &str) -> StoreResult<Vec<StoredJoin>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT left_table, left_column, right_table, right_column, join_type, cardinality
             FROM join_edges
             WHERE connection_id = ?1
             ORDER BY left_table, left_column, right_table, right_column",
        )?;

        let rows = stmt.query_map(params![connection_id], |row| {
            Ok(StoredJoin {
                connection_id: connection_id.to_string(),
                left_table: row.get(0)?,
                left_column: row.get(1)?,
                right_table: row.get(2)?,
                right_column: row.get(3)?,
                join_type: JoinType::parse_lossy(&row.get::<_, String>(4)?),
                cardinality: Cardinality::parse_lossy(&row.get::<_, String>(5)?),
            })
        })?;

        let mut joins = vec![];
        for row in rows {
            joins.push(row?);
        }
        Ok(joins)
    }

    /// All stored edges for a connection, as resolver edges.
    pub fn edges_for(&self, connection_id: &str) -> StoreResult<Vec<JoinEdge>> {
        Ok(self
            .list(connection_id)?
            .iter()
            .map(StoredJoin::to_edge)
            .collect())
    }
}
