//! SchemaCatalog trait definition.
//!
//! The SchemaCatalog trait abstracts over different ways of fetching
//! metadata from an external database: a live driver, a worker process,
//! or a static snapshot. The core never introspects directly; it only
//! consumes this interface.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use super::types::{ColumnInfo, ForeignKeyInfo, TableMetadata};

/// Errors from schema introspection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    #[error("unknown table '{0}'")]
    UnknownTable(String),

    #[error("introspection failed for '{table}': {message}")]
    Introspection { table: String, message: String },
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Trait for fetching metadata from one external connection.
///
/// All methods are async because the primary implementations cross an I/O
/// boundary. Single-table failures should be reported per call; callers
/// decide whether to degrade gracefully (skip the table) or abort.
#[async_trait]
pub trait SchemaCatalog: Send + Sync {
    /// List all table names visible on this connection.
    async fn list_tables(&self) -> CatalogResult<Vec<String>>;

    /// List the columns of a table.
    async fn list_columns(&self, table: &str) -> CatalogResult<Vec<ColumnInfo>>;

    /// The primary key column names of a table (empty if none).
    async fn primary_key(&self, table: &str) -> CatalogResult<Vec<String>>;

    /// The foreign key constraints of a table.
    async fn foreign_keys(&self, table: &str) -> CatalogResult<Vec<ForeignKeyInfo>>;

    /// Complete metadata for a table.
    ///
    /// Default implementation composes the three single-aspect calls.
    async fn table_metadata(&self, table: &str) -> CatalogResult<TableMetadata> {
        let columns = self.list_columns(table).await?;
        let primary_key = self.primary_key(table).await?;
        let foreign_keys = self.foreign_keys(table).await?;
        Ok(TableMetadata {
            name: table.to_string(),
            columns,
            primary_key,
            foreign_keys,
        })
    }

    /// Batch fetch metadata for multiple tables.
    ///
    /// Default implementation fetches in parallel using `join_all`. Each
    /// table's result is returned individually so one failing table does
    /// not poison the batch.
    async fn tables_batch(
        &self,
        tables: &[String],
    ) -> Vec<(String, CatalogResult<TableMetadata>)> {
        let futures: Vec<_> = tables
            .iter()
            .map(|t| async move { (t.clone(), self.table_metadata(t).await) })
            .collect();

        futures::future::join_all(futures).await
    }
}

/// An in-memory catalog backed by a fixed set of table definitions.
///
/// Primary use is tests and demos, but it also serves deployments that
/// introspect once up front and hand the core a snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    tables: HashMap<String, TableMetadata>,
    /// Insertion order, so list_tables is deterministic.
    order: Vec<String>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table definition. Replaces any previous table of the same name.
    pub fn with_table(mut self, meta: TableMetadata) -> Self {
        let key = meta.name.to_lowercase();
        if !self.tables.contains_key(&key) {
            self.order.push(meta.name.clone());
        }
        self.tables.insert(key, meta);
        self
    }

    fn get(&self, table: &str) -> CatalogResult<&TableMetadata> {
        self.tables
            .get(&table.to_lowercase())
            .ok_or_else(|| CatalogError::UnknownTable(table.to_string()))
    }
}

#[async_trait]
impl SchemaCatalog for StaticCatalog {
    async fn list_tables(&self) -> CatalogResult<Vec<String>> {
        Ok(self.order.clone())
    }

    async fn list_columns(&self, table: &str) -> CatalogResult<Vec<ColumnInfo>> {
        Ok(self.get(table)?.columns.clone())
    }

    async fn primary_key(&self, table: &str) -> CatalogResult<Vec<String>> {
        Ok(self.get(table)?.primary_key.clone())
    }

    async fn foreign_keys(&self, table: &str) -> CatalogResult<Vec<ForeignKeyInfo>> {
        Ok(self.get(table)?.foreign_keys.clone())
    }
}
