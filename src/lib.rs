//! # Adhoq
//!
//! Ad-hoc cross-table report query engine: join discovery, path
//! resolution, and multi-dialect SQL generation for reports built by
//! people who do not write SQL.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │            ReportConfig (declarative JSON)               │
//! │   (columns, groups, filters, sorts, calculated fields)   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [report: validation + table extraction]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Join Graph (stored + FK + heuristic edges)        │
//! │              [suggest + graph::store]                    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [graph::resolver - BFS / greedy Steiner]
//! ┌─────────────────────────────────────────────────────────┐
//! │                      JoinPath                            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [planner - dialect-aware compilation]
//! ┌─────────────────────────────────────────────────────────┐
//! │           QueryPlan (data + count statements)            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [exec - count + page, typed rows]
//! ┌─────────────────────────────────────────────────────────┐
//! │        ReportResult { rows, columns, total_rows }        │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod engine;
pub mod error;
pub mod exec;
pub mod graph;
pub mod planner;
pub mod report;
pub mod sql;
pub mod suggest;

// Re-export SQL submodules at crate level for ergonomic paths
pub use sql::dialect;
pub use sql::expr;
pub use sql::query;
pub use sql::token;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::catalog::{ColumnInfo, ColumnType, SchemaCatalog, TableMetadata};
    pub use crate::engine::{AccessPolicy, AllowAll, ReportEngine, TableAccess};
    pub use crate::error::{ConfigError, ExecutionError, PathError, ReportError};
    pub use crate::exec::pool::{BackendFactory, ConnectionPool};
    pub use crate::exec::{CellValue, QueryRows, ReportResponse, ReportResult, SqlBackend};
    pub use crate::graph::store::{JoinStore, StoredJoin};
    pub use crate::graph::{
        resolver, Cardinality, EdgeSource, JoinEdge, JoinPath, JoinType, Resolution,
    };
    pub use crate::planner::{ColumnTypes, PlanBuilder, QueryPlan};
    pub use crate::report::{FieldRef, ReportConfig};
    pub use crate::sql::{Dialect, SqlDialect};
    pub use crate::suggest::SuggestionEngine;
}

// Also export at crate root for convenience
pub use dialect::Dialect;
pub use error::ReportError;
pub use graph::{JoinEdge, JoinPath, Resolution};
pub use planner::{PlanBuilder, QueryPlan};
pub use report::ReportConfig;
