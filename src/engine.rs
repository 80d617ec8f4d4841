//! Request-scoped report evaluation.
//!
//! Wires the pieces together in the order a widget request flows:
//!
//! ```text
//! ReportConfig -> referenced tables -> access check
//!              -> edge discovery (stored + FK + heuristic, plus ad-hoc)
//!              -> path resolution
//!              -> plan building
//!              -> count + data execution
//! ```
//!
//! The whole sequence is synchronous in shape; the only suspension points
//! are catalog introspection and the two statement executions. A caller-
//! supplied deadline should wrap [`ReportEngine::run_report`]; the engine
//! itself adds no timeouts and never retries.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use crate::catalog::SchemaCatalog;
use crate::error::{ConfigError, ExecutionError, ReportError};
use crate::exec::pool::ConnectionPool;
use crate::exec::{execute_plan, ReportResponse, ReportResult};
use crate::graph::store::JoinStore;
use crate::graph::{normalize_table, resolver};
use crate::planner::{ColumnTypes, PlanBuilder};
use crate::report::ReportConfig;
use crate::sql::Dialect;
use crate::suggest::SuggestionEngine;

/// The set of tables a user may read on one connection.
#[derive(Debug, Clone, PartialEq)]
pub enum TableAccess {
    All,
    Only(BTreeSet<String>),
}

/// Permission capability, consumed from the embedding application.
pub trait AccessPolicy: Send + Sync {
    fn can_access_table(&self, user: &str, connection_id: &str, table: &str) -> bool;

    fn accessible_tables(&self, user: &str, connection_id: &str) -> TableAccess;
}

/// Policy that grants everything; the default for single-tenant embeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn can_access_table(&self, _user: &str, _connection_id: &str, _table: &str) -> bool {
        true
    }

    fn accessible_tables(&self, _user: &str, _connection_id: &str) -> TableAccess {
        TableAccess::All
    }
}

/// Evaluates report configs end to end.
pub struct ReportEngine {
    catalog: Arc<dyn SchemaCatalog>,
    store: Arc<JoinStore>,
    pool: Arc<ConnectionPool>,
    policy: Arc<dyn AccessPolicy>,
    /// Dialect per registered connection id.
    dialects: Mutex<HashMap<String, Dialect>>,
}

impl ReportEngine {
    pub fn new(
        catalog: Arc<dyn SchemaCatalog>,
        store: Arc<JoinStore>,
        pool: Arc<ConnectionPool>,
        policy: Arc<dyn AccessPolicy>,
    ) -> Self {
        Self {
            catalog,
            store,
            pool,
            policy,
            dialects: Mutex::new(HashMap::new()),
        }
    }

    /// Register (or update) the dialect of a connection.
    pub fn register_connection(&self, connection_id: &str, dialect: Dialect) {
        self.dialects
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(connection_id.to_string(), dialect);
    }

    fn dialect_for(&self, connection_id: &str) -> Result<Dialect, ConfigError> {
        self.dialects
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(connection_id)
            .copied()
            .ok_or_else(|| ConfigError::UnknownConnection(connection_id.to_string()))
    }

    /// Evaluate a report and return typed rows plus the total count.
    pub async fn run_report(
        &self,
        user: &str,
        config: &ReportConfig,
    ) -> Result<ReportResult, ReportError> {
        config.validate()?;
        let dialect = self.dialect_for(&config.connection_id)?;
        let required = config.referenced_tables()?;

        for table in &required {
            if !self
                .policy
                .can_access_table(user, &config.connection_id, table)
            {
                return Err(ReportError::Forbidden {
                    table: table.clone(),
                });
            }
        }

        // Candidate pool for discovery: every table the user may read.
        // Steiner pass-through tables come from here, so the pool is
        // deliberately wider than the required set.
        let candidates = self.candidate_tables(user, &config.connection_id).await?;

        let suggester = SuggestionEngine::new(&self.store, self.catalog.as_ref());
        let mut edges = config.adhoc_edges();
        edges.extend(
            suggester
                .discover_edges(&config.connection_id, &candidates)
                .await,
        );

        let path = resolver::resolve(&required, &edges).into_result()?;

        // Column types for everything in scope, for aggregation defaults
        // and bucket type checks.
        let mut scope: BTreeSet<String> = path.tables();
        scope.extend(required.iter().cloned());
        let scope: Vec<String> = scope.into_iter().collect();

        let mut metas = vec![];
        for (table, result) in self.catalog.tables_batch(&scope).await {
            match result {
                Ok(meta) => metas.push(meta),
                Err(err) => {
                    tracing::warn!(%table, error = %err, "missing metadata, aggregation defaults degrade to COUNT");
                }
            }
        }
        let types = ColumnTypes::from_metadata(&metas);

        let plan = PlanBuilder::new(dialect).build(config, &path, &types)?;

        let backend = self
            .pool
            .get(&config.connection_id)
            .await
            .map_err(ExecutionError::from)?;

        Ok(execute_plan(backend.as_ref(), &plan).await?)
    }

    /// Evaluate a report with errors-as-data semantics for widgets.
    pub async fn run_report_response(&self, user: &str, config: &ReportConfig) -> ReportResponse {
        self.run_report(user, config).await.into()
    }

    async fn candidate_tables(
        &self,
        user: &str,
        connection_id: &str,
    ) -> Result<Vec<String>, ReportError> {
        let tables = match self.policy.accessible_tables(user, connection_id) {
            TableAccess::All => self
                .catalog
                .list_tables()
                .await
                .map_err(|e| ReportError::Catalog(e.to_string()))?,
            TableAccess::Only(set) => set.into_iter().collect(),
        };

        let cand: BTreeSet<String> = tables.iter().map(|t| normalize_table(t)).collect();
        Ok(cand.into_iter().collect())
    }
}
