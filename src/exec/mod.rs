//! Query execution.
//!
//! Runs a compiled [`QueryPlan`] against a [`SqlBackend`]: first the
//! unlimited `COUNT(*)` form for the pagination total, then the
//! paginated data form. Cell values come back typed and are converted
//! to a small fixed set of JSON-safe scalars (null, number, string,
//! boolean, ISO-8601 strings for temporal values).
//!
//! Nothing here throws past the boundary: backend failures are mapped to
//! [`ExecutionError`] with a coarse category and logged as system faults.
//! No transaction spans the count+data pair; the count may drift between
//! the two statements (accepted consistency gap). Nothing is retried.

pub mod pool;

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::error::{ExecutionError, FailureKind, ReportError};
use crate::planner::QueryPlan;

/// A typed scalar cell as produced by a backend driver.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Decimal(Decimal),
    Date(time::Date),
    Timestamp(time::OffsetDateTime),
}

impl CellValue {
    /// Convert to a JSON-safe scalar.
    ///
    /// Temporal values become ISO-8601 strings. Decimals become numbers
    /// when exactly representable as f64, otherwise strings (preserving
    /// precision beats type purity for money columns).
    pub fn into_json(self) -> Value {
        match self {
            CellValue::Null => Value::Null,
            CellValue::Bool(b) => Value::Bool(b),
            CellValue::Int(i) => Value::Number(i.into()),
            CellValue::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
            CellValue::Text(s) => Value::String(s),
            CellValue::Decimal(d) => d
                .to_f64()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(d.to_string())),
            CellValue::Date(d) => Value::String(format!(
                "{:04}-{:02}-{:02}",
                d.year(),
                u8::from(d.month()),
                d.day()
            )),
            CellValue::Timestamp(ts) => {
                let iso = ts
                    .format(&time::format_description::well_known::Rfc3339)
                    .unwrap_or_else(|_| ts.to_string());
                Value::String(iso)
            }
        }
    }

    fn as_u64(&self) -> u64 {
        match self {
            CellValue::Int(i) => (*i).max(0) as u64,
            CellValue::Float(f) if *f >= 0.0 => *f as u64,
            CellValue::Decimal(d) => d.to_u64().unwrap_or(0),
            CellValue::Text(s) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }
}

/// Result set from one statement execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

/// A backend driver failure, categorized at the driver boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error("connection failure: {0}")]
    Connection(String),

    #[error("sql failure: {0}")]
    Sql(String),

    #[error("query timed out: {0}")]
    Timeout(String),
}

impl From<BackendError> for ExecutionError {
    fn from(err: BackendError) -> Self {
        let kind = match &err {
            BackendError::Connection(_) => FailureKind::Connection,
            BackendError::Sql(_) => FailureKind::Sql,
            BackendError::Timeout(_) => FailureKind::Timeout,
        };
        ExecutionError::new(
            kind,
            match err {
                BackendError::Connection(m)
                | BackendError::Sql(m)
                | BackendError::Timeout(m) => m,
            },
        )
    }
}

/// A live handle to one external database.
///
/// Implementations wrap a driver for the connection's engine. A handle
/// is shared across requests via the [`pool::ConnectionPool`], so it must
/// be cheap to call concurrently.
#[async_trait]
pub trait SqlBackend: Send + Sync {
    /// Execute a statement and return typed rows.
    async fn execute(&self, sql: &str) -> Result<QueryRows, BackendError>;

    /// Trivial liveness probe, used before a pooled handle is reused.
    async fn ping(&self) -> Result<(), BackendError>;
}

/// The result contract returned to dashboard widgets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportResult {
    pub rows: Vec<Map<String, Value>>,
    pub columns: Vec<String>,
    pub total_rows: u64,
}

/// Errors-as-data form of a report evaluation.
///
/// Failures serialize as `{"error": "..."}` so a dashboard can render an
/// inline message instead of crashing the widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportResponse {
    Success(ReportResult),
    Failure { error: String },
}

impl From<Result<ReportResult, ReportError>> for ReportResponse {
    fn from(result: Result<ReportResult, ReportError>) -> Self {
        match result {
            Ok(r) => ReportResponse::Success(r),
            Err(e) => ReportResponse::Failure {
                error: e.to_string(),
            },
        }
    }
}

/// Run the count query and the paginated data query for one plan.
pub async fn execute_plan(
    backend: &dyn SqlBackend,
    plan: &QueryPlan,
) -> Result<ReportResult, ExecutionError> {
    let count_sql = plan.count_sql();
    tracing::debug!(sql = %count_sql, "executing count query");
    let counted = backend.execute(&count_sql).await.map_err(|e| {
        let err = ExecutionError::from(e);
        tracing::error!(kind = %err.kind, message = %err.message, "count query failed");
        err
    })?;

    let total_rows = counted
        .rows
        .first()
        .and_then(|row| row.first())
        .map(CellValue::as_u64)
        .unwrap_or(0);

    let data_sql = plan.sql();
    tracing::debug!(sql = %data_sql, "executing data query");
    let data = backend.execute(&data_sql).await.map_err(|e| {
        let err = ExecutionError::from(e);
        tracing::error!(kind = %err.kind, message = %err.message, "data query failed");
        err
    })?;

    // Plan aliases are authoritative when they line up with the result
    // arity; otherwise trust whatever the driver reported.
    let columns = if plan.columns.len() == data.columns.len() || data.columns.is_empty() {
        plan.columns.clone()
    } else {
        data.columns.clone()
    };

    let rows = data
        .rows
        .into_iter()
        .map(|row| {
            columns
                .iter()
                .cloned()
                .zip(row.into_iter().map(CellValue::into_json))
                .collect::<Map<String, Value>>()
        })
        .collect();

    Ok(ReportResult {
        rows,
        columns,
        total_rows,
    })
}
