//! Error taxonomy for the report query core.
//!
//! Three families, matching how callers are expected to react:
//!
//! - [`ConfigError`] - the report definition itself is wrong. User-fixable,
//!   surfaced verbatim, never retryable.
//! - [`PathError`] - the referenced tables cannot be (fully) connected by any
//!   known join edge. Never retryable; `ManualJoinNeeded` is a prompt to
//!   configure a stored join, not a system fault.
//! - [`ExecutionError`] - the backend failed. Logged as a system fault;
//!   callers may retry.
//!
//! Every component returns a typed `Result` across its boundary. Only the
//! executor converts backend driver errors; nothing in this crate retries.

use thiserror::Error;

/// Result alias for configuration validation and plan building.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A defect in the report definition. Surfaced to the user as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("report has no connection id")]
    MissingConnection,

    #[error("connection '{0}' is not registered")]
    UnknownConnection(String),

    #[error("report selects no columns and no groupings")]
    EmptySelection,

    #[error("malformed report config: {0}")]
    Malformed(String),

    #[error("invalid field reference '{0}': expected table.column")]
    InvalidFieldRef(String),

    /// A field names a table outside the resolved join scope.
    #[error("unknown table '{table}' referenced by '{field}'")]
    UnknownTable { table: String, field: String },

    /// A `[...]` group in a formula that is not a `[table.column]` token.
    #[error("calculated field '{name}' has a malformed reference {token}")]
    MalformedFormulaToken { name: String, token: String },
}

/// Join path resolution failure. Always names the tables left behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    /// No edge chain connects the required tables at all.
    #[error("no join path connects tables: {}", unreachable.join(", "))]
    NoPath { unreachable: Vec<String> },

    /// A partial connection was found; the rest needs a stored join.
    #[error("tables need a manual join definition: {}", unreachable.join(", "))]
    ManualJoinNeeded { unreachable: Vec<String> },
}

/// Coarse category of a backend failure, for operators and retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Connection,
    Sql,
    Timeout,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Connection => write!(f, "connection"),
            FailureKind::Sql => write!(f, "sql"),
            FailureKind::Timeout => write!(f, "timeout"),
        }
    }
}

/// A backend failure, sanitized for display but categorized for logs.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} failure: {message}")]
pub struct ExecutionError {
    pub kind: FailureKind,
    pub message: String,
}

impl ExecutionError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Unified error for a full report evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReportError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// Schema introspection failed outright (not a single-table degradation).
    #[error("catalog error: {0}")]
    Catalog(String),

    /// The caller is not allowed to read one of the referenced tables.
    #[error("access to table '{table}' denied")]
    Forbidden { table: String },
}

impl ReportError {
    /// Whether a caller retry could plausibly change the outcome.
    ///
    /// Config and path errors are deterministic; retrying them is waste.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReportError::Execution(_) | ReportError::Catalog(_))
    }
}
