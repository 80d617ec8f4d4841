//! SQL generation module.
//!
//! This module provides a type-safe SQL builder that generates multi-dialect
//! SELECT statements. It includes:
//!
//! - [`query`] - SELECT query builder (plus the derived COUNT(*) form)
//! - [`expr`] - Expression AST and builder DSL
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations (Postgres, MySQL, SQLite)

pub mod dialect;
pub mod expr;
pub mod query;
pub mod token;

// Re-export commonly used types at the sql module level
pub use dialect::{DateGrain, Dialect, SqlDialect};
pub use expr::{
    avg, col, count, count_star, func, lit_bool, lit_float, lit_int, lit_null, lit_str, max, min,
    star, sum, table_col, BinaryOperator, Expr, ExprExt, Literal, UnaryOperator,
};
pub use query::{
    Join, LimitOffset, OrderByExpr, Query, SelectExpr, SortDir, SqlJoinKind, TableRef,
};
pub use token::{Token, TokenStream};
