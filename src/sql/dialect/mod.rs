//! SQL Dialect definitions and formatting rules.
//!
//! This module provides a trait-based abstraction for SQL dialect differences.
//! Each supported engine implements `SqlDialect` to handle its specific syntax:
//!
//! - Identifier quoting: `"` (PostgreSQL/SQLite), `` ` `` (MySQL)
//! - Boolean literals: true/false vs 1/0
//! - String concatenation: `||` vs CONCAT()
//! - Date bucketing: DATE_TRUNC vs DATE_FORMAT vs strftime
//!
//! Date truncation and numeric range binning are the only places a plan
//! is dialect-aware at the *expression* level; both live behind this trait
//! so no caller ever branches on the engine name.

pub mod helpers;
mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MySql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;

use super::token::{Token, TokenStream};

/// Granularity for date bucketing in groupings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateGrain {
    Month,
    Quarter,
    Year,
}

/// SQL dialect trait - defines how SQL constructs are rendered.
///
/// Implementations handle dialect-specific syntax differences.
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier (table, column, alias).
    ///
    /// - PostgreSQL/SQLite: `"identifier"`
    /// - MySQL: `` `identifier` ``
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal.
    ///
    /// All dialects use single quotes with `''` for escaping.
    fn quote_string(&self, s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }

    /// Format a boolean literal.
    ///
    /// - PostgreSQL: `true`/`false`
    /// - MySQL/SQLite: `1`/`0`
    fn format_bool(&self, b: bool) -> &'static str;

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Emit LIMIT/OFFSET or equivalent pagination clause.
    ///
    /// All three supported engines accept `LIMIT n OFFSET m`.
    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        let mut ts = TokenStream::new();

        if let Some(lim) = limit {
            ts.push(Token::Limit)
                .space()
                .push(Token::LitInt(lim as i64));
        }

        if let Some(off) = offset {
            if limit.is_some() {
                ts.space();
            }
            ts.push(Token::Offset)
                .space()
                .push(Token::LitInt(off as i64));
        }

        ts
    }

    // =========================================================================
    // Operators
    // =========================================================================

    /// String concatenation operator.
    ///
    /// MySQL uses `||` as logical OR by default; use CONCAT() there.
    fn concat_operator(&self) -> &'static str {
        "||"
    }

    /// Whether this dialect supports the `||` concat operator.
    fn supports_concat_operator(&self) -> bool {
        true
    }

    // =========================================================================
    // JOIN Syntax
    // =========================================================================

    /// Whether this dialect supports FULL OUTER JOIN.
    fn supports_full_outer_join(&self) -> bool {
        true
    }

    /// Whether this dialect supports RIGHT JOIN.
    ///
    /// SQLite grew RIGHT/FULL joins only in 3.39; deployed bundled builds
    /// are often older.
    fn supports_right_join(&self) -> bool {
        true
    }

    // =========================================================================
    // Bucketing Expressions
    // =========================================================================

    /// Truncate a date/timestamp expression to a grain boundary.
    ///
    /// Same logical bucket across engines, different expression text:
    /// - PostgreSQL: `DATE_TRUNC('month', col)`
    /// - MySQL: `DATE_FORMAT(col, '%Y-%m-01')`
    /// - SQLite: `STRFTIME('%Y-%m-01', col)`
    fn date_bucket(&self, grain: DateGrain, col: &TokenStream) -> TokenStream;

    /// Bin a numeric expression into fixed-width ranges:
    /// `FLOOR(col / size) * size`.
    fn numeric_bucket(&self, col: &TokenStream, size: f64) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::FunctionName("FLOOR".into()))
            .lparen()
            .append(col)
            .space()
            .push(Token::Div)
            .space()
            .push(Token::LitFloat(size));
        ts.rparen()
            .space()
            .push(Token::Mul)
            .space()
            .push(Token::LitFloat(size));
        ts
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Postgres => &Postgres,
            Dialect::MySql => &MySql,
            Dialect::Sqlite => &Sqlite,
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        self.dialect().format_bool(b)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        self.dialect().emit_limit_offset(limit, offset)
    }

    fn concat_operator(&self) -> &'static str {
        self.dialect().concat_operator()
    }

    fn supports_concat_operator(&self) -> bool {
        self.dialect().supports_concat_operator()
    }

    fn supports_full_outer_join(&self) -> bool {
        self.dialect().supports_full_outer_join()
    }

    fn supports_right_join(&self) -> bool {
        self.dialect().supports_right_join()
    }

    fn date_bucket(&self, grain: DateGrain, col: &TokenStream) -> TokenStream {
        self.dialect().date_bucket(grain, col)
    }

    fn numeric_bucket(&self, col: &TokenStream, size: f64) -> TokenStream {
        self.dialect().numeric_bucket(col, size)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            other => Err(format!("unknown dialect: '{}'", other)),
        }
    }
}
