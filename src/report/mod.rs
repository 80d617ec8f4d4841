//! Report configuration model.
//!
//! The declarative input consumed from dashboard/report storage: columns
//! (with optional aggregation), groupings (with optional bucketing),
//! filters, sorts, calculated fields, ad-hoc joins, pagination, and the
//! target connection.
//!
//! Everything is validated at this boundary; by the time a config reaches
//! the resolver or planner it is structurally sound. The one deliberately
//! forgiving surface is pagination: bad `page`/`page_size` values coerce
//! to defaults instead of failing, because a widget with a mangled page
//! number should still render.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ConfigError, ConfigResult};
use crate::graph::{normalize_table, EdgeSource, JoinEdge, JoinType};

/// Default page when the input is absent or unusable.
pub const DEFAULT_PAGE: u64 = 1;
/// Default page size when the input is absent or unusable.
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Matches one well-formed `[table.column]` formula token.
static FORMULA_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([A-Za-z0-9_]+)\.([A-Za-z0-9_]+)\]").expect("valid regex"));

/// Matches any bracket group, well-formed or not.
static BRACKET_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").expect("valid regex"));

// =============================================================================
// Field references
// =============================================================================

/// A `table.column` reference.
///
/// Invariant: exactly one `.` separator, both parts non-empty
/// `[A-Za-z0-9_]+` identifiers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub struct FieldRef {
    pub table: String,
    pub column: String,
}

impl FieldRef {
    /// Parse and validate a `table.column` string.
    pub fn parse(raw: &str) -> ConfigResult<Self> {
        let mut parts = raw.split('.');
        let (table, column) = match (parts.next(), parts.next(), parts.next()) {
            (Some(t), Some(c), None) => (t.trim(), c.trim()),
            _ => return Err(ConfigError::InvalidFieldRef(raw.to_string())),
        };

        if table.is_empty() || column.is_empty() || !is_identifier(table) || !is_identifier(column)
        {
            return Err(ConfigError::InvalidFieldRef(raw.to_string()));
        }

        Ok(Self {
            table: table.to_string(),
            column: column.to_string(),
        })
    }

    /// The table part, normalized for graph comparison.
    pub fn normalized_table(&self) -> String {
        normalize_table(&self.table)
    }
}

impl TryFrom<String> for FieldRef {
    type Error = ConfigError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl std::fmt::Display for FieldRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// =============================================================================
// Spec enums
// =============================================================================

/// Aggregation applied to a selected column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Aggregation {
    #[serde(alias = "sum")]
    Sum,
    #[serde(alias = "avg")]
    Avg,
    #[serde(alias = "count")]
    Count,
    #[serde(alias = "min")]
    Min,
    #[serde(alias = "max")]
    Max,
    /// Explicitly raw, even under grouping.
    #[serde(alias = "none")]
    None,
}

/// Bucketing method for a grouping.
///
/// Unknown method names fall back to `Exact` rather than failing - stored
/// dashboards routinely outlive the UI that wrote them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum GroupMethod {
    #[default]
    Exact,
    Month,
    Quarter,
    Year,
    Range,
}

impl From<String> for GroupMethod {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "month" => GroupMethod::Month,
            "quarter" => GroupMethod::Quarter,
            "year" => GroupMethod::Year,
            "range" => GroupMethod::Range,
            _ => GroupMethod::Exact,
        }
    }
}

/// Filter operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "LIKE", alias = "like")]
    Like,
    #[serde(rename = "IN", alias = "in")]
    In,
    #[serde(rename = "IS NULL", alias = "is null")]
    IsNull,
    #[serde(rename = "IS NOT NULL", alias = "is not null")]
    IsNotNull,
}

impl FilterOp {
    /// Whether this operator consumes no value.
    pub fn is_null_check(&self) -> bool {
        matches!(self, FilterOp::IsNull | FilterOp::IsNotNull)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "asc")]
    Asc,
    #[serde(alias = "desc")]
    Desc,
}

// =============================================================================
// Spec items
// =============================================================================

/// A selected column.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnSpec {
    pub field: FieldRef,
    #[serde(default)]
    pub agg: Option<Aggregation>,
}

/// A grouping.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GroupSpec {
    pub field: FieldRef,
    #[serde(default)]
    pub method: GroupMethod,
    /// Bucket width for `method = "range"`.
    #[serde(default)]
    pub size: Option<f64>,
}

/// A filter predicate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FilterSpec {
    pub field: FieldRef,
    pub op: FilterOp,
    #[serde(default)]
    pub val: Value,
}

/// A sort directive.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SortSpec {
    pub field: FieldRef,
    #[serde(default)]
    pub dir: SortDirection,
}

/// A user-defined formula over `[table.column]` references.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CalculatedField {
    pub name: String,
    pub formula: String,
}

impl CalculatedField {
    /// Extract the field references the formula names.
    ///
    /// Every bracket group must be a well-formed `[table.column]` token;
    /// anything else is a config error (the formula text around the
    /// tokens is deliberately not parsed - see [`CalculatedField::rewrite`]).
    pub fn tokens(&self) -> ConfigResult<Vec<FieldRef>> {
        let mut refs = vec![];

        for group in BRACKET_GROUP.find_iter(&self.formula) {
            match FORMULA_TOKEN.captures(group.as_str()) {
                Some(caps) if caps.get(0).map(|m| m.as_str()) == Some(group.as_str()) => {
                    refs.push(FieldRef {
                        table: caps[1].to_string(),
                        column: caps[2].to_string(),
                    });
                }
                _ => {
                    return Err(ConfigError::MalformedFormulaToken {
                        name: self.name.clone(),
                        token: group.as_str().to_string(),
                    });
                }
            }
        }

        Ok(refs)
    }

    /// Rewrite every `[table.column]` token via `quote`, leaving the
    /// surrounding text untouched.
    ///
    /// The remaining expression is NOT validated as a sub-language - this
    /// is a documented trust boundary. A hardened version should restrict
    /// formulas to arithmetic plus a function allowlist before letting
    /// them anywhere near a statement.
    pub fn rewrite(&self, quote: impl Fn(&str, &str) -> String) -> ConfigResult<String> {
        // Validate all bracket groups first so rewrite never half-applies.
        self.tokens()?;

        let rewritten = FORMULA_TOKEN.replace_all(&self.formula, |caps: &regex::Captures<'_>| {
            quote(&caps[1], &caps[2])
        });
        Ok(rewritten.into_owned())
    }
}

/// An ad-hoc join supplied inline with the report.
///
/// Treated as a stored-priority edge for this request only - the UI uses
/// this to preview a join before persisting it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdHocJoin {
    pub left_table: String,
    pub left_column: String,
    pub right_table: String,
    pub right_column: String,
    #[serde(default)]
    pub join_type: JoinType,
}

impl AdHocJoin {
    pub fn to_edge(&self) -> JoinEdge {
        let mut edge = JoinEdge::new(
            &self.left_table,
            &self.left_column,
            &self.right_table,
            &self.right_column,
            EdgeSource::Stored,
            1.0,
        );
        edge.join_type = self.join_type;
        edge
    }
}

// =============================================================================
// Report config
// =============================================================================

/// The full declarative report definition.
///
/// Constructed per request from stored or ad-hoc JSON; immutable during
/// planning; never persisted by this crate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub connection_id: String,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    #[serde(default)]
    pub sorts: Vec<SortSpec>,
    #[serde(default)]
    pub calculated_fields: Vec<CalculatedField>,
    #[serde(default)]
    pub joins: Vec<AdHocJoin>,

    /// Raw pagination inputs; see [`ReportConfig::page`] and
    /// [`ReportConfig::page_size`] for the coerced values.
    #[serde(default)]
    page: Value,
    #[serde(default)]
    page_size: Value,
}

impl ReportConfig {
    /// Parse a config from its JSON wire form.
    pub fn from_json(raw: &str) -> ConfigResult<Self> {
        serde_json::from_str(raw).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    /// Current page, 1-based. Coerced, never fails.
    pub fn page(&self) -> u64 {
        coerce_positive(&self.page, DEFAULT_PAGE)
    }

    /// Rows per page. Coerced, never fails.
    pub fn page_size(&self) -> u64 {
        coerce_positive(&self.page_size, DEFAULT_PAGE_SIZE)
    }

    /// Structural validation applied before any planning.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.connection_id.trim().is_empty() {
            return Err(ConfigError::MissingConnection);
        }
        if self.columns.is_empty() && self.groups.is_empty() {
            return Err(ConfigError::EmptySelection);
        }
        for calc in &self.calculated_fields {
            calc.tokens()?;
        }
        Ok(())
    }

    /// Every table the report references, normalized: columns, groups,
    /// filters, sorts, and calculated-field tokens.
    pub fn referenced_tables(&self) -> ConfigResult<BTreeSet<String>> {
        let mut tables = BTreeSet::new();

        for c in &self.columns {
            tables.insert(c.field.normalized_table());
        }
        for g in &self.groups {
            tables.insert(g.field.normalized_table());
        }
        for f in &self.filters {
            tables.insert(f.field.normalized_table());
        }
        for s in &self.sorts {
            tables.insert(s.field.normalized_table());
        }
        for calc in &self.calculated_fields {
            for token in calc.tokens()? {
                tables.insert(token.normalized_table());
            }
        }

        Ok(tables)
    }

    /// The ad-hoc joins as resolver edges.
    pub fn adhoc_edges(&self) -> Vec<JoinEdge> {
        self.joins.iter().map(AdHocJoin::to_edge).collect()
    }
}

/// Coerce an arbitrary JSON value to a positive integer, falling back to
/// `default`. Accepts numbers and numeric strings; everything else - and
/// zero or negative values - yields the default.
fn coerce_positive(value: &Value, default: u64) -> u64 {
    let n = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i as f64
            } else {
                n.as_f64().unwrap_or(0.0)
            }
        }
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };

    if n >= 1.0 && n.is_finite() {
        n as u64
    } else {
        default
    }
}
