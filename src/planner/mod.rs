//! Query plan builder.
//!
//! Compiles a validated [`ReportConfig`] plus a resolved [`JoinPath`]
//! into a dialect-aware [`QueryPlan`]. Policy decisions implemented here:
//!
//! - **Field resolution**: every field must name a table inside the join
//!   scope (the path's tables plus the anchor), else `UnknownTable`.
//! - **Aggregation default**: under grouping, a column without an explicit
//!   aggregation gets SUM if its introspected type is numeric, COUNT
//!   otherwise. Without grouping, columns are selected raw.
//! - **Bucketing**: month/quarter/year truncation goes through the dialect
//!   hook; `range` becomes a fixed-width numeric bin. A bucket method on a
//!   column of the wrong type falls back to the exact value.
//! - **Filters**: empty values are dropped silently (except the two NULL
//!   checks) - a half-typed dashboard filter must not break the widget.
//! - **Identifier quoting**: mandatory for every table/column reference,
//!   via the token layer; literal values go through the dialect's string
//!   escaping.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use crate::catalog::{ColumnType, TableMetadata};
use crate::error::{ConfigError, ConfigResult};
use crate::graph::{normalize_table, JoinEdge, JoinPath, JoinType};
use crate::report::{
    Aggregation, CalculatedField, ColumnSpec, FieldRef, FilterOp, FilterSpec, GroupMethod,
    GroupSpec, ReportConfig, SortDirection,
};
use crate::sql::{
    avg, count, lit_bool, lit_float, lit_int, lit_str, max, min, sum, table_col, DateGrain,
    Dialect, Expr, ExprExt, OrderByExpr, Query, SelectExpr, SqlDialect, SqlJoinKind, TableRef,
};

/// Default width for `range` buckets when the group spec omits one.
const DEFAULT_RANGE_SIZE: f64 = 10.0;

/// Column type lookup keyed by normalized `(table, column)`.
#[derive(Debug, Clone, Default)]
pub struct ColumnTypes {
    map: HashMap<(String, String), ColumnType>,
}

impl ColumnTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the lookup from introspected table metadata.
    pub fn from_metadata(tables: &[TableMetadata]) -> Self {
        let mut map = HashMap::new();
        for table in tables {
            let t = normalize_table(&table.name);
            for col in &table.columns {
                map.insert((t.clone(), col.name.to_lowercase()), col.data_type);
            }
        }
        Self { map }
    }

    pub fn insert(&mut self, table: &str, column: &str, ty: ColumnType) {
        self.map
            .insert((normalize_table(table), column.to_lowercase()), ty);
    }

    pub fn get(&self, field: &FieldRef) -> Option<ColumnType> {
        self.map
            .get(&(field.normalized_table(), field.column.to_lowercase()))
            .copied()
    }
}

/// The compiled plan: data query, derived count form, output columns.
///
/// Invariant: every table referenced in select/where/group/order appears
/// in the join chain.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub query: Query,
    /// Output column names, in select-list order.
    pub columns: Vec<String>,
    pub dialect: Dialect,
}

impl QueryPlan {
    /// The paginated data statement.
    pub fn sql(&self) -> String {
        self.query.to_sql(self.dialect)
    }

    /// The unlimited COUNT(*) statement.
    pub fn count_sql(&self) -> String {
        self.query.to_count_sql(self.dialect)
    }
}

/// Compiles report configs into query plans for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct PlanBuilder {
    dialect: Dialect,
}

impl PlanBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// Build a plan. `config` must already have passed
    /// [`ReportConfig::validate`]; `path` is the resolved join path
    /// (empty for single-table reports).
    pub fn build(
        &self,
        config: &ReportConfig,
        path: &JoinPath,
        types: &ColumnTypes,
    ) -> ConfigResult<QueryPlan> {
        let anchor = self.anchor(config)?;

        let mut scope = path.tables();
        scope.insert(normalize_table(&anchor));

        self.check_scope(config, &scope)?;

        let mut query = Query::new().from(TableRef::new(&anchor));
        query = self.apply_joins(query, &anchor, path);

        let has_groups = !config.groups.is_empty();
        let mut select: Vec<SelectExpr> = vec![];
        let mut group_by: Vec<Expr> = vec![];
        let mut columns: Vec<String> = vec![];

        for group in &config.groups {
            let (expr, alias) = self.group_expr(group, types);
            group_by.push(expr.clone());
            columns.push(alias.clone());
            select.push(SelectExpr::new(expr).with_alias(&alias));
        }

        for column in &config.columns {
            let (expr, alias) = self.column_expr(column, has_groups, types);
            columns.push(alias.clone());
            select.push(SelectExpr::new(expr).with_alias(&alias));
        }

        for calc in &config.calculated_fields {
            let expr = self.calculated_expr(calc)?;
            columns.push(calc.name.clone());
            select.push(SelectExpr::new(expr).with_alias(&calc.name));
        }

        query.select = select;
        if has_groups {
            query = query.group_by(group_by);
        }

        for filter in &config.filters {
            if let Some(predicate) = filter_expr(filter) {
                query = query.filter(predicate);
            }
        }

        let order_by: Vec<OrderByExpr> = config
            .sorts
            .iter()
            .map(|s| {
                let col = table_col(&s.field.table, &s.field.column);
                match s.dir {
                    SortDirection::Asc => OrderByExpr::asc(col),
                    SortDirection::Desc => OrderByExpr::desc(col),
                }
            })
            .collect();
        query = query.order_by(order_by);

        let page = config.page();
        let page_size = config.page_size();
        query = query.limit(page_size).offset((page - 1) * page_size);

        Ok(QueryPlan {
            query,
            columns,
            dialect: self.dialect,
        })
    }

    /// The FROM table: the first table the config references, in
    /// declaration order.
    fn anchor(&self, config: &ReportConfig) -> ConfigResult<String> {
        config
            .columns
            .first()
            .map(|c| c.field.table.clone())
            .or_else(|| config.groups.first().map(|g| g.field.table.clone()))
            .or_else(|| config.filters.first().map(|f| f.field.table.clone()))
            .or_else(|| config.sorts.first().map(|s| s.field.table.clone()))
            .ok_or(ConfigError::EmptySelection)
    }

    /// Every field reference must land inside the join scope.
    fn check_scope(&self, config: &ReportConfig, scope: &BTreeSet<String>) -> ConfigResult<()> {
        let check = |field: &FieldRef| -> ConfigResult<()> {
            let table = field.normalized_table();
            if scope.contains(&table) {
                Ok(())
            } else {
                Err(ConfigError::UnknownTable {
                    table,
                    field: field.to_string(),
                })
            }
        };

        for c in &config.columns {
            check(&c.field)?;
        }
        for g in &config.groups {
            check(&g.field)?;
        }
        for f in &config.filters {
            check(&f.field)?;
        }
        for s in &config.sorts {
            check(&s.field)?;
        }
        for calc in &config.calculated_fields {
            for token in calc.tokens()? {
                check(&token)?;
            }
        }

        Ok(())
    }

    /// Emit the join chain. Edges are walked so each JOIN adds exactly
    /// one new table to the already-joined set, regardless of the order
    /// the resolver discovered them in.
    fn apply_joins(&self, mut query: Query, anchor: &str, path: &JoinPath) -> Query {
        let mut joined: BTreeSet<String> = BTreeSet::new();
        joined.insert(normalize_table(anchor));

        let mut pending: Vec<&JoinEdge> = path.edges.iter().collect();

        while !pending.is_empty() {
            let mut progressed = false;

            let mut i = 0;
            while i < pending.len() {
                let edge = pending[i];
                let left = edge.normalized_left();
                let right = edge.normalized_right();
                let has_left = joined.contains(&left);
                let has_right = joined.contains(&right);

                if has_left && has_right {
                    // Cycle edge; the tables are already in the chain.
                    pending.remove(i);
                    progressed = true;
                    continue;
                }

                if has_left || has_right {
                    let new_table = if has_left { &right } else { &left };
                    let on = table_col(&edge.left_table, &edge.left_column)
                        .eq(table_col(&edge.right_table, &edge.right_column));
                    query = query.join(self.join_kind(edge.join_type), TableRef::new(new_table), on);
                    joined.insert(new_table.clone());
                    pending.remove(i);
                    progressed = true;
                    continue;
                }

                i += 1;
            }

            if !progressed {
                // Remaining edges never touch the anchor's component.
                // Valid only for partial paths; drop them rather than
                // emitting a cross join.
                tracing::warn!(
                    dropped = pending.len(),
                    "join path edges unreachable from anchor"
                );
                break;
            }
        }

        query
    }

    /// Downgrade join kinds the dialect cannot emit.
    fn join_kind(&self, jt: JoinType) -> SqlJoinKind {
        match jt {
            JoinType::Inner => SqlJoinKind::Inner,
            JoinType::Left => SqlJoinKind::Left,
            JoinType::Right => {
                if self.dialect.supports_right_join() {
                    SqlJoinKind::Right
                } else {
                    tracing::warn!(dialect = %self.dialect, "RIGHT JOIN unsupported, emitting LEFT JOIN");
                    SqlJoinKind::Left
                }
            }
            JoinType::Full => {
                if self.dialect.supports_full_outer_join() {
                    SqlJoinKind::Full
                } else {
                    tracing::warn!(dialect = %self.dialect, "FULL OUTER JOIN unsupported, emitting LEFT JOIN");
                    SqlJoinKind::Left
                }
            }
        }
    }

    /// Grouping expression plus its output alias.
    fn group_expr(&self, group: &GroupSpec, types: &ColumnTypes) -> (Expr, String) {
        let field = &group.field;
        let col = table_col(&field.table, &field.column);
        let base_alias = format!("{}_{}", field.table, field.column);
        let col_type = types.get(field);

        let grain = match group.method {
            GroupMethod::Month => Some(DateGrain::Month),
            GroupMethod::Quarter => Some(DateGrain::Quarter),
            GroupMethod::Year => Some(DateGrain::Year),
            GroupMethod::Exact | GroupMethod::Range => None,
        };

        if let Some(grain) = grain {
            // Date bucketing only applies to temporal columns; anything
            // else degrades to the exact value.
            if col_type.map(|t| t.is_temporal()).unwrap_or(false) {
                let suffix = match grain {
                    DateGrain::Month => "month",
                    DateGrain::Quarter => "quarter",
                    DateGrain::Year => "year",
                };
                return (
                    Expr::DateBucket {
                        grain,
                        expr: Box::new(col),
                    },
                    format!("{}_{}", base_alias, suffix),
                );
            }
            tracing::debug!(field = %field, "date bucket on non-temporal column, using exact value");
            return (col, base_alias);
        }

        if group.method == GroupMethod::Range {
            if col_type.map(|t| t.is_numeric()).unwrap_or(false) {
                let size = match group.size {
                    Some(s) if s > 0.0 && s.is_finite() => s,
                    _ => DEFAULT_RANGE_SIZE,
                };
                return (
                    Expr::NumericBucket {
                        size,
                        expr: Box::new(col),
                    },
                    format!("{}_bucket", base_alias),
                );
            }
            tracing::debug!(field = %field, "range bucket on non-numeric column, using exact value");
        }

        (col, base_alias)
    }

    /// Selected column expression plus its output alias.
    fn column_expr(
        &self,
        column: &ColumnSpec,
        has_groups: bool,
        types: &ColumnTypes,
    ) -> (Expr, String) {
        let field = &column.field;
        let col = table_col(&field.table, &field.column);
        let alias = format!("{}_{}", field.table, field.column);

        let agg = match column.agg {
            Some(Aggregation::None) => None,
            Some(explicit) => Some(explicit),
            None if has_groups => {
                // Default policy: numeric columns sum, everything else
                // counts.
                let numeric = types.get(field).map(|t| t.is_numeric()).unwrap_or(false);
                Some(if numeric {
                    Aggregation::Sum
                } else {
                    Aggregation::Count
                })
            }
            None => None,
        };

        let expr = match agg {
            Some(Aggregation::Sum) => sum(col),
            Some(Aggregation::Avg) => avg(col),
            Some(Aggregation::Count) => count(col),
            Some(Aggregation::Min) => min(col),
            Some(Aggregation::Max) => max(col),
            Some(Aggregation::None) | None => col,
        };

        (expr, alias)
    }

    /// Calculated field: token substitution into a raw select expression.
    ///
    /// Tokens are rewritten to dialect-quoted references; the surrounding
    /// text is inserted verbatim (the documented trust boundary).
    fn calculated_expr(&self, calc: &CalculatedField) -> ConfigResult<Expr> {
        let dialect = self.dialect;
        let rewritten = calc.rewrite(|table, column| {
            format!(
                "{}.{}",
                dialect.quote_identifier(table),
                dialect.quote_identifier(column)
            )
        })?;
        Ok(Expr::Raw(rewritten))
    }
}

/// Build the predicate for one filter, or `None` to drop it.
///
/// Empty values (null, blank string, empty list) are dropped silently for
/// every operator except the NULL checks - explicit policy, not an
/// oversight.
fn filter_expr(filter: &FilterSpec) -> Option<Expr> {
    let col = table_col(&filter.field.table, &filter.field.column);

    if filter.op.is_null_check() {
        return Some(match filter.op {
            FilterOp::IsNull => col.is_null(),
            _ => col.is_not_null(),
        });
    }

    if value_is_empty(&filter.val) {
        tracing::debug!(field = %filter.field, "dropping filter with empty value");
        return None;
    }

    Some(match filter.op {
        FilterOp::Eq => col.eq(value_literal(&filter.val)),
        FilterOp::Ne => col.ne(value_literal(&filter.val)),
        FilterOp::Gt => col.gt(value_literal(&filter.val)),
        FilterOp::Lt => col.lt(value_literal(&filter.val)),
        FilterOp::Like => col.like(string_literal(&filter.val)),
        FilterOp::In => col.in_list(in_values(&filter.val)),
        FilterOp::IsNull | FilterOp::IsNotNull => unreachable!("handled above"),
    })
}

fn value_is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Convert a JSON scalar to a SQL literal expression.
fn value_literal(value: &Value) -> Expr {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                lit_int(i)
            } else {
                lit_float(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::Bool(b) => lit_bool(*b),
        Value::String(s) => lit_str(s),
        other => lit_str(&other.to_string()),
    }
}

fn string_literal(value: &Value) -> Expr {
    match value {
        Value::String(s) => lit_str(s),
        other => lit_str(&other.to_string()),
    }
}

/// Values for an IN predicate. A comma-separated string is split; an
/// array is taken element-wise; a lone scalar becomes a one-element list.
fn in_values(value: &Value) -> Vec<Expr> {
    match value {
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(parse_scalar)
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter(|v| !value_is_empty(v))
            .map(value_literal)
            .collect(),
        other => vec![value_literal(other)],
    }
}

/// Interpret a split IN piece: integer, float, or string.
fn parse_scalar(piece: &str) -> Expr {
    if let Ok(i) = piece.parse::<i64>() {
        lit_int(i)
    } else if let Ok(f) = piece.parse::<f64>() {
        lit_float(f)
    } else {
        lit_str(piece)
    }
}
