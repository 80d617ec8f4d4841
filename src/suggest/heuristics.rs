//! Naming-convention heuristics for join inference.
//!
//! Two patterns, checked in confidence order for every unordered pair of
//! candidate tables:
//!
//! 1. **Id convention** (0.6): one table has a column named
//!    `<singular-or-plural of the other table>_id` and the other table
//!    has a column literally named `id`.
//! 2. **Shared business key** (0.5): both tables carry a column with the
//!    same name drawn from a small fixed set of conventional keys.
//!
//! Self-pairs are skipped and at most one edge is emitted per unordered
//! pair, so heuristic output never floods the resolver.

use crate::catalog::TableMetadata;
use crate::graph::{normalize_table, Cardinality, EdgeSource, JoinEdge};

use super::confidence;
use super::inflection::{pluralize, singularize};

/// Column names conventionally shared across tables as join keys.
const SHARED_KEYS: &[&str] = &["id", "code", "key", "sku", "employee_id", "customer_id"];

/// Infer heuristic edges between the given tables.
///
/// Input order does not matter; pairs are visited in sorted name order so
/// output is deterministic for a fixed table set.
pub fn infer_edges(tables: &[TableMetadata]) -> Vec<JoinEdge> {
    let mut sorted: Vec<&TableMetadata> = tables.iter().collect();
    sorted.sort_by_key(|t| normalize_table(&t.name));
    sorted.dedup_by_key(|t| normalize_table(&t.name));

    let mut edges = vec![];

    for (i, a) in sorted.iter().enumerate() {
        for b in sorted.iter().skip(i + 1) {
            if let Some(edge) = match_pair(a, b) {
                edges.push(edge);
            }
        }
    }

    edges
}

/// Try both patterns on one unordered pair, strongest first.
fn match_pair(a: &TableMetadata, b: &TableMetadata) -> Option<JoinEdge> {
    match_id_convention(a, b)
        .or_else(|| match_id_convention(b, a))
        .or_else(|| match_shared_key(a, b))
}

/// Pattern 1: `many` has `<singular|plural of one>_id`, `one` has `id`.
fn match_id_convention(many: &TableMetadata, one: &TableMetadata) -> Option<JoinEdge> {
    if !one.has_column("id") {
        return None;
    }

    let one_name = normalize_table(&one.name);
    let fk_candidates = [
        format!("{}_id", singularize(&one_name)),
        format!("{}_id", pluralize(&one_name)),
        format!("{}_id", one_name),
    ];

    for candidate in &fk_candidates {
        if let Some(col) = many.column(candidate) {
            let mut edge = JoinEdge::new(
                &normalize_table(&many.name),
                &col.name.to_lowercase(),
                &one_name,
                "id",
                EdgeSource::Heuristic,
                confidence::ID_CONVENTION,
            );
            edge.cardinality = Cardinality::ManyToOne;
            return Some(edge);
        }
    }

    None
}

/// Pattern 2: both tables carry the same conventional key column.
fn match_shared_key(a: &TableMetadata, b: &TableMetadata) -> Option<JoinEdge> {
    for key in SHARED_KEYS {
        if a.has_column(key) && b.has_column(key) {
            return Some(JoinEdge::new(
                &normalize_table(&a.name),
                key,
                &normalize_table(&b.name),
                key,
                EdgeSource::Heuristic,
                confidence::SHARED_KEY,
            ));
        }
    }

    None
}
