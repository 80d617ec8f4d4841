//! Join suggestion engine.
//!
//! Produces the candidate edge pool the resolver searches. Three sources,
//! in fixed priority order:
//!
//! 1. **Stored** definitions from the join store (confidence 1.0)
//! 2. **Foreign keys** from schema introspection (confidence 0.9)
//! 3. **Naming heuristics** (confidence 0.6 / 0.5, see [`heuristics`])
//!
//! Output is deterministic for a fixed input: edges are ordered by source
//! priority, then descending confidence, then a stable lexical key, and
//! deduplicated to at most one edge per unordered table pair per source.
//!
//! Discovery degrades gracefully: a table whose introspection fails is
//! skipped (with a warning), it does not abort the whole request.

pub mod heuristics;
pub mod inflection;

use std::collections::BTreeSet;

use crate::catalog::SchemaCatalog;
use crate::graph::store::JoinStore;
use crate::graph::{edge_priority_cmp, normalize_table, Cardinality, EdgeSource, JoinEdge};

/// Confidence levels per edge source.
pub mod confidence {
    /// User-defined edges are taken at face value.
    pub const STORED: f64 = 1.0;
    /// Database constraints are authoritative but may be stale copies.
    pub const FOREIGN_KEY: f64 = 0.9;
    /// `<table>_id` naming convention.
    pub const ID_CONVENTION: f64 = 0.6;
    /// Shared conventional business key.
    pub const SHARED_KEY: f64 = 0.5;
}

/// Discovers candidate join edges for one connection.
pub struct SuggestionEngine<'a> {
    store: &'a JoinStore,
    catalog: &'a dyn SchemaCatalog,
}

impl<'a> SuggestionEngine<'a> {
    pub fn new(store: &'a JoinStore, catalog: &'a dyn SchemaCatalog) -> Self {
        Self { store, catalog }
    }

    /// Produce the ordered, deduplicated edge pool for `candidates`.
    ///
    /// Only edges with both endpoints inside the candidate set are
    /// returned; the resolver decides which of them to use.
    pub async fn discover_edges(
        &self,
        connection_id: &str,
        candidates: &[String],
    ) -> Vec<JoinEdge> {
        let cand: BTreeSet<String> = candidates.iter().map(|t| normalize_table(t)).collect();

        let mut edges: Vec<JoinEdge> = vec![];

        // 1. Stored definitions.
        match self.store.edges_for(connection_id) {
            Ok(stored) => {
                edges.extend(stored.into_iter().filter(|e| {
                    cand.contains(&e.normalized_left()) && cand.contains(&e.normalized_right())
                }));
            }
            Err(err) => {
                tracing::warn!(%connection_id, error = %err, "join store unavailable, continuing without stored edges");
            }
        }

        // 2 + 3. Introspected metadata feeds both foreign-key edges and
        // naming heuristics. Tables that fail to introspect are skipped.
        let sorted: Vec<String> = cand.iter().cloned().collect();
        let mut metas = vec![];
        for (table, result) in self.catalog.tables_batch(&sorted).await {
            match result {
                Ok(meta) => metas.push(meta),
                Err(err) => {
                    tracing::warn!(%table, error = %err, "skipping table with failed introspection");
                }
            }
        }

        for meta in &metas {
            for fk in &meta.foreign_keys {
                if !cand.contains(&normalize_table(&fk.referred_table)) {
                    continue;
                }
                let mut edge = JoinEdge::new(
                    &normalize_table(&meta.name),
                    &fk.column.to_lowercase(),
                    &normalize_table(&fk.referred_table),
                    &fk.referred_column.to_lowercase(),
                    EdgeSource::ForeignKey,
                    confidence::FOREIGN_KEY,
                );
                edge.cardinality = Cardinality::ManyToOne;
                edges.push(edge);
            }
        }

        edges.extend(heuristics::infer_edges(&metas));

        dedup_ordered(edges)
    }
}

/// Sort edges into consumption order and drop duplicates: at most one
/// edge per direction-independent key, and at most one per unordered
/// table pair per source.
fn dedup_ordered(mut edges: Vec<JoinEdge>) -> Vec<JoinEdge> {
    edges.sort_by(edge_priority_cmp);

    let mut seen_keys = BTreeSet::new();
    let mut seen_pair_source: BTreeSet<(String, String, u8)> = BTreeSet::new();
    let mut out = vec![];

    for edge in edges {
        let key = edge.key().canonical();
        if !seen_keys.insert(key) {
            continue;
        }

        let (a, b) = edge.pair_key();
        if !seen_pair_source.insert((a, b, edge.source.rank())) {
            continue;
        }

        out.push(edge);
    }

    out
}
