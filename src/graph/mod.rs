//! Join graph model for one external connection.
//!
//! Tables are nodes, [`JoinEdge`]s are undirected edges usable in either
//! direction. Edges come from three sources with fixed priority:
//! stored definitions, foreign-key introspection, and naming heuristics.
//! The resolver ([`resolver`]) searches this graph for a connecting
//! subgraph; the store ([`store`]) persists user-defined edges.

pub mod resolver;
pub mod store;

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::PathError;

/// Join type requested for an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinType {
    #[default]
    #[serde(alias = "inner")]
    Inner,
    #[serde(alias = "left")]
    Left,
    #[serde(alias = "right")]
    Right,
    #[serde(alias = "full")]
    Full,
}

impl JoinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER",
            JoinType::Left => "LEFT",
            JoinType::Right => "RIGHT",
            JoinType::Full => "FULL",
        }
    }

    /// Parse a stored string; unknown values fall back to INNER.
    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "LEFT" => JoinType::Left,
            "RIGHT" => JoinType::Right,
            "FULL" => JoinType::Full,
            _ => JoinType::Inner,
        }
    }
}

/// Relationship cardinality between the two sides of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cardinality {
    #[serde(rename = "1:1")]
    OneToOne,
    #[serde(rename = "1:N")]
    OneToMany,
    #[serde(rename = "N:1")]
    ManyToOne,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl Cardinality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::OneToOne => "1:1",
            Cardinality::OneToMany => "1:N",
            Cardinality::ManyToOne => "N:1",
            Cardinality::Unknown => "unknown",
        }
    }

    pub fn parse_lossy(s: &str) -> Self {
        match s.trim() {
            "1:1" => Cardinality::OneToOne,
            "1:N" => Cardinality::OneToMany,
            "N:1" => Cardinality::ManyToOne,
            _ => Cardinality::Unknown,
        }
    }

    /// Cardinality seen from the opposite side of the edge.
    pub fn reverse(&self) -> Self {
        match self {
            Cardinality::OneToMany => Cardinality::ManyToOne,
            Cardinality::ManyToOne => Cardinality::OneToMany,
            other => *other,
        }
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where an edge came from. Lower rank wins during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeSource {
    /// User-defined, persisted in the join store.
    Stored,
    /// Discovered from a database foreign-key constraint.
    ForeignKey,
    /// Inferred from naming conventions.
    Heuristic,
}

impl EdgeSource {
    /// Priority rank: stored > foreignKey > heuristic.
    pub fn rank(&self) -> u8 {
        match self {
            EdgeSource::Stored => 0,
            EdgeSource::ForeignKey => 1,
            EdgeSource::Heuristic => 2,
        }
    }
}

impl std::fmt::Display for EdgeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeSource::Stored => write!(f, "stored"),
            EdgeSource::ForeignKey => write!(f, "foreignKey"),
            EdgeSource::Heuristic => write!(f, "heuristic"),
        }
    }
}

/// Normalize a table name for graph comparison: strip any schema
/// qualifier, trim, lowercase.
pub fn normalize_table(name: &str) -> String {
    let bare = name.rsplit('.').next().unwrap_or(name);
    bare.trim().to_lowercase()
}

/// A join relationship between two tables, usable in either direction.
///
/// Invariant: `left_table != right_table` after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinEdge {
    pub left_table: String,
    pub left_column: String,
    pub right_table: String,
    pub right_column: String,
    #[serde(default)]
    pub join_type: JoinType,
    #[serde(default)]
    pub cardinality: Cardinality,
    pub source: EdgeSource,
    pub confidence: f64,
}

impl JoinEdge {
    pub fn new(
        left_table: &str,
        left_column: &str,
        right_table: &str,
        right_column: &str,
        source: EdgeSource,
        confidence: f64,
    ) -> Self {
        Self {
            left_table: left_table.into(),
            left_column: left_column.into(),
            right_table: right_table.into(),
            right_column: right_column.into(),
            join_type: JoinType::Inner,
            cardinality: Cardinality::Unknown,
            source,
            confidence,
        }
    }

    pub fn normalized_left(&self) -> String {
        normalize_table(&self.left_table)
    }

    pub fn normalized_right(&self) -> String {
        normalize_table(&self.right_table)
    }

    /// The opposite endpoint, given one normalized endpoint name.
    pub fn other_end(&self, normalized: &str) -> Option<String> {
        if self.normalized_left() == normalized {
            Some(self.normalized_right())
        } else if self.normalized_right() == normalized {
            Some(self.normalized_left())
        } else {
            None
        }
    }

    /// Identity of this edge by its four name fields, normalized.
    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(
            &self.left_table,
            &self.left_column,
            &self.right_table,
            &self.right_column,
        )
    }

    /// The unordered normalized table pair this edge connects.
    pub fn pair_key(&self) -> (String, String) {
        let l = self.normalized_left();
        let r = self.normalized_right();
        if l <= r {
            (l, r)
        } else {
            (r, l)
        }
    }
}

/// A unique key identifying an edge by its endpoints.
///
/// All names are stored normalized for case-insensitive comparison.
#[derive(Debug, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct EdgeKey {
    pub left_table: String,
    pub left_column: String,
    pub right_table: String,
    pub right_column: String,
}

impl EdgeKey {
    pub fn new(left_table: &str, left_column: &str, right_table: &str, right_column: &str) -> Self {
        Self {
            left_table: normalize_table(left_table),
            left_column: left_column.trim().to_lowercase(),
            right_table: normalize_table(right_table),
            right_column: right_column.trim().to_lowercase(),
        }
    }

    /// The same key seen from the other side.
    pub fn reversed(&self) -> Self {
        Self {
            left_table: self.right_table.clone(),
            left_column: self.right_column.clone(),
            right_table: self.left_table.clone(),
            right_column: self.left_column.clone(),
        }
    }

    /// Direction-independent form: the lexically smaller of self/reversed.
    /// Two edges describing the same relationship from opposite sides
    /// canonicalize to the same key.
    pub fn canonical(&self) -> Self {
        let rev = self.reversed();
        if *self <= rev {
            self.clone()
        } else {
            rev
        }
    }
}

/// Consumption order for edges: source priority, then descending
/// confidence, then a stable lexical key. Total and deterministic.
pub fn edge_priority_cmp(a: &JoinEdge, b: &JoinEdge) -> Ordering {
    a.source
        .rank()
        .cmp(&b.source.rank())
        .then_with(|| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.key().cmp(&b.key()))
}

/// An ordered set of edges connecting the tables of one report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinPath {
    pub edges: Vec<JoinEdge>,
}

impl JoinPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// All tables touched by the path, normalized.
    pub fn tables(&self) -> BTreeSet<String> {
        let mut set = BTreeSet::new();
        for e in &self.edges {
            set.insert(e.normalized_left());
            set.insert(e.normalized_right());
        }
        set
    }
}

/// Outcome of path resolution.
///
/// `Partial` is a valid, callable state - the caller should surface a
/// "manual join needed" condition, not a hard failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Every required table is connected.
    Full(JoinPath),
    /// Some tables connected; the rest need a stored join definition.
    Partial {
        path: JoinPath,
        unreachable: Vec<String>,
    },
    /// No edge chain reaches the remaining tables at all.
    Disconnected { unreachable: Vec<String> },
}

impl Resolution {
    pub fn is_full(&self) -> bool {
        matches!(self, Resolution::Full(_))
    }

    pub fn path(&self) -> Option<&JoinPath> {
        match self {
            Resolution::Full(p) => Some(p),
            Resolution::Partial { path, .. } => Some(path),
            Resolution::Disconnected { .. } => None,
        }
    }

    /// Collapse into a hard result for callers that require full
    /// connectivity.
    pub fn into_result(self) -> Result<JoinPath, PathError> {
        match self {
            Resolution::Full(path) => Ok(path),
            Resolution::Partial { unreachable, .. } => {
                Err(PathError::ManualJoinNeeded { unreachable })
            }
            Resolution::Disconnected { unreachable } => Err(PathError::NoPath { unreachable }),
        }
    }
}
