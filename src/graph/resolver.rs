//! Join path resolution.
//!
//! Two algorithms, used in this order:
//!
//! 1. **Exact connector** - breadth-first search with a predecessor map,
//!    used when exactly two tables are required (or an exact multi-hop
//!    tree is requested). Finds a shortest connecting path; pass-through
//!    tables not in the required set are allowed.
//! 2. **Greedy minimal connector** - for larger required sets, grows a
//!    connected component one edge at a time, always taking the highest-
//!    priority edge that extends the frontier. Steiner-style pass-through
//!    nodes are admitted. May return *partial* connectivity as a valid
//!    state distinct from no-path.
//!
//! Equal-priority edges are tried in edge-list order and choices are never
//! revisited - greedy, not optimal. That approximation is deliberate: the
//! edge pools here are small and a wrong-but-connected tree is repairable
//! by storing an explicit join, whereas an optimal Steiner search is not
//! worth its complexity.
//!
//! Determinism: required tables are iterated in sorted order, edges in
//! priority order (see [`edge_priority_cmp`]), so a fixed input always
//! produces the same output.

use std::collections::{BTreeSet, HashMap, VecDeque};

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use super::{edge_priority_cmp, normalize_table, JoinEdge, JoinPath, Resolution};

/// Resolve a connecting subgraph for `required` tables over `edges`.
///
/// Table names are normalized before comparison. Zero or one required
/// table resolves to an empty path.
pub fn resolve(required: &BTreeSet<String>, edges: &[JoinEdge]) -> Resolution {
    let req: Vec<String> = required.iter().map(|t| normalize_table(t)).collect();
    let req: BTreeSet<String> = req.into_iter().collect();

    if req.len() <= 1 {
        return Resolution::Full(JoinPath::new());
    }

    let mut ordered: Vec<JoinEdge> = edges.to_vec();
    ordered.sort_by(edge_priority_cmp);

    if req.len() == 2 {
        connect_exact(&req, &ordered)
    } else {
        connect_greedy(&req, &ordered)
    }
}

/// Exact connector: BFS from one required table until the visited set
/// covers all required tables, then backtrack each required table to the
/// start collecting the unique edges used.
///
/// Exposed separately for callers that want an exact multi-hop tree even
/// with more than two tables.
pub fn connect_exact(required: &BTreeSet<String>, edges: &[JoinEdge]) -> Resolution {
    let (graph, nodes) = build_graph(edges);

    // Deterministic start: the lexically first required table that
    // touches any edge, so the unreachable report names the genuinely
    // isolated tables rather than everything-but-the-first.
    let start = match required.iter().find(|t| nodes.contains_key(*t)) {
        Some(t) => t.clone(),
        None => {
            return Resolution::Disconnected {
                unreachable: required.iter().skip(1).cloned().collect(),
            };
        }
    };

    let start_idx = nodes[&start];

    // BFS with parent pointers instead of path cloning.
    let mut visited: BTreeSet<NodeIndex> = BTreeSet::new();
    let mut parents: HashMap<NodeIndex, (NodeIndex, usize)> = HashMap::new();
    let mut queue: VecDeque<NodeIndex> = VecDeque::new();

    queue.push_back(start_idx);
    visited.insert(start_idx);

    let mut remaining: BTreeSet<&String> = required.iter().filter(|t| **t != start).collect();

    'bfs: while let Some(current) = queue.pop_front() {
        // petgraph yields a node's edges in reverse insertion order;
        // sort by weight (= position in the priority-ordered edge list)
        // to keep the documented tie-break.
        let mut outgoing: Vec<(NodeIndex, usize)> = graph
            .edges(current)
            .map(|e| (e.target(), *e.weight()))
            .collect();
        outgoing.sort_by_key(|(_, w)| *w);

        for (neighbor, edge_idx) in outgoing {
            if visited.contains(&neighbor) {
                continue;
            }

            parents.insert(neighbor, (current, edge_idx));
            visited.insert(neighbor);
            queue.push_back(neighbor);

            remaining.remove(&graph[neighbor]);
            if remaining.is_empty() {
                break 'bfs;
            }
        }
    }

    if !remaining.is_empty() {
        return Resolution::Disconnected {
            unreachable: remaining.into_iter().cloned().collect(),
        };
    }

    // Backtrack from each required table to the start, deduplicating
    // edges by their direction-independent key.
    let mut path = JoinPath::new();
    let mut seen = BTreeSet::new();

    for target in required.iter().filter(|t| **t != start) {
        let mut segment: Vec<&JoinEdge> = vec![];
        let mut current = nodes[target];

        while current != start_idx {
            let (parent, edge_idx) = parents[&current];
            segment.push(&edges[edge_idx]);
            current = parent;
        }

        // Walk was destination-to-start; reverse for source order.
        for edge in segment.into_iter().rev() {
            let key = edge.key().canonical();
            if seen.insert(key) {
                path.edges.push(edge.clone());
            }
        }
    }

    Resolution::Full(path)
}

/// Greedy minimal connector for N>2 required tables.
fn connect_greedy(required: &BTreeSet<String>, edges: &[JoinEdge]) -> Resolution {
    let endpoints: BTreeSet<String> = edges
        .iter()
        .flat_map(|e| [e.normalized_left(), e.normalized_right()])
        .collect();

    // Seed with the first required table that can grow at all.
    let seed = required
        .iter()
        .find(|t| endpoints.contains(*t))
        .or_else(|| required.iter().next());

    let mut connected: BTreeSet<String> = BTreeSet::new();
    if let Some(seed) = seed {
        connected.insert(seed.clone());
    }

    let mut path = JoinPath::new();

    loop {
        if required.is_subset(&connected) {
            return Resolution::Full(path);
        }

        // Highest-priority edge with exactly one endpoint inside the
        // component. Rescan from the top after every admission so a
        // newly reachable stored edge outranks a pending heuristic one.
        let mut admitted = false;
        for edge in edges {
            let left = edge.normalized_left();
            let right = edge.normalized_right();
            let has_left = connected.contains(&left);
            let has_right = connected.contains(&right);

            if has_left != has_right {
                connected.insert(if has_left { right } else { left });
                path.edges.push(edge.clone());
                admitted = true;
                break;
            }
        }

        if !admitted {
            break;
        }
    }

    let unreachable: Vec<String> = required.difference(&connected).cloned().collect();

    if path.is_empty() {
        Resolution::Disconnected { unreachable }
    } else {
        Resolution::Partial { path, unreachable }
    }
}

/// Build an undirected petgraph over normalized table names.
/// Edge weights are positions into the (priority-ordered) edge slice.
fn build_graph(edges: &[JoinEdge]) -> (UnGraph<String, usize>, HashMap<String, NodeIndex>) {
    let mut graph = UnGraph::new_undirected();
    let mut nodes: HashMap<String, NodeIndex> = HashMap::new();

    for (idx, edge) in edges.iter().enumerate() {
        let left = edge.normalized_left();
        let right = edge.normalized_right();
        if left == right {
            // Self-referencing rows violate the edge invariant; skip.
            continue;
        }

        let l = *nodes
            .entry(left.clone())
            .or_insert_with(|| graph.add_node(left.clone()));
        let r = *nodes
            .entry(right.clone())
            .or_insert_with(|| graph.add_node(right.clone()));
        graph.add_edge(l, r, idx);
    }

    (graph, nodes)
}
