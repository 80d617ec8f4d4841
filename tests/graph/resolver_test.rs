// tests/graph/resolver_test.rs
use std::collections::BTreeSet;

use adhoq::error::PathError;
use adhoq::graph::{resolver, EdgeSource, JoinEdge, Resolution};

fn fk(left: &str, left_col: &str, right: &str, right_col: &str) -> JoinEdge {
    JoinEdge::new(left, left_col, right, right_col, EdgeSource::ForeignKey, 0.9)
}

fn required(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_two_tables_one_edge() {
    // Scenario: orders.customer_id -> customers.id is the only edge.
    let edges = vec![fk("orders", "customer_id", "customers", "id")];

    let resolution = resolver::resolve(&required(&["orders", "customers"]), &edges);

    match resolution {
        Resolution::Full(path) => {
            assert_eq!(path.len(), 1);
            assert_eq!(path.edges[0].left_table, "orders");
            assert_eq!(path.edges[0].right_table, "customers");
        }
        other => panic!("expected full path, got {:?}", other),
    }
}

#[test]
fn test_pass_through_table() {
    // regions is only reachable through customers, which is not required.
    let edges = vec![
        fk("orders", "customer_id", "customers", "id"),
        fk("customers", "region_id", "regions", "id"),
    ];

    let resolution = resolver::resolve(&required(&["orders", "regions"]), &edges);

    let path = match resolution {
        Resolution::Full(path) => path,
        other => panic!("expected full path, got {:?}", other),
    };

    assert_eq!(path.len(), 2);
    let tables = path.tables();
    assert!(tables.contains("customers"), "pass-through table missing");
    assert!(tables.contains("orders"));
    assert!(tables.contains("regions"));
}

#[test]
fn test_disconnected_pair_is_no_path() {
    let resolution = resolver::resolve(&required(&["a", "b"]), &[]);

    match &resolution {
        Resolution::Disconnected { unreachable } => {
            assert!(unreachable.contains(&"b".to_string()));
        }
        other => panic!("expected disconnected, got {:?}", other),
    }

    assert!(matches!(
        resolution.into_result(),
        Err(PathError::NoPath { .. })
    ));
}

#[test]
fn test_disconnected_components_never_silently_dropped() {
    // a-b connected, c-d connected, but the two components are separate.
    let edges = vec![fk("a", "b_id", "b", "id"), fk("c", "d_id", "d", "id")];

    let resolution = resolver::resolve(&required(&["a", "d"]), &edges);
    match resolution {
        Resolution::Disconnected { unreachable } => {
            assert_eq!(unreachable, vec!["d".to_string()]);
        }
        other => panic!("expected disconnected, got {:?}", other),
    }
}

#[test]
fn test_greedy_star_topology() {
    // Four required tables hanging off a shared hub that is not required.
    let edges = vec![
        fk("facts", "hub_id", "hub", "id"),
        fk("dim_a", "hub_id", "hub", "id"),
        fk("dim_b", "hub_id", "hub", "id"),
    ];

    let resolution = resolver::resolve(&required(&["facts", "dim_a", "dim_b"]), &edges);

    let path = match resolution {
        Resolution::Full(path) => path,
        other => panic!("expected full path, got {:?}", other),
    };
    assert_eq!(path.len(), 3);
    assert!(path.tables().contains("hub"));
}

#[test]
fn test_partial_connectivity_is_not_failure() {
    // Three required tables, but only two are connectable.
    let edges = vec![fk("orders", "customer_id", "customers", "id")];

    let resolution = resolver::resolve(&required(&["orders", "customers", "warehouses"]), &edges);

    match &resolution {
        Resolution::Partial { path, unreachable } => {
            assert_eq!(path.len(), 1);
            assert_eq!(unreachable, &vec!["warehouses".to_string()]);
        }
        other => panic!("expected partial, got {:?}", other),
    }

    // Callers needing full connectivity get the distinct manual-join error.
    assert!(matches!(
        resolution.into_result(),
        Err(PathError::ManualJoinNeeded { .. })
    ));
}

#[test]
fn test_stored_edge_preferred_over_heuristic() {
    // Two parallel routes between the same pair; the stored one must win.
    let mut stored = JoinEdge::new("orders", "customer_id", "customers", "id", EdgeSource::Stored, 1.0);
    stored.join_type = adhoq::graph::JoinType::Left;
    let heuristic = JoinEdge::new("orders", "id", "customers", "id", EdgeSource::Heuristic, 0.5);

    // Heuristic listed first; priority ordering must still prefer stored.
    let edges = vec![heuristic, stored];

    let resolution = resolver::resolve(&required(&["orders", "customers"]), &edges);
    match resolution {
        Resolution::Full(path) => {
            assert_eq!(path.len(), 1);
            assert_eq!(path.edges[0].source, EdgeSource::Stored);
        }
        other => panic!("expected full path, got {:?}", other),
    }
}

#[test]
fn test_single_and_empty_required_sets() {
    let edges = vec![fk("orders", "customer_id", "customers", "id")];

    match resolver::resolve(&required(&["orders"]), &edges) {
        Resolution::Full(path) => assert!(path.is_empty()),
        other => panic!("expected empty full path, got {:?}", other),
    }

    match resolver::resolve(&BTreeSet::new(), &edges) {
        Resolution::Full(path) => assert!(path.is_empty()),
        other => panic!("expected empty full path, got {:?}", other),
    }
}

#[test]
fn test_case_insensitive_table_matching() {
    let edges = vec![fk("public.Orders", "customer_id", "Customers", "id")];

    let resolution = resolver::resolve(&required(&["ORDERS", "customers"]), &edges);
    assert!(resolution.is_full());
}

#[test]
fn test_deterministic_across_calls() {
    let edges = vec![
        fk("orders", "customer_id", "customers", "id"),
        fk("orders", "region_id", "regions", "id"),
        fk("customers", "region_id", "regions", "id"),
        JoinEdge::new("orders", "id", "regions", "id", EdgeSource::Heuristic, 0.5),
    ];
    let req = required(&["orders", "customers", "regions"]);

    let first = resolver::resolve(&req, &edges);
    for _ in 0..10 {
        assert_eq!(resolver::resolve(&req, &edges), first);
    }
}

#[test]
fn test_exact_multi_hop_chain() {
    // Four-table chain resolved exactly via BFS tree building.
    let edges = vec![
        fk("a", "b_id", "b", "id"),
        fk("b", "c_id", "c", "id"),
        fk("c", "d_id", "d", "id"),
    ];

    let resolution = resolver::connect_exact(&required(&["a", "d"]), &edges);
    match resolution {
        Resolution::Full(path) => assert_eq!(path.len(), 3),
        other => panic!("expected full path, got {:?}", other),
    }
}
