// tests/suggest/suggest_test.rs
use adhoq::catalog::{ColumnInfo, ColumnType, ForeignKeyInfo, StaticCatalog, TableMetadata};
use adhoq::graph::store::{JoinStore, StoredJoin};
use adhoq::graph::{Cardinality, EdgeSource, JoinType};
use adhoq::suggest::{confidence, SuggestionEngine};

fn table(name: &str, columns: &[(&str, ColumnType)]) -> TableMetadata {
    TableMetadata {
        name: name.into(),
        columns: columns
            .iter()
            .map(|(c, t)| ColumnInfo::new(c, *t))
            .collect(),
        primary_key: vec![],
        foreign_keys: vec![],
    }
}

fn sample_catalog() -> StaticCatalog {
    let mut orders = table(
        "orders",
        &[
            ("id", ColumnType::Integer),
            ("customer_id", ColumnType::Integer),
            ("amount", ColumnType::Decimal),
        ],
    );
    orders.foreign_keys.push(ForeignKeyInfo {
        column: "customer_id".into(),
        referred_table: "customers".into(),
        referred_column: "id".into(),
    });

    let customers = table(
        "customers",
        &[
            ("id", ColumnType::Integer),
            ("region_id", ColumnType::Integer),
            ("name", ColumnType::Text),
        ],
    );
    let regions = table(
        "regions",
        &[("id", ColumnType::Integer), ("name", ColumnType::Text)],
    );

    StaticCatalog::new()
        .with_table(orders)
        .with_table(customers)
        .with_table(regions)
}

fn candidates(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_sources_and_priority_order() {
    let store = JoinStore::open_in_memory().unwrap();
    store
        .upsert(&StoredJoin {
            connection_id: "conn-1".into(),
            left_table: "orders".into(),
            left_column: "customer_id".into(),
            right_table: "customers".into(),
            right_column: "id".into(),
            join_type: JoinType::Left,
            cardinality: Cardinality::ManyToOne,
        })
        .unwrap();

    let catalog = sample_catalog();
    let engine = SuggestionEngine::new(&store, &catalog);

    let edges = engine
        .discover_edges("conn-1", &candidates(&["orders", "customers", "regions"]))
        .await;

    // Stored orders-customers shadows the identical FK edge; the
    // customers-regions link comes from the id naming convention; the
    // orders-regions pair only shares the conventional "id" key.
    assert_eq!(edges.len(), 3);
    assert_eq!(edges[0].source, EdgeSource::Stored);
    assert_eq!(edges[0].join_type, JoinType::Left);
    assert_eq!(edges[1].source, EdgeSource::Heuristic);
    assert_eq!(edges[1].left_table, "customers");
    assert_eq!(edges[1].right_table, "regions");
    assert_eq!(edges[1].confidence, confidence::ID_CONVENTION);
    assert_eq!(edges[2].source, EdgeSource::Heuristic);
    assert_eq!(edges[2].confidence, confidence::SHARED_KEY);
}

#[tokio::test]
async fn test_foreign_key_edges_without_store() {
    let store = JoinStore::open_in_memory().unwrap();
    let catalog = sample_catalog();
    let engine = SuggestionEngine::new(&store, &catalog);

    let edges = engine
        .discover_edges("conn-1", &candidates(&["orders", "customers"]))
        .await;

    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].source, EdgeSource::ForeignKey);
    assert_eq!(edges[0].confidence, confidence::FOREIGN_KEY);
    assert_eq!(edges[0].left_column, "customer_id");
    assert_eq!(edges[0].cardinality, Cardinality::ManyToOne);
}

#[tokio::test]
async fn test_fk_to_table_outside_candidates_ignored() {
    let store = JoinStore::open_in_memory().unwrap();
    let catalog = sample_catalog();
    let engine = SuggestionEngine::new(&store, &catalog);

    // customers is not a candidate, so the orders FK must not surface.
    // The only remaining signal is the weak shared-id heuristic.
    let edges = engine
        .discover_edges("conn-1", &candidates(&["orders", "regions"]))
        .await;

    assert!(edges.iter().all(|e| e.source == EdgeSource::Heuristic));
    assert!(!edges
        .iter()
        .any(|e| e.left_table == "customers" || e.right_table == "customers"));
}

#[tokio::test]
async fn test_shared_business_key_heuristic() {
    let store = JoinStore::open_in_memory().unwrap();
    let catalog = StaticCatalog::new()
        .with_table(table(
            "products",
            &[("sku", ColumnType::Text), ("name", ColumnType::Text)],
        ))
        .with_table(table(
            "stock_levels",
            &[("sku", ColumnType::Text), ("on_hand", ColumnType::Integer)],
        ));
    let engine = SuggestionEngine::new(&store, &catalog);

    let edges = engine
        .discover_edges("conn-1", &candidates(&["products", "stock_levels"]))
        .await;

    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].source, EdgeSource::Heuristic);
    assert_eq!(edges[0].confidence, confidence::SHARED_KEY);
    assert_eq!(edges[0].left_column, "sku");
    assert_eq!(edges[0].right_column, "sku");
}

#[tokio::test]
async fn test_failed_introspection_degrades_gracefully() {
    let store = JoinStore::open_in_memory().unwrap();
    let catalog = sample_catalog();
    let engine = SuggestionEngine::new(&store, &catalog);

    // "phantom" is not introspectable; discovery continues for the rest.
    let edges = engine
        .discover_edges("conn-1", &candidates(&["orders", "customers", "phantom"]))
        .await;

    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].source, EdgeSource::ForeignKey);
}

#[tokio::test]
async fn test_repeated_calls_identical() {
    let store = JoinStore::open_in_memory().unwrap();
    let catalog = sample_catalog();
    let engine = SuggestionEngine::new(&store, &catalog);
    let cand = candidates(&["orders", "customers", "regions"]);

    let first = engine.discover_edges("conn-1", &cand).await;
    for _ in 0..5 {
        assert_eq!(engine.discover_edges("conn-1", &cand).await, first);
    }
}
