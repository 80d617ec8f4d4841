// tests/planner/plan_test.rs
use adhoq::catalog::ColumnType;
use adhoq::error::ConfigError;
use adhoq::graph::{EdgeSource, JoinEdge, JoinPath, JoinType};
use adhoq::planner::{ColumnTypes, PlanBuilder};
use adhoq::report::ReportConfig;
use adhoq::sql::Dialect;

fn orders_customers_path() -> JoinPath {
    JoinPath {
        edges: vec![JoinEdge::new(
            "orders",
            "customer_id",
            "customers",
            "id",
            EdgeSource::ForeignKey,
            0.9,
        )],
    }
}

fn sample_types() -> ColumnTypes {
    let mut types = ColumnTypes::new();
    types.insert("orders", "id", ColumnType::Integer);
    types.insert("orders", "amount", ColumnType::Decimal);
    types.insert("orders", "status", ColumnType::Text);
    types.insert("orders", "ordered_at", ColumnType::Timestamp);
    types.insert("customers", "id", ColumnType::Integer);
    types.insert("customers", "name", ColumnType::Text);
    types
}

fn config(raw: &str) -> ReportConfig {
    ReportConfig::from_json(raw).unwrap()
}

#[test]
fn test_join_chain_emission() {
    let cfg = config(
        r#"{
            "connection_id": "c",
            "columns": [{"field": "orders.amount"}],
            "groups": [{"field": "customers.name"}]
        }"#,
    );

    let plan = PlanBuilder::new(Dialect::Postgres)
        .build(&cfg, &orders_customers_path(), &sample_types())
        .unwrap();

    let sql = plan.sql();
    assert!(sql.contains("FROM \"orders\""));
    assert!(sql.contains(
        "INNER JOIN \"customers\" ON \"orders\".\"customer_id\" = \"customers\".\"id\""
    ));
}

#[test]
fn test_aggregation_defaults_under_grouping() {
    let cfg = config(
        r#"{
            "connection_id": "c",
            "columns": [
                {"field": "orders.amount"},
                {"field": "orders.status"}
            ],
            "groups": [{"field": "customers.name"}]
        }"#,
    );

    let plan = PlanBuilder::new(Dialect::Postgres)
        .build(&cfg, &orders_customers_path(), &sample_types())
        .unwrap();

    let sql = plan.sql();
    // Numeric column defaults to SUM, non-numeric to COUNT.
    assert!(sql.contains("SUM(\"orders\".\"amount\") AS \"orders_amount\""));
    assert!(sql.contains("COUNT(\"orders\".\"status\") AS \"orders_status\""));
    assert!(sql.contains("GROUP BY \"customers\".\"name\""));
}

#[test]
fn test_no_grouping_selects_raw() {
    let cfg = config(
        r#"{
            "connection_id": "c",
            "columns": [{"field": "orders.amount"}]
        }"#,
    );

    let plan = PlanBuilder::new(Dialect::Postgres)
        .build(&cfg, &JoinPath::new(), &sample_types())
        .unwrap();

    let sql = plan.sql();
    assert!(sql.contains("\"orders\".\"amount\" AS \"orders_amount\""));
    assert!(!sql.contains("SUM("));
    assert!(!sql.contains("GROUP BY"));
}

#[test]
fn test_explicit_none_stays_raw_under_grouping() {
    let cfg = config(
        r#"{
            "connection_id": "c",
            "columns": [{"field": "orders.amount", "agg": "NONE"}],
            "groups": [{"field": "customers.name"}]
        }"#,
    );

    let plan = PlanBuilder::new(Dialect::Postgres)
        .build(&cfg, &orders_customers_path(), &sample_types())
        .unwrap();

    assert!(!plan.sql().contains("SUM("));
}

#[test]
fn test_month_bucket_dialect_divergence() {
    let raw = r#"{
        "connection_id": "c",
        "columns": [{"field": "orders.amount"}],
        "groups": [{"field": "orders.ordered_at", "method": "month"}]
    }"#;

    let pg = PlanBuilder::new(Dialect::Postgres)
        .build(&config(raw), &JoinPath::new(), &sample_types())
        .unwrap();
    let lite = PlanBuilder::new(Dialect::Sqlite)
        .build(&config(raw), &JoinPath::new(), &sample_types())
        .unwrap();

    // Same logical bucket, engine-specific expression text.
    assert!(pg
        .sql()
        .contains("DATE_TRUNC('month', \"orders\".\"ordered_at\")"));
    assert!(lite
        .sql()
        .contains("STRFTIME('%Y-%m-01', \"orders\".\"ordered_at\")"));

    // The bucket expression is repeated in GROUP BY, not aliased.
    let pg_sql = pg.sql();
    let first = pg_sql.find("DATE_TRUNC").unwrap();
    assert!(pg_sql[first + 1..].contains("DATE_TRUNC"));

    // Output aliases are identical across dialects.
    assert_eq!(pg.columns, lite.columns);
    assert_eq!(pg.columns[0], "orders_ordered_at_month");
}

#[test]
fn test_bucket_method_on_wrong_type_degrades_to_exact() {
    let cfg = config(
        r#"{
            "connection_id": "c",
            "columns": [{"field": "orders.amount"}],
            "groups": [{"field": "orders.status", "method": "month"}]
        }"#,
    );

    let plan = PlanBuilder::new(Dialect::Postgres)
        .build(&cfg, &JoinPath::new(), &sample_types())
        .unwrap();

    let sql = plan.sql();
    assert!(!sql.contains("DATE_TRUNC"));
    assert!(sql.contains("GROUP BY \"orders\".\"status\""));
}

#[test]
fn test_range_bucket() {
    let cfg = config(
        r#"{
            "connection_id": "c",
            "columns": [{"field": "orders.id"}],
            "groups": [{"field": "orders.amount", "method": "range", "size": 50}]
        }"#,
    );

    let plan = PlanBuilder::new(Dialect::Postgres)
        .build(&cfg, &JoinPath::new(), &sample_types())
        .unwrap();

    let sql = plan.sql();
    assert!(sql.contains("FLOOR(\"orders\".\"amount\" / 50.0) * 50.0"));
    assert!(plan.columns.contains(&"orders_amount_bucket".to_string()));
}

#[test]
fn test_unknown_table_rejected() {
    let cfg = config(
        r#"{
            "connection_id": "c",
            "columns": [{"field": "orders.amount"}, {"field": "warehouses.bin"}]
        }"#,
    );

    let err = PlanBuilder::new(Dialect::Postgres)
        .build(&cfg, &JoinPath::new(), &sample_types())
        .unwrap_err();

    assert_eq!(
        err,
        ConfigError::UnknownTable {
            table: "warehouses".into(),
            field: "warehouses.bin".into(),
        }
    );
}

#[test]
fn test_filters() {
    let cfg = config(
        r#"{
            "connection_id": "c",
            "columns": [{"field": "orders.amount"}],
            "filters": [
                {"field": "orders.status", "op": "IN", "val": "open, closed"},
                {"field": "orders.amount", "op": ">", "val": 100},
                {"field": "orders.ordered_at", "op": "IS NOT NULL"},
                {"field": "orders.status", "op": "=", "val": ""}
            ]
        }"#,
    );

    let plan = PlanBuilder::new(Dialect::Postgres)
        .build(&cfg, &JoinPath::new(), &sample_types())
        .unwrap();

    let sql = plan.sql();
    assert!(sql.contains("\"orders\".\"status\" IN ('open', 'closed')"));
    assert!(sql.contains("\"orders\".\"amount\" > 100"));
    assert!(sql.contains("\"orders\".\"ordered_at\" IS NOT NULL"));
    // The empty-valued equality filter is dropped, not emitted malformed.
    assert!(!sql.contains("= ''"));
}

#[test]
fn test_string_values_escaped() {
    let cfg = config(
        r#"{
            "connection_id": "c",
            "columns": [{"field": "orders.amount"}],
            "filters": [
                {"field": "orders.status", "op": "=", "val": "O'Brien'; DROP TABLE x; --"}
            ]
        }"#,
    );

    let plan = PlanBuilder::new(Dialect::Postgres)
        .build(&cfg, &JoinPath::new(), &sample_types())
        .unwrap();

    let sql = plan.sql();
    assert!(sql.contains("'O''Brien''; DROP TABLE x; --'"));
}

#[test]
fn test_sorting_and_pagination() {
    let cfg = config(
        r#"{
            "connection_id": "c",
            "columns": [{"field": "orders.amount"}],
            "sorts": [{"field": "orders.amount", "dir": "DESC"}],
            "page": 3,
            "page_size": 20
        }"#,
    );

    let plan = PlanBuilder::new(Dialect::Postgres)
        .build(&cfg, &JoinPath::new(), &sample_types())
        .unwrap();

    let sql = plan.sql();
    assert!(sql.contains("ORDER BY \"orders\".\"amount\" DESC"));
    assert!(sql.contains("LIMIT 20 OFFSET 40"));
}

#[test]
fn test_pagination_garbage_defaults() {
    let cfg = config(
        r#"{
            "connection_id": "c",
            "columns": [{"field": "orders.amount"}],
            "page": "garbage",
            "page_size": 0
        }"#,
    );

    let plan = PlanBuilder::new(Dialect::Postgres)
        .build(&cfg, &JoinPath::new(), &sample_types())
        .unwrap();

    assert!(plan.sql().contains("LIMIT 100 OFFSET 0"));
}

#[test]
fn test_calculated_field_substitution() {
    let cfg = config(
        r#"{
            "connection_id": "c",
            "columns": [{"field": "orders.amount"}],
            "calculated_fields": [
                {"name": "double_amount", "formula": "[orders.amount] * 2"}
            ]
        }"#,
    );

    let plan = PlanBuilder::new(Dialect::Postgres)
        .build(&cfg, &JoinPath::new(), &sample_types())
        .unwrap();

    let sql = plan.sql();
    assert!(sql.contains("\"orders\".\"amount\" * 2 AS \"double_amount\""));
    assert!(plan.columns.contains(&"double_amount".to_string()));

    // MySQL gets backtick quoting inside the substituted text.
    let my = PlanBuilder::new(Dialect::MySql)
        .build(&cfg, &JoinPath::new(), &sample_types())
        .unwrap();
    assert!(my.sql().contains("`orders`.`amount` * 2"));
}

#[test]
fn test_calculated_field_unknown_table_rejected() {
    let cfg = config(
        r#"{
            "connection_id": "c",
            "columns": [{"field": "orders.amount"}],
            "calculated_fields": [
                {"name": "x", "formula": "[elsewhere.value] * 2"}
            ]
        }"#,
    );

    let err = PlanBuilder::new(Dialect::Postgres)
        .build(&cfg, &JoinPath::new(), &sample_types())
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnknownTable { .. }));
}

#[test]
fn test_count_sql_wraps_grouped_query() {
    let cfg = config(
        r#"{
            "connection_id": "c",
            "columns": [{"field": "orders.amount"}],
            "groups": [{"field": "customers.name"}]
        }"#,
    );

    let plan = PlanBuilder::new(Dialect::Postgres)
        .build(&cfg, &orders_customers_path(), &sample_types())
        .unwrap();

    let count_sql = plan.count_sql();
    assert!(count_sql.starts_with("SELECT COUNT(*)"));
    assert!(count_sql.contains("GROUP BY"));
    assert!(count_sql.trim_end().ends_with("AS \"grouped\""));
    assert!(!count_sql.contains("LIMIT"));
}

#[test]
fn test_full_join_downgrade_on_sqlite() {
    let mut edge = JoinEdge::new(
        "orders",
        "customer_id",
        "customers",
        "id",
        EdgeSource::Stored,
        1.0,
    );
    edge.join_type = JoinType::Full;
    let path = JoinPath { edges: vec![edge] };

    let cfg = config(
        r#"{
            "connection_id": "c",
            "columns": [{"field": "orders.amount"}, {"field": "customers.name"}]
        }"#,
    );

    let pg = PlanBuilder::new(Dialect::Postgres)
        .build(&cfg, &path, &sample_types())
        .unwrap();
    assert!(pg.sql().contains("FULL OUTER JOIN"));

    let lite = PlanBuilder::new(Dialect::Sqlite)
        .build(&cfg, &path, &sample_types())
        .unwrap();
    assert!(lite.sql().contains("LEFT JOIN"));
    assert!(!lite.sql().contains("FULL"));
}

#[test]
fn test_output_columns_in_select_order() {
    let cfg = config(
        r#"{
            "connection_id": "c",
            "columns": [{"field": "orders.amount"}],
            "groups": [{"field": "customers.name"}],
            "calculated_fields": [{"name": "flag", "formula": "1"}]
        }"#,
    );

    let plan = PlanBuilder::new(Dialect::Postgres)
        .build(&cfg, &orders_customers_path(), &sample_types())
        .unwrap();

    assert_eq!(
        plan.columns,
        vec!["customers_name", "orders_amount", "flag"]
    );
}
