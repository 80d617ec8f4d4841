// tests/report/config_test.rs
use adhoq::error::ConfigError;
use adhoq::report::{
    Aggregation, FilterOp, GroupMethod, ReportConfig, SortDirection, DEFAULT_PAGE,
    DEFAULT_PAGE_SIZE,
};

#[test]
fn test_full_wire_contract() {
    let raw = r#"{
        "connection_id": "conn-1",
        "columns": [
            {"field": "orders.amount", "agg": "SUM"},
            {"field": "orders.id", "agg": "COUNT"},
            {"field": "customers.name"}
        ],
        "groups": [
            {"field": "customers.region", "method": "exact"},
            {"field": "orders.ordered_at", "method": "month"},
            {"field": "orders.amount", "method": "range", "size": 50}
        ],
        "filters": [
            {"field": "orders.status", "op": "=", "val": "open"},
            {"field": "orders.amount", "op": ">", "val": 100},
            {"field": "orders.closed_at", "op": "IS NULL"},
            {"field": "customers.tier", "op": "IN", "val": "gold,silver"}
        ],
        "sorts": [{"field": "orders.amount", "dir": "DESC"}],
        "calculated_fields": [
            {"name": "margin", "formula": "[orders.revenue] - [orders.cost]"}
        ],
        "joins": [
            {
                "left_table": "orders",
                "left_column": "customer_id",
                "right_table": "customers",
                "right_column": "id",
                "join_type": "LEFT"
            }
        ],
        "page": 2,
        "page_size": 50
    }"#;

    let config = ReportConfig::from_json(raw).unwrap();
    config.validate().unwrap();

    assert_eq!(config.columns.len(), 3);
    assert_eq!(config.columns[0].agg, Some(Aggregation::Sum));
    assert_eq!(config.columns[2].agg, None);

    assert_eq!(config.groups[0].method, GroupMethod::Exact);
    assert_eq!(config.groups[1].method, GroupMethod::Month);
    assert_eq!(config.groups[2].method, GroupMethod::Range);
    assert_eq!(config.groups[2].size, Some(50.0));

    assert_eq!(config.filters[2].op, FilterOp::IsNull);
    assert_eq!(config.filters[3].op, FilterOp::In);
    assert_eq!(config.sorts[0].dir, SortDirection::Desc);

    assert_eq!(config.joins.len(), 1);
    let edge = &config.adhoc_edges()[0];
    assert_eq!(edge.join_type, adhoq::graph::JoinType::Left);
    assert_eq!(edge.confidence, 1.0);

    assert_eq!(config.page(), 2);
    assert_eq!(config.page_size(), 50);

    let tables = config.referenced_tables().unwrap();
    assert_eq!(
        tables.into_iter().collect::<Vec<_>>(),
        vec!["customers", "orders"]
    );
}

#[test]
fn test_pagination_never_fails() {
    for (page, page_size) in [
        (r#""page": 0"#, r#""page_size": -5"#),
        (r#""page": "zero""#, r#""page_size": "many""#),
        (r#""page": null"#, r#""page_size": null"#),
        (r#""page": [2]"#, r#""page_size": {"n": 3}"#),
    ] {
        let raw = format!(
            r#"{{"connection_id": "c", "columns": [{{"field": "t.c"}}], {}, {}}}"#,
            page, page_size
        );
        let config = ReportConfig::from_json(&raw).unwrap();
        assert_eq!(config.page(), DEFAULT_PAGE, "input: {}", page);
        assert_eq!(config.page_size(), DEFAULT_PAGE_SIZE, "input: {}", page_size);
    }
}

#[test]
fn test_bad_field_refs_rejected_at_parse() {
    for field in ["orders", "a.b.c", ".x", "x.", "or ders.id", "t.c; DROP TABLE users"] {
        let raw = format!(
            r#"{{"connection_id": "c", "columns": [{{"field": "{}"}}]}}"#,
            field
        );
        assert!(ReportConfig::from_json(&raw).is_err(), "accepted: {}", field);
    }
}

#[test]
fn test_unknown_group_method_falls_back_to_exact() {
    let raw = r#"{
        "connection_id": "c",
        "groups": [{"field": "t.c", "method": "fortnight"}]
    }"#;
    let config = ReportConfig::from_json(raw).unwrap();
    assert_eq!(config.groups[0].method, GroupMethod::Exact);
}

#[test]
fn test_unknown_filter_op_rejected() {
    let raw = r#"{
        "connection_id": "c",
        "columns": [{"field": "t.c"}],
        "filters": [{"field": "t.c", "op": "BETWEEN", "val": 1}]
    }"#;
    assert!(ReportConfig::from_json(raw).is_err());
}

#[test]
fn test_lowercase_enum_aliases() {
    let raw = r#"{
        "connection_id": "c",
        "columns": [{"field": "t.c", "agg": "sum"}],
        "sorts": [{"field": "t.c", "dir": "desc"}]
    }"#;
    let config = ReportConfig::from_json(raw).unwrap();
    assert_eq!(config.columns[0].agg, Some(Aggregation::Sum));
    assert_eq!(config.sorts[0].dir, SortDirection::Desc);
}

#[test]
fn test_validation_errors() {
    let no_selection = ReportConfig::from_json(r#"{"connection_id": "c"}"#).unwrap();
    assert_eq!(no_selection.validate(), Err(ConfigError::EmptySelection));

    let no_connection =
        ReportConfig::from_json(r#"{"columns": [{"field": "t.c"}]}"#).unwrap();
    assert_eq!(no_connection.validate(), Err(ConfigError::MissingConnection));

    let bad_formula = ReportConfig::from_json(
        r#"{
            "connection_id": "c",
            "columns": [{"field": "t.c"}],
            "calculated_fields": [{"name": "x", "formula": "[not a token]"}]
        }"#,
    )
    .unwrap();
    assert!(matches!(
        bad_formula.validate(),
        Err(ConfigError::MalformedFormulaToken { .. })
    ));
}
