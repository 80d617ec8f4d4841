// tests/exec/executor_test.rs
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use adhoq::catalog::ColumnType;
use adhoq::error::FailureKind;
use adhoq::exec::{
    execute_plan, BackendError, CellValue, QueryRows, ReportResponse, SqlBackend,
};
use adhoq::graph::JoinPath;
use adhoq::planner::{ColumnTypes, PlanBuilder};
use adhoq::report::ReportConfig;
use adhoq::sql::Dialect;

/// Backend that replays scripted responses and records executed SQL.
struct ScriptedBackend {
    log: Mutex<Vec<String>>,
    responses: Mutex<VecDeque<Result<QueryRows, BackendError>>>,
}

impl ScriptedBackend {
    fn new(responses: Vec<Result<QueryRows, BackendError>>) -> Self {
        Self {
            log: Mutex::new(vec![]),
            responses: Mutex::new(responses.into()),
        }
    }

    fn executed(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl SqlBackend for ScriptedBackend {
    async fn execute(&self, sql: &str) -> Result<QueryRows, BackendError> {
        self.log.lock().unwrap().push(sql.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(QueryRows::default()))
    }

    async fn ping(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

fn sample_plan() -> adhoq::planner::QueryPlan {
    let cfg = ReportConfig::from_json(
        r#"{
            "connection_id": "c",
            "columns": [{"field": "orders.amount"}, {"field": "orders.status"}],
            "page": 2,
            "page_size": 2
        }"#,
    )
    .unwrap();

    let mut types = ColumnTypes::new();
    types.insert("orders", "amount", ColumnType::Decimal);
    types.insert("orders", "status", ColumnType::Text);

    PlanBuilder::new(Dialect::Postgres)
        .build(&cfg, &JoinPath::new(), &types)
        .unwrap()
}

fn count_rows(total: i64) -> QueryRows {
    QueryRows {
        columns: vec!["total_rows".into()],
        rows: vec![vec![CellValue::Int(total)]],
    }
}

#[tokio::test]
async fn test_count_then_page() {
    let backend = ScriptedBackend::new(vec![
        Ok(count_rows(41)),
        Ok(QueryRows {
            columns: vec![],
            rows: vec![
                vec![CellValue::Float(10.5), CellValue::Text("open".into())],
                vec![CellValue::Float(7.0), CellValue::Null],
            ],
        }),
    ]);

    let result = execute_plan(&backend, &sample_plan()).await.unwrap();

    let executed = backend.executed();
    assert_eq!(executed.len(), 2);
    assert!(executed[0].contains("COUNT(*)"));
    assert!(!executed[0].contains("LIMIT"));
    assert!(executed[1].contains("LIMIT 2 OFFSET 2"));

    assert_eq!(result.total_rows, 41);
    assert_eq!(result.columns, vec!["orders_amount", "orders_status"]);
    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.rows[0]["orders_amount"], serde_json::json!(10.5));
    assert_eq!(result.rows[0]["orders_status"], serde_json::json!("open"));
    assert_eq!(result.rows[1]["orders_status"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_backend_failure_categorized() {
    let backend = ScriptedBackend::new(vec![Err(BackendError::Sql(
        "syntax error near SELECT".into(),
    ))]);

    let err = execute_plan(&backend, &sample_plan()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Sql);
    assert!(err.message.contains("syntax error"));

    let backend = ScriptedBackend::new(vec![
        Ok(count_rows(1)),
        Err(BackendError::Timeout("deadline exceeded".into())),
    ]);
    let err = execute_plan(&backend, &sample_plan()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn test_empty_count_result_is_zero() {
    let backend = ScriptedBackend::new(vec![Ok(QueryRows::default()), Ok(QueryRows::default())]);

    let result = execute_plan(&backend, &sample_plan()).await.unwrap();
    assert_eq!(result.total_rows, 0);
    assert!(result.rows.is_empty());
}

#[tokio::test]
async fn test_errors_render_as_data() {
    let backend = ScriptedBackend::new(vec![Err(BackendError::Connection("refused".into()))]);

    let outcome = execute_plan(&backend, &sample_plan())
        .await
        .map_err(adhoq::error::ReportError::from);
    let response = ReportResponse::from(outcome);

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"error": "connection failure: refused"})
    );
}
