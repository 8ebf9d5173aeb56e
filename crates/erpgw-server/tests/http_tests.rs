#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use common::*;
use erpgw_core::pricing::{PriceStockItem, PriceStockResult};
use erpgw_core::{GwError, GwErrorKind, SqlValue};
use erpgw_engine::{resolver_for, Backend, PricingSettings, QueryLimits};
use serde_json::json;

// ---------- auth ----------

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    // Given a request without an Authorization header
    let exec = Arc::new(FakeExecutor::returning(vec![]));
    let request = Request::builder()
        .method("POST")
        .uri("/api/sql")
        .body(Body::from(r#"{"query":"SELECT 1"}"#))
        .unwrap();

    // When it is served
    let (status, body, _) = send(app(exec.clone()), request).await;

    // Then it is refused before any query runs
    assert_eq!(status, 401);
    assert_eq!(
        body,
        json!({"error": "Unauthorized", "code": "UNAUTHORIZED", "details": {}})
    );
    assert!(exec.calls().is_empty());
}

#[tokio::test]
async fn test_wrong_token_and_scheme_rejected() {
    for header in ["Bearer nope", "Basic secret-token", "Bearer secret-token extra"] {
        let request = Request::builder()
            .uri("/api/health")
            .header("authorization", header)
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(app(Arc::new(FakeExecutor::default())), request).await;
        assert_eq!(status, 401, "header {:?}", header);
    }
}

#[tokio::test]
async fn test_scheme_is_case_insensitive() {
    let request = Request::builder()
        .uri("/api/health")
        .header("authorization", format!("bearer {}", TOKEN))
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(app(Arc::new(FakeExecutor::default())), request).await;
    assert_eq!(status, 200);
}

// ---------- routing ----------

#[tokio::test]
async fn test_unknown_api_route_is_not_found() {
    let (status, body, _) = send(app(Arc::new(FakeExecutor::default())), get("/api/nope")).await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["error"], "Not found");
    assert_eq!(body["details"], json!({}));
}

#[tokio::test]
async fn test_unknown_route_still_requires_auth() {
    let request = Request::builder().uri("/api/nope").body(Body::empty()).unwrap();
    let (status, _, _) = send(app(Arc::new(FakeExecutor::default())), request).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_wrong_method_is_not_found() {
    let (status, body, _) = send(app(Arc::new(FakeExecutor::default())), get("/api/sql")).await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_request_id_echoed_or_generated() {
    let exec = Arc::new(FakeExecutor::default());

    let mut request = get("/api/health");
    request
        .headers_mut()
        .insert("x-request-id", "client-42".parse().unwrap());
    let (_, _, head) = send(app(exec.clone()), request).await;
    assert_eq!(head.headers()["x-request-id"], "client-42");

    let (_, _, head) = send(app(exec), get("/api/health")).await;
    let generated = head.headers()["x-request-id"].to_str().unwrap();
    assert!(!generated.is_empty());
    assert_ne!(generated, "client-42");
}

// ---------- health ----------

#[tokio::test]
async fn test_health_ok() {
    let (status, body, _) = send(app(Arc::new(FakeExecutor::default())), get("/api/health")).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_health_database_down() {
    let exec = FakeExecutor::default().with_ping_failure(
        GwError::new(GwErrorKind::ResourceUnavailable).with_detail("login failed for user 'sa'"),
    );
    let (status, body, _) = send(app(Arc::new(exec)), get("/api/health")).await;
    assert_eq!(status, 503);
    assert_eq!(body["code"], "DB_UNAVAILABLE");
    assert!(!body.to_string().contains("login failed"));
}

#[tokio::test]
async fn test_health_probe_deadline() {
    let exec = Arc::new(FakeExecutor::default().with_delay(Duration::from_millis(500)));
    let mut cfg = settings();
    cfg.health_timeout = Duration::from_millis(20);
    let resolver = Arc::new(FixedResolver::new(Ok(PriceStockResult::default())));

    let (status, body, _) = send(app_with(exec, resolver, cfg), get("/api/health")).await;
    assert_eq!(status, 503);
    assert_eq!(body["code"], "DB_UNAVAILABLE");
}

// ---------- /api/sql ----------

#[tokio::test]
async fn test_select_one_end_to_end() {
    // Given a database that answers with one row
    let exec = Arc::new(FakeExecutor::returning(vec![table(json!([{"x": 1}]))]));

    // When SELECT 1 AS x is posted
    let (status, body, _) = send(app(exec.clone()), post_json("/api/sql", r#"{"query":"SELECT 1 AS x"}"#)).await;

    // Then the response carries the first set as rows and every set as recordsets
    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "api": "/api/sql",
            "status": "success",
            "rowCount": 1,
            "rows": [{"x": 1}],
            "recordsets": [[{"x": 1}]]
        })
    );
    let calls = exec.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].text, "SELECT 1 AS x");
    assert_eq!(calls[0].max_rows, Some(10_000));
}

#[tokio::test]
async fn test_params_are_bound() {
    let exec = Arc::new(FakeExecutor::returning(vec![vec![]]));
    let body = r#"{"query":"SELECT * FROM Items WHERE id = @id AND name = @name","params":{"@id":5,"name":"bolt"}}"#;

    let (status, resp, _) = send(app(exec.clone()), post_json("/api/sql", body)).await;

    assert_eq!(status, 200);
    assert_eq!(resp["rows"], json!([]));
    assert_eq!(resp["rowCount"], 0);
    let call = &exec.calls()[0];
    assert_eq!(call.param("id"), Some(&SqlValue::Int(5)));
    assert_eq!(call.param("name"), Some(&SqlValue::Text("bolt".into())));
}

#[tokio::test]
async fn test_no_result_sets_yields_empty_arrays() {
    let exec = Arc::new(FakeExecutor::returning(vec![]));
    let (status, body, _) = send(app(exec), post_json("/api/sql", r#"{"query":"SELECT 1"}"#)).await;
    assert_eq!(status, 200);
    assert_eq!(body["rows"], json!([]));
    assert_eq!(body["recordsets"], json!([]));
}

#[tokio::test]
async fn test_rejected_queries_never_execute() {
    let cases = [
        (r#"{"query":"  "}"#, "SQL_QUERY_REQUIRED"),
        (r#"{}"#, "SQL_QUERY_REQUIRED"),
        (r#"{"query":"SELECT 1; SELECT 2"}"#, "SQL_MULTI_STATEMENT"),
        (r#"{"query":"SELECT 1 -- hi"}"#, "SQL_COMMENTS_NOT_ALLOWED"),
        (r#"{"query":"DELETE FROM Items"}"#, "SQL_NOT_READ_ONLY"),
        (r#"{"query":"WITH t AS (SELECT 1 AS n) UPDATE t SET n = 2"}"#, "SQL_NOT_READ_ONLY"),
    ];
    for (body, code) in cases {
        let exec = Arc::new(FakeExecutor::returning(vec![]));
        let (status, resp, _) = send(app(exec.clone()), post_json("/api/sql", body)).await;
        assert_eq!(status, 400, "{}", body);
        assert_eq!(resp["code"], code, "{}", body);
        assert!(exec.calls().is_empty(), "{}", body);
    }
}

#[tokio::test]
async fn test_invalid_json_bodies() {
    for body in [
        "",
        "not json",
        r#"{"query":"SELECT 1"} trailing"#,
        r#"{"query":"SELECT 1"}{"query":"SELECT 2"}"#,
        r#"{"query": 5}"#,
    ] {
        let exec = Arc::new(FakeExecutor::returning(vec![]));
        let (status, resp, _) = send(app(exec.clone()), post_json("/api/sql", body)).await;
        assert_eq!(status, 400, "{:?}", body);
        assert_eq!(resp["code"], "INVALID_JSON", "{:?}", body);
        assert!(exec.calls().is_empty());
    }
}

#[tokio::test]
async fn test_oversized_body_is_invalid_json() {
    let exec = Arc::new(FakeExecutor::returning(vec![]));
    let mut cfg = settings();
    cfg.max_body_bytes = 64;
    let resolver = Arc::new(FixedResolver::new(Ok(PriceStockResult::default())));
    let body = format!(r#"{{"query":"SELECT '{}'"}}"#, "x".repeat(200));

    let (status, resp, _) = send(app_with(exec.clone(), resolver, cfg), post_json("/api/sql", body)).await;

    assert_eq!(status, 400);
    assert_eq!(resp["code"], "INVALID_JSON");
    assert!(exec.calls().is_empty());
}

#[tokio::test]
async fn test_execution_errors_map_to_status() {
    let cases = [
        (erpgw_store::errors::row_limit_exceeded(10_000), 413, "SQL_ROW_LIMIT"),
        (
            GwError::new(GwErrorKind::Execution)
                .with_message("Database query failed")
                .with_detail("Invalid object name 'dbo.Nope'"),
            500,
            "DB_ERROR",
        ),
        (erpgw_store::errors::unavailable("pool_get", "refused"), 503, "DB_UNAVAILABLE"),
    ];
    for (err, status_code, code) in cases {
        let exec = Arc::new(FakeExecutor::failing(err));
        let (status, body, _) = send(app(exec), post_json("/api/sql", r#"{"query":"SELECT 1"}"#)).await;
        assert_eq!(status, status_code);
        assert_eq!(body["code"], code);
        assert!(!body.to_string().contains("dbo.Nope"));
    }
}

#[tokio::test]
async fn test_sql_timeout() {
    let exec = Arc::new(FakeExecutor::returning(vec![]).with_delay(Duration::from_millis(500)));
    let mut cfg = settings();
    cfg.query_limits = QueryLimits {
        max_rows: 10,
        timeout: Duration::from_millis(20),
    };
    let resolver = Arc::new(FixedResolver::new(Ok(PriceStockResult::default())));

    let (status, body, _) = send(
        app_with(exec, resolver, cfg),
        post_json("/api/sql", r#"{"query":"SELECT 1"}"#),
    )
    .await;

    assert_eq!(status, 504);
    assert_eq!(body["code"], "SQL_TIMEOUT");
}

// ---------- /api/priceAndStockHandler ----------

#[tokio::test]
async fn test_price_stock_response_shape() {
    // Given a resolver with one priced item
    let mut item = PriceStockItem::empty("A1");
    item.put_price("finalPrice", Some(9.5));
    item.stock_by_warehouse.insert("01".to_string(), 4.0);
    let resolver = Arc::new(FixedResolver::new(Ok(PriceStockResult { items: vec![item] })));
    let exec = Arc::new(FakeExecutor::default());

    // When a request is posted
    let body = r#"{"skuList":["A1"],"priceList":["3"],"warehouses":["01"],"userExtId":"C100","date":"2024-05-01"}"#;
    let (status, resp, _) = send(
        app_with(exec, resolver.clone(), settings()),
        post_json("/api/priceAndStockHandler", body),
    )
    .await;

    // Then items come back with the duration in meta
    assert_eq!(status, 200);
    assert_eq!(
        resp["items"],
        json!([{"sku": "A1", "prices": {"finalPrice": 9.5}, "stockByWarehouse": {"01": 4.0}}])
    );
    assert!(resp["meta"]["durationMs"].is_u64());

    let seen = resolver.seen.lock().unwrap();
    assert_eq!(seen[0].account_id, "C100");
    assert_eq!(seen[0].price_list_hints, vec!["3"]);
    assert_eq!(seen[0].as_of.unwrap().to_string(), "2024-05-01");
}

#[tokio::test]
async fn test_price_stock_failure_code() {
    let resolver = Arc::new(FixedResolver::new(Err(GwError::new(GwErrorKind::Execution)
        .with_detail("deadlock victim"))));
    let (status, body, _) = send(
        app_with(Arc::new(FakeExecutor::default()), resolver, settings()),
        post_json("/api/priceAndStockHandler", r#"{"skuList":["A1"],"userExtId":"C1"}"#),
    )
    .await;

    assert_eq!(status, 500);
    assert_eq!(body["code"], "PRICE_STOCK_FAILED");
    assert!(!body.to_string().contains("deadlock"));
}

#[tokio::test]
async fn test_price_stock_bad_date() {
    let resolver = Arc::new(FixedResolver::new(Ok(PriceStockResult::default())));
    let (status, body, _) = send(
        app_with(Arc::new(FakeExecutor::default()), resolver.clone(), settings()),
        post_json("/api/priceAndStockHandler", r#"{"skuList":["A1"],"date":"May 1st"}"#),
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["code"], "INVALID_INPUT");
    assert!(resolver.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_rule_engine_requires_account() {
    // Given the real rule-engine resolver over a database that must not be touched
    let exec = Arc::new(FakeExecutor::default());
    let resolver = resolver_for(Backend::Sap, exec.clone(), PricingSettings::default());

    // When a request without userExtId is posted
    let (status, body, _) = send(
        app_with(exec.clone(), resolver, settings()),
        post_json("/api/priceAndStockHandler", r#"{"skuList":["A1"]}"#),
    )
    .await;

    // Then it is rejected as invalid input
    assert_eq!(status, 400);
    assert_eq!(body["code"], "INVALID_INPUT");
    assert_eq!(body["error"], "userExtId is required");
    assert!(exec.calls().is_empty());
}

#[tokio::test]
async fn test_empty_sku_list_returns_no_items() {
    let exec = Arc::new(FakeExecutor::default());
    let resolver = resolver_for(Backend::Hasavshevet, exec.clone(), PricingSettings::default());

    let (status, body, _) = send(
        app_with(exec.clone(), resolver, settings()),
        post_json("/api/priceAndStockHandler", r#"{"skuList":[" ",""],"userExtId":"C1"}"#),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["items"], json!([]));
    assert!(exec.calls().is_empty());
}
