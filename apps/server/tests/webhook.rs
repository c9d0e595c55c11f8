use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use banksync_core::ledger::MockLedgerClient;
use banksync_core::{LedgerAccount, PipelineHandle};
use banksync_server::api::{app_router, AppState, NOTIFICATION_IGNORED, TRANSACTION_RECEIVED};
use banksync_server::{build_pipeline, config::Config, validate_mappings};
use tower::ServiceExt;

const WEBHOOK_PATH: &str = "/abcdefghijklmnopqrstuvwxyz0123456";

fn test_config() -> Config {
    let env: HashMap<&str, &str> = HashMap::from([
        ("MONOBANK_API_TOKEN", "mono-token"),
        ("BANKSYNC_PUBLIC_HOST", "http://localhost:3000"),
        ("FFI_URL", "http://localhost:8080"),
        ("FFI_TOKEN", "ffi-token"),
    ]);
    Config::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap()
}

fn build_test_router(ledger: &MockLedgerClient) -> (Router, PipelineHandle) {
    let (_, intake, pipeline) = build_pipeline(&test_config(), Arc::new(ledger.clone()));
    (app_router(Arc::new(AppState { intake }), WEBHOOK_PATH), pipeline)
}

fn mapped_ledger() -> MockLedgerClient {
    MockLedgerClient::new(vec![
        LedgerAccount::new("1", "Cash", ""),
        LedgerAccount::new("2", "Mono black", "fbs.mono:black-1"),
    ])
}

fn statement_item(id: &str, amount: i64) -> String {
    serde_json::json!({
        "type": "StatementItem",
        "data": {
            "account": "black-1",
            "statementItem": {
                "id": id,
                "time": 1_700_000_000,
                "description": "Coffee",
                "mcc": 5814,
                "originalMcc": 5814,
                "hold": true,
                "amount": amount,
                "operationAmount": amount,
                "currencyCode": 980,
                "commissionRate": 0,
                "cashbackAmount": 0,
                "balance": 100000,
                "comment": "",
                "receiptId": "",
                "invoiceId": "",
                "counterEdrpou": "",
                "counterIban": "",
                "counterName": ""
            }
        }
    })
    .to_string()
}

fn post(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(WEBHOOK_PATH)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn verification_get_returns_empty_ok() {
    let ledger = mapped_ledger();
    let (app, _pipeline) = build_test_router(&ledger);

    let response = app
        .oneshot(
            Request::builder()
                .uri(WEBHOOK_PATH)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.is_empty());
}

#[tokio::test]
async fn statement_item_is_forwarded_to_ledger() {
    let ledger = mapped_ledger();
    let (app, pipeline) = build_test_router(&ledger);

    let response = app
        .clone()
        .oneshot(post(statement_item("tx-1", -4500)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, TRANSACTION_RECEIVED);

    // Dropping the router closes the intake so the pipeline can drain.
    drop(app);
    let stats = pipeline.stopped().await;
    assert_eq!(stats.succeeded, 1);

    let stored = ledger.stored();
    assert_eq!(stored.len(), 1);
    let split = &stored[0].transactions[0];
    assert_eq!(split.amount, "45.00");
    assert_eq!(split.source_id.as_deref(), Some("2"));
    assert_eq!(split.external_id, "AccountId: black-1");
    assert_eq!(split.internal_reference, "tx-1");
}

#[tokio::test]
async fn unmapped_account_is_acknowledged_but_not_stored() {
    let ledger = MockLedgerClient::new(vec![LedgerAccount::new("1", "Cash", "")]);
    let (app, pipeline) = build_test_router(&ledger);

    let response = app
        .clone()
        .oneshot(post(statement_item("tx-2", 1000)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    drop(app);
    let stats = pipeline.stopped().await;
    assert_eq!(stats.failed, 1);
    assert!(ledger.stored().is_empty());
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let ledger = mapped_ledger();
    let (app, _pipeline) = build_test_router(&ledger);

    let response = app.oneshot(post("{not json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn statement_item_without_amount_is_rejected() {
    let ledger = mapped_ledger();
    let (app, _pipeline) = build_test_router(&ledger);

    let body = r#"{"type":"StatementItem","data":{"account":"black-1",
        "statementItem":{"id":"x","time":1700000000,"currencyCode":980}}}"#;
    let response = app.oneshot(post(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn other_notification_types_are_ignored() {
    let ledger = mapped_ledger();
    let (app, pipeline) = build_test_router(&ledger);

    let response = app
        .clone()
        .oneshot(post(r#"{"type":"AccountUpdate","data":{}}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, NOTIFICATION_IGNORED);

    drop(app);
    assert_eq!(pipeline.stopped().await.dispatched, 0);
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let ledger = mapped_ledger();
    let (app, _pipeline) = build_test_router(&ledger);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/guess")
                .body(Body::from(statement_item("tx-3", 1)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_check_reports_ok() {
    let ledger = mapped_ledger();
    let (app, _pipeline) = build_test_router(&ledger);

    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn ambiguous_mappings_abort_startup() {
    let ledger = MockLedgerClient::new(vec![
        LedgerAccount::new("10", "Card", "fbs.mono:black-1"),
        LedgerAccount::new("11", "Card copy", "fbs.mono:black-1"),
    ]);
    let (resolver, _intake, _pipeline) = build_pipeline(&test_config(), Arc::new(ledger));
    assert!(validate_mappings(&resolver).await.is_err());
}

#[tokio::test]
async fn unreachable_ledger_does_not_abort_startup() {
    let ledger = mapped_ledger();
    ledger.fail_accounts(Some("connection refused"));
    let (resolver, _intake, _pipeline) = build_pipeline(&test_config(), Arc::new(ledger));
    assert!(validate_mappings(&resolver).await.is_ok());
}
