//! HTTP 集成测试：内存仓储 + 链客户端替身驱动完整路由
//!
//! 运行方式：
//! ```bash
//! cargo test --test api_test
//! ```

mod common;

use axum::http::{Method, StatusCode};
use common::spawn_app;
use rust_decimal::Decimal;
use serde_json::json;
use wallet_manager::service::currency::ManagerError;

// ============ 创建钱包 ============

#[tokio::test]
async fn test_create_wallet_persists_generated_keys() {
    let app = spawn_app(&["ETH"]);

    let (status, _, body) = app
        .request(Method::POST, "/wallets/", Some(json!({"currency": "ETH"})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["currency"], "ETH");
    assert!(body.get("private_key").is_none());
    assert!(body.get("balance").is_none());

    let generated = app.chain().generated.clone();
    let stored = app.repo.all();
    assert_eq!(generated.len(), 1);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].public_key, generated[0].public_key);
    assert_eq!(stored[0].private_key, generated[0].private_key);
    assert_eq!(body["public_key"], generated[0].public_key);
    assert_eq!(body["id"], stored[0].id);
}

#[tokio::test]
async fn test_create_wallet_under_api_prefix() {
    let app = spawn_app(&["ETH"]);
    let (status, _, _) = app
        .request(Method::POST, "/api/v1/wallets", Some(json!({"currency": "ETH"})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(app.repo.all().len(), 1);
}

#[tokio::test]
async fn test_create_wallet_rejects_long_code_without_chain_call() {
    let app = spawn_app(&["ETH"]);

    let (status, _, body) = app
        .request(Method::POST, "/wallets/", Some(json!({"currency": "FAKE"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"currency": ["Ensure this field has no more than 3 characters."]})
    );
    assert_eq!(app.chain().chain_calls(), 0);
    assert!(app.repo.all().is_empty());
}

#[tokio::test]
async fn test_create_wallet_field_errors() {
    let app = spawn_app(&["ETH"]);

    let cases = vec![
        (json!({}), "This field is required."),
        (json!({"currency": ""}), "This field may not be blank."),
        (json!({"currency": null}), "This field may not be null."),
        (json!({"currency": "ET"}), "Ensure this field has at least 3 characters."),
    ];
    for (payload, expected) in cases {
        let (status, _, body) = app.request(Method::POST, "/wallets/", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["currency"][0], expected);
    }
    assert_eq!(app.chain().chain_calls(), 0);
    assert!(app.repo.all().is_empty());
}

#[tokio::test]
async fn test_create_wallet_unsupported_currency() {
    let app = spawn_app(&["ETH"]);

    let (status, _, body) = app
        .request(Method::POST, "/wallets/", Some(json!({"currency": "BTC"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Currency BTC is not supported");
    assert_eq!(body["code"], "chain_not_supported");
    assert!(app.chain().generated.is_empty());
    assert!(app.repo.all().is_empty());
}

#[tokio::test]
async fn test_create_wallet_malformed_json() {
    let app = spawn_app(&["ETH"]);
    let req = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/wallets/")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let (status, _, body) = app.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
    assert!(app.repo.all().is_empty());
}

#[tokio::test]
async fn test_create_wallet_non_object_body() {
    let app = spawn_app(&["ETH"]);
    let (status, _, body) = app
        .request(Method::POST, "/wallets/", Some(json!(["ETH"])))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["non_field_errors"][0],
        "Invalid data. Expected a dictionary, but got list."
    );
}

// ============ 钱包列表 ============

#[tokio::test]
async fn test_list_wallets_one_batch_per_currency() {
    let app = spawn_app(&["ETH", "BTC"]);
    app.repo.seed("ETH", "a").await;
    app.repo.seed("BTC", "b").await;
    app.repo.seed("ETH", "c").await;
    {
        let mut chain = app.chain();
        chain.balances.insert("a".into(), 10);
        chain.balances.insert("b".into(), 20);
    }

    let (status, _, body) = app.request(Method::GET, "/wallets/", None).await;
    assert_eq!(status, StatusCode::OK);

    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(list[0], json!({"id": 1, "currency": "ETH", "public_key": "a", "balance": 10}));
    assert_eq!(list[1], json!({"id": 2, "currency": "BTC", "public_key": "b", "balance": 20}));
    // 链上没有返回余额的钱包不带 balance 字段
    assert_eq!(list[2], json!({"id": 3, "currency": "ETH", "public_key": "c"}));

    let calls = app.chain().balance_calls.clone();
    assert_eq!(
        calls,
        vec![
            ("ETH".to_string(), vec!["a".to_string(), "c".to_string()]),
            ("BTC".to_string(), vec!["b".to_string()]),
        ]
    );
}

#[tokio::test]
async fn test_list_wallets_empty_store_makes_no_chain_calls() {
    let app = spawn_app(&["ETH"]);
    let (status, _, body) = app.request(Method::GET, "/wallets", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    assert_eq!(app.chain().chain_calls(), 0);
}

#[tokio::test]
async fn test_list_wallets_paginated() {
    let app = spawn_app(&["ETH"]);
    for key in ["a", "b", "c"] {
        app.repo.seed("ETH", key).await;
    }

    let (status, _, body) = app
        .request(Method::GET, "/api/v1/wallets/?limit=2", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["next"], "/api/v1/wallets/?limit=2&offset=2");
    assert!(body["previous"].is_null());
    assert_eq!(body["results"].as_array().unwrap().len(), 2);

    let (_, _, body) = app
        .request(Method::GET, "/api/v1/wallets/?limit=2&offset=2", None)
        .await;
    assert!(body["next"].is_null());
    assert_eq!(body["previous"], "/api/v1/wallets/?limit=2");
    assert_eq!(body["results"][0]["public_key"], "c");

    // 第二页只查询该页钱包的余额
    let calls = app.chain().balance_calls.clone();
    assert_eq!(calls.last().unwrap().1, vec!["c".to_string()]);
}

#[tokio::test]
async fn test_list_wallets_huge_offset() {
    let app = spawn_app(&["ETH"]);
    app.repo.seed("ETH", "a").await;

    let (status, _, body) = app
        .request(Method::GET, "/wallets/?limit=10&offset=9223372036854775807", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert!(body["next"].is_null());
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn test_list_wallets_chain_failure_is_server_error() {
    let app = spawn_app(&["ETH"]);
    app.repo.seed("ETH", "a").await;
    app.chain().balance_error = Some(ManagerError::Rpc("node unreachable".into()));

    let (status, _, body) = app.request(Method::GET, "/wallets/", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "rpc_error");
}

#[tokio::test]
async fn test_list_wallets_unknown_stored_currency_is_internal_error() {
    let app = spawn_app(&["ETH"]);
    app.repo.seed("XRP", "a").await;

    let (status, _, _) = app.request(Method::GET, "/wallets/", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

// ============ 转账 ============

#[tokio::test]
async fn test_transaction_between_known_wallets() {
    let app = spawn_app(&["ETH"]);
    app.repo.seed("ETH", "A").await;
    app.repo.seed("ETH", "B").await;

    let (status, _, body) = app
        .request(
            Method::POST,
            "/transaction/",
            Some(json!({"from": "A", "to": "B", "amount": 1, "currency": "ETH"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"hash": "0xdead"}));

    let txs = app.chain().transactions.clone();
    assert_eq!(txs, vec![("A".to_string(), "B".to_string(), Decimal::from(1))]);
}

#[tokio::test]
async fn test_transaction_to_self_rejected_before_chain() {
    let app = spawn_app(&["ETH"]);
    app.repo.seed("ETH", "A").await;

    let (status, _, body) = app
        .request(
            Method::POST,
            "/transaction/",
            Some(json!({"from": "A", "to": "A", "amount": "0.5", "currency": "ETH"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"from": ["Cannot send a transaction to yourself"]}));
    assert_eq!(app.chain().chain_calls(), 0);
}

#[tokio::test]
async fn test_transaction_with_unknown_wallet_rejected_before_chain() {
    let app = spawn_app(&["ETH"]);
    app.repo.seed("ETH", "A").await;

    for (from, to) in [("A", "Z"), ("Z", "A")] {
        let (status, _, body) = app
            .request(
                Method::POST,
                "/transaction/",
                Some(json!({"from": from, "to": to, "amount": "0.5", "currency": "ETH"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"from": ["Transactions are only allowed between wallets inside the system"]})
        );
    }
    assert_eq!(app.chain().chain_calls(), 0);
}

#[tokio::test]
async fn test_transaction_currency_mismatch() {
    let app = spawn_app(&["ETH", "BTC"]);
    app.repo.seed("ETH", "A").await;
    app.repo.seed("ETH", "B").await;

    let (status, _, body) = app
        .request(
            Method::POST,
            "/transaction/",
            Some(json!({"from": "A", "to": "B", "amount": "0.5", "currency": "BTC"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["currency"][0].is_string());
    assert_eq!(app.chain().chain_calls(), 0);
}

#[tokio::test]
async fn test_transaction_field_validation() {
    let app = spawn_app(&["ETH"]);

    let (status, _, body) = app
        .request(
            Method::POST,
            "/transaction/",
            Some(json!({"from": "A", "to": "B", "amount": "0.000000001"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["amount"][0],
        "Ensure that there are no more than 8 decimal places."
    );
    assert_eq!(body["currency"][0], "This field is required.");
    assert_eq!(app.chain().chain_calls(), 0);
}

#[tokio::test]
async fn test_transaction_chain_error_keeps_bad_request() {
    let app = spawn_app(&["ETH"]);
    app.repo.seed("ETH", "A").await;
    app.repo.seed("ETH", "B").await;
    app.chain().tx_error = Some(ManagerError::InsufficientBalance);

    let (status, _, body) = app
        .request(
            Method::POST,
            "/transaction",
            Some(json!({"from": "A", "to": "B", "amount": "2.5", "currency": "ETH"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "insufficient_balance");
    assert!(body["error"].is_string());
}

// ============ 其他端点 ============

#[tokio::test]
async fn test_responses_carry_request_and_trace_ids() {
    let app = spawn_app(&["ETH"]);
    let req = axum::http::Request::builder()
        .uri("/health")
        .header("x-trace-id", "trace-123")
        .body(axum::body::Body::empty())
        .unwrap();

    let (status, headers, body) = app.send(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(headers["x-trace-id"], "trace-123");
}

#[tokio::test]
async fn test_currencies_and_healthz() {
    let app = spawn_app(&["ETH"]);

    let (status, _, body) = app.request(Method::GET, "/api/v1/currencies/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"currencies": ["ETH"]}));

    let (status, _, body) = app.request(Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["db_ok"], true);
    assert_eq!(body["nodes"]["ETH"], true);
}

#[tokio::test]
async fn test_metrics_and_openapi() {
    let app = spawn_app(&["ETH"]);
    app.request(Method::GET, "/wallets/", None).await;

    let (status, _, body) = app.request(Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body
        .as_str()
        .unwrap()
        .contains("wallet_manager_endpoint_requests_total{endpoint=\"GET /wallets\"}"));

    let (status, _, body) = app.request(Method::GET, "/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/wallets/"].is_object());
}
