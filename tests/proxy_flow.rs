//! End-to-end tests: real proxy, mock backend, real sockets.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use finance_proxy::client::{ClientError, FinanceClient, NewExpense};

mod common;

#[tokio::test]
async fn test_post_passes_through() {
    let backend = common::start_programmable_backend(|_| {
        (
            StatusCode::CREATED,
            Json(json!({"id": 7, "amount": 12.5, "description": "Lunch", "category": "Food"})),
        )
            .into_response()
    })
    .await;
    let (proxy_addr, shutdown) = common::start_proxy(common::test_config(&backend.url())).await;

    let res = common::http_client()
        .post(format!("http://{}/api/proxy/expenses", proxy_addr))
        .header("authorization", "Bearer t0ken")
        .header("x-custom", "dropped")
        .json(&json!({"amount": 12.5, "description": "Lunch", "category": "Food"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 201);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["id"], 7);

    assert_eq!(backend.calls(), 1);
    let seen = &backend.received()[0];
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.path, "/api/expenses");
    assert_eq!(seen.headers["authorization"], "Bearer t0ken");
    assert_eq!(seen.headers["content-type"], "application/json");
    assert!(!seen.headers.contains_key("x-custom"));
    let sent: Value = serde_json::from_slice(&seen.body).unwrap();
    assert_eq!(sent["description"], "Lunch");

    shutdown.trigger();
}

#[tokio::test]
async fn test_recovers_after_server_errors() {
    let backend = common::start_programmable_backend(|call| {
        if call < 2 {
            (StatusCode::SERVICE_UNAVAILABLE, "warming up").into_response()
        } else {
            Json(json!([{"id": 1}])).into_response()
        }
    })
    .await;
    let (proxy_addr, shutdown) = common::start_proxy(common::test_config(&backend.url())).await;

    let res = common::http_client()
        .get(format!("http://{}/api/proxy/expenses", proxy_addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.json::<Value>().await.unwrap(), json!([{"id": 1}]));
    assert_eq!(backend.calls(), 3);

    shutdown.trigger();
}

#[tokio::test]
async fn test_exhausted_server_errors_are_annotated() {
    let backend = common::start_programmable_backend(|_| {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "boom"}))).into_response()
    })
    .await;
    let (proxy_addr, shutdown) = common::start_proxy(common::test_config(&backend.url())).await;

    let res = common::http_client()
        .get(format!("http://{}/api/proxy/expenses", proxy_addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({"error": "boom", "target": format!("{}/api/expenses", backend.url())})
    );
    assert_eq!(backend.calls(), 3);

    shutdown.trigger();
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let backend = common::start_programmable_backend(|_| {
        (StatusCode::NOT_FOUND, Json(json!({"error": "Not found"}))).into_response()
    })
    .await;
    let (proxy_addr, shutdown) = common::start_proxy(common::test_config(&backend.url())).await;

    let res = common::http_client()
        .delete(format!("http://{}/api/proxy/expenses/99", proxy_addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 404);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"error": "Not found"}));
    assert_eq!(backend.calls(), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_upstream_returns_502() {
    let origin = format!("http://127.0.0.1:{}", common::unused_port());
    let (proxy_addr, shutdown) = common::start_proxy(common::test_config(&origin)).await;

    let res = common::http_client()
        .post(format!("http://{}/api/proxy/auth/login", proxy_addr))
        .json(&json!({"email": "a@b.c", "password": "pw"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 502);
    let body: Value = res.json().await.unwrap();
    assert!(!body["error"].as_str().unwrap().is_empty());
    assert_eq!(body["target"], format!("{}/api/auth/login", origin));

    shutdown.trigger();
}

#[tokio::test]
async fn test_get_body_is_not_forwarded() {
    let backend = common::start_programmable_backend(|_| Json(json!([])).into_response()).await;
    let (proxy_addr, shutdown) = common::start_proxy(common::test_config(&backend.url())).await;

    let res = common::http_client()
        .get(format!("http://{}/api/proxy/expenses", proxy_addr))
        .header("content-type", "application/json")
        .body(r#"{"ignored":true}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let seen = &backend.received()[0];
    assert!(seen.body.is_empty());
    assert!(!seen.headers.contains_key("content-type"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_finance_client_through_proxy() {
    let backend = common::start_programmable_backend(|call| match call {
        0 => Json(json!({"token": "jwt", "user": {"id": 1, "email": "a@b.c", "name": null}}))
            .into_response(),
        1 => Json(json!({
            "id": 3,
            "amount": 9.5,
            "description": "Tea",
            "category": "Food",
            "createdAt": "2024-05-01T09:00:00.000Z"
        }))
        .into_response(),
        _ => (StatusCode::BAD_REQUEST, Json(json!({"error": "Invalid amount"}))).into_response(),
    })
    .await;
    let (proxy_addr, shutdown) = common::start_proxy(common::test_config(&backend.url())).await;

    let base = format!("http://{}", proxy_addr);
    let anonymous = FinanceClient::new(&base).with_http_client(common::http_client());
    let session = anonymous.login("a@b.c", "pw").await.unwrap();
    assert_eq!(session.token, "jwt");
    assert_eq!(session.user.name, None);

    let client = FinanceClient::new(&base)
        .with_http_client(common::http_client())
        .with_token(session.token);
    let expense = NewExpense {
        amount: 9.5,
        description: "Tea".into(),
        category: "Food".into(),
    };
    let created = client.create_expense(&expense).await.unwrap();
    assert_eq!(created.id, 3);

    match client.update_expense(3, &expense).await {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid amount");
        }
        other => panic!("expected API error, got {:?}", other),
    }

    let seen = backend.received();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].path, "/api/auth/login");
    assert!(!seen[0].headers.contains_key("authorization"));
    assert_eq!(seen[1].headers["authorization"], "Bearer jwt");
    assert_eq!(seen[2].method, "PUT");
    assert_eq!(seen[2].path, "/api/expenses/3");

    shutdown.trigger();
}
