use std::collections::HashMap;
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Form, Json, Router};
use callboard_api::{CallListQuery, ChannelAuthRequest, LoginRequest};
use callboard_api_client::{ApiClient, CallGateway, GatewayError};
use serde_json::{json, Value};

fn call_json(id: &str, archived: bool, notes: Value) -> Value {
    json!({
        "id": id,
        "call_type": "missed",
        "direction": "inbound",
        "duration": 42,
        "from": "+1",
        "to": "+2",
        "via": "+3",
        "created_at": "2024-03-01T10:00:00Z",
        "is_archived": archived,
        "notes": notes,
    })
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn app() -> Router {
    Router::new()
        .route(
            "/auth/login",
            post(|Json(body): Json<Value>| async move {
                if body["username"] == "agent@example.com" && body["password"] == "secret1" {
                    (
                        StatusCode::CREATED,
                        Json(json!({"access_token": "at-1", "refresh_token": "rt-1"})),
                    )
                } else {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({"message": "Invalid credentials"})),
                    )
                }
            }),
        )
        .route(
            "/auth/refresh-token",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["refresh_token"], "rt-1");
                Json(json!({"access_token": "at-2", "expires_in": 600}))
            }),
        )
        .route(
            "/calls",
            get(
                |headers: HeaderMap, Query(query): Query<CallListQuery>| async move {
                    if bearer(&headers).as_deref() != Some("at-1") {
                        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthorized"})));
                    }
                    let nodes: Vec<Value> = (0..query.limit)
                        .map(|i| call_json(&format!("c-{}", query.offset + u64::from(i)), false, json!([])))
                        .collect();
                    (
                        StatusCode::OK,
                        Json(json!({"nodes": nodes, "totalCount": 42, "hasNextPage": true})),
                    )
                },
            ),
        )
        .route(
            "/calls/{id}/note",
            post(
                |Path(id): Path<String>, Json(body): Json<Value>| async move {
                    let notes = json!([{"id": "n-1", "content": body["content"], "created_at": "2024-03-02T00:00:00Z"}]);
                    Json(call_json(&id, false, notes))
                },
            ),
        )
        .route(
            "/calls/{id}/archive",
            put(|Path(id): Path<String>, body: String| async move {
                assert!(body.is_empty(), "archive toggle must not send a body");
                Json(call_json(&id, true, json!([])))
            }),
        )
        .route(
            "/pusher/auth",
            post(
                |headers: HeaderMap, Form(form): Form<HashMap<String, String>>| async move {
                    if bearer(&headers).as_deref() != Some("at-1") {
                        return (StatusCode::FORBIDDEN, Json(json!({})));
                    }
                    let auth = format!("key:{}:{}", form["socket_id"], form["channel_name"]);
                    (StatusCode::OK, Json(json!({ "auth": auth })))
                },
            ),
        )
}

async fn spawn_client() -> ApiClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app()).await.expect("serve");
    });
    ApiClient::new(&format!("http://{addr}/"), Duration::from_secs(5)).expect("client")
}

#[tokio::test]
async fn login_returns_tokens() {
    let client = spawn_client().await;
    let resp = client
        .login(&LoginRequest {
            username: "agent@example.com".into(),
            password: "secret1".into(),
        })
        .await
        .expect("login");
    assert_eq!(resp.access_token, "at-1");
    assert_eq!(resp.refresh_token.as_deref(), Some("rt-1"));
    assert_eq!(resp.expires_in, None);
}

#[tokio::test]
async fn login_failure_surfaces_server_message() {
    let client = spawn_client().await;
    let err = client
        .login(&LoginRequest {
            username: "agent@example.com".into(),
            password: "wrong-pass".into(),
        })
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "Invalid credentials");
}

#[tokio::test]
async fn refresh_posts_refresh_token() {
    let client = spawn_client().await;
    let resp = client.refresh("rt-1").await.expect("refresh");
    assert_eq!(resp.access_token, "at-2");
    assert_eq!(resp.refresh_token, None);
    assert_eq!(resp.expires_in, Some(600));
}

#[tokio::test]
async fn list_calls_sends_offset_limit_and_bearer() {
    let client = spawn_client().await;
    let page = CallGateway::list_calls(&client, Some("at-1"), CallListQuery::for_page(5, 10))
        .await
        .expect("list");
    assert_eq!(page.total_count, 42);
    assert!(page.has_next_page);
    assert_eq!(page.nodes.len(), 10);
    assert_eq!(page.nodes[0].id, "c-40");
}

#[tokio::test]
async fn list_calls_without_token_is_unauthorized() {
    let client = spawn_client().await;
    let err = client
        .list_calls(None, CallListQuery::for_page(1, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Status { status: 401, .. }));
}

#[tokio::test]
async fn add_note_returns_server_snapshot() {
    let client = spawn_client().await;
    let call = client
        .add_note(Some("at-1"), "c-7", "call back tomorrow")
        .await
        .expect("add note");
    assert_eq!(call.id, "c-7");
    assert_eq!(call.notes.len(), 1);
    assert_eq!(call.notes[0].content, "call back tomorrow");
}

#[tokio::test]
async fn toggle_archive_uses_empty_put() {
    let client = spawn_client().await;
    let call = client
        .toggle_archive(Some("at-1"), "c-3")
        .await
        .expect("archive");
    assert_eq!(call.id, "c-3");
    assert!(call.is_archived);
}

#[tokio::test]
async fn authorize_channel_posts_form_with_bearer() {
    let client = spawn_client().await;
    let req = ChannelAuthRequest {
        socket_id: "123.456".into(),
        channel_name: "private-aircall".into(),
    };
    let signed = client
        .authorize_channel("/pusher/auth", Some("at-1"), &req)
        .await
        .expect("authorize");
    assert_eq!(signed.auth, "key:123.456:private-aircall");

    let err = client
        .authorize_channel("/pusher/auth", None, &req)
        .await
        .expect_err("anonymous channel auth");
    assert_eq!(err.status(), Some(403));
}
