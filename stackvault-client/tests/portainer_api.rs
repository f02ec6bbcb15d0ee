use std::collections::HashMap;

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use stackvault_client::{ClientError, Orchestrator, PortainerClient, Token};
use stackvault_core::{ApiConfig, EndpointId, StackStatus};

const JWT: &str = "tok-1";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {JWT}"))
        .unwrap_or(false)
}

async fn auth(Json(body): Json<Value>) -> Response {
    if body["username"] == "admin" && body["password"] == "pw" {
        Json(json!({ "jwt": JWT })).into_response()
    } else {
        StatusCode::UNPROCESSABLE_ENTITY.into_response()
    }
}

async fn endpoints(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!([{ "Id": 1, "Name": "node1" }, { "Id": 2, "Name": "node2" }])).into_response()
}

async fn stacks(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!([
        { "Id": 10, "Name": "web", "EndpointId": 1, "Status": 1, "ProjectPath": "/data/compose/10" },
        { "Id": 11, "Name": "db", "EndpointId": 2, "Status": 2 }
    ]))
    .into_response()
}

async fn containers(
    Path(id): Path<u64>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if query.get("all").map(String::as_str) != Some("true") {
        return StatusCode::BAD_REQUEST.into_response();
    }
    match id {
        1 => Json(json!([
            { "Names": ["/web_1"], "State": "running", "Ports": [{ "PublicPort": 8080 }, { "PublicPort": 80 }] }
        ]))
        .into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn start_fake_platform() -> String {
    let app = Router::new()
        .route("/api/auth", post(auth))
        .route("/api/endpoints", get(endpoints))
        .route("/api/stacks", get(stacks))
        .route("/api/endpoints/:id/docker/containers/json", get(containers));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve") });
    format!("http://{addr}")
}

fn client(base_url: &str, password: &str) -> PortainerClient {
    PortainerClient::new(&ApiConfig {
        base_url: base_url.to_string(),
        username: "admin".to_string(),
        password: password.to_string(),
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn full_listing_round_trip() {
    let base = start_fake_platform().await;
    tokio::task::spawn_blocking(move || {
        let client = client(&base, "pw");
        let token = client.authenticate().expect("authenticate");
        assert_eq!(token.as_str(), JWT);

        let endpoints = client.list_endpoints(&token).expect("endpoints");
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[1].name, "node2");

        let stacks = client.list_stacks(&token).expect("stacks");
        assert_eq!(stacks[0].name, "web");
        assert_eq!(stacks[0].status, StackStatus::Active);
        assert_eq!(stacks[1].endpoint_id, EndpointId(2));

        let containers = client
            .list_containers(&token, EndpointId(1))
            .expect("containers");
        assert_eq!(containers[0].display_name(), "web_1");
        assert_eq!(containers[0].published_ports(), vec!["80", "8080"]);
    })
    .await
    .expect("join");
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_credentials_surface_auth_error() {
    let base = start_fake_platform().await;
    tokio::task::spawn_blocking(move || {
        let err = client(&base, "wrong").authenticate().expect_err("auth must fail");
        assert!(matches!(err, ClientError::Auth { status: 422 }), "got {err:?}");
    })
    .await
    .expect("join");
}

#[tokio::test(flavor = "multi_thread")]
async fn non_2xx_listing_carries_status() {
    let base = start_fake_platform().await;
    tokio::task::spawn_blocking(move || {
        let client = client(&base, "pw");
        let bad = Token::new("expired");
        let err = client.list_stacks(&bad).expect_err("must fail");
        assert_eq!(err.status(), Some(401));
        assert!(matches!(err, ClientError::Api { .. }));

        let token = client.authenticate().expect("authenticate");
        let err = client
            .list_containers(&token, EndpointId(99))
            .expect_err("unknown endpoint");
        match err {
            ClientError::Api { url, status } => {
                assert_eq!(status, 404);
                assert!(url.ends_with("/api/endpoints/99/docker/containers/json?all=true"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    })
    .await
    .expect("join");
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_platform_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    tokio::task::spawn_blocking(move || {
        let err = client(&format!("http://{addr}"), "pw")
            .authenticate()
            .expect_err("nothing listens");
        assert!(matches!(err, ClientError::Transport(_)), "got {err:?}");
    })
    .await
    .expect("join");
}
