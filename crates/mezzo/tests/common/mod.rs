//! Local stand-in for the chat completions API.
//!
//! Binds an axum server on a random port. Every request is recorded; the
//! reply echoes the last message back, or returns the configured failure.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use serde_json::{Value, json};

/// A request the mock received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct MockState {
    requests: Arc<Mutex<Vec<Recorded>>>,
    failure: Option<(StatusCode, Value)>,
}

/// Handle to a running mock server.
pub struct MockApi {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockApi {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// Spawn a mock that echoes `echo: <last message>`.
pub async fn spawn_echo() -> MockApi {
    spawn(None).await
}

/// Spawn a mock that answers every request with `status` and `body`.
pub async fn spawn_failing(status: StatusCode, body: Value) -> MockApi {
    spawn(Some((status, body))).await
}

async fn spawn(failure: Option<(StatusCode, Value)>) -> MockApi {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        requests: requests.clone(),
        failure,
    };

    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockApi {
        base_url: format!("http://{addr}/v1"),
        requests,
    }
}

async fn completions(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let last = body["messages"]
        .as_array()
        .and_then(|m| m.last())
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default()
        .to_string();

    state.requests.lock().unwrap().push(Recorded {
        authorization,
        body,
    });

    if let Some((status, body)) = state.failure {
        return (status, Json(body));
    }

    (
        StatusCode::OK,
        Json(json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": format!("echo: {last}")},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        })),
    )
}

/// Write the two context files under `root`.
pub fn write_context(root: &std::path::Path, persona: &str, knowledge_base: &str) {
    std::fs::create_dir_all(root.join("sops")).unwrap();
    std::fs::write(root.join("README.md"), persona).unwrap();
    std::fs::write(root.join("sops").join("knowledge_base.md"), knowledge_base).unwrap();
}
