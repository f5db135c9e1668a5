#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use visual_erp_client::{
    ClientConfig, OutgoingRequest, RawResponse, RetryPolicy, Transport, TransportError,
};

/// Fast retries for tests that hit a real socket.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(5))
}

// ----- scripted transport -----

/// Transport that replays canned outcomes in order and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    fallback: Mutex<Option<Result<RawResponse, TransportError>>>,
    seen: Mutex<Vec<OutgoingRequest>>,
    latency: Mutex<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Outcome returned once the script is exhausted.
    pub fn always(outcome: Result<RawResponse, TransportError>) -> Arc<Self> {
        let transport = Self::default();
        *transport.fallback.lock().unwrap() = Some(outcome);
        Arc::new(transport)
    }

    pub fn push(&self, outcome: Result<RawResponse, TransportError>) -> &Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }

    pub fn push_status(&self, status: u16, body: Value) -> &Self {
        self.push(Ok(response(status, body)))
    }

    /// Delay every answer, leaving room to act while a request is in flight.
    pub fn with_latency(&self, latency: Duration) -> &Self {
        *self.latency.lock().unwrap() = latency;
        self
    }

    /// Request paths in the order they were sent.
    pub fn paths(&self) -> Vec<String> {
        self.seen()
            .iter()
            .map(|r| format!("{} {}", r.method, r.url.split_once("/api/").map_or("", |(_, p)| p)))
            .collect()
    }

    pub fn seen(&self) -> Vec<OutgoingRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &OutgoingRequest) -> Result<RawResponse, TransportError> {
        self.seen.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        let outcome = next.unwrap_or_else(|| {
            self.fallback
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err(TransportError::Other("script exhausted".to_string())))
        });
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        outcome
    }
}

pub fn response(status: u16, body: Value) -> RawResponse {
    RawResponse {
        status,
        body: body.to_string(),
    }
}

pub fn refused() -> Result<RawResponse, TransportError> {
    Err(TransportError::Connect("connection refused".to_string()))
}

// ----- stub backend -----

/// In-process ERP backend on an ephemeral port.
pub struct TestServer {
    pub base_url: String,
    pub backend: Arc<Backend>,
    handle: tokio::task::JoinHandle<()>,
}

#[derive(Default)]
pub struct Backend {
    log: Mutex<Vec<String>>,
    customers: Mutex<Vec<Value>>,
}

impl Backend {
    /// `"<METHOD> <path> <bearer|->"` per request, in arrival order.
    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, method: &str, path: &str, headers: &HeaderMap) {
        let bearer = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap_or("-")
            .to_string();
        self.log
            .lock()
            .unwrap()
            .push(format!("{method} {path} {bearer}"));
    }
}

impl TestServer {
    pub async fn spawn() -> Self {
        let backend = Arc::new(Backend::default());
        let app = router(backend.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            backend,
            handle,
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url.clone()).with_retry(fast_retry())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

type Shared = State<Arc<Backend>>;

fn router(backend: Arc<Backend>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/login", post(login))
        .route("/api/inventory/products", get(list_products).post(create_product))
        .route("/api/customers", get(list_customers).post(create_customer))
        .route("/api/quotes/:id", delete(delete_quote))
        .route("/api/quotes/:id/convert", post(convert_quote))
        .with_state(backend)
}

async fn health(State(b): Shared, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    b.record("GET", "/api/health", &headers);
    let expired = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        == Some("Bearer expired");
    if expired {
        (StatusCode::UNAUTHORIZED, Json(json!({"error": "token expired"})))
    } else {
        (StatusCode::OK, Json(json!({"status": "ok", "version": "1.4.0"})))
    }
}

async fn login(State(b): Shared, headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    b.record("POST", "/api/auth/login", &headers);
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    match (username, password) {
        ("ghost", _) => (StatusCode::OK, Json(json!({"success": true}))),
        (_, "secret") | ("t", "t") => (
            StatusCode::OK,
            Json(json!({
                "token": "abc",
                "user": {"id": 1, "username": username, "role": "admin", "displayName": "Ada Admin"}
            })),
        ),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "unauthorized", "message": "Invalid credentials"})),
        ),
    }
}

async fn list_products(State(b): Shared, headers: HeaderMap) -> Json<Value> {
    b.record("GET", "/api/inventory/products", &headers);
    Json(json!({
        "success": true,
        "products": [
            {"id": 10, "name": "Hex Bolt M8", "sku": "HB-M8", "status": "Active",
             "stockOnHand": 1200, "batches": 4, "price": 0.35, "cost": 0.12}
        ]
    }))
}

async fn create_product(State(b): Shared, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    b.record("POST", "/api/inventory/products", &headers);
    (
        StatusCode::CONFLICT,
        Json(json!({"error": "conflict", "message": "SKU already exists"})),
    )
}

async fn list_customers(State(b): Shared, headers: HeaderMap) -> Json<Value> {
    b.record("GET", "/api/customers", &headers);
    let customers = b.customers.lock().unwrap().clone();
    Json(json!({"success": true, "customers": customers}))
}

async fn create_customer(
    State(b): Shared,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    b.record("POST", "/api/customers", &headers);
    let mut customers = b.customers.lock().unwrap();
    body["id"] = json!(customers.len() + 1);
    customers.push(body.clone());
    (StatusCode::CREATED, Json(json!({"success": true, "customer": body})))
}

async fn delete_quote(State(b): Shared, headers: HeaderMap, Path(id): Path<String>) -> Json<Value> {
    b.record("DELETE", &format!("/api/quotes/{id}"), &headers);
    Json(json!({"success": true}))
}

async fn convert_quote(State(b): Shared, headers: HeaderMap, Path(id): Path<String>) -> Json<Value> {
    b.record("POST", &format!("/api/quotes/{id}/convert"), &headers);
    Json(json!({"success": true, "orderId": 77, "message": format!("Quote {id} converted")}))
}
