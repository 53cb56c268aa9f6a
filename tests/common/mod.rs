use axum::{body::Body, http::Request, Router};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use trip_checkout::{
    config::GatewayCredentials,
    handlers::{router, AppState},
    services::{MemoryOrderStore, OrderStore, PaymentService, PaymentStats, SignatureService},
};

pub const CLIENT_KEY: &str = "c";
pub const SECRET_KEY: &str = "s";

pub fn credentials() -> GatewayCredentials {
    GatewayCredentials {
        client_key: CLIENT_KEY.to_string(),
        secret_key: SECRET_KEY.to_string(),
    }
}

/// Router wired with an in-memory order store.
pub fn setup_test_app() -> Router {
    let signer = SignatureService::new(&credentials()).unwrap();
    let store: Arc<dyn OrderStore> = Arc::new(MemoryOrderStore::new(Duration::from_secs(60)));
    let stats = Arc::new(PaymentStats::new());
    let payments = Arc::new(PaymentService::new(signer, store, stats.clone()));

    router(AppState { payments, stats })
}

pub async fn post_json(app: &Router, uri: &str, body: String) -> (u16, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    read(response).await
}

pub async fn get_json(app: &Router, uri: &str) -> (u16, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    read(response).await
}

async fn read(response: axum::response::Response) -> (u16, Value) {
    let status = response.status().as_u16();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
