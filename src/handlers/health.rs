use crate::{handlers::AppState, models::HealthStatus};
use axum::{extract::State, Json};
use chrono::Utc;

pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    let store = state.payments.store();
    let store_ok = store.ping().await;

    let status = if store_ok { "healthy" } else { "degraded" };

    Json(HealthStatus {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        order_store: store.backend().to_string(),
        order_store_ok: store_ok,
        uptime_seconds: state.stats.uptime_seconds(),
        timestamp: Utc::now(),
    })
}
