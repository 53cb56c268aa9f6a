pub mod health;
pub mod payment;
pub mod stats;

pub use health::*;
pub use payment::*;
pub use stats::*;

use axum::{
    routing::{get, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(get_stats))
        .route("/api/payment/prepare", post(prepare_payment))
        .route("/api/payment/complete", post(complete_payment))
        .with_state(state)
}
