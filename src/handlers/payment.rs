use crate::{
    error::CheckoutError,
    models::{CallbackPayload, CompletionResponse, PaymentCallback, PrepareRequest, PrepareResponse},
    services::{PaymentService, PaymentStats},
};
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub payments: Arc<PaymentService>,
    pub stats: Arc<PaymentStats>,
}

pub async fn prepare_payment(
    State(state): State<AppState>,
    payload: Result<Json<PrepareRequest>, JsonRejection>,
) -> Result<Json<PrepareResponse>, CheckoutError> {
    let Json(request) = payload.map_err(|e| CheckoutError::InvalidRequest(e.body_text()))?;

    let prepared = state.payments.prepare(&request).await?;
    Ok(Json(prepared))
}

/// Gateway `dbProcessUrl` target.
pub async fn complete_payment(
    State(state): State<AppState>,
    payload: Result<Json<CallbackPayload>, JsonRejection>,
) -> Result<Json<CompletionResponse>, CheckoutError> {
    let callback = payload
        .map_err(|e| {
            tracing::debug!("Unreadable callback body: {}", e.body_text());
            CheckoutError::MissingField("body")
        })
        .and_then(|Json(payload)| PaymentCallback::try_from(payload));

    let callback = match callback {
        Ok(callback) => callback,
        Err(e) => {
            state.stats.record_rejected();
            return Err(e);
        }
    };

    let outcome = state.payments.complete(&callback).await?;
    Ok(Json(outcome))
}
