use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const PAYMENT_ERROR_MESSAGE: &str = "결제 처리 중 오류가 발생했습니다.";
const INVALID_REQUEST_MESSAGE: &str = "결제 요청 정보가 올바르지 않습니다.";

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Signature mismatch for order {order_id}")]
    SignatureMismatch { order_id: String },

    #[error("Missing or malformed field: {0}")]
    MissingField(&'static str),

    #[error("Invalid payment request: {0}")]
    InvalidRequest(String),

    #[error("Order store error: {0}")]
    OrderStore(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl CheckoutError {
    pub fn error_code(&self) -> &'static str {
        match self {
            CheckoutError::Configuration(_) => "CONFIGURATION_ERROR",
            CheckoutError::SignatureMismatch { .. } => "SIGNATURE_MISMATCH",
            CheckoutError::MissingField(_) => "MISSING_FIELD",
            CheckoutError::InvalidRequest(_) => "INVALID_REQUEST",
            CheckoutError::OrderStore(_) => "ORDER_STORE_ERROR",
            CheckoutError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<redis::RedisError> for CheckoutError {
    fn from(err: redis::RedisError) -> Self {
        CheckoutError::OrderStore(err.to_string())
    }
}

impl From<serde_json::Error> for CheckoutError {
    fn from(err: serde_json::Error) -> Self {
        CheckoutError::Internal(err.to_string())
    }
}

/// Wire shape for every failed payment call. Carries only a user-facing
/// message so callers cannot tell which check failed.
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for CheckoutError {
    fn into_response(self) -> Response {
        let error_code = self.error_code();

        let (status, message) = match &self {
            CheckoutError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, INVALID_REQUEST_MESSAGE),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, PAYMENT_ERROR_MESSAGE),
        };

        match &self {
            CheckoutError::InvalidRequest(_) | CheckoutError::MissingField(_) => {
                tracing::warn!(error = %self, error_code, "Payment request rejected");
            }
            CheckoutError::SignatureMismatch { .. } => {
                tracing::warn!(error = %self, error_code, "Untrusted payment callback");
            }
            _ => {
                tracing::error!(error = ?self, error_code, "Payment request failed");
            }
        }

        let body = ErrorResponse {
            error: message.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
