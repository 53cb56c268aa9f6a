use crate::error::CheckoutError;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub const SUCCESS_RESULT_CODE: &str = "0000";
pub const MAX_ORDER_ID_LEN: usize = 64;

/// Checkout attempt submitted by the browser before redirecting to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PrepareRequest {
    #[validate(range(min = 1))]
    pub amount: u64,
    #[validate(custom = "validate_order_id")]
    pub order_id: String,
    #[serde(default)]
    pub order_name: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_tel: String,
}

fn validate_order_id(order_id: &str) -> Result<(), ValidationError> {
    let well_formed = !order_id.is_empty()
        && order_id.len() <= MAX_ORDER_ID_LEN
        && order_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::new("order_id"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareResponse {
    pub client_key: String,
    pub signature: String,
    pub timestamp: i64,
}

/// Callback body as it arrives on the wire. Every field is optional here so
/// absence can be reported as a typed error instead of an extractor rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackPayload {
    pub result_code: Option<String>,
    pub result_msg: Option<String>,
    pub order_id: Option<String>,
    pub amount: Option<u64>,
    pub signature: Option<String>,
    pub timestamp: Option<i64>,
}

/// Gateway notification of a payment outcome with all fields present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCallback {
    pub result_code: String,
    pub result_msg: String,
    pub order_id: String,
    pub amount: u64,
    pub signature: String,
    pub timestamp: i64,
}

impl PaymentCallback {
    pub fn is_success(&self) -> bool {
        self.result_code == SUCCESS_RESULT_CODE
    }
}

impl TryFrom<CallbackPayload> for PaymentCallback {
    type Error = CheckoutError;

    fn try_from(payload: CallbackPayload) -> Result<Self, Self::Error> {
        Ok(Self {
            result_code: payload
                .result_code
                .ok_or(CheckoutError::MissingField("resultCode"))?,
            result_msg: payload
                .result_msg
                .ok_or(CheckoutError::MissingField("resultMsg"))?,
            order_id: payload
                .order_id
                .filter(|id| !id.is_empty())
                .ok_or(CheckoutError::MissingField("orderId"))?,
            amount: payload.amount.ok_or(CheckoutError::MissingField("amount"))?,
            signature: payload
                .signature
                .filter(|sig| !sig.is_empty())
                .ok_or(CheckoutError::MissingField("signature"))?,
            timestamp: payload
                .timestamp
                .ok_or(CheckoutError::MissingField("timestamp"))?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CompletionResponse {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(order_id: &str, amount: u64) -> PrepareRequest {
        PrepareRequest {
            amount,
            order_id: order_id.to_string(),
            order_name: "Jeju 3-day trip".to_string(),
            customer_name: "A".to_string(),
            customer_email: "a@x.com".to_string(),
            customer_tel: "010".to_string(),
        }
    }

    #[test]
    fn accepts_gateway_style_order_ids() {
        assert!(request("TRIP_1700000000000", 1000).validate().is_ok());
        assert!(request("trip-42", 1).validate().is_ok());
    }

    #[test]
    fn rejects_zero_amount() {
        assert!(request("TRIP_1", 0).validate().is_err());
    }

    #[test]
    fn rejects_malformed_order_ids() {
        assert!(request("", 1000).validate().is_err());
        assert!(request("TRIP.1", 1000).validate().is_err());
        assert!(request(&"A".repeat(MAX_ORDER_ID_LEN + 1), 1000).validate().is_err());
    }

    #[test]
    fn prepare_request_reads_camel_case() {
        let parsed: PrepareRequest = serde_json::from_str(
            r#"{"amount":1000,"orderId":"TRIP_1","orderName":"Trip","customerName":"A","customerEmail":"a@x.com","customerTel":"010"}"#,
        )
        .unwrap();
        assert_eq!(parsed.order_id, "TRIP_1");
        assert_eq!(parsed.customer_tel, "010");
    }

    #[test]
    fn callback_reports_first_missing_field() {
        let payload = CallbackPayload {
            result_code: Some("0000".into()),
            result_msg: Some("ok".into()),
            order_id: Some("TRIP_1".into()),
            amount: None,
            signature: Some("ab".into()),
            timestamp: Some(1),
        };

        match PaymentCallback::try_from(payload) {
            Err(CheckoutError::MissingField(field)) => assert_eq!(field, "amount"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn empty_signature_counts_as_missing() {
        let payload = CallbackPayload {
            result_code: Some("0000".into()),
            result_msg: Some("ok".into()),
            order_id: Some("TRIP_1".into()),
            amount: Some(1000),
            signature: Some(String::new()),
            timestamp: Some(1),
        };
        assert!(matches!(
            PaymentCallback::try_from(payload),
            Err(CheckoutError::MissingField("signature"))
        ));
    }

    #[test]
    fn completion_response_omits_message_on_success() {
        let json = serde_json::to_value(CompletionResponse::succeeded()).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true }));

        let json = serde_json::to_value(CompletionResponse::failed("한도 초과")).unwrap();
        assert_eq!(json, serde_json::json!({ "success": false, "message": "한도 초과" }));
    }
}
