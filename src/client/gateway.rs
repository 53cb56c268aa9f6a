use crate::{
    config::GatewayCredentials,
    error::ErrorResponse,
    models::{CompletionResponse, PaymentCallback, PrepareRequest, PrepareResponse},
    services::SignatureService,
};
use anyhow::{bail, Context, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

/// HTTP client for the two checkout endpoints.
pub struct CheckoutClient {
    base_url: String,
    client: Client,
}

impl CheckoutClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub async fn prepare(&self, request: &PrepareRequest) -> Result<PrepareResponse> {
        let response = self
            .client
            .post(format!("{}/api/payment/prepare", self.base_url))
            .json(request)
            .send()
            .await
            .context("Failed to reach prepare endpoint")?;

        Self::decode(response, "prepare").await
    }

    pub async fn complete(&self, callback: &PaymentCallback) -> Result<CompletionResponse> {
        let response = self
            .client
            .post(format!("{}/api/payment/complete", self.base_url))
            .json(callback)
            .send()
            .await
            .context("Failed to reach complete endpoint")?;

        Self::decode(response, "complete").await
    }

    async fn decode<T: DeserializeOwned>(response: Response, operation: &str) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error,
                Err(_) => "<unreadable error body>".to_string(),
            };
            bail!("{} failed ({}): {}", operation, status, message);
        }

        response
            .json()
            .await
            .with_context(|| format!("Invalid {} response body", operation))
    }
}

/// Signs callbacks the way the gateway does, for driving `complete` without
/// a real gateway.
pub struct GatewaySimulator {
    signer: SignatureService,
}

impl GatewaySimulator {
    pub fn new(credentials: &GatewayCredentials) -> Result<Self> {
        let signer = SignatureService::new(credentials).context("Invalid gateway credentials")?;
        Ok(Self { signer })
    }

    pub fn callback(
        &self,
        order_id: &str,
        amount: u64,
        timestamp: i64,
        result_code: &str,
        result_msg: &str,
    ) -> PaymentCallback {
        PaymentCallback {
            result_code: result_code.to_string(),
            result_msg: result_msg.to_string(),
            order_id: order_id.to_string(),
            amount,
            signature: self.signer.sign(timestamp, order_id, amount),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn credentials() -> GatewayCredentials {
        GatewayCredentials {
            client_key: "c".to_string(),
            secret_key: "s".to_string(),
        }
    }

    #[tokio::test]
    async fn prepare_posts_camel_case_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/payment/prepare")
            .match_body(Matcher::PartialJson(json!({
                "amount": 1000,
                "orderId": "TRIP_1",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"clientKey":"c","signature":"abc","timestamp":1700000000}"#)
            .create_async()
            .await;

        let client = CheckoutClient::new(format!("{}/", server.url()));
        let prepared = client
            .prepare(&PrepareRequest {
                amount: 1000,
                order_id: "TRIP_1".to_string(),
                order_name: "Trip".to_string(),
                customer_name: "A".to_string(),
                customer_email: "a@x.com".to_string(),
                customer_tel: "010".to_string(),
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(prepared.client_key, "c");
        assert_eq!(prepared.timestamp, 1_700_000_000);
    }

    #[tokio::test]
    async fn complete_surfaces_error_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/payment/complete")
            .with_status(500)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"결제 처리 중 오류가 발생했습니다."}"#)
            .create_async()
            .await;

        let simulator = GatewaySimulator::new(&credentials()).unwrap();
        let callback = simulator.callback("TRIP_1", 1000, 1_700_000_000, "0000", "ok");

        let err = CheckoutClient::new(server.url())
            .complete(&callback)
            .await
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("500"));
        assert!(text.contains("결제 처리 중 오류가 발생했습니다."));
    }

    #[tokio::test]
    async fn complete_reads_failure_outcome() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/payment/complete")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":false,"message":"declined"}"#)
            .create_async()
            .await;

        let simulator = GatewaySimulator::new(&credentials()).unwrap();
        let callback = simulator.callback("TRIP_1", 1000, 1_700_000_000, "0001", "declined");

        let outcome = tokio_test::assert_ok!(
            CheckoutClient::new(server.url()).complete(&callback).await
        );
        assert_eq!(outcome, CompletionResponse::failed("declined"));
    }

    #[test]
    fn simulator_signs_like_the_gateway() {
        let simulator = GatewaySimulator::new(&credentials()).unwrap();
        let callback = simulator.callback("TRIP_1700000000000", 1000, 1_700_000_000, "0000", "ok");
        assert_eq!(
            callback.signature,
            "3213a99a6716fff7f922417f7bb3976258665e258fcdf8bd9375f45fbdff99bf"
        );
    }

    #[test]
    fn simulator_requires_secret() {
        let result = GatewaySimulator::new(&GatewayCredentials {
            client_key: "c".to_string(),
            secret_key: String::new(),
        });
        assert!(result.is_err());
    }
}
