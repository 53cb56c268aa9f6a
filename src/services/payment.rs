use crate::{
    error::CheckoutError,
    models::{
        CompletionResponse, OrderRecord, PaymentCallback, PrepareRequest, PrepareResponse,
    },
    services::{Completion, OrderStore, PaymentStats, SignatureService},
};
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

pub struct PaymentService {
    signer: SignatureService,
    store: Arc<dyn OrderStore>,
    stats: Arc<PaymentStats>,
}

impl PaymentService {
    pub fn new(
        signer: SignatureService,
        store: Arc<dyn OrderStore>,
        stats: Arc<PaymentStats>,
    ) -> Self {
        Self {
            signer,
            store,
            stats,
        }
    }

    pub fn store(&self) -> &Arc<dyn OrderStore> {
        &self.store
    }

    pub async fn prepare(&self, request: &PrepareRequest) -> Result<PrepareResponse, CheckoutError> {
        self.prepare_at(request, Utc::now().timestamp()).await
    }

    /// Signs a checkout attempt for the given epoch-second timestamp.
    pub async fn prepare_at(
        &self,
        request: &PrepareRequest,
        timestamp: i64,
    ) -> Result<PrepareResponse, CheckoutError> {
        request
            .validate()
            .map_err(|e| CheckoutError::InvalidRequest(e.to_string()))?;

        let signature = self.signer.sign(timestamp, &request.order_id, request.amount);

        self.track_prepared(request).await;
        self.stats.record_prepared();

        tracing::info!(
            order_id = %request.order_id,
            amount = request.amount,
            order_name = %request.order_name,
            "Payment prepared"
        );

        Ok(PrepareResponse {
            client_key: self.signer.client_key().to_string(),
            signature,
            timestamp,
        })
    }

    // Best-effort: losing the Prepared record only costs observability.
    async fn track_prepared(&self, request: &PrepareRequest) {
        let existing = match self.store.get_order_state(&request.order_id).await {
            Ok(existing) => existing,
            Err(e) => {
                tracing::warn!("Could not read state for {}: {}", request.order_id, e);
                return;
            }
        };

        if let Some(record) = existing {
            tracing::debug!(
                "Order {} already tracked in state {:?}",
                request.order_id,
                record.state
            );
            return;
        }

        if let Err(e) = self
            .store
            .set_order_state(&request.order_id, &OrderRecord::prepared(request.amount))
            .await
        {
            tracing::warn!("Could not record prepared order {}: {}", request.order_id, e);
        }
    }

    pub async fn complete(&self, callback: &PaymentCallback) -> Result<CompletionResponse, CheckoutError> {
        if let Err(e) = self.signer.verify(
            callback.timestamp,
            &callback.order_id,
            callback.amount,
            &callback.signature,
        ) {
            self.stats.record_rejected();
            return Err(e);
        }

        let success = callback.is_success();
        let record = OrderRecord::completed(success, callback.amount, &callback.result_msg);

        match self.store.complete_order(&callback.order_id, &record).await? {
            Completion::Claimed => {
                self.stats.record_completion(success);

                if success {
                    tracing::info!(
                        order_id = %callback.order_id,
                        amount = callback.amount,
                        "Payment completed"
                    );
                } else {
                    tracing::info!(
                        order_id = %callback.order_id,
                        amount = callback.amount,
                        result_code = %callback.result_code,
                        result_msg = %callback.result_msg,
                        "Payment failed at gateway"
                    );
                }

                outcome_response(&record)
            }
            Completion::AlreadyCompleted(existing) => {
                self.stats.record_replay();

                if existing.state != record.state {
                    tracing::warn!(
                        order_id = %callback.order_id,
                        recorded = ?existing.state,
                        received = ?record.state,
                        "Replayed callback disagrees with recorded outcome"
                    );
                } else {
                    tracing::info!(order_id = %callback.order_id, "Replayed callback ignored");
                }

                outcome_response(&existing)
            }
        }
    }
}

fn outcome_response(record: &OrderRecord) -> Result<CompletionResponse, CheckoutError> {
    record.to_response().ok_or_else(|| {
        CheckoutError::Internal(format!("non-terminal outcome record: {:?}", record.state))
    })
}
