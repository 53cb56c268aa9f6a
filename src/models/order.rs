use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CompletionResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    Prepared,
    PendingCallback,
    CompletedSuccess,
    CompletedFailure,
}

impl OrderState {
    pub const ALL: [OrderState; 4] = [
        OrderState::Prepared,
        OrderState::PendingCallback,
        OrderState::CompletedSuccess,
        OrderState::CompletedFailure,
    ];

    /// Wire name, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderState::Prepared => "PREPARED",
            OrderState::PendingCallback => "PENDING_CALLBACK",
            OrderState::CompletedSuccess => "COMPLETED_SUCCESS",
            OrderState::CompletedFailure => "COMPLETED_FAILURE",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderState::CompletedSuccess | OrderState::CompletedFailure)
    }

    pub fn can_transition_to(self, next: OrderState) -> bool {
        use OrderState::*;

        match (self, next) {
            (Prepared, PendingCallback) => true,
            (Prepared | PendingCallback, CompletedSuccess | CompletedFailure) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub state: OrderState,
    pub amount: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_msg: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRecord {
    pub fn prepared(amount: u64) -> Self {
        Self {
            state: OrderState::Prepared,
            amount,
            result_msg: None,
            updated_at: Utc::now(),
        }
    }

    pub fn completed(success: bool, amount: u64, result_msg: &str) -> Self {
        let (state, result_msg) = if success {
            (OrderState::CompletedSuccess, None)
        } else {
            (OrderState::CompletedFailure, Some(result_msg.to_string()))
        };

        Self {
            state,
            amount,
            result_msg,
            updated_at: Utc::now(),
        }
    }

    /// Response a terminal record answers with, so replays see the first outcome.
    pub fn to_response(&self) -> Option<CompletionResponse> {
        match self.state {
            OrderState::CompletedSuccess => Some(CompletionResponse::succeeded()),
            OrderState::CompletedFailure => Some(CompletionResponse::failed(
                self.result_msg.clone().unwrap_or_default(),
            )),
            _ => None,
        }
    }
}
