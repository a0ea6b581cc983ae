use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub apartment_id: String,
}

/// Structured gateway result. Failures are carried here, never thrown: the
/// caller branches on `success` instead of catching transport errors.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl PaymentResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        PaymentResponse {
            success: false,
            payment_url: None,
            transaction_id: None,
            error_message: Some(message.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCallbackRequest {
    pub transaction_id: String,
    pub status: String,
}

impl PaymentCallbackRequest {
    /// The provider signals completion with either of these values.
    pub fn is_completed(&self) -> bool {
        self.status == "completed" || self.status == "success"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_and_success_statuses_confirm_payment() {
        for status in ["completed", "success"] {
            let cb = PaymentCallbackRequest {
                transaction_id: "tx-1".to_string(),
                status: status.to_string(),
            };
            assert!(cb.is_completed());
        }
    }

    #[test]
    fn other_statuses_do_not_confirm_payment() {
        for status in ["pending", "failed", "cancelled", "COMPLETED", ""] {
            let cb = PaymentCallbackRequest {
                transaction_id: "tx-1".to_string(),
                status: status.to_string(),
            };
            assert!(!cb.is_completed(), "status {:?} must not confirm", status);
        }
    }
}
