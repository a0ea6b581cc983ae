// services/payment_service.rs
use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{error, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::dtos::payment_dtos::PaymentResponse;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GrowCreateResponse {
    payment_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GrowStatusResponse {
    status: Option<String>,
}

/// Adapter for the Grow payment provider. Every failure mode - missing
/// configuration, transport errors, non-2xx responses - folds into a
/// structured failure result; nothing here ever propagates an error to the
/// caller. The client timeout keeps a dead provider from hanging requests.
#[derive(Debug, Clone)]
pub struct GrowPaymentService {
    config: AppConfig,
    client: Client,
}

impl GrowPaymentService {
    pub fn new(config: AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        GrowPaymentService { config, client }
    }

    pub async fn create_payment(
        &self,
        apartment_id: &str,
        user_id: &str,
        amount: f64,
        description: &str,
    ) -> PaymentResponse {
        if !self.config.payments_configured() {
            warn!("Grow payment service not configured");
            return PaymentResponse::failure("Payment service not configured");
        }

        let transaction_id = Uuid::new_v4().to_string();

        let payment_data = json!({
            "terminalId": self.config.grow_terminal_id,
            "amount": amount,
            "currency": "ILS",
            "description": description,
            "transactionId": transaction_id,
            "callbackUrl": format!("{}?apartmentId={}", self.config.grow_callback_url, apartment_id),
            "metadata": {
                "apartmentId": apartment_id,
                "userId": user_id,
            },
        });

        let response = self
            .client
            .post(format!("{}/api/v1/payments", self.config.grow_base_url))
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.grow_api_key),
            )
            .json(&payment_data)
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                match response.json::<GrowCreateResponse>().await {
                    Ok(result) => PaymentResponse {
                        success: true,
                        payment_url: result.payment_url,
                        transaction_id: Some(transaction_id),
                        error_message: None,
                    },
                    Err(e) => {
                        error!("Grow payment response unreadable: {}", e);
                        PaymentResponse::failure("Payment creation failed")
                    }
                }
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                error!("Grow payment failed: {} - {}", status, body);
                PaymentResponse::failure("Payment creation failed")
            }
            Err(e) => {
                error!("Error creating payment: {}", e);
                PaymentResponse::failure("Payment service error")
            }
        }
    }

    pub async fn verify_payment(&self, transaction_id: &str) -> bool {
        if self.config.grow_api_key.is_empty() {
            return false;
        }

        let response = self
            .client
            .get(format!(
                "{}/api/v1/payments/{}",
                self.config.grow_base_url, transaction_id
            ))
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.grow_api_key),
            )
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                match response.json::<GrowStatusResponse>().await {
                    Ok(result) => result.status.as_deref() == Some("completed"),
                    Err(e) => {
                        error!("Grow status response unreadable: {}", e);
                        false
                    }
                }
            }
            Ok(response) => {
                error!("Grow verify failed: {}", response.status());
                false
            }
            Err(e) => {
                error!("Error verifying payment: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unconfigured() -> GrowPaymentService {
        GrowPaymentService::new(AppConfig {
            grow_api_key: String::new(),
            grow_terminal_id: String::new(),
            grow_base_url: "https://api.grow.co.il".to_string(),
            grow_callback_url: String::new(),
            google_client_id: String::new(),
            allow_payment_simulation: false,
            database_url: "mongodb://localhost".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
        })
    }

    #[tokio::test]
    async fn create_payment_without_configuration_fails_closed() {
        let response = unconfigured()
            .create_payment("apt-1", "user-1", 10.0, "listing fee")
            .await;

        assert!(!response.success);
        assert!(response.transaction_id.is_none());
        assert_eq!(
            response.error_message.as_deref(),
            Some("Payment service not configured")
        );
    }

    #[tokio::test]
    async fn verify_payment_without_configuration_is_not_confirmed() {
        assert!(!unconfigured().verify_payment("tx-1").await);
    }
}
