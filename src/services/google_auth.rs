// services/google_auth.rs
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, warn};

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

#[derive(Debug, Clone)]
pub struct GoogleUserInfo {
    pub google_id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    email: Option<String>,
    name: Option<String>,
}

/// Verifies Google ID tokens through the tokeninfo endpoint and checks the
/// audience against our client id. Any failure yields `None`; the caller
/// treats that as an unauthorized login attempt.
#[derive(Debug, Clone)]
pub struct GoogleAuthService {
    client: Client,
    client_id: String,
}

impl GoogleAuthService {
    pub fn new(client_id: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        GoogleAuthService { client, client_id }
    }

    pub async fn verify_id_token(&self, id_token: &str) -> Option<GoogleUserInfo> {
        if self.client_id.is_empty() {
            warn!("Google Client ID not configured");
            return None;
        }

        let response = self
            .client
            .get(TOKENINFO_URL)
            .query(&[("id_token", id_token)])
            .send()
            .await;

        let info: TokenInfo = match response {
            Ok(response) if response.status().is_success() => match response.json().await {
                Ok(info) => info,
                Err(e) => {
                    error!("Google tokeninfo response unreadable: {}", e);
                    return None;
                }
            },
            Ok(response) => {
                warn!("Google token rejected: {}", response.status());
                return None;
            }
            Err(e) => {
                error!("Error validating Google token: {}", e);
                return None;
            }
        };

        if info.aud != self.client_id {
            warn!("Google token audience mismatch");
            return None;
        }

        let email = info.email?;
        let name = info.name.unwrap_or_else(|| email.clone());

        Some(GoogleUserInfo {
            google_id: info.sub,
            email,
            name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_client_id_rejects_every_token() {
        let service = GoogleAuthService::new(String::new());
        assert!(service.verify_id_token("any-token").await.is_none());
    }
}
