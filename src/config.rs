// config.rs
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub grow_api_key: String,
    pub grow_terminal_id: String,
    pub grow_base_url: String,
    pub grow_callback_url: String,
    pub google_client_id: String,
    pub allow_payment_simulation: bool,
    pub database_url: String,
    pub port: u16,
    pub host: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        AppConfig {
            grow_api_key: env::var("GROW_API_KEY").unwrap_or_default(),
            grow_terminal_id: env::var("GROW_TERMINAL_ID").unwrap_or_default(),
            grow_base_url: env::var("GROW_BASE_URL")
                .unwrap_or_else(|_| "https://api.grow.co.il".to_string()),
            grow_callback_url: env::var("GROW_CALLBACK_URL").unwrap_or_default(),
            google_client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            allow_payment_simulation: env::var("ALLOW_PAYMENT_SIMULATION")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            database_url: env::var("DATABASE_URL")
                .expect("DATABASE_URL must be set"),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("PORT must be a number"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
        }
    }

    pub fn payments_configured(&self) -> bool {
        !self.grow_api_key.is_empty() && !self.grow_terminal_id.is_empty()
    }

    pub fn get_config_info(&self) -> serde_json::Value {
        serde_json::json!({
            "grow_base_url": self.grow_base_url,
            "grow_callback_url": self.grow_callback_url,
            "api_key_set": !self.grow_api_key.is_empty(),
            "terminal_id_set": !self.grow_terminal_id.is_empty(),
            "google_client_id_set": !self.google_client_id.is_empty(),
            "payment_simulation": self.allow_payment_simulation,
            "port": self.port,
            "host": self.host,
        })
    }
}
