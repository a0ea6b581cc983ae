use std::sync::Arc;

use mongodb::Database;

use crate::config::AppConfig;
use crate::services::google_auth::GoogleAuthService;
use crate::services::payment_service::GrowPaymentService;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<AppConfig>,
    pub payment_service: Arc<GrowPaymentService>,
    pub google_auth: Arc<GoogleAuthService>,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig) -> Self {
        let payment_service = Arc::new(GrowPaymentService::new(config.clone()));
        let google_auth = Arc::new(GoogleAuthService::new(config.google_client_id.clone()));

        AppState {
            db,
            config: Arc::new(config),
            payment_service,
            google_auth,
        }
    }
}
