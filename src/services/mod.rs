pub mod google_auth;
pub mod payment_service;
