pub mod apartments;
pub mod auth;
pub mod payments;
