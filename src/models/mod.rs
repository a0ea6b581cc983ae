pub mod apartment;
pub mod user;
