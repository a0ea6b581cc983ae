pub mod apartment_dtos;
pub mod auth_dtos;
pub mod payment_dtos;
