pub(crate) mod apartments;
pub(crate) mod auth;
pub(crate) mod payments;
