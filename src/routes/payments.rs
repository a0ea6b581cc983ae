use axum::{middleware, routing::post, Router};

use crate::handlers::payments;
use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    // The callback is invoked by the payment provider, not by a logged-in
    // user, so it stays outside the auth layer.
    let public = Router::new().route("/callback", post(payments::payment_callback));

    let protected = Router::new()
        .route("/create", post(payments::create_payment))
        .route("/verify/:transaction_id", post(payments::verify_payment))
        .route(
            "/simulate-payment/:apartment_id",
            post(payments::simulate_payment),
        )
        .route_layer(middleware::from_fn(auth_middleware));

    public.merge(protected)
}
