use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::apartments;
use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    // Search, city list and single-listing reads are public; everything that
    // creates or mutates requires a bearer token.
    let public = Router::new()
        .route("/", get(apartments::search_apartments))
        .route("/cities", get(apartments::get_cities))
        .route("/:id", get(apartments::get_apartment));

    let protected = Router::new()
        .route("/my", get(apartments::get_my_apartments))
        .route("/", post(apartments::create_apartment))
        .route("/:id", put(apartments::update_apartment))
        .route("/:id", delete(apartments::delete_apartment))
        .route_layer(middleware::from_fn(auth_middleware));

    public.merge(protected)
}
