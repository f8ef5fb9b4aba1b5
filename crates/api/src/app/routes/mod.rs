//! Route table: (method, path) → handler.

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use crate::app::services::AppServices;
use crate::middleware;

pub mod auth;
pub mod products;
pub mod system;

/// Routes reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/login/", post(auth::login))
        .route("/login/refresh/", post(auth::refresh))
}

/// Product CRUD. The caller wraps this in the auth stage.
///
/// Only the list endpoint goes through the cache lookup stage; every route
/// goes through the write-invalidation stage.
pub fn product_router(services: Arc<AppServices>) -> Router {
    Router::new()
        .route(
            "/products/",
            get(products::list)
                .route_layer(from_fn_with_state(services.clone(), middleware::cache_lookup)),
        )
        .route("/products/", post(products::create))
        .route(
            "/products/:id/",
            get(products::retrieve)
                .put(products::update)
                .patch(products::partial_update)
                .delete(products::destroy),
        )
        .route_layer(from_fn_with_state(services, middleware::invalidate_on_write))
}
