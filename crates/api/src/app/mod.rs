//! HTTP application wiring (Axum router + request pipeline).
//!
//! - `services.rs`: shared collaborators (store, cache, users, tokens)
//! - `routes/`: route table and handlers
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: error → response mapping

use std::sync::Arc;

use axum::{Extension, Router, middleware::from_fn, middleware::from_fn_with_state};
use tower::ServiceBuilder;

use agro_auth::JwtValidator;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: AppServices) -> Router {
    let services = Arc::new(services);
    let jwt: Arc<dyn JwtValidator> = services.jwt.clone();
    let auth_state = middleware::AuthState {
        jwt,
        users: services.users.clone(),
    };

    // Protected routes: the auth stage runs before anything else in them.
    let protected = routes::product_router(services.clone())
        .route_layer(from_fn_with_state(auth_state, middleware::auth_middleware));

    Router::new()
        .merge(routes::public_router())
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(middleware::request_log))
                .layer(Extension(services)),
        )
}
