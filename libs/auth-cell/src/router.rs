use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Public token endpoints.
pub fn token_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::obtain_token_pair))
        .route("/refresh", post(handlers::refresh_token))
        .route("/blacklist", post(handlers::blacklist_token))
        .with_state(state)
}

pub fn profile_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::get_profile)
                .put(handlers::update_profile)
                .patch(handlers::update_profile),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
