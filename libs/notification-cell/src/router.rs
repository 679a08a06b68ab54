use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn notification_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_notifications))
        .route("/leer-todas", post(handlers::mark_all_read))
        .route("/{notification_id}/leer", post(handlers::mark_read))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

pub fn device_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_devices).post(handlers::register_device))
        .route("/{device_id}", delete(handlers::delete_device))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
