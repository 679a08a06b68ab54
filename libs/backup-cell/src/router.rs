use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn backup_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_backups).post(handlers::create_backup))
        .route("/limpiar", post(handlers::cleanup_backups))
        .route("/{backup_id}", delete(handlers::delete_backup))
        .route("/{backup_id}/restaurar", post(handlers::restore_backup))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
