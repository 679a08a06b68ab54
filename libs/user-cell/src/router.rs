use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn user_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_users).post(handlers::create_user))
        .route(
            "/{user_id}",
            get(handlers::get_user)
                .put(handlers::replace_user)
                .patch(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/{user_id}/cambiar-password", post(handlers::change_password))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

pub fn role_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_roles).post(handlers::create_role))
        .route(
            "/{role_id}",
            get(handlers::get_role)
                .put(handlers::update_role)
                .patch(handlers::update_role)
                .delete(handlers::delete_role),
        )
        .route(
            "/{role_id}/permisos",
            get(handlers::get_role_permissions).put(handlers::set_role_permissions),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

pub fn permission_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_permissions).post(handlers::create_permission))
        .route(
            "/{permission_id}",
            get(handlers::get_permission)
                .put(handlers::update_permission)
                .patch(handlers::update_permission)
                .delete(handlers::delete_permission),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

pub fn administrator_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_administrators))
        .route("/{user_id}", get(handlers::get_administrator))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

pub fn component_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_components))
        .route("/mios", get(handlers::my_components))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
