use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn patient_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_patients))
        .route(
            "/{patient_id}",
            get(handlers::get_patient)
                .put(handlers::update_patient)
                .patch(handlers::update_patient),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Public self-registration.
pub fn registration_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::register_patient))
        .with_state(state)
}
