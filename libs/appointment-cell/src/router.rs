use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::list_appointments).post(handlers::create_appointment),
        )
        .route(
            "/{appointment_id}",
            get(handlers::get_appointment).delete(handlers::delete_appointment),
        )
        // State transitions
        .route("/{appointment_id}/confirmar", post(handlers::confirm_appointment))
        .route("/{appointment_id}/cancelar", post(handlers::cancel_appointment))
        .route("/{appointment_id}/realizar", post(handlers::complete_appointment))
        .route(
            "/{appointment_id}/reprogramar",
            post(handlers::reschedule_appointment),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
