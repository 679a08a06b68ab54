use std::sync::Arc;

use axum::{
    middleware,
    routing::get,
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

fn authenticated(router: Router<Arc<AppConfig>>, state: Arc<AppConfig>) -> Router {
    router
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    let router = Router::new()
        .route("/", get(handlers::list_doctors).post(handlers::create_doctor))
        .route(
            "/{doctor_id}",
            get(handlers::get_doctor)
                .put(handlers::update_doctor)
                .patch(handlers::update_doctor),
        )
        .route(
            "/{doctor_id}/especialidades",
            get(handlers::list_doctor_specialties).post(handlers::assign_specialty),
        );
    authenticated(router, state)
}

pub fn specialty_routes(state: Arc<AppConfig>) -> Router {
    let router = Router::new()
        .route(
            "/",
            get(handlers::list_specialties).post(handlers::create_specialty),
        )
        .route(
            "/{specialty_id}",
            get(handlers::get_specialty)
                .put(handlers::update_specialty)
                .patch(handlers::update_specialty)
                .delete(handlers::delete_specialty),
        );
    authenticated(router, state)
}

pub fn assignment_routes(state: Arc<AppConfig>) -> Router {
    let router = Router::new()
        .route(
            "/{assignment_id}",
            get(handlers::get_assignment).delete(handlers::delete_assignment),
        )
        .route(
            "/{assignment_id}/disponibilidad",
            get(handlers::get_availability),
        );
    authenticated(router, state)
}

pub fn schedule_routes(state: Arc<AppConfig>) -> Router {
    let router = Router::new()
        .route("/", get(handlers::list_schedules).post(handlers::create_schedule))
        .route(
            "/{schedule_id}",
            get(handlers::get_schedule)
                .put(handlers::update_schedule)
                .patch(handlers::update_schedule)
                .delete(handlers::delete_schedule),
        );
    authenticated(router, state)
}
