use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
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

pub fn history_routes(state: Arc<AppConfig>) -> Router {
    let router = Router::new()
        .route("/", get(handlers::list_histories).post(handlers::create_history))
        .route(
            "/{history_id}",
            get(handlers::get_history)
                .put(handlers::update_history)
                .patch(handlers::update_history),
        );
    authenticated(router, state)
}

pub fn consultation_routes(state: Arc<AppConfig>) -> Router {
    let router = Router::new()
        .route(
            "/",
            get(handlers::list_consultations).post(handlers::create_consultation),
        )
        .route(
            "/{consultation_id}",
            get(handlers::get_consultation)
                .put(handlers::update_consultation)
                .patch(handlers::update_consultation)
                .delete(handlers::delete_consultation),
        );
    authenticated(router, state)
}

pub fn follow_up_routes(state: Arc<AppConfig>) -> Router {
    let router = Router::new()
        .route("/", get(handlers::list_follow_ups).post(handlers::create_follow_up))
        .route(
            "/{follow_up_id}",
            get(handlers::get_follow_up)
                .put(handlers::update_follow_up)
                .patch(handlers::update_follow_up)
                .delete(handlers::delete_follow_up),
        );
    authenticated(router, state)
}

pub fn document_routes(state: Arc<AppConfig>) -> Router {
    let router = Router::new()
        .route("/", get(handlers::list_documents).post(handlers::create_document))
        .route(
            "/{document_id}",
            get(handlers::get_document).delete(handlers::delete_document),
        );
    authenticated(router, state)
}

pub fn prescription_routes(state: Arc<AppConfig>) -> Router {
    let router = Router::new()
        .route(
            "/",
            get(handlers::list_prescriptions).post(handlers::create_prescription),
        )
        .route("/{prescription_id}", get(handlers::get_prescription));
    authenticated(router, state)
}

pub fn exam_type_routes(state: Arc<AppConfig>) -> Router {
    let router = Router::new()
        .route("/", get(handlers::list_exam_types).post(handlers::create_exam_type))
        .route(
            "/{type_id}",
            get(handlers::get_exam_type)
                .put(handlers::update_exam_type)
                .patch(handlers::update_exam_type)
                .delete(handlers::delete_exam_type),
        );
    authenticated(router, state)
}

pub fn exam_request_routes(state: Arc<AppConfig>) -> Router {
    let router = Router::new()
        .route(
            "/",
            get(handlers::list_exam_requests).post(handlers::create_exam_request),
        )
        .route("/{request_id}", get(handlers::get_exam_request))
        .route("/{request_id}/resultado", post(handlers::record_exam_result));
    authenticated(router, state)
}
