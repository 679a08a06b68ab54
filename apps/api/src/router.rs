use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use appointment_cell::appointment_routes;
use auth_cell::{profile_routes, token_routes};
use backup_cell::backup_routes;
use doctor_cell::{assignment_routes, doctor_routes, schedule_routes, specialty_routes};
use medical_record_cell::{
    consultation_routes, document_routes, exam_request_routes, exam_type_routes,
    follow_up_routes, history_routes, prescription_routes,
};
use notification_cell::{device_routes, notification_routes};
use patient_cell::{patient_routes, registration_routes};
use security_cell::audit_routes;
use shared_config::AppConfig;
use user_cell::{
    administrator_routes, component_routes, permission_routes, role_routes, user_routes,
};

async fn health(config: Arc<AppConfig>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "postgrest": config.is_configured(),
        "push": config.is_push_configured(),
        "email": config.is_email_configured(),
        "backup": config.is_backup_configured(),
    }))
}

pub fn api_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        // Authentication
        .nest("/token", token_routes(state.clone()))
        .nest("/mi-perfil", profile_routes(state.clone()))
        .nest("/registro-paciente", registration_routes(state.clone()))
        // Users, roles and UI access
        .nest("/usuarios", user_routes(state.clone()))
        .nest("/roles", role_routes(state.clone()))
        .nest("/permisos", permission_routes(state.clone()))
        .nest("/componentes", component_routes(state.clone()))
        .nest("/administradores", administrator_routes(state.clone()))
        .nest("/bitacora", audit_routes(state.clone()))
        // Patients, doctors and scheduling
        .nest("/pacientes", patient_routes(state.clone()))
        .nest("/medicos", doctor_routes(state.clone()))
        .nest("/especialidades", specialty_routes(state.clone()))
        .nest("/medico-especialidades", assignment_routes(state.clone()))
        .nest("/horarios", schedule_routes(state.clone()))
        .nest("/citas", appointment_routes(state.clone()))
        // Clinical records
        .nest("/historias-clinicas", history_routes(state.clone()))
        .nest("/consultas", consultation_routes(state.clone()))
        .nest("/documentos", document_routes(state.clone()))
        .nest("/recetas", prescription_routes(state.clone()))
        .nest("/seguimientos", follow_up_routes(state.clone()))
        .nest("/tipos-examen", exam_type_routes(state.clone()))
        .nest("/solicitudes-examen", exam_request_routes(state.clone()))
        // Notifications
        .nest("/notificaciones", notification_routes(state.clone()))
        .nest("/dispositivos", device_routes(state.clone()))
        .nest("/backups", backup_routes(state))
}

pub fn create_router(state: Arc<AppConfig>) -> Router {
    let health_state = state.clone();
    Router::new()
        .route("/", get(|| async { "Clinic API is running!" }))
        .route("/health", get(move || health(health_state.clone())))
        .nest("/api", api_routes(state))
}
