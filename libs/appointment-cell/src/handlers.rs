use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::client_ip;
use shared_utils::guard::require_admin;

use crate::models::{
    Appointment, AppointmentError, AppointmentQuery, CreateAppointmentRequest, RescheduleRequest,
    Visibility,
};
use crate::services::{AppointmentAction, AppointmentService};

/// Patients see their own appointments, doctors the ones booked with them.
fn visibility(user: &User) -> Result<Visibility, AppError> {
    if user.is_admin() {
        Ok(Visibility::All)
    } else if user.is_doctor() {
        Ok(Visibility::Doctor(user.id))
    } else if user.is_patient() {
        Ok(Visibility::Patient(user.id))
    } else {
        Err(AppointmentError::Forbidden.into())
    }
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let scope = visibility(&user)?;
    let appointments = AppointmentService::new(&config).list(query, scope).await?;
    Ok(Json(appointments))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Appointment>, AppError> {
    let scope = visibility(&user)?;
    let appointment = AppointmentService::new(&config)
        .get_visible(appointment_id, scope)
        .await?;
    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    headers: HeaderMap,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let scope = visibility(&user)?;
    let appointment = AppointmentService::new(&config)
        .create(request, user.id, scope, &client_ip(&headers))
        .await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

async fn transition(
    config: &AppConfig,
    user: &User,
    headers: &HeaderMap,
    appointment_id: i64,
    action: AppointmentAction,
) -> Result<Json<Appointment>, AppError> {
    let scope = visibility(user)?;
    let appointment = AppointmentService::new(config)
        .apply(appointment_id, action, user.id, scope, &client_ip(headers))
        .await?;
    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn confirm_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    headers: HeaderMap,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Appointment>, AppError> {
    transition(&config, &user, &headers, appointment_id, AppointmentAction::Confirm).await
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    headers: HeaderMap,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Appointment>, AppError> {
    transition(&config, &user, &headers, appointment_id, AppointmentAction::Cancel).await
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    headers: HeaderMap,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Appointment>, AppError> {
    transition(&config, &user, &headers, appointment_id, AppointmentAction::Complete).await
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    headers: HeaderMap,
    Path(appointment_id): Path<i64>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<Appointment>, AppError> {
    let scope = visibility(&user)?;
    let appointment = AppointmentService::new(&config)
        .reschedule(appointment_id, request, user.id, scope, &client_ip(&headers))
        .await?;
    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    headers: HeaderMap,
    Path(appointment_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_admin(&user)?;
    AppointmentService::new(&config)
        .delete(appointment_id, user.id, &client_ip(&headers))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
