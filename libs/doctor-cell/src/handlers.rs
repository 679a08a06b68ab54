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
    AssignSpecialtyRequest, AvailabilityResponse, CreateDoctorRequest, DoctorError, DoctorQuery,
    DoctorResponse, DoctorSpecialty, Schedule, ScheduleQuery, ScheduleRequest, Specialty,
    SpecialtyQuery, SpecialtyRequest, UpdateDoctorRequest,
};
use crate::services::{AvailabilityService, DoctorService, ScheduleService, SpecialtyService};

// ==============================================================================
// MEDICOS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_doctors(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<DoctorQuery>,
) -> Result<Json<Vec<DoctorResponse>>, AppError> {
    let doctors = DoctorService::new(&config).list_doctors(query).await?;
    Ok(Json(doctors.into_iter().map(DoctorResponse::from).collect()))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<DoctorResponse>, AppError> {
    let doctor = DoctorService::new(&config).get_doctor(doctor_id).await?;
    Ok(Json(doctor.into()))
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    headers: HeaderMap,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<DoctorResponse>), AppError> {
    require_admin(&user)?;

    let doctor = DoctorService::new(&config)
        .create_doctor(request, user.id, &client_ip(&headers))
        .await?;
    Ok((StatusCode::CREATED, Json(doctor.into())))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<i64>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<DoctorResponse>, AppError> {
    require_admin(&user)?;

    let doctor = DoctorService::new(&config)
        .update_doctor(doctor_id, request)
        .await?;
    Ok(Json(doctor.into()))
}

#[axum::debug_handler]
pub async fn list_doctor_specialties(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Vec<DoctorSpecialty>>, AppError> {
    let assignments = SpecialtyService::new(&config)
        .assignments_for(doctor_id)
        .await?;
    Ok(Json(assignments))
}

#[axum::debug_handler]
pub async fn assign_specialty(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<i64>,
    Json(request): Json<AssignSpecialtyRequest>,
) -> Result<(StatusCode, Json<DoctorSpecialty>), AppError> {
    require_admin(&user)?;
    let specialty_id = request.especialidad.ok_or_else(|| {
        DoctorError::Validation("El campo especialidad es obligatorio.".to_string())
    })?;

    let assignment = SpecialtyService::new(&config)
        .assign(doctor_id, specialty_id)
        .await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

// ==============================================================================
// MEDICO-ESPECIALIDADES
// ==============================================================================

#[axum::debug_handler]
pub async fn get_assignment(
    State(config): State<Arc<AppConfig>>,
    Path(assignment_id): Path<i64>,
) -> Result<Json<DoctorSpecialty>, AppError> {
    let assignment = SpecialtyService::new(&config)
        .get_assignment(assignment_id)
        .await?;
    Ok(Json(assignment))
}

#[axum::debug_handler]
pub async fn delete_assignment(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(assignment_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_admin(&user)?;
    SpecialtyService::new(&config).unassign(assignment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn get_availability(
    State(config): State<Arc<AppConfig>>,
    Path(assignment_id): Path<i64>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let availability = AvailabilityService::new(&config)
        .for_assignment(assignment_id)
        .await?;
    Ok(Json(availability))
}

// ==============================================================================
// ESPECIALIDADES
// ==============================================================================

#[axum::debug_handler]
pub async fn list_specialties(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<SpecialtyQuery>,
) -> Result<Json<Vec<Specialty>>, AppError> {
    Ok(Json(SpecialtyService::new(&config).list(query).await?))
}

#[axum::debug_handler]
pub async fn get_specialty(
    State(config): State<Arc<AppConfig>>,
    Path(specialty_id): Path<i64>,
) -> Result<Json<Specialty>, AppError> {
    Ok(Json(SpecialtyService::new(&config).get(specialty_id).await?))
}

#[axum::debug_handler]
pub async fn create_specialty(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<SpecialtyRequest>,
) -> Result<(StatusCode, Json<Specialty>), AppError> {
    require_admin(&user)?;
    let specialty = SpecialtyService::new(&config).create(request).await?;
    Ok((StatusCode::CREATED, Json(specialty)))
}

#[axum::debug_handler]
pub async fn update_specialty(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(specialty_id): Path<i64>,
    Json(request): Json<SpecialtyRequest>,
) -> Result<Json<Specialty>, AppError> {
    require_admin(&user)?;
    let specialty = SpecialtyService::new(&config)
        .update(specialty_id, request)
        .await?;
    Ok(Json(specialty))
}

#[axum::debug_handler]
pub async fn delete_specialty(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(specialty_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_admin(&user)?;
    SpecialtyService::new(&config).delete(specialty_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// HORARIOS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_schedules(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<Vec<Schedule>>, AppError> {
    Ok(Json(ScheduleService::new(&config).list(query).await?))
}

#[axum::debug_handler]
pub async fn get_schedule(
    State(config): State<Arc<AppConfig>>,
    Path(schedule_id): Path<i64>,
) -> Result<Json<Schedule>, AppError> {
    Ok(Json(ScheduleService::new(&config).get(schedule_id).await?))
}

#[axum::debug_handler]
pub async fn create_schedule(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<ScheduleRequest>,
) -> Result<(StatusCode, Json<Schedule>), AppError> {
    require_admin(&user)?;
    let schedule = ScheduleService::new(&config).create(request).await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

#[axum::debug_handler]
pub async fn update_schedule(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(schedule_id): Path<i64>,
    Json(request): Json<ScheduleRequest>,
) -> Result<Json<Schedule>, AppError> {
    require_admin(&user)?;
    let schedule = ScheduleService::new(&config)
        .update(schedule_id, request)
        .await?;
    Ok(Json(schedule))
}

#[axum::debug_handler]
pub async fn delete_schedule(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(schedule_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_admin(&user)?;
    ScheduleService::new(&config).delete(schedule_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
