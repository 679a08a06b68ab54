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
use shared_utils::guard::require_staff;

use crate::models::{
    PatientError, PatientRegistrationRequest, PatientResponse, PatientSearchQuery,
    UpdatePatientRequest,
};
use crate::services::PatientService;

#[axum::debug_handler]
pub async fn register_patient(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
    Json(request): Json<PatientRegistrationRequest>,
) -> Result<(StatusCode, Json<PatientResponse>), AppError> {
    let patient = PatientService::new(&config)
        .register(request, &client_ip(&headers))
        .await?;
    Ok((StatusCode::CREATED, Json(patient.into())))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Query(query): Query<PatientSearchQuery>,
) -> Result<Json<Vec<PatientResponse>>, AppError> {
    require_staff(&user)?;

    let patients = PatientService::new(&config).list_patients(query).await?;
    Ok(Json(patients.into_iter().map(PatientResponse::from).collect()))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<i64>,
) -> Result<Json<PatientResponse>, AppError> {
    if user.is_patient() {
        if user.id != patient_id {
            return Err(PatientError::Unauthorized.into());
        }
    } else {
        require_staff(&user)?;
    }

    let patient = PatientService::new(&config).get_patient(patient_id).await?;
    Ok(Json(patient.into()))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<i64>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<PatientResponse>, AppError> {
    require_staff(&user)?;

    let patient = PatientService::new(&config)
        .update_patient(patient_id, request)
        .await?;
    Ok(Json(patient.into()))
}
