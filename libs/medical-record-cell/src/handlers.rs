use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::guard::{require_admin, require_staff};

use crate::models::{
    ByConsultationQuery, ClinicalHistory, Consultation, ConsultationQuery, CreateConsultationRequest,
    CreateDocumentRequest, CreateExamRequest, CreateFollowUpRequest, CreateHistoryRequest,
    CreatePrescriptionRequest, Document, DocumentQuery, ExamRequest, ExamRequestQuery,
    ExamResultRequest, ExamType, ExamTypeQuery, ExamTypeRequest, FollowUp, HistoryQuery,
    MedicalRecordError, Prescription, UpdateConsultationRequest, UpdateFollowUpRequest,
    UpdateHistoryRequest,
};
use crate::services::{
    ClinicalHistoryService, ConsultationService, DocumentService, ExamService,
    PrescriptionService,
};

/// Staff see every record; patients only their own.
fn owner_scope(user: &User) -> Result<Option<i64>, AppError> {
    if user.is_doctor() || user.is_admin() {
        Ok(None)
    } else if user.is_patient() {
        Ok(Some(user.id))
    } else {
        Err(MedicalRecordError::Forbidden.into())
    }
}

fn ensure_owner(user: &User, paciente_id: i64) -> Result<(), AppError> {
    match owner_scope(user)? {
        Some(owner) if owner != paciente_id => Err(MedicalRecordError::Forbidden.into()),
        _ => Ok(()),
    }
}

fn acting_doctor(user: &User) -> Option<i64> {
    user.is_doctor().then_some(user.id)
}

// ==============================================================================
// HISTORIAS CLINICAS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_histories(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ClinicalHistory>>, AppError> {
    let owner = owner_scope(&user)?;
    let histories = ClinicalHistoryService::new(&config).list(query, owner).await?;
    Ok(Json(histories))
}

#[axum::debug_handler]
pub async fn get_history(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(history_id): Path<i64>,
) -> Result<Json<ClinicalHistory>, AppError> {
    let history = ClinicalHistoryService::new(&config).get(history_id).await?;
    ensure_owner(&user, history.paciente_id)?;
    Ok(Json(history))
}

#[axum::debug_handler]
pub async fn create_history(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateHistoryRequest>,
) -> Result<(StatusCode, Json<ClinicalHistory>), AppError> {
    require_staff(&user)?;

    let history = ClinicalHistoryService::new(&config)
        .open_for_patient(request.paciente, request.observaciones_generales)
        .await?;
    Ok((StatusCode::CREATED, Json(history)))
}

#[axum::debug_handler]
pub async fn update_history(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(history_id): Path<i64>,
    Json(request): Json<UpdateHistoryRequest>,
) -> Result<Json<ClinicalHistory>, AppError> {
    require_staff(&user)?;

    let history = ClinicalHistoryService::new(&config)
        .update(history_id, request)
        .await?;
    Ok(Json(history))
}

// ==============================================================================
// CONSULTAS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_consultations(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Query(query): Query<ConsultationQuery>,
) -> Result<Json<Vec<Consultation>>, AppError> {
    let owner = owner_scope(&user)?;
    let consultations = ConsultationService::new(&config).list(query, owner).await?;
    Ok(Json(consultations))
}

#[axum::debug_handler]
pub async fn get_consultation(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(consultation_id): Path<i64>,
) -> Result<Json<Consultation>, AppError> {
    let service = ConsultationService::new(&config);
    if owner_scope(&user)?.is_some() {
        let paciente_id = service.patient_of(consultation_id).await?;
        ensure_owner(&user, paciente_id)?;
    }
    Ok(Json(service.get(consultation_id).await?))
}

#[axum::debug_handler]
pub async fn create_consultation(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateConsultationRequest>,
) -> Result<(StatusCode, Json<Consultation>), AppError> {
    require_staff(&user)?;

    let consultation = ConsultationService::new(&config)
        .create(request, acting_doctor(&user))
        .await?;
    Ok((StatusCode::CREATED, Json(consultation)))
}

#[axum::debug_handler]
pub async fn update_consultation(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(consultation_id): Path<i64>,
    Json(request): Json<UpdateConsultationRequest>,
) -> Result<Json<Consultation>, AppError> {
    require_staff(&user)?;

    let consultation = ConsultationService::new(&config)
        .update(consultation_id, request)
        .await?;
    Ok(Json(consultation))
}

#[axum::debug_handler]
pub async fn delete_consultation(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(consultation_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_staff(&user)?;

    ConsultationService::new(&config).delete(consultation_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// SEGUIMIENTOS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_follow_ups(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Query(query): Query<ByConsultationQuery>,
) -> Result<Json<Vec<FollowUp>>, AppError> {
    require_staff(&user)?;
    let follow_ups = ConsultationService::new(&config).list_follow_ups(query).await?;
    Ok(Json(follow_ups))
}

#[axum::debug_handler]
pub async fn get_follow_up(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(follow_up_id): Path<i64>,
) -> Result<Json<FollowUp>, AppError> {
    require_staff(&user)?;
    let follow_up = ConsultationService::new(&config).get_follow_up(follow_up_id).await?;
    Ok(Json(follow_up))
}

#[axum::debug_handler]
pub async fn create_follow_up(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateFollowUpRequest>,
) -> Result<(StatusCode, Json<FollowUp>), AppError> {
    require_staff(&user)?;
    let follow_up = ConsultationService::new(&config).create_follow_up(request).await?;
    Ok((StatusCode::CREATED, Json(follow_up)))
}

#[axum::debug_handler]
pub async fn update_follow_up(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(follow_up_id): Path<i64>,
    Json(request): Json<UpdateFollowUpRequest>,
) -> Result<Json<FollowUp>, AppError> {
    require_staff(&user)?;
    let follow_up = ConsultationService::new(&config)
        .update_follow_up(follow_up_id, request)
        .await?;
    Ok(Json(follow_up))
}

#[axum::debug_handler]
pub async fn delete_follow_up(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(follow_up_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_staff(&user)?;
    ConsultationService::new(&config).delete_follow_up(follow_up_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// DOCUMENTOS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_documents(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Query(query): Query<DocumentQuery>,
) -> Result<Json<Vec<Document>>, AppError> {
    let owner = owner_scope(&user)?;
    let documents = DocumentService::new(&config).list(query, owner).await?;
    Ok(Json(documents))
}

#[axum::debug_handler]
pub async fn get_document(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(document_id): Path<i64>,
) -> Result<Json<Document>, AppError> {
    let document = DocumentService::new(&config).get(document_id).await?;
    if owner_scope(&user)?.is_some() {
        let paciente_id = ClinicalHistoryService::new(&config)
            .owner_of(document.historia_clinica_id)
            .await?;
        ensure_owner(&user, paciente_id)?;
    }
    Ok(Json(document))
}

#[axum::debug_handler]
pub async fn create_document(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<Document>), AppError> {
    require_staff(&user)?;
    let document = DocumentService::new(&config).create(request).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

#[axum::debug_handler]
pub async fn delete_document(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(document_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_staff(&user)?;
    DocumentService::new(&config).delete(document_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// RECETAS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_prescriptions(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Query(query): Query<ByConsultationQuery>,
) -> Result<Json<Vec<Prescription>>, AppError> {
    let owner = owner_scope(&user)?;
    let prescriptions = PrescriptionService::new(&config).list(query, owner).await?;
    Ok(Json(prescriptions))
}

#[axum::debug_handler]
pub async fn get_prescription(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(prescription_id): Path<i64>,
) -> Result<Json<Prescription>, AppError> {
    let prescription = PrescriptionService::new(&config).get(prescription_id).await?;
    if owner_scope(&user)?.is_some() {
        let paciente_id = ConsultationService::new(&config)
            .patient_of(prescription.consulta_id)
            .await?;
        ensure_owner(&user, paciente_id)?;
    }
    Ok(Json(prescription))
}

#[axum::debug_handler]
pub async fn create_prescription(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreatePrescriptionRequest>,
) -> Result<(StatusCode, Json<Prescription>), AppError> {
    require_staff(&user)?;
    let prescription = PrescriptionService::new(&config).create(request).await?;
    Ok((StatusCode::CREATED, Json(prescription)))
}

// ==============================================================================
// TIPOS DE EXAMEN
// ==============================================================================

#[axum::debug_handler]
pub async fn list_exam_types(
    State(config): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    Query(query): Query<ExamTypeQuery>,
) -> Result<Json<Vec<ExamType>>, AppError> {
    let types = ExamService::new(&config).list_types(query).await?;
    Ok(Json(types))
}

#[axum::debug_handler]
pub async fn get_exam_type(
    State(config): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    Path(type_id): Path<i64>,
) -> Result<Json<ExamType>, AppError> {
    let exam_type = ExamService::new(&config).get_type(type_id).await?;
    Ok(Json(exam_type))
}

#[axum::debug_handler]
pub async fn create_exam_type(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<ExamTypeRequest>,
) -> Result<(StatusCode, Json<ExamType>), AppError> {
    require_admin(&user)?;
    let exam_type = ExamService::new(&config).create_type(request).await?;
    Ok((StatusCode::CREATED, Json(exam_type)))
}

#[axum::debug_handler]
pub async fn update_exam_type(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(type_id): Path<i64>,
    Json(request): Json<ExamTypeRequest>,
) -> Result<Json<ExamType>, AppError> {
    require_admin(&user)?;
    let exam_type = ExamService::new(&config).update_type(type_id, request).await?;
    Ok(Json(exam_type))
}

#[axum::debug_handler]
pub async fn delete_exam_type(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(type_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_admin(&user)?;
    ExamService::new(&config).delete_type(type_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// SOLICITUDES DE EXAMEN
// ==============================================================================

#[axum::debug_handler]
pub async fn list_exam_requests(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Query(query): Query<ExamRequestQuery>,
) -> Result<Json<Vec<ExamRequest>>, AppError> {
    let owner = owner_scope(&user)?;
    let requests = ExamService::new(&config).list_requests(query, owner).await?;
    Ok(Json(requests))
}

#[axum::debug_handler]
pub async fn get_exam_request(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(request_id): Path<i64>,
) -> Result<Json<ExamRequest>, AppError> {
    let request = ExamService::new(&config).get_request(request_id).await?;
    ensure_owner(&user, request.paciente_id)?;
    Ok(Json(request))
}

#[axum::debug_handler]
pub async fn create_exam_request(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateExamRequest>,
) -> Result<(StatusCode, Json<ExamRequest>), AppError> {
    require_staff(&user)?;
    let created = ExamService::new(&config).request_exam(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[axum::debug_handler]
pub async fn record_exam_result(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(request_id): Path<i64>,
    Json(result): Json<ExamResultRequest>,
) -> Result<Json<ExamRequest>, AppError> {
    require_staff(&user)?;
    let updated = ExamService::new(&config).record_result(request_id, result).await?;
    Ok(Json(updated))
}
