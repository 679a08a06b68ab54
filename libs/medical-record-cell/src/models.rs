use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::error::AppError;

// ==============================================================================
// HISTORIA CLINICA
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalHistory {
    pub id: i64,
    pub paciente_id: i64,
    pub fecha_creacion: Option<DateTime<Utc>>,
    pub observaciones_generales: Option<String>,
    pub activo: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateHistoryRequest {
    pub paciente: i64,
    pub observaciones_generales: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateHistoryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observaciones_generales: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activo: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub paciente: Option<i64>,
    pub activo: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ==============================================================================
// CONSULTA / SEGUIMIENTO
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    pub id: i64,
    pub historia_clinica_id: i64,
    pub medico_id: i64,
    pub fecha_consulta: DateTime<Utc>,
    pub motivo_consulta: String,
    pub sintomas: Option<String>,
    pub diagnostico: Option<String>,
    pub tratamiento: Option<String>,
    pub observaciones: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateConsultationRequest {
    pub historia_clinica: i64,
    /// Defaults to the requesting doctor.
    pub medico: Option<i64>,
    pub fecha_consulta: Option<DateTime<Utc>>,
    pub motivo_consulta: Option<String>,
    pub sintomas: Option<String>,
    pub diagnostico: Option<String>,
    pub tratamiento: Option<String>,
    pub observaciones: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateConsultationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_consulta: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motivo_consulta: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sintomas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostico: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tratamiento: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsultationQuery {
    pub historia_clinica: Option<i64>,
    pub medico: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUp {
    pub id: i64,
    pub consulta_id: i64,
    pub fecha_seguimiento: NaiveDate,
    pub observaciones: String,
    pub recomendaciones: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFollowUpRequest {
    pub consulta: i64,
    pub fecha_seguimiento: NaiveDate,
    pub observaciones: Option<String>,
    pub recomendaciones: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateFollowUpRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_seguimiento: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recomendaciones: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ByConsultationQuery {
    pub consulta: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ==============================================================================
// DOCUMENTO
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Receta,
    Laboratorio,
    Imagen,
    Consentimiento,
    Otro,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Receta => "receta",
            DocumentKind::Laboratorio => "laboratorio",
            DocumentKind::Imagen => "imagen",
            DocumentKind::Consentimiento => "consentimiento",
            DocumentKind::Otro => "otro",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub historia_clinica_id: i64,
    pub consulta_id: Option<i64>,
    pub tipo_documento: DocumentKind,
    pub nombre_archivo: String,
    pub url_archivo: String,
    pub hash_archivo: Option<String>,
    pub fecha_subida: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDocumentRequest {
    pub historia_clinica: i64,
    pub consulta: Option<i64>,
    pub tipo_documento: DocumentKind,
    pub nombre_archivo: Option<String>,
    pub url_archivo: Option<String>,
    /// Base64 file content, optionally as a data URL. Only its hash is kept.
    pub contenido: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentQuery {
    pub historia_clinica: Option<i64>,
    pub consulta: Option<i64>,
    pub tipo_documento: Option<DocumentKind>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ==============================================================================
// RECETA
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionItem {
    pub id: i64,
    pub receta_id: i64,
    pub medicamento: String,
    pub dosis: String,
    pub frecuencia: String,
    pub duracion: String,
    pub indicaciones: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: i64,
    pub consulta_id: i64,
    pub fecha_receta: NaiveDate,
    pub observaciones: Option<String>,
    #[serde(default)]
    pub detalles: Vec<PrescriptionItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionItemRequest {
    pub medicamento: Option<String>,
    pub dosis: Option<String>,
    pub frecuencia: Option<String>,
    pub duracion: Option<String>,
    pub indicaciones: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePrescriptionRequest {
    pub consulta: i64,
    pub fecha_receta: Option<NaiveDate>,
    pub observaciones: Option<String>,
    #[serde(default)]
    pub detalles: Vec<PrescriptionItemRequest>,
}

// ==============================================================================
// EXAMENES
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    Rutina,
    Urgente,
    Emergencia,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamStatus {
    Solicitado,
    EnProceso,
    Completado,
    Cancelado,
}

impl ExamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamStatus::Solicitado => "solicitado",
            ExamStatus::EnProceso => "en_proceso",
            ExamStatus::Completado => "completado",
            ExamStatus::Cancelado => "cancelado",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamType {
    pub id: i64,
    pub codigo: String,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub indicaciones: Option<String>,
    pub urgencia_default: Urgency,
    pub activo: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExamTypeRequest {
    pub codigo: Option<String>,
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub indicaciones: Option<String>,
    pub urgencia_default: Option<Urgency>,
    pub activo: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExamTypeQuery {
    pub activo: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamRequest {
    pub id: i64,
    pub consulta_id: i64,
    pub paciente_id: i64,
    pub medico_id: i64,
    pub tipo_examen_id: i64,
    pub urgencia: Urgency,
    pub indicaciones_especificas: Option<String>,
    pub estado: ExamStatus,
    pub fecha_solicitud: Option<DateTime<Utc>>,
    pub resultados: Option<String>,
    pub observaciones: Option<String>,
    pub fecha_resultado: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipo_examen: Option<ExamType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateExamRequest {
    pub consulta: i64,
    pub tipo_examen: i64,
    pub urgencia: Option<Urgency>,
    pub indicaciones_especificas: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExamResultRequest {
    pub resultados: Option<String>,
    pub observaciones: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExamRequestQuery {
    pub paciente: Option<i64>,
    pub consulta: Option<i64>,
    pub estado: Option<ExamStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum MedicalRecordError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("El paciente ya tiene una historia clínica activa.")]
    ActiveHistoryExists,

    #[error("Ya existe un tipo de examen con este código.")]
    DuplicateExamCode,

    #[error("El examen ya tiene resultados registrados.")]
    AlreadyCompleted,

    #[error("No se pueden registrar resultados de un examen cancelado.")]
    ExamCancelled,

    #[error("No tiene acceso a este registro.")]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for MedicalRecordError {
    fn from(err: anyhow::Error) -> Self {
        MedicalRecordError::Database(err.to_string())
    }
}

impl From<MedicalRecordError> for AppError {
    fn from(err: MedicalRecordError) -> Self {
        match err {
            MedicalRecordError::NotFound(msg) => AppError::NotFound(msg.to_string()),
            MedicalRecordError::ActiveHistoryExists | MedicalRecordError::DuplicateExamCode => {
                AppError::Conflict(err.to_string())
            }
            MedicalRecordError::AlreadyCompleted | MedicalRecordError::ExamCancelled => {
                AppError::BadRequest(err.to_string())
            }
            MedicalRecordError::Forbidden => AppError::Forbidden(err.to_string()),
            MedicalRecordError::Validation(msg) => AppError::ValidationError(msg),
            MedicalRecordError::Database(msg) => AppError::Database(msg),
        }
    }
}
