use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use medical_record_cell::MedicalRecordError;
use shared_models::error::AppError;
use user_cell::{UserAccount, UserError, UserResponse};

pub const PATIENT_STATES: [&str; 2] = ["Activo", "Inactivo"];

/// Row of `core_paciente` with its embedded user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub usuario_id: i64,
    pub tipo_sangre: Option<String>,
    pub alergias: Option<String>,
    pub enfermedades_cronicas: Option<String>,
    pub medicamentos_actuales: Option<String>,
    pub contacto_emergencia_nombre: Option<String>,
    pub contacto_emergencia_telefono: Option<String>,
    pub contacto_emergencia_parentesco: Option<String>,
    pub estado: String,
    pub usuario: UserAccount,
}

impl Patient {
    pub fn full_name(&self) -> String {
        self.usuario.full_name()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientResponse {
    pub usuario: UserResponse,
    pub tipo_sangre: Option<String>,
    pub alergias: Option<String>,
    pub enfermedades_cronicas: Option<String>,
    pub medicamentos_actuales: Option<String>,
    pub contacto_emergencia_nombre: Option<String>,
    pub contacto_emergencia_telefono: Option<String>,
    pub contacto_emergencia_parentesco: Option<String>,
    pub estado: String,
}

impl From<Patient> for PatientResponse {
    fn from(p: Patient) -> Self {
        Self {
            usuario: p.usuario.into(),
            tipo_sangre: p.tipo_sangre,
            alergias: p.alergias,
            enfermedades_cronicas: p.enfermedades_cronicas,
            medicamentos_actuales: p.medicamentos_actuales,
            contacto_emergencia_nombre: p.contacto_emergencia_nombre,
            contacto_emergencia_telefono: p.contacto_emergencia_telefono,
            contacto_emergencia_parentesco: p.contacto_emergencia_parentesco,
            estado: p.estado,
        }
    }
}

/// Public self-registration: account fields plus the medical profile.
#[derive(Debug, Clone, Deserialize)]
pub struct PatientRegistrationRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub nombre: Option<String>,
    pub apellido: Option<String>,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub genero: Option<String>,
    pub tipo_sangre: Option<String>,
    pub alergias: Option<String>,
    pub enfermedades_cronicas: Option<String>,
    pub medicamentos_actuales: Option<String>,
    pub contacto_emergencia_nombre: Option<String>,
    pub contacto_emergencia_telefono: Option<String>,
    pub contacto_emergencia_parentesco: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdatePatientRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo_sangre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alergias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enfermedades_cronicas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medicamentos_actuales: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contacto_emergencia_nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contacto_emergencia_telefono: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contacto_emergencia_parentesco: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientSearchQuery {
    pub estado: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Error)]
pub enum PatientError {
    #[error("Paciente no encontrado")]
    NotFound,

    #[error("Solo puede consultar su propio perfil de paciente")]
    Unauthorized,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    User(#[from] UserError),

    #[error(transparent)]
    MedicalRecord(#[from] MedicalRecordError),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for PatientError {
    fn from(err: anyhow::Error) -> Self {
        PatientError::Database(err.to_string())
    }
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound => AppError::NotFound(err.to_string()),
            PatientError::Unauthorized => AppError::Forbidden(err.to_string()),
            PatientError::Validation(msg) => AppError::ValidationError(msg),
            PatientError::User(inner) => inner.into(),
            PatientError::MedicalRecord(inner) => inner.into(),
            PatientError::Database(msg) => AppError::Database(msg),
        }
    }
}
