// =====================================================================================
// SECURITY CELL MODELS
// =====================================================================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::error::AppError;

/// Module names recorded in the audit log.
pub mod modules {
    pub const AUTH: &str = "Autenticación";
    pub const USERS: &str = "Usuarios";
    pub const DOCTORS: &str = "Médicos";
    pub const PATIENTS: &str = "Pacientes";
    pub const SCHEDULE: &str = "Agenda";
    pub const CLINICAL_HISTORIES: &str = "Historias Clínicas";
    pub const CONSULTATIONS: &str = "Consultas";
    pub const EXAMS: &str = "Exámenes";
    pub const SETTINGS: &str = "Configuración";
    pub const BACKUP: &str = "Backup/Restore";
}

/// Row of `core_bitacora`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub usuario_id: Option<i64>,
    pub ip_address: Option<String>,
    pub accion_realizada: String,
    pub modulo_afectado: String,
    pub fecha_hora: DateTime<Utc>,
    pub detalles: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuditEntry {
    pub usuario_id: Option<i64>,
    pub ip_address: String,
    pub accion_realizada: String,
    pub modulo_afectado: String,
    pub detalles: Option<String>,
}

impl NewAuditEntry {
    pub fn new(action: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            usuario_id: None,
            ip_address: "0.0.0.0".to_string(),
            accion_realizada: action.into(),
            modulo_afectado: module.into(),
            detalles: None,
        }
    }

    pub fn with_user(mut self, user_id: i64) -> Self {
        self.usuario_id = Some(user_id);
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = ip.into();
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.detalles = Some(details.into());
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditLogQuery {
    pub usuario: Option<i64>,
    pub modulo: Option<String>,
    pub desde: Option<NaiveDate>,
    pub hasta: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("Password must be at least {0} characters long")]
    PasswordTooShort(usize),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for SecurityError {
    fn from(err: anyhow::Error) -> Self {
        SecurityError::Database(err.to_string())
    }
}

impl From<SecurityError> for AppError {
    fn from(err: SecurityError) -> Self {
        match err {
            SecurityError::PasswordTooShort(_) => AppError::ValidationError(err.to_string()),
            SecurityError::Hashing(msg) => AppError::Internal(msg),
            SecurityError::Database(msg) => AppError::Database(msg),
        }
    }
}
