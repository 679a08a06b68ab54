use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::error::AppError;
use user_cell::{UserAccount, UserError, UserResponse};

pub const DOCTOR_STATES: [&str; 3] = ["Activo", "Inactivo", "Vacaciones"];

/// Weekday names as stored in `dia_semana`, Monday first.
pub const WEEKDAYS: [&str; 7] = [
    "Lunes",
    "Martes",
    "Miércoles",
    "Jueves",
    "Viernes",
    "Sábado",
    "Domingo",
];

// ==============================================================================
// ESPECIALIDADES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Specialty {
    pub id: i64,
    pub codigo: String,
    pub nombre: String,
    pub descripcion: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SpecialtyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codigo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpecialtyQuery {
    pub nombre: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Row of `medico_especialidad`; the specialty is embedded on reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSpecialty {
    pub id: i64,
    pub medico_id: i64,
    pub especialidad_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub especialidad: Option<Specialty>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignSpecialtyRequest {
    pub especialidad: Option<i64>,
}

// ==============================================================================
// MEDICOS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub usuario_id: i64,
    pub numero_licencia: String,
    pub firma_digital: Option<String>,
    pub estado: String,
    pub usuario: UserAccount,
    #[serde(default)]
    pub especialidades: Vec<DoctorSpecialty>,
}

impl Doctor {
    pub fn is_active(&self) -> bool {
        self.estado == "Activo"
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorResponse {
    pub usuario: UserResponse,
    pub numero_licencia: String,
    pub firma_digital: Option<String>,
    pub estado: String,
    pub especialidades: Vec<DoctorSpecialty>,
}

impl From<Doctor> for DoctorResponse {
    fn from(d: Doctor) -> Self {
        Self {
            usuario: d.usuario.into(),
            numero_licencia: d.numero_licencia,
            firma_digital: d.firma_digital,
            estado: d.estado,
            especialidades: d.especialidades,
        }
    }
}

/// Admin-side creation of a doctor account and profile.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDoctorRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub nombre: Option<String>,
    pub apellido: Option<String>,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub genero: Option<String>,
    pub numero_licencia: Option<String>,
    pub firma_digital: Option<String>,
    pub estado: Option<String>,
    #[serde(default)]
    pub especialidades: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateDoctorRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firma_digital: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorQuery {
    pub estado: Option<String>,
    pub especialidad: Option<i64>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ==============================================================================
// HORARIOS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    pub medico_especialidad_id: i64,
    pub dia_semana: String,
    pub hora_inicio: NaiveTime,
    pub hora_fin: NaiveTime,
    pub activo: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleRequest {
    pub medico_especialidad: Option<i64>,
    pub dia_semana: Option<String>,
    pub hora_inicio: Option<NaiveTime>,
    pub hora_fin: Option<NaiveTime>,
    pub activo: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleQuery {
    pub medico_especialidad: Option<i64>,
    pub dia_semana: Option<String>,
    pub activo: Option<bool>,
}

// ==============================================================================
// DISPONIBILIDAD
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayAvailability {
    pub fecha: NaiveDate,
    pub dia_semana: &'static str,
    pub horas: Vec<NaiveTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityResponse {
    pub medico_especialidad: i64,
    pub medico: i64,
    pub especialidad: i64,
    pub desde: NaiveDate,
    pub hasta: NaiveDate,
    pub dias: Vec<DayAvailability>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum DoctorError {
    #[error("Médico no encontrado")]
    NotFound,

    #[error("Especialidad no encontrada")]
    SpecialtyNotFound,

    #[error("Especialidad del médico no encontrada")]
    AssignmentNotFound,

    #[error("Horario no encontrado")]
    ScheduleNotFound,

    #[error("Ya existe un médico con este número de licencia.")]
    DuplicateLicense,

    #[error("Ya existe una especialidad con este código o nombre.")]
    DuplicateSpecialty,

    #[error("El médico ya tiene asignada esta especialidad.")]
    DuplicateAssignment,

    #[error("Ya existe un horario con los mismos datos para esta especialidad del médico.")]
    DuplicateSchedule,

    #[error("No se puede eliminar la especialidad porque está asociada a uno o más médicos.")]
    SpecialtyInUse,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    User(#[from] UserError),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for DoctorError {
    fn from(err: anyhow::Error) -> Self {
        DoctorError::Database(err.to_string())
    }
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound
            | DoctorError::SpecialtyNotFound
            | DoctorError::AssignmentNotFound
            | DoctorError::ScheduleNotFound => AppError::NotFound(err.to_string()),
            DoctorError::DuplicateLicense
            | DoctorError::DuplicateSpecialty
            | DoctorError::DuplicateAssignment
            | DoctorError::DuplicateSchedule => AppError::Conflict(err.to_string()),
            DoctorError::SpecialtyInUse => AppError::BadRequest(err.to_string()),
            DoctorError::Validation(msg) => AppError::ValidationError(msg),
            DoctorError::User(inner) => inner.into(),
            DoctorError::Database(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn doctor_rows_embed_account_and_specialties() {
        let doctor: Doctor = serde_json::from_value(json!({
            "usuario_id": 11,
            "numero_licencia": "M-11",
            "firma_digital": null,
            "estado": "Vacaciones",
            "usuario": {
                "id": 11,
                "email": "medico1@salud.com",
                "password": "$argon2id$secret",
                "nombre": "Luis",
                "apellido": "Gómez",
                "telefono": null,
                "direccion": null,
                "fecha_nacimiento": null,
                "genero": "M",
                "activo": true,
                "id_rol_id": 2,
                "rol": {"id": 2, "nombre_rol": "Medico", "descripcion": null}
            },
            "especialidades": [{
                "id": 5,
                "medico_id": 11,
                "especialidad_id": 1,
                "especialidad": {"id": 1, "codigo": "CARD", "nombre": "Cardiología", "descripcion": null}
            }]
        }))
        .unwrap();

        assert!(!doctor.is_active());
        let response = serde_json::to_value(DoctorResponse::from(doctor)).unwrap();
        assert_eq!(response["especialidades"][0]["especialidad"]["codigo"], "CARD");
        assert!(response["usuario"].get("password").is_none());
    }

    #[test]
    fn schedule_times_use_clock_format() {
        let schedule: Schedule = serde_json::from_value(json!({
            "id": 1,
            "medico_especialidad_id": 5,
            "dia_semana": "Lunes",
            "hora_inicio": "08:00:00",
            "hora_fin": "12:30:00",
            "activo": true
        }))
        .unwrap();
        assert_eq!(schedule.hora_fin, NaiveTime::from_hms_opt(12, 30, 0).unwrap());
    }

    #[test]
    fn specialty_in_use_is_a_bad_request() {
        assert_matches!(
            AppError::from(DoctorError::SpecialtyInUse),
            AppError::BadRequest(msg) if msg.starts_with("No se puede eliminar la especialidad")
        );
        assert_matches!(
            AppError::from(DoctorError::DuplicateAssignment),
            AppError::Conflict(_)
        );
    }
}
