use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use doctor_cell::DoctorError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pendiente,
    Confirmada,
    Cancelada,
    Realizada,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pendiente => "pendiente",
            AppointmentStatus::Confirmada => "confirmada",
            AppointmentStatus::Cancelada => "cancelada",
            AppointmentStatus::Realizada => "realizada",
        }
    }

    /// States reachable through confirm, cancel and complete.
    pub fn allowed_next(&self) -> &'static [AppointmentStatus] {
        match self {
            AppointmentStatus::Pendiente => {
                &[AppointmentStatus::Confirmada, AppointmentStatus::Cancelada]
            }
            AppointmentStatus::Confirmada => {
                &[AppointmentStatus::Realizada, AppointmentStatus::Cancelada]
            }
            AppointmentStatus::Cancelada | AppointmentStatus::Realizada => &[],
        }
    }

    pub fn can_reschedule(&self) -> bool {
        matches!(self, AppointmentStatus::Pendiente | AppointmentStatus::Confirmada)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonName {
    pub nombre: String,
    pub apellido: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorRef {
    pub usuario: PersonName,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialtyRef {
    pub id: i64,
    pub nombre: String,
}

/// Doctor-specialty pair embedded in appointment reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookedAssignment {
    pub id: i64,
    pub medico_id: i64,
    #[serde(default)]
    pub especialidad: Option<SpecialtyRef>,
    #[serde(default)]
    pub medico: Option<DoctorRef>,
}

/// Row of `core_agendacita`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub paciente_id: i64,
    pub medico_especialidad_id: i64,
    pub fecha_cita: NaiveDate,
    pub hora_cita: NaiveTime,
    pub estado: AppointmentStatus,
    pub motivo: Option<String>,
    pub notas: Option<String>,
    pub fecha_creacion: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medico_especialidad: Option<BookedAssignment>,
}

impl Appointment {
    pub fn medico_id(&self) -> Option<i64> {
        self.medico_especialidad.as_ref().map(|a| a.medico_id)
    }

    pub fn doctor_name(&self) -> String {
        self.medico_especialidad
            .as_ref()
            .and_then(|a| a.medico.as_ref())
            .map(|m| format!("{} {}", m.usuario.nombre, m.usuario.apellido))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAppointmentRequest {
    pub paciente: Option<i64>,
    pub medico_especialidad: Option<i64>,
    pub fecha_cita: Option<NaiveDate>,
    pub hora_cita: Option<NaiveTime>,
    pub motivo: Option<String>,
    pub notas: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleRequest {
    pub fecha_cita: Option<NaiveDate>,
    pub hora_cita: Option<NaiveTime>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentQuery {
    pub paciente: Option<i64>,
    pub medico: Option<i64>,
    pub medico_especialidad: Option<i64>,
    pub fecha: Option<NaiveDate>,
    pub fecha_desde: Option<NaiveDate>,
    pub fecha_hasta: Option<NaiveDate>,
    pub estado: Option<AppointmentStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Rows a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    All,
    Patient(i64),
    Doctor(i64),
}

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Cita no encontrada")]
    NotFound,

    #[error("No se puede agendar una cita en una fecha u hora pasada.")]
    PastDate,

    #[error("El médico no atiende en la fecha y hora seleccionadas.")]
    OutsideSchedule,

    #[error("El horario seleccionado ya está ocupado.")]
    SlotTaken,

    #[error("No se puede cambiar una cita {from} a {to}.")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Solo se pueden reprogramar citas pendientes o confirmadas.")]
    CannotReschedule,

    #[error("No tiene acceso a esta cita")]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Doctor(#[from] DoctorError),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for AppointmentError {
    fn from(err: anyhow::Error) -> Self {
        AppointmentError::Database(err.to_string())
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound => AppError::NotFound(err.to_string()),
            AppointmentError::SlotTaken => AppError::Conflict(err.to_string()),
            AppointmentError::PastDate
            | AppointmentError::OutsideSchedule
            | AppointmentError::InvalidTransition { .. }
            | AppointmentError::CannotReschedule => AppError::BadRequest(err.to_string()),
            AppointmentError::Forbidden => AppError::Forbidden(err.to_string()),
            AppointmentError::Validation(msg) => AppError::ValidationError(msg),
            AppointmentError::Doctor(inner) => inner.into(),
            AppointmentError::Database(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn appointment_rows_carry_the_doctor() {
        let appointment: Appointment = serde_json::from_value(json!({
            "id": 31,
            "paciente_id": 40,
            "medico_especialidad_id": 5,
            "fecha_cita": "2025-03-07",
            "hora_cita": "09:30:00",
            "estado": "confirmada",
            "motivo": "Control",
            "notas": null,
            "fecha_creacion": "2025-03-01T10:00:00Z",
            "medico_especialidad": {
                "id": 5,
                "medico_id": 11,
                "especialidad": {"id": 1, "nombre": "Cardiología"},
                "medico": {"usuario": {"nombre": "Laura", "apellido": "Gómez"}}
            }
        }))
        .unwrap();

        assert_eq!(appointment.estado, AppointmentStatus::Confirmada);
        assert_eq!(appointment.medico_id(), Some(11));
        assert_eq!(appointment.doctor_name(), "Laura Gómez");
    }

    #[test]
    fn terminal_states_go_nowhere() {
        assert!(AppointmentStatus::Cancelada.allowed_next().is_empty());
        assert!(AppointmentStatus::Realizada.allowed_next().is_empty());
        assert!(!AppointmentStatus::Realizada.can_reschedule());
        assert!(AppointmentStatus::Confirmada.can_reschedule());
    }

    #[test]
    fn transition_error_names_both_states() {
        let err = AppointmentError::InvalidTransition {
            from: AppointmentStatus::Pendiente,
            to: AppointmentStatus::Realizada,
        };
        assert_eq!(err.to_string(), "No se puede cambiar una cita pendiente a realizada.");
    }
}
