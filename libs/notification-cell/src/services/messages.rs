//! Patient-facing texts for appointment and exam events.

use chrono::{NaiveDate, NaiveTime};
use serde_json::json;

use crate::models::{NotificationKind, OutgoingNotification};

/// What a patient needs to know about one appointment.
#[derive(Debug, Clone)]
pub struct AppointmentNotice {
    pub cita_id: i64,
    pub paciente_usuario_id: i64,
    pub medico: String,
    pub fecha: NaiveDate,
    pub hora: NaiveTime,
    pub estado: String,
}

impl AppointmentNotice {
    fn fecha(&self) -> String {
        self.fecha.format("%d/%m/%Y").to_string()
    }

    fn hora(&self) -> String {
        self.hora.format("%H:%M").to_string()
    }

    fn build(&self, titulo: &str, mensaje: String, estado: &str, accion: &str) -> OutgoingNotification {
        OutgoingNotification::new(self.paciente_usuario_id, NotificationKind::Cita, titulo, mensaje)
            .with_data(json!({
                "tipo": "cita",
                "cita_id": self.cita_id.to_string(),
                "estado": estado,
                "accion": accion,
                "medico": self.medico,
                "fecha": self.fecha(),
                "hora": self.hora(),
            }))
    }

    /// State change to `estado_nuevo`.
    pub fn status_changed(&self, estado_nuevo: &str) -> OutgoingNotification {
        let (titulo, mensaje) = match estado_nuevo {
            "confirmada" => (
                "Cita Confirmada",
                format!(
                    "Su cita con Dr. {} para el {} a las {} ha sido confirmada.",
                    self.medico,
                    self.fecha(),
                    self.hora()
                ),
            ),
            "cancelada" => (
                "Cita Cancelada",
                format!(
                    "Su cita con Dr. {} para el {} a las {} ha sido cancelada.",
                    self.medico,
                    self.fecha(),
                    self.hora()
                ),
            ),
            _ => (
                "Cita Actualizada",
                format!(
                    "Su cita con Dr. {} ha sido actualizada. Nueva fecha: {} a las {}.",
                    self.medico,
                    self.fecha(),
                    self.hora()
                ),
            ),
        };
        self.build(titulo, mensaje, estado_nuevo, "cambio_estado")
    }

    /// `self` already carries the new date and time.
    pub fn rescheduled(&self) -> OutgoingNotification {
        let mensaje = format!(
            "Su cita con Dr. {} ha sido reprogramada. Nueva fecha: {} a las {}.",
            self.medico,
            self.fecha(),
            self.hora()
        );
        self.build("Cita Reprogramada", mensaje, &self.estado, "reprogramacion")
    }

    pub fn created(&self) -> OutgoingNotification {
        let mensaje = format!(
            "Se ha agendado una cita con Dr. {} para el {} a las {}. Estado: Pendiente.",
            self.medico,
            self.fecha(),
            self.hora()
        );
        self.build("Nueva Cita Agendada", mensaje, &self.estado, "nueva_cita")
    }
}

#[derive(Debug, Clone)]
pub struct ExamNotice {
    pub examen_id: i64,
    pub paciente_usuario_id: i64,
    pub tipo_examen: String,
}

impl ExamNotice {
    fn build(&self, titulo: &str, mensaje: String, estado: &str) -> OutgoingNotification {
        OutgoingNotification::new(
            self.paciente_usuario_id,
            NotificationKind::Resultado,
            titulo,
            mensaje,
        )
        .with_data(json!({
            "tipo": "examen",
            "examen_id": self.examen_id.to_string(),
            "tipo_examen": self.tipo_examen,
            "estado": estado,
        }))
    }

    pub fn requested(&self) -> OutgoingNotification {
        self.build(
            "Nuevo Examen Solicitado",
            format!(
                "Se ha solicitado un examen de {}. Estado: Pendiente.",
                self.tipo_examen
            ),
            "solicitado",
        )
    }

    pub fn result_ready(&self) -> OutgoingNotification {
        self.build(
            "Resultados de Examen Disponibles",
            format!(
                "Los resultados de su examen de {} están disponibles.",
                self.tipo_examen
            ),
            "completado",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice() -> AppointmentNotice {
        AppointmentNotice {
            cita_id: 31,
            paciente_usuario_id: 9,
            medico: "Laura Gómez".to_string(),
            fecha: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
            hora: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            estado: "pendiente".to_string(),
        }
    }

    #[test]
    fn confirmation_uses_day_first_dates() {
        let msg = notice().status_changed("confirmada");

        assert_eq!(msg.titulo, "Cita Confirmada");
        assert_eq!(
            msg.mensaje,
            "Su cita con Dr. Laura Gómez para el 07/03/2025 a las 09:30 ha sido confirmada."
        );
        let datos = msg.datos.unwrap();
        assert_eq!(datos["cita_id"], "31");
        assert_eq!(datos["accion"], "cambio_estado");
        assert_eq!(datos["estado"], "confirmada");
    }

    #[test]
    fn other_states_read_as_update() {
        let msg = notice().status_changed("realizada");
        assert_eq!(msg.titulo, "Cita Actualizada");
        assert!(msg.mensaje.contains("Nueva fecha: 07/03/2025 a las 09:30"));
    }

    #[test]
    fn new_appointment_goes_to_the_patient() {
        let msg = notice().created();
        assert_eq!(msg.usuario_id, 9);
        assert_eq!(msg.tipo, NotificationKind::Cita);
        assert_eq!(msg.datos.unwrap()["accion"], "nueva_cita");
    }

    #[test]
    fn exam_notices() {
        let exam = ExamNotice {
            examen_id: 4,
            paciente_usuario_id: 9,
            tipo_examen: "Hemograma Completo".to_string(),
        };
        let requested = exam.requested();
        assert_eq!(requested.titulo, "Nuevo Examen Solicitado");
        assert_eq!(requested.tipo, NotificationKind::Resultado);
        assert_eq!(requested.datos.unwrap()["estado"], "solicitado");

        let ready = exam.result_ready();
        assert_eq!(
            ready.mensaje,
            "Los resultados de su examen de Hemograma Completo están disponibles."
        );
    }
}
