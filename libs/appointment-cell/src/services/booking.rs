use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::json;
use tracing::{info, instrument};

use doctor_cell::{ScheduleService, SpecialtyService};
use notification_cell::{AppointmentNotice, NotificationService};
use security_cell::{modules, AuditService, NewAuditEntry};
use shared_config::AppConfig;
use shared_database::{tables, PostgrestClient, Query};

use crate::models::{
    Appointment, AppointmentError, AppointmentQuery, AppointmentStatus, CreateAppointmentRequest,
    RescheduleRequest, Visibility,
};
use crate::services::lifecycle::{next_status, AppointmentAction};

const APPOINTMENT_SELECT: &str = "*,medico_especialidad:medico_especialidad!inner(id,medico_id,especialidad:core_especialidad(id,nombre),medico:core_medico(usuario:core_usuario(nombre,apellido)))";

fn notice_for(appointment: &Appointment) -> AppointmentNotice {
    AppointmentNotice {
        cita_id: appointment.id,
        paciente_usuario_id: appointment.paciente_id,
        medico: appointment.doctor_name(),
        fecha: appointment.fecha_cita,
        hora: appointment.hora_cita,
        estado: appointment.estado.to_string(),
    }
}

fn missing(field: &str) -> AppointmentError {
    AppointmentError::Validation(format!("El campo {} es obligatorio.", field))
}

/// Rejects dates before today and times already elapsed today.
pub fn ensure_future(fecha: NaiveDate, hora: NaiveTime, now: NaiveDateTime) -> Result<(), AppointmentError> {
    if fecha < now.date() || (fecha == now.date() && hora <= now.time()) {
        return Err(AppointmentError::PastDate);
    }
    Ok(())
}

pub struct AppointmentService {
    db: PostgrestClient,
    schedules: ScheduleService,
    specialties: SpecialtyService,
    notifications: NotificationService,
    audit: AuditService,
}

impl AppointmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
            schedules: ScheduleService::new(config),
            specialties: SpecialtyService::new(config),
            notifications: NotificationService::new(config),
            audit: AuditService::new(config),
        }
    }

    pub async fn list(
        &self,
        query: AppointmentQuery,
        visibility: Visibility,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut q = Query::new().select(APPOINTMENT_SELECT);

        let (paciente, medico) = match visibility {
            Visibility::All => (query.paciente, query.medico),
            Visibility::Patient(id) => (Some(id), query.medico),
            Visibility::Doctor(id) => (query.paciente, Some(id)),
        };
        if let Some(paciente) = paciente {
            q = q.eq("paciente_id", paciente);
        }
        if let Some(medico) = medico {
            q = q.eq("medico_especialidad.medico_id", medico);
        }
        if let Some(assignment) = query.medico_especialidad {
            q = q.eq("medico_especialidad_id", assignment);
        }
        if let Some(fecha) = query.fecha {
            q = q.eq("fecha_cita", fecha);
        }
        if let Some(desde) = query.fecha_desde {
            q = q.gte("fecha_cita", desde);
        }
        if let Some(hasta) = query.fecha_hasta {
            q = q.lte("fecha_cita", hasta);
        }
        if let Some(estado) = query.estado {
            q = q.eq("estado", estado);
        }
        let q = q
            .order("fecha_cita", false)
            .order("hora_cita", false)
            .paginate(query.limit, query.offset);

        Ok(self.db.select(tables::APPOINTMENTS, &q).await?)
    }

    pub async fn get(&self, appointment_id: i64) -> Result<Appointment, AppointmentError> {
        let q = Query::new().select(APPOINTMENT_SELECT).eq("id", appointment_id);
        self.db
            .select_one(tables::APPOINTMENTS, &q)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    /// Loads an appointment the caller is allowed to see.
    pub async fn get_visible(
        &self,
        appointment_id: i64,
        visibility: Visibility,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.get(appointment_id).await?;
        let allowed = match visibility {
            Visibility::All => true,
            Visibility::Patient(id) => appointment.paciente_id == id,
            Visibility::Doctor(id) => appointment.medico_id() == Some(id),
        };
        if !allowed {
            return Err(AppointmentError::Forbidden);
        }
        Ok(appointment)
    }

    /// Date in the future, inside an active block of that weekday and not
    /// already taken by a live appointment.
    async fn ensure_bookable(
        &self,
        assignment_id: i64,
        fecha: NaiveDate,
        hora: NaiveTime,
        except: Option<i64>,
    ) -> Result<(), AppointmentError> {
        ensure_future(fecha, hora, Local::now().naive_local())?;

        if !self.schedules.covers(assignment_id, fecha, hora).await? {
            return Err(AppointmentError::OutsideSchedule);
        }

        let mut taken = Query::new()
            .select("id")
            .eq("medico_especialidad_id", assignment_id)
            .eq("fecha_cita", fecha)
            .eq("hora_cita", hora)
            .neq("estado", AppointmentStatus::Cancelada);
        if let Some(id) = except {
            taken = taken.neq("id", id);
        }
        if self.db.exists(tables::APPOINTMENTS, &taken).await? {
            return Err(AppointmentError::SlotTaken);
        }
        Ok(())
    }

    async fn record_audit(&self, actor_id: i64, client_ip: &str, action: &str, appointment: &Appointment) {
        self.audit
            .record(
                NewAuditEntry::new(action, modules::SCHEDULE)
                    .with_user(actor_id)
                    .with_ip(client_ip)
                    .with_details(format!(
                        "Cita {} ({} {})",
                        appointment.id, appointment.fecha_cita, appointment.hora_cita
                    )),
            )
            .await;
    }

    #[instrument(skip(self, request, client_ip))]
    pub async fn create(
        &self,
        request: CreateAppointmentRequest,
        actor_id: i64,
        visibility: Visibility,
        client_ip: &str,
    ) -> Result<Appointment, AppointmentError> {
        let paciente_id = match visibility {
            Visibility::Patient(own) => match request.paciente {
                Some(other) if other != own => return Err(AppointmentError::Forbidden),
                _ => own,
            },
            _ => request.paciente.ok_or_else(|| missing("paciente"))?,
        };
        let assignment_id = request
            .medico_especialidad
            .ok_or_else(|| missing("medico_especialidad"))?;
        let fecha = request.fecha_cita.ok_or_else(|| missing("fecha_cita"))?;
        let hora = request.hora_cita.ok_or_else(|| missing("hora_cita"))?;

        let patient = Query::new().select("usuario_id").eq("usuario_id", paciente_id);
        if !self.db.exists(tables::PATIENTS, &patient).await? {
            return Err(AppointmentError::Validation(
                "El paciente indicado no existe.".to_string(),
            ));
        }
        let assignment = self.specialties.get_assignment(assignment_id).await?;
        if let Visibility::Doctor(own) = visibility {
            if assignment.medico_id != own {
                return Err(AppointmentError::Forbidden);
            }
        }
        self.ensure_bookable(assignment_id, fecha, hora, None).await?;

        let created: Appointment = self
            .db
            .insert(
                tables::APPOINTMENTS,
                json!({
                    "paciente_id": paciente_id,
                    "medico_especialidad_id": assignment_id,
                    "fecha_cita": fecha,
                    "hora_cita": hora,
                    "estado": AppointmentStatus::Pendiente,
                    "motivo": request.motivo,
                    "notas": request.notas,
                    "fecha_creacion": Utc::now(),
                }),
            )
            .await?;
        info!(appointment_id = created.id, paciente_id, "Appointment booked");

        let appointment = self.get(created.id).await?;
        self.notifications
            .create_and_send(notice_for(&appointment).created())
            .await;
        self.record_audit(actor_id, client_ip, "Agendar cita", &appointment).await;
        Ok(appointment)
    }

    /// Confirm and complete are staff actions; any party may cancel.
    #[instrument(skip(self, client_ip))]
    pub async fn apply(
        &self,
        appointment_id: i64,
        action: AppointmentAction,
        actor_id: i64,
        visibility: Visibility,
        client_ip: &str,
    ) -> Result<Appointment, AppointmentError> {
        if matches!(visibility, Visibility::Patient(_)) && action != AppointmentAction::Cancel {
            return Err(AppointmentError::Forbidden);
        }
        let current = self.get_visible(appointment_id, visibility).await?;
        let estado = next_status(current.estado, action)?;

        let q = Query::new().eq("id", appointment_id);
        let rows: Vec<serde_json::Value> = self
            .db
            .update(tables::APPOINTMENTS, &q, json!({"estado": estado}))
            .await?;
        if rows.is_empty() {
            return Err(AppointmentError::NotFound);
        }
        info!(appointment_id, from = %current.estado, to = %estado, "Appointment state changed");

        let appointment = Appointment { estado, ..current };
        if matches!(estado, AppointmentStatus::Confirmada | AppointmentStatus::Cancelada) {
            self.notifications
                .create_and_send(notice_for(&appointment).status_changed(estado.as_str()))
                .await;
        }
        let label = match action {
            AppointmentAction::Confirm => "Confirmar cita",
            AppointmentAction::Cancel => "Cancelar cita",
            AppointmentAction::Complete => "Marcar cita como realizada",
        };
        self.record_audit(actor_id, client_ip, label, &appointment).await;
        Ok(appointment)
    }

    #[instrument(skip(self, request, client_ip))]
    pub async fn reschedule(
        &self,
        appointment_id: i64,
        request: RescheduleRequest,
        actor_id: i64,
        visibility: Visibility,
        client_ip: &str,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get_visible(appointment_id, visibility).await?;
        if !current.estado.can_reschedule() {
            return Err(AppointmentError::CannotReschedule);
        }
        let fecha = request.fecha_cita.ok_or_else(|| missing("fecha_cita"))?;
        let hora = request.hora_cita.ok_or_else(|| missing("hora_cita"))?;
        self.ensure_bookable(current.medico_especialidad_id, fecha, hora, Some(appointment_id))
            .await?;

        let q = Query::new().eq("id", appointment_id);
        let rows: Vec<serde_json::Value> = self
            .db
            .update(
                tables::APPOINTMENTS,
                &q,
                json!({
                    "fecha_cita": fecha,
                    "hora_cita": hora,
                    "estado": AppointmentStatus::Pendiente,
                }),
            )
            .await?;
        if rows.is_empty() {
            return Err(AppointmentError::NotFound);
        }
        info!(appointment_id, %fecha, %hora, "Appointment rescheduled");

        let appointment = Appointment {
            fecha_cita: fecha,
            hora_cita: hora,
            estado: AppointmentStatus::Pendiente,
            ..current
        };
        self.notifications
            .create_and_send(notice_for(&appointment).rescheduled())
            .await;
        self.record_audit(actor_id, client_ip, "Reprogramar cita", &appointment).await;
        Ok(appointment)
    }

    pub async fn delete(
        &self,
        appointment_id: i64,
        actor_id: i64,
        client_ip: &str,
    ) -> Result<(), AppointmentError> {
        let appointment = self.get(appointment_id).await?;
        self.db
            .delete(tables::APPOINTMENTS, &Query::new().eq("id", appointment_id))
            .await?;
        self.record_audit(actor_id, client_ip, "Eliminar cita", &appointment).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_time(NaiveTime::parse_from_str(time, "%H:%M").unwrap())
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    #[test]
    fn past_dates_are_rejected() {
        let now = at("2025-03-07", "10:00");
        assert_matches!(
            ensure_future(date("2025-03-06"), time("11:00"), now),
            Err(AppointmentError::PastDate)
        );
        assert!(ensure_future(date("2025-03-08"), time("08:00"), now).is_ok());
    }

    #[test]
    fn elapsed_times_today_are_rejected() {
        let now = at("2025-03-07", "10:00");
        assert_matches!(
            ensure_future(date("2025-03-07"), time("10:00"), now),
            Err(AppointmentError::PastDate)
        );
        assert!(ensure_future(date("2025-03-07"), time("10:30"), now).is_ok());
    }
}
