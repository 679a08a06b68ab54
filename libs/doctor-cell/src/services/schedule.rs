use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use tracing::{info, instrument};

use shared_config::AppConfig;
use shared_database::{tables, PostgrestClient, Query};

use crate::models::{DoctorError, Schedule, ScheduleQuery, ScheduleRequest, WEEKDAYS};
use crate::services::availability::{offers_slot, weekday_name};

fn validate_block(dia_semana: &str, inicio: NaiveTime, fin: NaiveTime) -> Result<(), DoctorError> {
    if !WEEKDAYS.contains(&dia_semana) {
        return Err(DoctorError::Validation(format!(
            "\"{}\" no es una elección válida para dia_semana.",
            dia_semana
        )));
    }
    if inicio >= fin {
        return Err(DoctorError::Validation(
            "La hora de inicio debe ser anterior a la hora de fin.".to_string(),
        ));
    }
    Ok(())
}

pub struct ScheduleService {
    db: PostgrestClient,
}

impl ScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    pub async fn list(&self, query: ScheduleQuery) -> Result<Vec<Schedule>, DoctorError> {
        let mut q = Query::new();
        if let Some(assignment) = query.medico_especialidad {
            q = q.eq("medico_especialidad_id", assignment);
        }
        if let Some(dia) = query.dia_semana.as_deref() {
            q = q.eq("dia_semana", dia);
        }
        if let Some(activo) = query.activo {
            q = q.eq("activo", activo);
        }
        let q = q.order("hora_inicio", true);

        Ok(self.db.select(tables::DOCTOR_SCHEDULES, &q).await?)
    }

    pub async fn get(&self, schedule_id: i64) -> Result<Schedule, DoctorError> {
        self.db
            .select_one(tables::DOCTOR_SCHEDULES, &Query::new().eq("id", schedule_id))
            .await?
            .ok_or(DoctorError::ScheduleNotFound)
    }

    pub async fn active_for(&self, assignment_id: i64) -> Result<Vec<Schedule>, DoctorError> {
        self.list(ScheduleQuery {
            medico_especialidad: Some(assignment_id),
            dia_semana: None,
            activo: Some(true),
        })
        .await
    }

    /// True when an active block of that weekday offers a slot starting at `hora`.
    pub async fn covers(
        &self,
        assignment_id: i64,
        fecha: NaiveDate,
        hora: NaiveTime,
    ) -> Result<bool, DoctorError> {
        let blocks = self
            .list(ScheduleQuery {
                medico_especialidad: Some(assignment_id),
                dia_semana: Some(weekday_name(fecha).to_string()),
                activo: Some(true),
            })
            .await?;
        Ok(blocks.iter().any(|block| offers_slot(block, hora)))
    }

    async fn ensure_unique(
        &self,
        assignment_id: i64,
        dia_semana: &str,
        inicio: NaiveTime,
        fin: NaiveTime,
        except: Option<i64>,
    ) -> Result<(), DoctorError> {
        let mut q = Query::new()
            .select("id")
            .eq("medico_especialidad_id", assignment_id)
            .eq("dia_semana", dia_semana)
            .eq("hora_inicio", inicio)
            .eq("hora_fin", fin);
        if let Some(id) = except {
            q = q.neq("id", id);
        }
        if self.db.exists(tables::DOCTOR_SCHEDULES, &q).await? {
            return Err(DoctorError::DuplicateSchedule);
        }
        Ok(())
    }

    #[instrument(skip(self, request))]
    pub async fn create(&self, request: ScheduleRequest) -> Result<Schedule, DoctorError> {
        let missing = |field: &str| DoctorError::Validation(format!("El campo {} es obligatorio.", field));
        let assignment_id = request.medico_especialidad.ok_or_else(|| missing("medico_especialidad"))?;
        let dia_semana = request.dia_semana.ok_or_else(|| missing("dia_semana"))?;
        let inicio = request.hora_inicio.ok_or_else(|| missing("hora_inicio"))?;
        let fin = request.hora_fin.ok_or_else(|| missing("hora_fin"))?;

        validate_block(&dia_semana, inicio, fin)?;
        let assignment = Query::new().select("id").eq("id", assignment_id);
        if !self.db.exists(tables::DOCTOR_SPECIALTIES, &assignment).await? {
            return Err(DoctorError::AssignmentNotFound);
        }
        self.ensure_unique(assignment_id, &dia_semana, inicio, fin, None)
            .await?;

        let schedule: Schedule = self
            .db
            .insert(
                tables::DOCTOR_SCHEDULES,
                json!({
                    "medico_especialidad_id": assignment_id,
                    "dia_semana": dia_semana,
                    "hora_inicio": inicio,
                    "hora_fin": fin,
                    "activo": request.activo.unwrap_or(true),
                }),
            )
            .await?;
        info!(schedule_id = schedule.id, assignment_id, "Schedule created");
        Ok(schedule)
    }

    /// Partial update; the resulting block is validated as a whole.
    #[instrument(skip(self, request))]
    pub async fn update(&self, schedule_id: i64, request: ScheduleRequest) -> Result<Schedule, DoctorError> {
        let current = self.get(schedule_id).await?;
        let dia_semana = request.dia_semana.unwrap_or(current.dia_semana);
        let inicio = request.hora_inicio.unwrap_or(current.hora_inicio);
        let fin = request.hora_fin.unwrap_or(current.hora_fin);
        let activo = request.activo.unwrap_or(current.activo);

        validate_block(&dia_semana, inicio, fin)?;
        self.ensure_unique(
            current.medico_especialidad_id,
            &dia_semana,
            inicio,
            fin,
            Some(schedule_id),
        )
        .await?;

        let q = Query::new().eq("id", schedule_id);
        let rows: Vec<Schedule> = self
            .db
            .update(
                tables::DOCTOR_SCHEDULES,
                &q,
                json!({
                    "dia_semana": dia_semana,
                    "hora_inicio": inicio,
                    "hora_fin": fin,
                    "activo": activo,
                }),
            )
            .await?;
        rows.into_iter().next().ok_or(DoctorError::ScheduleNotFound)
    }

    pub async fn delete(&self, schedule_id: i64) -> Result<(), DoctorError> {
        self.get(schedule_id).await?;
        self.db
            .delete(tables::DOCTOR_SCHEDULES, &Query::new().eq("id", schedule_id))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn blocks_must_close_after_they_open() {
        assert!(validate_block("Lunes", time(8, 0), time(12, 0)).is_ok());
        assert_matches!(
            validate_block("Lunes", time(12, 0), time(12, 0)),
            Err(DoctorError::Validation(_))
        );
    }

    #[test]
    fn unknown_weekday_is_rejected() {
        assert_matches!(
            validate_block("Monday", time(8, 0), time(12, 0)),
            Err(DoctorError::Validation(msg)) if msg.contains("Monday")
        );
    }
}
