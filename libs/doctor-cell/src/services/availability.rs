use std::collections::HashSet;

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use tracing::{debug, instrument};

use shared_config::AppConfig;
use shared_database::{tables, PostgrestClient, Query};

use crate::models::{AvailabilityResponse, DayAvailability, DoctorError, Schedule, WEEKDAYS};
use crate::services::schedule::ScheduleService;
use crate::services::specialty::SpecialtyService;

pub const SLOT_MINUTES: i64 = 30;
/// Days offered, today included.
pub const WINDOW_DAYS: i64 = 15;

pub fn weekday_name(date: NaiveDate) -> &'static str {
    WEEKDAYS[date.weekday().num_days_from_monday() as usize]
}

/// A slot fits a block when it starts inside it and ends before it closes.
pub fn slot_fits(schedule: &Schedule, hora: NaiveTime) -> bool {
    let (end, wrapped) = hora.overflowing_add_signed(Duration::minutes(SLOT_MINUTES));
    wrapped == 0 && hora >= schedule.hora_inicio && end <= schedule.hora_fin
}

/// True when `hora` is one of the block's slot starts, i.e. it fits and
/// sits on the grid measured from `hora_inicio`.
pub fn offers_slot(schedule: &Schedule, hora: NaiveTime) -> bool {
    let offset = hora.signed_duration_since(schedule.hora_inicio);
    slot_fits(schedule, hora) && offset.num_seconds() % (SLOT_MINUTES * 60) == 0
}

/// Starting times of every slot inside one schedule block.
fn block_slots(schedule: &Schedule) -> Vec<NaiveTime> {
    let mut slots = Vec::new();
    let mut current = schedule.hora_inicio;
    while slot_fits(schedule, current) {
        slots.push(current);
        current += Duration::minutes(SLOT_MINUTES);
    }
    slots
}

/// Free slots for the window starting at `now`'s date. Inactive blocks,
/// `booked` (date, time) pairs and times already elapsed today are left out;
/// days without free slots are omitted.
pub fn generate_slots(
    schedules: &[Schedule],
    booked: &HashSet<(NaiveDate, NaiveTime)>,
    now: NaiveDateTime,
) -> Vec<DayAvailability> {
    let today = now.date();
    let mut days = Vec::new();

    for offset in 0..WINDOW_DAYS {
        let fecha = today + Duration::days(offset);
        let dia_semana = weekday_name(fecha);

        let mut horas: Vec<NaiveTime> = schedules
            .iter()
            .filter(|s| s.activo && s.dia_semana == dia_semana)
            .flat_map(block_slots)
            .filter(|hora| !booked.contains(&(fecha, *hora)))
            .filter(|hora| fecha != today || *hora > now.time())
            .collect();
        horas.sort();
        horas.dedup();

        if !horas.is_empty() {
            days.push(DayAvailability {
                fecha,
                dia_semana,
                horas,
            });
        }
    }

    days
}

#[derive(Debug, Deserialize)]
struct Booking {
    fecha_cita: NaiveDate,
    hora_cita: NaiveTime,
}

pub struct AvailabilityService {
    db: PostgrestClient,
    specialties: SpecialtyService,
    schedules: ScheduleService,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
            specialties: SpecialtyService::new(config),
            schedules: ScheduleService::new(config),
        }
    }

    #[instrument(skip(self))]
    pub async fn for_assignment(&self, assignment_id: i64) -> Result<AvailabilityResponse, DoctorError> {
        let assignment = self.specialties.get_assignment(assignment_id).await?;
        let now = Local::now().naive_local();
        let desde = now.date();
        let hasta = desde + Duration::days(WINDOW_DAYS - 1);

        let mut response = AvailabilityResponse {
            medico_especialidad: assignment.id,
            medico: assignment.medico_id,
            especialidad: assignment.especialidad_id,
            desde,
            hasta,
            dias: Vec::new(),
        };

        if !self.doctor_is_active(assignment.medico_id).await? {
            debug!(doctor_id = assignment.medico_id, "Doctor not active, no slots offered");
            return Ok(response);
        }

        let schedules = self.schedules.active_for(assignment.id).await?;
        if schedules.is_empty() {
            return Ok(response);
        }

        let q = Query::new()
            .select("fecha_cita,hora_cita")
            .eq("medico_especialidad_id", assignment.id)
            .gte("fecha_cita", desde)
            .lte("fecha_cita", hasta)
            .neq("estado", "cancelada");
        let bookings: Vec<Booking> = self.db.select(tables::APPOINTMENTS, &q).await?;
        let booked: HashSet<_> = bookings
            .into_iter()
            .map(|b| (b.fecha_cita, b.hora_cita))
            .collect();

        response.dias = generate_slots(&schedules, &booked, now);
        Ok(response)
    }

    async fn doctor_is_active(&self, doctor_id: i64) -> Result<bool, DoctorError> {
        let q = Query::new()
            .select("usuario_id")
            .eq("usuario_id", doctor_id)
            .eq("estado", "Activo");
        Ok(self.db.exists(tables::DOCTORS, &q).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn block(dia: &str, start: NaiveTime, end: NaiveTime) -> Schedule {
        Schedule {
            id: 1,
            medico_especialidad_id: 5,
            dia_semana: dia.to_string(),
            hora_inicio: start,
            hora_fin: end,
            activo: true,
        }
    }

    // 2025-03-03 is a Monday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
    }

    #[test]
    fn weekday_names_start_on_monday() {
        assert_eq!(weekday_name(monday()), "Lunes");
        assert_eq!(weekday_name(monday() + Duration::days(2)), "Miércoles");
        assert_eq!(weekday_name(monday() + Duration::days(6)), "Domingo");
    }

    #[test]
    fn slots_are_thirty_minutes_and_fit_the_block() {
        let schedules = [block("Martes", time(8, 0), time(10, 15))];
        let now = monday().and_time(time(7, 0));

        let days = generate_slots(&schedules, &HashSet::new(), now);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].fecha, monday() + Duration::days(1));
        assert_eq!(days[0].dia_semana, "Martes");
        assert_eq!(days[0].horas, vec![time(8, 0), time(8, 30), time(9, 0), time(9, 30)]);
        assert_eq!(days[1].fecha, monday() + Duration::days(8));
    }

    #[test]
    fn window_covers_fifteen_days_from_today() {
        let schedules = [block("Lunes", time(9, 0), time(9, 30))];
        let now = monday().and_time(time(6, 0));

        let days = generate_slots(&schedules, &HashSet::new(), now);

        let dates: Vec<_> = days.iter().map(|d| d.fecha).collect();
        assert_eq!(
            dates,
            vec![monday(), monday() + Duration::days(7), monday() + Duration::days(14)]
        );
    }

    #[test]
    fn booked_and_elapsed_times_are_excluded() {
        let schedules = [block("Lunes", time(8, 0), time(10, 0))];
        let now = monday().and_time(time(8, 10));
        let next_monday = monday() + Duration::days(7);
        let booked: HashSet<_> = [(monday(), time(9, 0)), (next_monday, time(8, 0))]
            .into_iter()
            .collect();

        let days = generate_slots(&schedules, &booked, now);

        assert_eq!(days[0].fecha, monday());
        assert_eq!(days[0].horas, vec![time(8, 30), time(9, 30)]);
        assert_eq!(days[1].horas, vec![time(8, 30), time(9, 0), time(9, 30)]);
    }

    #[test]
    fn inactive_blocks_offer_nothing() {
        let mut schedule = block("Lunes", time(8, 0), time(12, 0));
        schedule.activo = false;

        let days = generate_slots(&[schedule], &HashSet::new(), monday().and_time(time(0, 0)));

        assert!(days.is_empty());
    }

    #[test]
    fn overlapping_blocks_do_not_repeat_slots() {
        let schedules = [
            block("Lunes", time(8, 0), time(9, 0)),
            block("Lunes", time(8, 30), time(9, 30)),
        ];

        let days = generate_slots(&schedules, &HashSet::new(), monday().and_time(time(0, 0)));

        assert_eq!(days[0].horas, vec![time(8, 0), time(8, 30), time(9, 0)]);
    }

    #[test]
    fn only_grid_times_are_offered() {
        let schedule = block("Lunes", time(8, 0), time(10, 0));

        assert!(offers_slot(&schedule, time(8, 0)));
        assert!(offers_slot(&schedule, time(9, 30)));
        assert!(!offers_slot(&schedule, time(8, 15)));
        assert!(!offers_slot(&schedule, time(9, 45)));
        assert!(!offers_slot(&schedule, time(7, 30)));

        let shifted = block("Lunes", time(8, 15), time(9, 15));
        assert!(offers_slot(&shifted, time(8, 45)));
        assert!(!offers_slot(&shifted, time(8, 30)));
    }

    #[test]
    fn blocks_ending_at_midnight_do_not_wrap() {
        let schedule = block("Lunes", time(23, 0), time(23, 59));

        assert_eq!(block_slots(&schedule), vec![time(23, 0)]);
        assert!(!slot_fits(&schedule, time(23, 45)));
    }
}
