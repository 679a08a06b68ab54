// =====================================================================================
// DOCTOR CELL - MEDICOS, ESPECIALIDADES, HORARIOS & SLOT AVAILABILITY
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    AvailabilityResponse, DayAvailability, Doctor, DoctorError, DoctorResponse, DoctorSpecialty,
    Schedule, Specialty, WEEKDAYS,
};
pub use router::{assignment_routes, doctor_routes, schedule_routes, specialty_routes};
pub use services::availability::{generate_slots, weekday_name, SLOT_MINUTES, WINDOW_DAYS};
pub use services::{AvailabilityService, DoctorService, ScheduleService, SpecialtyService};
