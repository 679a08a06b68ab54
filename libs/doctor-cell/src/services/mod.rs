pub mod availability;
pub mod doctor;
pub mod schedule;
pub mod specialty;

pub use availability::AvailabilityService;
pub use doctor::DoctorService;
pub use schedule::ScheduleService;
pub use specialty::SpecialtyService;
