pub mod booking;
pub mod lifecycle;

pub use booking::AppointmentService;
pub use lifecycle::{next_status, AppointmentAction};
