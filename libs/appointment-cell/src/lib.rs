// =====================================================================================
// APPOINTMENT CELL - AGENDA DE CITAS
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Appointment, AppointmentError, AppointmentStatus, Visibility};
pub use router::appointment_routes;
pub use services::{next_status, AppointmentAction, AppointmentService};
