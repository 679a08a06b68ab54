pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Patient, PatientError, PatientResponse};
pub use router::{patient_routes, registration_routes};
pub use services::PatientService;
