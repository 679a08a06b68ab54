pub mod consultation;
pub mod document;
pub mod exam;
pub mod history;
pub mod prescription;

pub use consultation::ConsultationService;
pub use document::DocumentService;
pub use exam::ExamService;
pub use history::ClinicalHistoryService;
pub use prescription::PrescriptionService;
