// =====================================================================================
// MEDICAL RECORD CELL - HISTORIES, CONSULTATIONS, DOCUMENTS, PRESCRIPTIONS, EXAMS
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    ClinicalHistory, Consultation, Document, ExamRequest, ExamStatus, ExamType, FollowUp,
    MedicalRecordError, Prescription, PrescriptionItem, Urgency,
};
pub use router::{
    consultation_routes, document_routes, exam_request_routes, exam_type_routes,
    follow_up_routes, history_routes, prescription_routes,
};
pub use services::{
    ClinicalHistoryService, ConsultationService, DocumentService, ExamService,
    PrescriptionService,
};
