// =====================================================================================
// SECURITY CELL - PASSWORD HASHING & AUDIT LOG (BITACORA)
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{AuditEntry, AuditLogQuery, NewAuditEntry, SecurityError, modules};
pub use services::{AuditService, PasswordSecurityService};
pub use router::audit_routes;
