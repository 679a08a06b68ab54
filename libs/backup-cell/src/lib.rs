// =====================================================================================
// BACKUP CELL - PG_DUMP BACKUPS, RESTORE, RETENTION AND SCHEDULING
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{BackupError, BackupKind, BackupRecord, CleanupSummary, RestoreOutcome};
pub use router::backup_routes;
pub use services::tools::{locate_tool, WELL_KNOWN_DIRS};
pub use services::{spawn_scheduler, BackupService};
