// =====================================================================================
// BACKUP CELL MODELS
// =====================================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::error::AppError;

pub const BACKUP_TYPE_FULL: &str = "Completo";
pub const BACKUP_STATE_OK: &str = "Exitoso";

/// Row of `core_registrobackup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRecord {
    pub id: i64,
    pub fecha_backup: DateTime<Utc>,
    pub nombre_archivo: String,
    pub tamano_bytes: i64,
    pub usuario_responsable_id: Option<i64>,
    pub tipo_backup: String,
    pub estado: String,
    pub ubicacion_almacenamiento: String,
    pub notas: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupKind {
    Auto,
    Manual,
}

impl BackupKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackupKind::Auto => "auto",
            BackupKind::Manual => "manual",
        }
    }

    /// `backup_auto_20250301_020000.sql`
    pub fn file_name(self, at: DateTime<chrono::Local>) -> String {
        format!("backup_{}_{}.sql", self.as_str(), at.format("%Y%m%d_%H%M%S"))
    }

    pub fn success_action(self) -> &'static str {
        match self {
            BackupKind::Auto => "Backup automático ejecutado",
            BackupKind::Manual => "Backup manual ejecutado",
        }
    }

    pub fn failure_action(self) -> &'static str {
        match self {
            BackupKind::Auto => "Error en backup automático",
            BackupKind::Manual => "Error en backup manual",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackupQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestoreOutcome {
    pub backup_id: i64,
    pub nombre_archivo: String,
    pub mensaje: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupSummary {
    pub registros_eliminados: usize,
    pub archivos_eliminados: usize,
}

/// Size in megabytes rounded to two decimals, as shown in audit details.
pub fn size_in_mb(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Backup not found")]
    NotFound,

    #[error("El archivo de backup no existe: {0}")]
    FileMissing(String),

    #[error("No se encontró la herramienta {0}. Instale el cliente de PostgreSQL o configure PG_BIN_DIR.")]
    ToolMissing(String),

    #[error("La base de datos no está configurada para backups")]
    NotConfigured,

    #[error("El proceso excedió el tiempo límite de {0} segundos")]
    Timeout(u64),

    #[error("{tool} falló: {stderr}")]
    CommandFailed { tool: String, stderr: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for BackupError {
    fn from(err: anyhow::Error) -> Self {
        BackupError::Database(err.to_string())
    }
}

impl From<std::io::Error> for BackupError {
    fn from(err: std::io::Error) -> Self {
        BackupError::Io(err.to_string())
    }
}

impl From<BackupError> for AppError {
    fn from(err: BackupError) -> Self {
        match err {
            BackupError::NotFound | BackupError::FileMissing(_) => {
                AppError::NotFound(err.to_string())
            }
            BackupError::ToolMissing(_) | BackupError::NotConfigured => {
                AppError::ServiceUnavailable(err.to_string())
            }
            BackupError::Timeout(_) => AppError::Timeout(err.to_string()),
            BackupError::CommandFailed { .. } | BackupError::Io(_) => {
                AppError::Internal(err.to_string())
            }
            BackupError::Database(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    #[test]
    fn file_names_carry_kind_and_timestamp() {
        let at = chrono::Local.with_ymd_and_hms(2025, 3, 1, 2, 0, 5).unwrap();
        assert_eq!(BackupKind::Auto.file_name(at), "backup_auto_20250301_020005.sql");
        assert_eq!(BackupKind::Manual.file_name(at), "backup_manual_20250301_020005.sql");
    }

    #[test]
    fn sizes_round_to_two_decimals() {
        assert_eq!(size_in_mb(0), 0.0);
        assert_eq!(size_in_mb(1024 * 1024), 1.0);
        assert_eq!(size_in_mb(1_572_864), 1.5);
        assert_eq!(size_in_mb(1_234_567), 1.18);
    }

    #[test]
    fn tool_and_timeout_errors_map_to_gateway_statuses() {
        assert_matches!(
            AppError::from(BackupError::ToolMissing("pg_dump".into())),
            AppError::ServiceUnavailable(msg) if msg.contains("pg_dump")
        );
        assert_matches!(AppError::from(BackupError::Timeout(300)), AppError::Timeout(_));
        assert_matches!(AppError::from(BackupError::NotFound), AppError::NotFound(_));
    }
}
