// =====================================================================================
// BACKUP SERVICE - PG_DUMP / PSQL / RETENTION
// =====================================================================================

use std::path::{Path, PathBuf};

use chrono::{Duration, Local, Utc};
use serde_json::json;
use tracing::{error, info, instrument, warn};

use security_cell::{modules, AuditService, NewAuditEntry};
use shared_config::AppConfig;
use shared_database::{tables, PostgrestClient, Query};

use crate::models::{
    size_in_mb, BackupError, BackupKind, BackupQuery, BackupRecord, CleanupSummary,
    RestoreOutcome, BACKUP_STATE_OK, BACKUP_TYPE_FULL,
};
use crate::services::tools::{connection_args, locate_tool, run_tool};

/// Connection and storage settings taken from the app config.
#[derive(Debug, Clone)]
struct BackupSettings {
    host: String,
    port: String,
    user: String,
    password: String,
    database: String,
    pg_bin_dir: Option<String>,
    dir: PathBuf,
    retention_days: i64,
    timeout_secs: u64,
    configured: bool,
}

impl BackupSettings {
    fn from_config(config: &AppConfig) -> Self {
        Self {
            host: config.db_host.clone(),
            port: config.db_port.clone(),
            user: config.db_user.clone(),
            password: config.db_password.clone(),
            database: config.db_name.clone(),
            pg_bin_dir: config.pg_bin_dir.clone(),
            dir: PathBuf::from(&config.backup_dir),
            retention_days: config.backup_retention_days,
            timeout_secs: config.backup_timeout_secs,
            configured: config.is_backup_configured(),
        }
    }

    fn connection_args(&self) -> Vec<String> {
        connection_args(&self.host, &self.port, &self.user, &self.database)
    }

    fn tool(&self, name: &str) -> Result<PathBuf, BackupError> {
        if !self.configured {
            return Err(BackupError::NotConfigured);
        }
        locate_tool(name, self.pg_bin_dir.as_deref())
            .ok_or_else(|| BackupError::ToolMissing(name.to_string()))
    }
}

pub struct BackupService {
    db: PostgrestClient,
    audit: AuditService,
    settings: BackupSettings,
}

impl BackupService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
            audit: AuditService::new(config),
            settings: BackupSettings::from_config(config),
        }
    }

    pub async fn list(&self, query: BackupQuery) -> Result<Vec<BackupRecord>, BackupError> {
        let q = Query::new()
            .order("fecha_backup", false)
            .paginate(query.limit, query.offset);
        Ok(self.db.select(tables::BACKUPS, &q).await?)
    }

    pub async fn get(&self, backup_id: i64) -> Result<BackupRecord, BackupError> {
        self.db
            .select_one(tables::BACKUPS, &Query::new().eq("id", backup_id))
            .await?
            .ok_or(BackupError::NotFound)
    }

    /// Dumps the whole database to a new file and registers it.
    #[instrument(skip(self, client_ip))]
    pub async fn run_backup(
        &self,
        kind: BackupKind,
        actor_id: Option<i64>,
        client_ip: &str,
    ) -> Result<BackupRecord, BackupError> {
        match self.dump(kind, actor_id).await {
            Ok(record) => {
                let mut entry = NewAuditEntry::new(kind.success_action(), modules::BACKUP)
                    .with_ip(client_ip)
                    .with_details(format!(
                        "Archivo: {}, Tamaño: {} MB",
                        record.nombre_archivo,
                        size_in_mb(record.tamano_bytes.max(0) as u64)
                    ));
                if let Some(id) = actor_id {
                    entry = entry.with_user(id);
                }
                self.audit.record(entry).await;
                Ok(record)
            }
            Err(err) => {
                error!("Backup ({}) failed: {}", kind.as_str(), err);
                let mut entry = NewAuditEntry::new(kind.failure_action(), modules::BACKUP)
                    .with_ip(client_ip)
                    .with_details(err.to_string());
                if let Some(id) = actor_id {
                    entry = entry.with_user(id);
                }
                self.audit.record(entry).await;
                Err(err)
            }
        }
    }

    async fn dump(&self, kind: BackupKind, actor_id: Option<i64>) -> Result<BackupRecord, BackupError> {
        let pg_dump = self.settings.tool("pg_dump")?;

        tokio::fs::create_dir_all(&self.settings.dir).await?;
        let file_name = kind.file_name(Local::now());
        let path = self.settings.dir.join(&file_name);

        dump_into(
            &pg_dump,
            self.settings.connection_args(),
            &path,
            &self.settings.password,
            self.settings.timeout_secs,
        )
        .await?;

        let size = tokio::fs::metadata(&path).await?.len();
        info!("Backup written to {} ({} bytes)", path.display(), size);

        let row = json!({
            "fecha_backup": Utc::now().to_rfc3339(),
            "nombre_archivo": file_name,
            "tamano_bytes": size,
            "usuario_responsable_id": actor_id,
            "tipo_backup": BACKUP_TYPE_FULL,
            "estado": BACKUP_STATE_OK,
            "ubicacion_almacenamiento": path.to_string_lossy(),
            "notas": format!("Backup {} generado con pg_dump", kind.as_str()),
        });
        Ok(self.db.insert(tables::BACKUPS, row).await?)
    }

    /// Replays a stored dump with `psql -f`.
    #[instrument(skip(self, client_ip))]
    pub async fn restore(
        &self,
        backup_id: i64,
        actor_id: i64,
        client_ip: &str,
    ) -> Result<RestoreOutcome, BackupError> {
        let record = self.get(backup_id).await?;
        let path = PathBuf::from(&record.ubicacion_almacenamiento);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(BackupError::FileMissing(record.nombre_archivo));
        }
        let psql = self.settings.tool("psql")?;

        let mut args = self.settings.connection_args();
        args.push("-f".to_string());
        args.push(path.to_string_lossy().into_owned());

        let result = run_tool(&psql, &args, &self.settings.password, self.settings.timeout_secs).await;

        let (action, details) = match &result {
            Ok(_) => ("Restauración de backup", format!("Archivo: {}", record.nombre_archivo)),
            Err(err) => ("Error en restauración de backup", err.to_string()),
        };
        self.audit
            .record(
                NewAuditEntry::new(action, modules::BACKUP)
                    .with_user(actor_id)
                    .with_ip(client_ip)
                    .with_details(details),
            )
            .await;
        result?;

        Ok(RestoreOutcome {
            backup_id: record.id,
            mensaje: format!("Backup {} restaurado correctamente", record.nombre_archivo),
            nombre_archivo: record.nombre_archivo,
        })
    }

    pub async fn delete(&self, backup_id: i64, actor_id: i64, client_ip: &str) -> Result<(), BackupError> {
        let record = self.get(backup_id).await?;
        remove_if_present(Path::new(&record.ubicacion_almacenamiento)).await;
        self.db
            .delete(tables::BACKUPS, &Query::new().eq("id", backup_id))
            .await?;

        self.audit
            .record(
                NewAuditEntry::new("Eliminación de backup", modules::BACKUP)
                    .with_user(actor_id)
                    .with_ip(client_ip)
                    .with_details(format!("Archivo: {}", record.nombre_archivo)),
            )
            .await;
        Ok(())
    }

    /// Drops records older than the retention window together with their files.
    #[instrument(skip(self, client_ip))]
    pub async fn cleanup(&self, actor_id: Option<i64>, client_ip: &str) -> Result<CleanupSummary, BackupError> {
        let cutoff = (Utc::now() - Duration::days(self.settings.retention_days)).to_rfc3339();
        let expired_query = Query::new().lt("fecha_backup", &cutoff);

        let expired: Vec<BackupRecord> = self.db.select(tables::BACKUPS, &expired_query).await?;
        if expired.is_empty() {
            return Ok(CleanupSummary::default());
        }

        let mut summary = CleanupSummary::default();
        for record in &expired {
            if remove_if_present(Path::new(&record.ubicacion_almacenamiento)).await {
                summary.archivos_eliminados += 1;
            }
        }
        self.db.delete(tables::BACKUPS, &expired_query).await?;
        summary.registros_eliminados = expired.len();

        info!(
            records = summary.registros_eliminados,
            files = summary.archivos_eliminados,
            "Expired backups removed"
        );
        let mut entry = NewAuditEntry::new("Limpieza de backups antiguos", modules::BACKUP)
            .with_ip(client_ip)
            .with_details(format!(
                "Registros eliminados: {}, archivos eliminados: {}",
                summary.registros_eliminados, summary.archivos_eliminados
            ));
        if let Some(id) = actor_id {
            entry = entry.with_user(id);
        }
        self.audit.record(entry).await;

        Ok(summary)
    }
}

/// Returns whether a file was actually removed.
/// Runs `pg_dump -f path`; a failed or timed-out run leaves no partial file.
async fn dump_into(
    pg_dump: &Path,
    mut args: Vec<String>,
    path: &Path,
    password: &str,
    timeout_secs: u64,
) -> Result<(), BackupError> {
    args.push("-f".to_string());
    args.push(path.to_string_lossy().into_owned());

    if let Err(err) = run_tool(pg_dump, &args, password, timeout_secs).await {
        remove_if_present(path).await;
        return Err(err);
    }
    Ok(())
}

async fn remove_if_present(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!("Could not remove {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn removing_a_missing_file_is_not_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("backup_auto_20250101_000000.sql");
        assert!(!remove_if_present(&path).await);

        tokio::fs::write(&path, b"-- dump").await.unwrap();
        assert!(remove_if_present(&path).await);
        assert!(!path.exists());
    }

    // The shell stands in for pg_dump: it receives the script followed by
    // `-f <target>`, so "$2" is the dump file.
    #[cfg(unix)]
    #[tokio::test]
    async fn timed_out_dump_is_killed_and_leaves_no_file() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("slow_dump.sh");
        tokio::fs::write(&script, "echo partial > \"$2\"\nexec sleep 30\n").await.unwrap();
        let target = dir.path().join("backup_manual_20250101_000000.sql");

        let started = std::time::Instant::now();
        let result = dump_into(
            Path::new("/bin/sh"),
            vec![script.to_string_lossy().into_owned()],
            &target,
            "secret",
            1,
        )
        .await;

        assert!(matches!(result, Err(BackupError::Timeout(1))));
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
        assert!(!target.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn completed_dump_keeps_the_file() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("dump.sh");
        tokio::fs::write(&script, "echo '-- dump' > \"$2\"\n").await.unwrap();
        let target = dir.path().join("backup_auto_20250101_000000.sql");

        dump_into(
            Path::new("/bin/sh"),
            vec![script.to_string_lossy().into_owned()],
            &target,
            "secret",
            5,
        )
        .await
        .unwrap();

        assert!(target.exists());
    }

    #[test]
    fn unconfigured_database_is_rejected_before_tool_lookup() {
        let settings = BackupSettings::from_config(&AppConfig::default());
        assert!(matches!(settings.tool("pg_dump"), Err(BackupError::NotConfigured)));
    }
}
