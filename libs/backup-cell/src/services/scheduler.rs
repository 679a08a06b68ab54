use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use shared_config::AppConfig;

use crate::models::BackupKind;
use crate::services::BackupService;

const SCHEDULER_IP: &str = "127.0.0.1";

/// Runs an automatic backup followed by retention cleanup every
/// `backup_interval_hours`. Returns `None` when backups are not configured.
pub fn spawn_scheduler(config: Arc<AppConfig>) -> Option<JoinHandle<()>> {
    if !config.is_backup_configured() || config.backup_interval_hours == 0 {
        info!("Automatic backups disabled");
        return None;
    }

    let period = Duration::from_secs(config.backup_interval_hours * 3600);
    info!("Automatic backups every {} hours", config.backup_interval_hours);

    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick fires immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            let service = BackupService::new(&config);

            if let Err(e) = service.run_backup(BackupKind::Auto, None, SCHEDULER_IP).await {
                error!("Scheduled backup failed: {}", e);
            }
            if let Err(e) = service.cleanup(None, SCHEDULER_IP).await {
                error!("Scheduled backup cleanup failed: {}", e);
            }
        }
    }))
}
