//! Clinic management commands
//!
//! Usage:
//!   clinic-manage seed-users
//!   clinic-manage seed-clinical
//!   clinic-manage seed-notifications
//!   clinic-manage test-email <to>
//!   clinic-manage test-push <token>
//!   clinic-manage backup
//!   clinic-manage cleanup-backups

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use backup_cell::{BackupKind, BackupService};
use notification_cell::{EmailSender, FcmPushSender, PushSender, SmtpEmailSender};
use shared_config::AppConfig;

mod seed;

const LOCAL_IP: &str = "127.0.0.1";

#[derive(Parser)]
#[command(name = "clinic-manage")]
#[command(version = "0.1.0")]
#[command(about = "Seeding, delivery checks and backups for the clinic backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Roles, permissions, administrators, specialties, doctors and patients
    SeedUsers,

    /// UI components, schedules, clinical histories, appointments, consultations and audit rows
    SeedClinical,

    /// Documents, prescriptions, follow-ups, notifications, devices and exams
    SeedNotifications,

    /// Send a test email through the configured SMTP relay
    TestEmail {
        /// Recipient address
        to: String,
    },

    /// Send a test push notification to one FCM token
    TestPush {
        /// Device registration token
        token: String,
    },

    /// Run a database backup now
    Backup,

    /// Remove backups older than the retention window
    CleanupBackups,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command {
        Commands::SeedUsers => seed::users::run(&config).await?,
        Commands::SeedClinical => seed::clinical::run(&config).await?,
        Commands::SeedNotifications => seed::notifications::run(&config).await?,
        Commands::TestEmail { to } => test_email(&config, &to).await?,
        Commands::TestPush { token } => test_push(&config, token).await?,
        Commands::Backup => {
            let record = BackupService::new(&config)
                .run_backup(BackupKind::Manual, None, LOCAL_IP)
                .await?;
            info!(
                "Backup {} created ({} bytes)",
                record.nombre_archivo, record.tamano_bytes
            );
        }
        Commands::CleanupBackups => {
            let summary = BackupService::new(&config).cleanup(None, LOCAL_IP).await?;
            info!(
                "Removed {} backup records and {} files",
                summary.registros_eliminados, summary.archivos_eliminados
            );
        }
    }

    Ok(())
}

async fn test_email(config: &AppConfig, to: &str) -> Result<()> {
    let sender = SmtpEmailSender::from_config(config)
        .ok_or_else(|| anyhow!("SMTP is not configured (SMTP_HOST, SMTP_FROM)"))?;

    info!("Sending test email to {}", to);
    sender
        .send(
            to,
            "Prueba de Alerta",
            "<h1>Nuevo mensaje del sistema médico</h1><p>Esto es solo una prueba.</p>",
            "Este es un mensaje de prueba.",
        )
        .await?;
    info!("Email sent");
    Ok(())
}

async fn test_push(config: &AppConfig, token: String) -> Result<()> {
    let sender = FcmPushSender::from_config(config)
        .ok_or_else(|| anyhow!("FCM is not configured (FCM_PROJECT_ID, FCM_SERVICE_ACCOUNT_PATH)"))?;

    let delivered = sender
        .send(
            &[token],
            "Prueba Firebase",
            "¡Notificación de prueba del sistema médico!",
            &BTreeMap::new(),
        )
        .await?;

    if delivered == 0 {
        return Err(anyhow!("FCM rejected the test notification"));
    }
    info!("Push notification delivered");
    Ok(())
}
