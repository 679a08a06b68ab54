use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::client_ip;
use shared_utils::guard::require_admin;

use crate::models::{BackupKind, BackupQuery, BackupRecord, CleanupSummary, RestoreOutcome};
use crate::services::BackupService;

#[axum::debug_handler]
pub async fn list_backups(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Query(query): Query<BackupQuery>,
) -> Result<Json<Vec<BackupRecord>>, AppError> {
    require_admin(&user)?;
    let backups = BackupService::new(&config).list(query).await?;
    Ok(Json(backups))
}

#[axum::debug_handler]
pub async fn create_backup(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<BackupRecord>), AppError> {
    require_admin(&user)?;
    let record = BackupService::new(&config)
        .run_backup(BackupKind::Manual, Some(user.id), &client_ip(&headers))
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[axum::debug_handler]
pub async fn restore_backup(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    headers: HeaderMap,
    Path(backup_id): Path<i64>,
) -> Result<Json<RestoreOutcome>, AppError> {
    require_admin(&user)?;
    let outcome = BackupService::new(&config)
        .restore(backup_id, user.id, &client_ip(&headers))
        .await?;
    Ok(Json(outcome))
}

#[axum::debug_handler]
pub async fn delete_backup(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    headers: HeaderMap,
    Path(backup_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_admin(&user)?;
    BackupService::new(&config)
        .delete(backup_id, user.id, &client_ip(&headers))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn cleanup_backups(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    headers: HeaderMap,
) -> Result<Json<CleanupSummary>, AppError> {
    require_admin(&user)?;
    let summary = BackupService::new(&config)
        .cleanup(Some(user.id), &client_ip(&headers))
        .await?;
    Ok(Json(summary))
}
