use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{Device, Notification, NotificationListQuery, RegisterDeviceRequest};
use crate::services::{DeviceService, NotificationService};

#[axum::debug_handler]
pub async fn list_notifications(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = NotificationService::new(&config)
        .list_for_user(user.id, query)
        .await?;
    Ok(Json(notifications))
}

#[axum::debug_handler]
pub async fn mark_read(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(notification_id): Path<i64>,
) -> Result<Json<Notification>, AppError> {
    let notification = NotificationService::new(&config)
        .mark_read(user.id, notification_id)
        .await?;
    Ok(Json(notification))
}

#[axum::debug_handler]
pub async fn mark_all_read(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let updated = NotificationService::new(&config).mark_all_read(user.id).await?;
    Ok(Json(json!({ "marcadas": updated })))
}

#[axum::debug_handler]
pub async fn register_device(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<RegisterDeviceRequest>,
) -> Result<(StatusCode, Json<Device>), AppError> {
    let (device, created) = DeviceService::new(&config).register(user.id, request).await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(device)))
}

#[axum::debug_handler]
pub async fn list_devices(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Device>>, AppError> {
    let devices = DeviceService::new(&config).list_for_user(user.id).await?;
    Ok(Json(devices))
}

#[axum::debug_handler]
pub async fn delete_device(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(device_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    DeviceService::new(&config).delete_for_user(user.id, device_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
