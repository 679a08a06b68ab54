use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::{tables, PostgrestClient, Query};

use crate::models::{Device, NotificationError, RegisterDeviceRequest};

pub struct DeviceService {
    db: PostgrestClient,
}

impl DeviceService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    /// Registers a token for `user_id`. A token seen before is reassigned and reactivated.
    pub async fn register(
        &self,
        user_id: i64,
        request: RegisterDeviceRequest,
    ) -> Result<(Device, bool), NotificationError> {
        let token = request.token_fcm.trim();
        if token.is_empty() {
            return Err(NotificationError::Validation(
                "El campo token_fcm es obligatorio.".to_string(),
            ));
        }

        let by_token = Query::new().eq("token_fcm", token);
        let existing: Option<Device> = self.db.select_one(tables::DEVICES, &by_token).await?;

        if existing.is_some() {
            let rows: Vec<Device> = self
                .db
                .update(
                    tables::DEVICES,
                    &by_token,
                    json!({
                        "usuario_id": user_id,
                        "plataforma": request.plataforma,
                        "activo": true,
                    }),
                )
                .await?;
            debug!(user_id, "Device token reactivated");
            return rows
                .into_iter()
                .next()
                .map(|device| (device, false))
                .ok_or(NotificationError::DeviceNotFound);
        }

        let device: Device = self
            .db
            .insert(
                tables::DEVICES,
                json!({
                    "usuario_id": user_id,
                    "token_fcm": token,
                    "plataforma": request.plataforma,
                    "activo": true,
                    "fecha_registro": Utc::now().to_rfc3339(),
                }),
            )
            .await?;
        info!(user_id, device_id = device.id, "Device registered");
        Ok((device, true))
    }

    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<Device>, NotificationError> {
        let q = Query::new()
            .eq("usuario_id", user_id)
            .order("fecha_registro", false);
        Ok(self.db.select(tables::DEVICES, &q).await?)
    }

    /// Only the owner may remove a device.
    pub async fn delete_for_user(&self, user_id: i64, device_id: i64) -> Result<(), NotificationError> {
        let q = Query::new().eq("id", device_id).eq("usuario_id", user_id);
        if !self.db.exists(tables::DEVICES, &q).await? {
            return Err(NotificationError::DeviceNotFound);
        }
        self.db.delete(tables::DEVICES, &q).await?;
        Ok(())
    }
}
