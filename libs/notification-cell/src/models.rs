use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Cita,
    Resultado,
    Sistema,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Cita => "cita",
            NotificationKind::Resultado => "resultado",
            NotificationKind::Sistema => "sistema",
        }
    }
}

/// Row of `core_notificacion`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub usuario_id: i64,
    pub tipo: NotificationKind,
    pub titulo: String,
    pub mensaje: String,
    pub leida: bool,
    pub fecha_envio: DateTime<Utc>,
    pub datos_adicionales: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationListQuery {
    pub leida: Option<bool>,
    pub tipo: Option<NotificationKind>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// A notification ready to be stored and delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingNotification {
    pub usuario_id: i64,
    pub tipo: NotificationKind,
    pub titulo: String,
    pub mensaje: String,
    pub datos: Option<Value>,
}

impl OutgoingNotification {
    pub fn new(
        usuario_id: i64,
        tipo: NotificationKind,
        titulo: impl Into<String>,
        mensaje: impl Into<String>,
    ) -> Self {
        Self {
            usuario_id,
            tipo,
            titulo: titulo.into(),
            mensaje: mensaje.into(),
            datos: None,
        }
    }

    pub fn with_data(mut self, datos: Value) -> Self {
        self.datos = Some(datos);
        self
    }

    /// FCM only accepts string values in the data payload.
    pub fn push_data(&self) -> BTreeMap<String, String> {
        let Some(Value::Object(map)) = &self.datos else {
            return BTreeMap::new();
        };
        map.iter()
            .map(|(k, v)| {
                let value = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Push,
    Email,
    Undelivered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
    Web,
}

/// Row of `core_dispositivo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,
    pub usuario_id: i64,
    pub token_fcm: String,
    pub plataforma: Platform,
    pub activo: bool,
    pub fecha_registro: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterDeviceRequest {
    pub token_fcm: String,
    pub plataforma: Platform,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notificación no encontrada")]
    NotFound,

    #[error("Dispositivo no encontrado")]
    DeviceNotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Channel not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Push delivery failed: {0}")]
    Push(String),

    #[error("Email delivery failed: {0}")]
    Email(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for NotificationError {
    fn from(err: anyhow::Error) -> Self {
        NotificationError::Database(err.to_string())
    }
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::NotFound | NotificationError::DeviceNotFound => {
                AppError::NotFound(err.to_string())
            }
            NotificationError::Validation(msg) => AppError::ValidationError(msg),
            NotificationError::NotConfigured(_) => AppError::ServiceUnavailable(err.to_string()),
            NotificationError::Push(msg) | NotificationError::Email(msg) => {
                AppError::ExternalService(msg)
            }
            NotificationError::Database(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn push_data_stringifies_values() {
        let outgoing = OutgoingNotification::new(1, NotificationKind::Cita, "t", "m")
            .with_data(json!({"cita_id": 12, "estado": "confirmada"}));
        let data = outgoing.push_data();

        assert_eq!(data["cita_id"], "12");
        assert_eq!(data["estado"], "confirmada");
    }

    #[test]
    fn kinds_serialize_lowercase() {
        assert_eq!(serde_json::to_value(NotificationKind::Resultado).unwrap(), "resultado");
        assert_eq!(serde_json::to_value(Platform::Ios).unwrap(), "ios");
    }
}
