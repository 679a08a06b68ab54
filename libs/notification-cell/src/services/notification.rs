use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use shared_config::AppConfig;
use shared_database::{tables, PostgrestClient, Query};

use crate::models::{
    DeliveryOutcome, Notification, NotificationError, NotificationListQuery, OutgoingNotification,
};
use crate::services::channels::{EmailSender, FcmPushSender, PushSender, SmtpEmailSender};

pub struct NotificationService {
    db: PostgrestClient,
    push: Option<Arc<dyn PushSender>>,
    email: Option<Arc<dyn EmailSender>>,
}

pub fn email_html(titulo: &str, mensaje: &str, sent_at: &str) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
    <h2 style="color: #2c5aa0;">{titulo}</h2>
    <div style="background: #f8f9fa; padding: 20px; border-radius: 8px;">
        <p style="margin: 0; color: #333;">{mensaje}</p>
    </div>
    <p style="color: #666; font-size: 12px; margin-top: 20px;">
        Fecha: {sent_at}<br>
        Sistema de Gestión Médica
    </p>
</div>"#
    )
}

pub fn email_text(titulo: &str, mensaje: &str, sent_at: &str) -> String {
    format!("{}\n\n{}\n\nFecha: {}", titulo, mensaje, sent_at)
}

impl NotificationService {
    pub fn new(config: &AppConfig) -> Self {
        let push = FcmPushSender::from_config(config).map(|s| Arc::new(s) as Arc<dyn PushSender>);
        let email =
            SmtpEmailSender::from_config(config).map(|s| Arc::new(s) as Arc<dyn EmailSender>);
        Self::with_channels(config, push, email)
    }

    pub fn with_channels(
        config: &AppConfig,
        push: Option<Arc<dyn PushSender>>,
        email: Option<Arc<dyn EmailSender>>,
    ) -> Self {
        Self {
            db: PostgrestClient::new(config),
            push,
            email,
        }
    }

    pub async fn list_for_user(
        &self,
        user_id: i64,
        query: NotificationListQuery,
    ) -> Result<Vec<Notification>, NotificationError> {
        let mut q = Query::new().eq("usuario_id", user_id);
        if let Some(leida) = query.leida {
            q = q.eq("leida", leida);
        }
        if let Some(tipo) = query.tipo {
            q = q.eq("tipo", tipo.as_str());
        }
        let q = q
            .order("fecha_envio", false)
            .paginate(Some(query.limit.unwrap_or(50)), query.offset);

        Ok(self.db.select(tables::NOTIFICATIONS, &q).await?)
    }

    pub async fn mark_read(&self, user_id: i64, notification_id: i64) -> Result<Notification, NotificationError> {
        let q = Query::new()
            .eq("id", notification_id)
            .eq("usuario_id", user_id);
        let rows: Vec<Notification> = self
            .db
            .update(tables::NOTIFICATIONS, &q, json!({ "leida": true }))
            .await?;
        rows.into_iter().next().ok_or(NotificationError::NotFound)
    }

    pub async fn mark_all_read(&self, user_id: i64) -> Result<usize, NotificationError> {
        let q = Query::new().eq("usuario_id", user_id).eq("leida", false);
        let rows: Vec<Value> = self
            .db
            .update(tables::NOTIFICATIONS, &q, json!({ "leida": true }))
            .await?;
        Ok(rows.len())
    }

    /// Stores the notification and delivers it. Never fails the caller: storage and
    /// delivery problems are logged.
    #[instrument(skip(self, outgoing), fields(user_id = outgoing.usuario_id, title = %outgoing.titulo))]
    pub async fn create_and_send(&self, outgoing: OutgoingNotification) -> Option<Notification> {
        let row = json!({
            "usuario_id": outgoing.usuario_id,
            "tipo": outgoing.tipo,
            "titulo": outgoing.titulo,
            "mensaje": outgoing.mensaje,
            "leida": false,
            "fecha_envio": Utc::now().to_rfc3339(),
            "datos_adicionales": outgoing.datos,
        });
        let stored = match self.db.insert::<Notification>(tables::NOTIFICATIONS, row).await {
            Ok(notification) => Some(notification),
            Err(e) => {
                warn!("Failed to store notification: {}", e);
                None
            }
        };

        let outcome = self.deliver(&outgoing).await;
        info!(?outcome, "Notification dispatched");
        stored
    }

    /// Push to active devices first; email when there is no device or no push landed.
    pub async fn deliver(&self, outgoing: &OutgoingNotification) -> DeliveryOutcome {
        let tokens = match self.active_tokens(outgoing.usuario_id).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("Could not load devices: {}", e);
                Vec::new()
            }
        };

        if tokens.is_empty() {
            info!("No registered devices for push");
        } else if let Some(push) = &self.push {
            match push
                .send(&tokens, &outgoing.titulo, &outgoing.mensaje, &outgoing.push_data())
                .await
            {
                Ok(delivered) if delivered > 0 => return DeliveryOutcome::Push,
                Ok(_) => warn!("Push accepted by no device"),
                Err(e) => warn!("Push delivery failed: {}", e),
            }
        } else {
            warn!("Push channel not configured");
        }

        self.send_email_fallback(outgoing).await
    }

    async fn send_email_fallback(&self, outgoing: &OutgoingNotification) -> DeliveryOutcome {
        let Some(email) = &self.email else {
            warn!("Email channel not configured, notification undelivered");
            return DeliveryOutcome::Undelivered;
        };
        let address = match self.user_email(outgoing.usuario_id).await {
            Ok(Some(address)) => address,
            Ok(None) => {
                warn!("User has no email address");
                return DeliveryOutcome::Undelivered;
            }
            Err(e) => {
                warn!("Could not load user email: {}", e);
                return DeliveryOutcome::Undelivered;
            }
        };

        let sent_at = Utc::now().format("%d/%m/%Y %H:%M").to_string();
        let html = email_html(&outgoing.titulo, &outgoing.mensaje, &sent_at);
        let text = email_text(&outgoing.titulo, &outgoing.mensaje, &sent_at);
        match email.send(&address, &outgoing.titulo, &html, &text).await {
            Ok(()) => DeliveryOutcome::Email,
            Err(e) => {
                warn!("Could not notify {}: {}", address, e);
                DeliveryOutcome::Undelivered
            }
        }
    }

    async fn active_tokens(&self, user_id: i64) -> Result<Vec<String>, NotificationError> {
        let q = Query::new()
            .select("token_fcm")
            .eq("usuario_id", user_id)
            .eq("activo", true);
        let rows: Vec<Value> = self.db.select(tables::DEVICES, &q).await?;
        Ok(rows
            .iter()
            .filter_map(|r| r["token_fcm"].as_str().map(str::to_string))
            .collect())
    }

    async fn user_email(&self, user_id: i64) -> Result<Option<String>, NotificationError> {
        let q = Query::new().select("email").eq("id", user_id);
        let row: Option<Value> = self.db.select_one(tables::USERS, &q).await?;
        Ok(row.and_then(|r| r["email"].as_str().map(str::to_string)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_bodies_carry_title_message_and_date() {
        let html = email_html("Cita Cancelada", "Su cita fue cancelada.", "01/02/2025 10:00");
        assert!(html.contains("<h2 style=\"color: #2c5aa0;\">Cita Cancelada</h2>"));
        assert!(html.contains("Fecha: 01/02/2025 10:00"));

        let text = email_text("Cita Cancelada", "Su cita fue cancelada.", "01/02/2025 10:00");
        assert_eq!(
            text,
            "Cita Cancelada\n\nSu cita fue cancelada.\n\nFecha: 01/02/2025 10:00"
        );
    }
}
