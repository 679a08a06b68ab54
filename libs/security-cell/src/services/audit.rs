// =====================================================================================
// AUDIT SERVICE - BITACORA
// =====================================================================================

use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument, warn};

use shared_config::AppConfig;
use shared_database::{tables, PostgrestClient, Query};

use crate::models::{AuditEntry, AuditLogQuery, NewAuditEntry, SecurityError};

pub struct AuditService {
    db: PostgrestClient,
}

impl AuditService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    /// Writes the entry to the log stream and the audit table. Storage failures
    /// are logged and swallowed so auditing never breaks the audited action.
    #[instrument(skip(self, entry))]
    pub async fn record(&self, entry: NewAuditEntry) {
        info!(
            user_id = ?entry.usuario_id,
            ip_address = %entry.ip_address,
            module = %entry.modulo_afectado,
            "AUDIT: {}", entry.accion_realizada
        );

        let row = json!({
            "usuario_id": entry.usuario_id,
            "ip_address": entry.ip_address,
            "accion_realizada": entry.accion_realizada,
            "modulo_afectado": entry.modulo_afectado,
            "fecha_hora": Utc::now().to_rfc3339(),
            "detalles": entry.detalles,
        });

        if let Err(e) = self
            .db
            .insert::<serde_json::Value>(tables::AUDIT_LOG, row)
            .await
        {
            warn!("Failed to persist audit entry: {}", e);
        }
    }

    pub async fn list(&self, query: AuditLogQuery) -> Result<Vec<AuditEntry>, SecurityError> {
        let mut q = Query::new();
        if let Some(user_id) = query.usuario {
            q = q.eq("usuario_id", user_id);
        }
        if let Some(module) = query.modulo.as_deref() {
            q = q.eq("modulo_afectado", module);
        }
        if let Some(from) = query.desde {
            q = q.gte("fecha_hora", from.format("%Y-%m-%d"));
        }
        if let Some(to) = query.hasta {
            // inclusive upper bound on the calendar day
            q = q.lt("fecha_hora", (to + chrono::Duration::days(1)).format("%Y-%m-%d"));
        }
        let q = q
            .order("fecha_hora", false)
            .paginate(Some(query.limit.unwrap_or(100)), query.offset);

        Ok(self.db.select(tables::AUDIT_LOG, &q).await?)
    }
}
