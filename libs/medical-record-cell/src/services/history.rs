use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use shared_config::AppConfig;
use shared_database::{tables, PostgrestClient, Query};

use crate::models::{ClinicalHistory, HistoryQuery, MedicalRecordError, UpdateHistoryRequest};

const NOT_FOUND: &str = "Historia clínica no encontrada";

pub struct ClinicalHistoryService {
    db: PostgrestClient,
}

impl ClinicalHistoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    /// `owner` restricts the listing to one patient's histories.
    pub async fn list(
        &self,
        query: HistoryQuery,
        owner: Option<i64>,
    ) -> Result<Vec<ClinicalHistory>, MedicalRecordError> {
        let mut q = Query::new();
        if let Some(paciente) = owner.or(query.paciente) {
            q = q.eq("paciente_id", paciente);
        }
        if let Some(activo) = query.activo {
            q = q.eq("activo", activo);
        }
        let q = q
            .order("fecha_creacion", false)
            .paginate(query.limit, query.offset);

        Ok(self.db.select(tables::CLINICAL_HISTORIES, &q).await?)
    }

    pub async fn get(&self, history_id: i64) -> Result<ClinicalHistory, MedicalRecordError> {
        let q = Query::new().eq("id", history_id);
        self.db
            .select_one(tables::CLINICAL_HISTORIES, &q)
            .await?
            .ok_or(MedicalRecordError::NotFound(NOT_FOUND))
    }

    async fn has_active(&self, paciente_id: i64, except: Option<i64>) -> Result<bool, MedicalRecordError> {
        let mut q = Query::new().eq("paciente_id", paciente_id).eq("activo", true);
        if let Some(id) = except {
            q = q.neq("id", id);
        }
        Ok(self.db.exists(tables::CLINICAL_HISTORIES, &q).await?)
    }

    /// Opens the active history of a patient. A patient holds at most one.
    pub async fn open_for_patient(
        &self,
        paciente_id: i64,
        observaciones: Option<String>,
    ) -> Result<ClinicalHistory, MedicalRecordError> {
        if self.has_active(paciente_id, None).await? {
            return Err(MedicalRecordError::ActiveHistoryExists);
        }

        let history: ClinicalHistory = self
            .db
            .insert(
                tables::CLINICAL_HISTORIES,
                json!({
                    "paciente_id": paciente_id,
                    "fecha_creacion": Utc::now().to_rfc3339(),
                    "observaciones_generales": observaciones,
                    "activo": true,
                }),
            )
            .await?;

        info!(paciente_id, history_id = history.id, "Clinical history opened");
        Ok(history)
    }

    pub async fn update(
        &self,
        history_id: i64,
        request: UpdateHistoryRequest,
    ) -> Result<ClinicalHistory, MedicalRecordError> {
        let current = self.get(history_id).await?;
        if request.activo == Some(true)
            && !current.activo
            && self.has_active(current.paciente_id, Some(history_id)).await?
        {
            return Err(MedicalRecordError::ActiveHistoryExists);
        }

        let body = serde_json::to_value(&request)
            .map_err(|e| MedicalRecordError::Validation(e.to_string()))?;
        if body.as_object().map_or(true, |o| o.is_empty()) {
            return Ok(current);
        }

        let q = Query::new().eq("id", history_id);
        let rows: Vec<ClinicalHistory> = self.db.update(tables::CLINICAL_HISTORIES, &q, body).await?;
        rows.into_iter()
            .next()
            .ok_or(MedicalRecordError::NotFound(NOT_FOUND))
    }

    /// Patient that owns the history, used for access checks further down the record.
    pub async fn owner_of(&self, history_id: i64) -> Result<i64, MedicalRecordError> {
        let q = Query::new().select("paciente_id").eq("id", history_id);
        let row: Option<Value> = self.db.select_one(tables::CLINICAL_HISTORIES, &q).await?;
        row.and_then(|r| r["paciente_id"].as_i64())
            .ok_or(MedicalRecordError::NotFound(NOT_FOUND))
    }
}
