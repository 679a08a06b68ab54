use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, warn};

use shared_config::AppConfig;
use shared_database::{tables, PostgrestClient, Query};

use crate::models::{
    ByConsultationQuery, CreatePrescriptionRequest, MedicalRecordError, Prescription,
    PrescriptionItem, PrescriptionItemRequest,
};

const NOT_FOUND: &str = "Receta no encontrada";
const WITH_ITEMS: &str = "*,detalles:core_detallereceta(*)";

/// Rows for `core_detallereceta`; every item needs medicamento, dosis, frecuencia and duracion.
pub fn item_rows(receta_id: i64, items: &[PrescriptionItemRequest]) -> Result<Value, MedicalRecordError> {
    if items.is_empty() {
        return Err(MedicalRecordError::Validation(
            "La receta debe incluir al menos un medicamento.".to_string(),
        ));
    }

    let mut rows = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let field = |value: &Option<String>, name: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    MedicalRecordError::Validation(format!(
                        "detalles[{}]: el campo {} es obligatorio.",
                        index, name
                    ))
                })
        };
        rows.push(json!({
            "receta_id": receta_id,
            "medicamento": field(&item.medicamento, "medicamento")?,
            "dosis": field(&item.dosis, "dosis")?,
            "frecuencia": field(&item.frecuencia, "frecuencia")?,
            "duracion": field(&item.duracion, "duracion")?,
            "indicaciones": item.indicaciones,
        }));
    }
    Ok(Value::Array(rows))
}

pub struct PrescriptionService {
    db: PostgrestClient,
}

impl PrescriptionService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    pub async fn list(
        &self,
        query: ByConsultationQuery,
        owner: Option<i64>,
    ) -> Result<Vec<Prescription>, MedicalRecordError> {
        let mut q = Query::new();
        if let Some(paciente) = owner {
            q = q
                .select(
                    "*,detalles:core_detallereceta(*),consulta:core_consulta!inner(historia_clinica:core_historiaclinica!inner(paciente_id))",
                )
                .eq("consulta.historia_clinica.paciente_id", paciente);
        } else {
            q = q.select(WITH_ITEMS);
        }
        if let Some(consulta) = query.consulta {
            q = q.eq("consulta_id", consulta);
        }
        let q = q
            .order("fecha_receta", false)
            .paginate(query.limit, query.offset);

        Ok(self.db.select(tables::PRESCRIPTIONS, &q).await?)
    }

    pub async fn get(&self, prescription_id: i64) -> Result<Prescription, MedicalRecordError> {
        let q = Query::new().select(WITH_ITEMS).eq("id", prescription_id);
        self.db
            .select_one(tables::PRESCRIPTIONS, &q)
            .await?
            .ok_or(MedicalRecordError::NotFound(NOT_FOUND))
    }

    /// Stores the prescription and its items. If the items cannot be stored the
    /// prescription row is removed again.
    pub async fn create(
        &self,
        request: CreatePrescriptionRequest,
    ) -> Result<Prescription, MedicalRecordError> {
        // Validate items before touching the database.
        item_rows(0, &request.detalles)?;

        let consultation = Query::new().eq("id", request.consulta);
        if !self.db.exists(tables::CONSULTATIONS, &consultation).await? {
            return Err(MedicalRecordError::NotFound("Consulta no encontrada"));
        }

        let mut prescription: Prescription = self
            .db
            .insert(
                tables::PRESCRIPTIONS,
                json!({
                    "consulta_id": request.consulta,
                    "fecha_receta": request.fecha_receta.unwrap_or_else(|| Utc::now().date_naive()),
                    "observaciones": request.observaciones,
                }),
            )
            .await?;

        let rows = item_rows(prescription.id, &request.detalles)?;
        let items: Vec<PrescriptionItem> = match self.db.insert_many(tables::PRESCRIPTION_ITEMS, rows).await {
            Ok(items) => items,
            Err(e) => {
                warn!(prescription_id = prescription.id, "Prescription items failed, rolling back: {}", e);
                let q = Query::new().eq("id", prescription.id);
                if let Err(cleanup) = self.db.delete(tables::PRESCRIPTIONS, &q).await {
                    warn!("Could not remove incomplete prescription: {}", cleanup);
                }
                return Err(e.into());
            }
        };

        info!(
            prescription_id = prescription.id,
            items = items.len(),
            "Prescription issued"
        );
        prescription.detalles = items;
        Ok(prescription)
    }
}
