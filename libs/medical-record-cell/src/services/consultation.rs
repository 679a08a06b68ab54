use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use shared_config::AppConfig;
use shared_database::{tables, PostgrestClient, Query};

use crate::models::{
    ByConsultationQuery, Consultation, ConsultationQuery, CreateConsultationRequest,
    CreateFollowUpRequest, FollowUp, MedicalRecordError, UpdateConsultationRequest,
    UpdateFollowUpRequest,
};

const NOT_FOUND: &str = "Consulta no encontrada";
const FOLLOW_UP_NOT_FOUND: &str = "Seguimiento no encontrado";
const OWNED_BY_PATIENT: &str = "*,historia_clinica:core_historiaclinica!inner(paciente_id)";

fn patch_body<T: serde::Serialize>(request: &T) -> Result<Option<Value>, MedicalRecordError> {
    let body = serde_json::to_value(request)
        .map_err(|e| MedicalRecordError::Validation(e.to_string()))?;
    if body.as_object().map_or(true, |o| o.is_empty()) {
        Ok(None)
    } else {
        Ok(Some(body))
    }
}

pub struct ConsultationService {
    db: PostgrestClient,
}

impl ConsultationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    pub async fn list(
        &self,
        query: ConsultationQuery,
        owner: Option<i64>,
    ) -> Result<Vec<Consultation>, MedicalRecordError> {
        let mut q = Query::new();
        if let Some(paciente) = owner {
            q = q
                .select(OWNED_BY_PATIENT)
                .eq("historia_clinica.paciente_id", paciente);
        }
        if let Some(historia) = query.historia_clinica {
            q = q.eq("historia_clinica_id", historia);
        }
        if let Some(medico) = query.medico {
            q = q.eq("medico_id", medico);
        }
        let q = q
            .order("fecha_consulta", false)
            .paginate(query.limit, query.offset);

        Ok(self.db.select(tables::CONSULTATIONS, &q).await?)
    }

    pub async fn get(&self, consultation_id: i64) -> Result<Consultation, MedicalRecordError> {
        let q = Query::new().eq("id", consultation_id);
        self.db
            .select_one(tables::CONSULTATIONS, &q)
            .await?
            .ok_or(MedicalRecordError::NotFound(NOT_FOUND))
    }

    /// Patient whose history holds the consultation.
    pub async fn patient_of(&self, consultation_id: i64) -> Result<i64, MedicalRecordError> {
        let q = Query::new()
            .select("historia_clinica:core_historiaclinica(paciente_id)")
            .eq("id", consultation_id);
        let row: Option<Value> = self.db.select_one(tables::CONSULTATIONS, &q).await?;
        row.and_then(|r| r["historia_clinica"]["paciente_id"].as_i64())
            .ok_or(MedicalRecordError::NotFound(NOT_FOUND))
    }

    /// `acting_doctor` fills `medico` when the request leaves it out.
    pub async fn create(
        &self,
        request: CreateConsultationRequest,
        acting_doctor: Option<i64>,
    ) -> Result<Consultation, MedicalRecordError> {
        let motivo = request
            .motivo_consulta
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| {
                MedicalRecordError::Validation("El campo motivo_consulta es obligatorio.".to_string())
            })?;
        let medico = request.medico.or(acting_doctor).ok_or_else(|| {
            MedicalRecordError::Validation("El campo medico es obligatorio.".to_string())
        })?;

        let history = Query::new().eq("id", request.historia_clinica);
        if !self.db.exists(tables::CLINICAL_HISTORIES, &history).await? {
            return Err(MedicalRecordError::NotFound("Historia clínica no encontrada"));
        }
        let doctor = Query::new().eq("usuario_id", medico);
        if !self.db.exists(tables::DOCTORS, &doctor).await? {
            return Err(MedicalRecordError::Validation(
                "El médico indicado no existe.".to_string(),
            ));
        }

        let consultation: Consultation = self
            .db
            .insert(
                tables::CONSULTATIONS,
                json!({
                    "historia_clinica_id": request.historia_clinica,
                    "medico_id": medico,
                    "fecha_consulta": request.fecha_consulta.unwrap_or_else(Utc::now).to_rfc3339(),
                    "motivo_consulta": motivo,
                    "sintomas": request.sintomas,
                    "diagnostico": request.diagnostico,
                    "tratamiento": request.tratamiento,
                    "observaciones": request.observaciones,
                }),
            )
            .await?;

        info!(
            consultation_id = consultation.id,
            medico_id = medico,
            "Consultation recorded"
        );
        Ok(consultation)
    }

    pub async fn update(
        &self,
        consultation_id: i64,
        request: UpdateConsultationRequest,
    ) -> Result<Consultation, MedicalRecordError> {
        let Some(body) = patch_body(&request)? else {
            return self.get(consultation_id).await;
        };
        let q = Query::new().eq("id", consultation_id);
        let rows: Vec<Consultation> = self.db.update(tables::CONSULTATIONS, &q, body).await?;
        rows.into_iter()
            .next()
            .ok_or(MedicalRecordError::NotFound(NOT_FOUND))
    }

    pub async fn delete(&self, consultation_id: i64) -> Result<(), MedicalRecordError> {
        let q = Query::new().eq("id", consultation_id);
        if !self.db.exists(tables::CONSULTATIONS, &q).await? {
            return Err(MedicalRecordError::NotFound(NOT_FOUND));
        }
        self.db.delete(tables::CONSULTATIONS, &q).await?;
        Ok(())
    }

    // ==========================================================================
    // SEGUIMIENTOS
    // ==========================================================================

    pub async fn list_follow_ups(
        &self,
        query: ByConsultationQuery,
    ) -> Result<Vec<FollowUp>, MedicalRecordError> {
        let mut q = Query::new();
        if let Some(consulta) = query.consulta {
            q = q.eq("consulta_id", consulta);
        }
        let q = q
            .order("fecha_seguimiento", true)
            .paginate(query.limit, query.offset);
        Ok(self.db.select(tables::FOLLOW_UPS, &q).await?)
    }

    pub async fn get_follow_up(&self, follow_up_id: i64) -> Result<FollowUp, MedicalRecordError> {
        let q = Query::new().eq("id", follow_up_id);
        self.db
            .select_one(tables::FOLLOW_UPS, &q)
            .await?
            .ok_or(MedicalRecordError::NotFound(FOLLOW_UP_NOT_FOUND))
    }

    pub async fn create_follow_up(
        &self,
        request: CreateFollowUpRequest,
    ) -> Result<FollowUp, MedicalRecordError> {
        let observaciones = request
            .observaciones
            .filter(|o| !o.trim().is_empty())
            .ok_or_else(|| {
                MedicalRecordError::Validation("El campo observaciones es obligatorio.".to_string())
            })?;
        self.get(request.consulta).await?;

        let follow_up = self
            .db
            .insert(
                tables::FOLLOW_UPS,
                json!({
                    "consulta_id": request.consulta,
                    "fecha_seguimiento": request.fecha_seguimiento,
                    "observaciones": observaciones,
                    "recomendaciones": request.recomendaciones,
                }),
            )
            .await?;
        Ok(follow_up)
    }

    pub async fn update_follow_up(
        &self,
        follow_up_id: i64,
        request: UpdateFollowUpRequest,
    ) -> Result<FollowUp, MedicalRecordError> {
        let Some(body) = patch_body(&request)? else {
            return self.get_follow_up(follow_up_id).await;
        };
        let q = Query::new().eq("id", follow_up_id);
        let rows: Vec<FollowUp> = self.db.update(tables::FOLLOW_UPS, &q, body).await?;
        rows.into_iter()
            .next()
            .ok_or(MedicalRecordError::NotFound(FOLLOW_UP_NOT_FOUND))
    }

    pub async fn delete_follow_up(&self, follow_up_id: i64) -> Result<(), MedicalRecordError> {
        let q = Query::new().eq("id", follow_up_id);
        if !self.db.exists(tables::FOLLOW_UPS, &q).await? {
            return Err(MedicalRecordError::NotFound(FOLLOW_UP_NOT_FOUND));
        }
        self.db.delete(tables::FOLLOW_UPS, &q).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_patch_has_no_body() {
        assert!(patch_body(&UpdateConsultationRequest::default()).unwrap().is_none());

        let body = patch_body(&UpdateConsultationRequest {
            diagnostico: Some("Hipertensión arterial".to_string()),
            ..Default::default()
        })
        .unwrap()
        .unwrap();
        assert_eq!(body, json!({"diagnostico": "Hipertensión arterial"}));
    }
}
