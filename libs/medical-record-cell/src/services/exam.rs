use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::info;

use notification_cell::{ExamNotice, NotificationService};
use shared_config::AppConfig;
use shared_database::{tables, PostgrestClient, Query};

use crate::models::{
    CreateExamRequest, ExamRequest, ExamRequestQuery, ExamResultRequest, ExamStatus, ExamType,
    ExamTypeQuery, ExamTypeRequest, MedicalRecordError, Urgency,
};

const TYPE_NOT_FOUND: &str = "Tipo de examen no encontrado";
const REQUEST_NOT_FOUND: &str = "Solicitud de examen no encontrada";
const WITH_TYPE: &str = "*,tipo_examen:core_tipoexamen(*)";

pub struct ExamService {
    db: PostgrestClient,
    notifications: NotificationService,
}

impl ExamService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
            notifications: NotificationService::new(config),
        }
    }

    // ==========================================================================
    // TIPOS DE EXAMEN
    // ==========================================================================

    pub async fn list_types(&self, query: ExamTypeQuery) -> Result<Vec<ExamType>, MedicalRecordError> {
        let mut q = Query::new();
        if let Some(activo) = query.activo {
            q = q.eq("activo", activo);
        }
        if let Some(search) = query.search.as_deref() {
            q = q.search(&["codigo", "nombre"], search);
        }
        Ok(self.db.select(tables::EXAM_TYPES, &q.order("nombre", true)).await?)
    }

    pub async fn get_type(&self, type_id: i64) -> Result<ExamType, MedicalRecordError> {
        let q = Query::new().eq("id", type_id);
        self.db
            .select_one(tables::EXAM_TYPES, &q)
            .await?
            .ok_or(MedicalRecordError::NotFound(TYPE_NOT_FOUND))
    }

    async fn code_taken(&self, codigo: &str, except: Option<i64>) -> Result<bool, MedicalRecordError> {
        let mut q = Query::new().eq("codigo", codigo);
        if let Some(id) = except {
            q = q.neq("id", id);
        }
        Ok(self.db.exists(tables::EXAM_TYPES, &q).await?)
    }

    pub async fn create_type(&self, request: ExamTypeRequest) -> Result<ExamType, MedicalRecordError> {
        let codigo = request
            .codigo
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| MedicalRecordError::Validation("El campo codigo es obligatorio.".to_string()))?;
        let nombre = request
            .nombre
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| MedicalRecordError::Validation("El campo nombre es obligatorio.".to_string()))?;
        if self.code_taken(&codigo, None).await? {
            return Err(MedicalRecordError::DuplicateExamCode);
        }

        let exam_type = self
            .db
            .insert(
                tables::EXAM_TYPES,
                json!({
                    "codigo": codigo,
                    "nombre": nombre,
                    "descripcion": request.descripcion,
                    "indicaciones": request.indicaciones,
                    "urgencia_default": request.urgencia_default.unwrap_or(Urgency::Rutina),
                    "activo": request.activo.unwrap_or(true),
                }),
            )
            .await?;
        Ok(exam_type)
    }

    pub async fn update_type(
        &self,
        type_id: i64,
        request: ExamTypeRequest,
    ) -> Result<ExamType, MedicalRecordError> {
        let current = self.get_type(type_id).await?;

        let mut body = Map::new();
        if let Some(codigo) = request.codigo.map(|c| c.trim().to_uppercase()) {
            if codigo != current.codigo && self.code_taken(&codigo, Some(type_id)).await? {
                return Err(MedicalRecordError::DuplicateExamCode);
            }
            body.insert("codigo".into(), json!(codigo));
        }
        if let Some(nombre) = request.nombre {
            body.insert("nombre".into(), json!(nombre));
        }
        if let Some(descripcion) = request.descripcion {
            body.insert("descripcion".into(), json!(descripcion));
        }
        if let Some(indicaciones) = request.indicaciones {
            body.insert("indicaciones".into(), json!(indicaciones));
        }
        if let Some(urgencia) = request.urgencia_default {
            body.insert("urgencia_default".into(), json!(urgencia));
        }
        if let Some(activo) = request.activo {
            body.insert("activo".into(), json!(activo));
        }
        if body.is_empty() {
            return Ok(current);
        }

        let q = Query::new().eq("id", type_id);
        let rows: Vec<ExamType> = self.db.update(tables::EXAM_TYPES, &q, Value::Object(body)).await?;
        rows.into_iter()
            .next()
            .ok_or(MedicalRecordError::NotFound(TYPE_NOT_FOUND))
    }

    pub async fn delete_type(&self, type_id: i64) -> Result<(), MedicalRecordError> {
        self.get_type(type_id).await?;
        let requested = Query::new().eq("tipo_examen_id", type_id);
        if self.db.exists(tables::EXAM_REQUESTS, &requested).await? {
            return Err(MedicalRecordError::Validation(
                "No se puede eliminar el tipo de examen porque tiene solicitudes asociadas."
                    .to_string(),
            ));
        }
        self.db
            .delete(tables::EXAM_TYPES, &Query::new().eq("id", type_id))
            .await?;
        Ok(())
    }

    // ==========================================================================
    // SOLICITUDES
    // ==========================================================================

    pub async fn list_requests(
        &self,
        query: ExamRequestQuery,
        owner: Option<i64>,
    ) -> Result<Vec<ExamRequest>, MedicalRecordError> {
        let mut q = Query::new().select(WITH_TYPE);
        if let Some(paciente) = owner.or(query.paciente) {
            q = q.eq("paciente_id", paciente);
        }
        if let Some(consulta) = query.consulta {
            q = q.eq("consulta_id", consulta);
        }
        if let Some(estado) = query.estado {
            q = q.eq("estado", estado.as_str());
        }
        let q = q
            .order("fecha_solicitud", false)
            .paginate(query.limit, query.offset);

        Ok(self.db.select(tables::EXAM_REQUESTS, &q).await?)
    }

    pub async fn get_request(&self, request_id: i64) -> Result<ExamRequest, MedicalRecordError> {
        let q = Query::new().select(WITH_TYPE).eq("id", request_id);
        self.db
            .select_one(tables::EXAM_REQUESTS, &q)
            .await?
            .ok_or(MedicalRecordError::NotFound(REQUEST_NOT_FOUND))
    }

    /// Patient and doctor come from the consultation; urgency defaults to the exam type's.
    pub async fn request_exam(&self, request: CreateExamRequest) -> Result<ExamRequest, MedicalRecordError> {
        let q = Query::new()
            .select("id,medico_id,historia_clinica:core_historiaclinica(paciente_id)")
            .eq("id", request.consulta);
        let consultation: Value = self
            .db
            .select_one(tables::CONSULTATIONS, &q)
            .await?
            .ok_or(MedicalRecordError::NotFound("Consulta no encontrada"))?;
        let (Some(medico_id), Some(paciente_id)) = (
            consultation["medico_id"].as_i64(),
            consultation["historia_clinica"]["paciente_id"].as_i64(),
        ) else {
            return Err(MedicalRecordError::Database(
                "Consultation row without doctor or patient".to_string(),
            ));
        };

        let exam_type = self.get_type(request.tipo_examen).await?;
        if !exam_type.activo {
            return Err(MedicalRecordError::Validation(
                "El tipo de examen no está activo.".to_string(),
            ));
        }

        let mut created: ExamRequest = self
            .db
            .insert(
                tables::EXAM_REQUESTS,
                json!({
                    "consulta_id": request.consulta,
                    "paciente_id": paciente_id,
                    "medico_id": medico_id,
                    "tipo_examen_id": exam_type.id,
                    "urgencia": request.urgencia.unwrap_or(exam_type.urgencia_default),
                    "indicaciones_especificas": request.indicaciones_especificas,
                    "estado": ExamStatus::Solicitado,
                    "fecha_solicitud": Utc::now().to_rfc3339(),
                }),
            )
            .await?;

        info!(exam_request_id = created.id, paciente_id, "Exam requested");
        let notice = ExamNotice {
            examen_id: created.id,
            paciente_usuario_id: paciente_id,
            tipo_examen: exam_type.nombre.clone(),
        };
        self.notifications.create_and_send(notice.requested()).await;

        created.tipo_examen = Some(exam_type);
        Ok(created)
    }

    pub async fn record_result(
        &self,
        request_id: i64,
        result: ExamResultRequest,
    ) -> Result<ExamRequest, MedicalRecordError> {
        let current = self.get_request(request_id).await?;
        match current.estado {
            ExamStatus::Completado => return Err(MedicalRecordError::AlreadyCompleted),
            ExamStatus::Cancelado => return Err(MedicalRecordError::ExamCancelled),
            ExamStatus::Solicitado | ExamStatus::EnProceso => {}
        }
        let resultados = result
            .resultados
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| {
                MedicalRecordError::Validation("El campo resultados es obligatorio.".to_string())
            })?;

        let q = Query::new().eq("id", request_id);
        let rows: Vec<ExamRequest> = self
            .db
            .update(
                tables::EXAM_REQUESTS,
                &q,
                json!({
                    "estado": ExamStatus::Completado,
                    "resultados": resultados,
                    "observaciones": result.observaciones,
                    "fecha_resultado": Utc::now().to_rfc3339(),
                }),
            )
            .await?;
        let mut updated = rows
            .into_iter()
            .next()
            .ok_or(MedicalRecordError::NotFound(REQUEST_NOT_FOUND))?;

        let tipo_examen = current
            .tipo_examen
            .as_ref()
            .map(|t| t.nombre.clone())
            .unwrap_or_default();
        info!(exam_request_id = request_id, "Exam results recorded");
        let notice = ExamNotice {
            examen_id: request_id,
            paciente_usuario_id: updated.paciente_id,
            tipo_examen,
        };
        self.notifications.create_and_send(notice.result_ready()).await;

        updated.tipo_examen = current.tipo_examen;
        Ok(updated)
    }
}
