use serde_json::json;
use tracing::{info, instrument};

use shared_config::AppConfig;
use shared_database::{tables, PostgrestClient, Query};

use crate::models::{DoctorError, DoctorSpecialty, Specialty, SpecialtyQuery, SpecialtyRequest};

const WITH_SPECIALTY: &str = "*,especialidad:core_especialidad(*)";

fn required(value: Option<String>, field: &str) -> Result<String, DoctorError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(DoctorError::Validation(format!(
            "El campo {} es obligatorio.",
            field
        ))),
    }
}

/// Specialty catalog and the doctor/specialty pairs that schedules hang from.
pub struct SpecialtyService {
    db: PostgrestClient,
}

impl SpecialtyService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    pub async fn list(&self, query: SpecialtyQuery) -> Result<Vec<Specialty>, DoctorError> {
        let mut q = Query::new();
        if let Some(nombre) = query.nombre.as_deref() {
            q = q.eq("nombre", nombre);
        }
        if let Some(search) = query.search.as_deref() {
            q = q.search(&["nombre"], search);
        }
        let q = q.order("id", false).paginate(query.limit, query.offset);

        Ok(self.db.select(tables::SPECIALTIES, &q).await?)
    }

    pub async fn get(&self, specialty_id: i64) -> Result<Specialty, DoctorError> {
        self.db
            .select_one(tables::SPECIALTIES, &Query::new().eq("id", specialty_id))
            .await?
            .ok_or(DoctorError::SpecialtyNotFound)
    }

    async fn ensure_unique(
        &self,
        codigo: Option<&str>,
        nombre: Option<&str>,
        except: Option<i64>,
    ) -> Result<(), DoctorError> {
        for (column, value) in [("codigo", codigo), ("nombre", nombre)] {
            let Some(value) = value else { continue };
            let mut q = Query::new().select("id").eq(column, value);
            if let Some(id) = except {
                q = q.neq("id", id);
            }
            if self.db.exists(tables::SPECIALTIES, &q).await? {
                return Err(DoctorError::DuplicateSpecialty);
            }
        }
        Ok(())
    }

    #[instrument(skip(self, request))]
    pub async fn create(&self, request: SpecialtyRequest) -> Result<Specialty, DoctorError> {
        let codigo = required(request.codigo, "codigo")?.to_uppercase();
        let nombre = required(request.nombre, "nombre")?;
        self.ensure_unique(Some(&codigo), Some(&nombre), None).await?;

        let specialty: Specialty = self
            .db
            .insert(
                tables::SPECIALTIES,
                json!({
                    "codigo": codigo,
                    "nombre": nombre,
                    "descripcion": request.descripcion,
                }),
            )
            .await?;
        info!(specialty_id = specialty.id, "Specialty created");
        Ok(specialty)
    }

    pub async fn update(
        &self,
        specialty_id: i64,
        mut request: SpecialtyRequest,
    ) -> Result<Specialty, DoctorError> {
        let current = self.get(specialty_id).await?;
        request.codigo = request.codigo.map(|c| c.trim().to_uppercase());
        self.ensure_unique(
            request.codigo.as_deref().filter(|c| *c != current.codigo),
            request.nombre.as_deref().filter(|n| *n != current.nombre),
            Some(specialty_id),
        )
        .await?;

        let body = serde_json::to_value(&request)
            .map_err(|e| DoctorError::Validation(e.to_string()))?;
        if body.as_object().map_or(true, |o| o.is_empty()) {
            return Ok(current);
        }

        let q = Query::new().eq("id", specialty_id);
        let rows: Vec<Specialty> = self.db.update(tables::SPECIALTIES, &q, body).await?;
        rows.into_iter().next().ok_or(DoctorError::SpecialtyNotFound)
    }

    /// Refused while any doctor still holds the specialty.
    #[instrument(skip(self))]
    pub async fn delete(&self, specialty_id: i64) -> Result<(), DoctorError> {
        self.get(specialty_id).await?;
        let assigned = Query::new().select("id").eq("especialidad_id", specialty_id);
        if self.db.exists(tables::DOCTOR_SPECIALTIES, &assigned).await? {
            return Err(DoctorError::SpecialtyInUse);
        }
        self.db
            .delete(tables::SPECIALTIES, &Query::new().eq("id", specialty_id))
            .await?;
        info!(specialty_id, "Specialty deleted");
        Ok(())
    }

    // ==========================================================================
    // MEDICO-ESPECIALIDAD
    // ==========================================================================

    pub async fn assignments_for(&self, doctor_id: i64) -> Result<Vec<DoctorSpecialty>, DoctorError> {
        let q = Query::new()
            .select(WITH_SPECIALTY)
            .eq("medico_id", doctor_id)
            .order("id", true);
        Ok(self.db.select(tables::DOCTOR_SPECIALTIES, &q).await?)
    }

    pub async fn get_assignment(&self, assignment_id: i64) -> Result<DoctorSpecialty, DoctorError> {
        let q = Query::new().select(WITH_SPECIALTY).eq("id", assignment_id);
        self.db
            .select_one(tables::DOCTOR_SPECIALTIES, &q)
            .await?
            .ok_or(DoctorError::AssignmentNotFound)
    }

    #[instrument(skip(self))]
    pub async fn assign(
        &self,
        doctor_id: i64,
        specialty_id: i64,
    ) -> Result<DoctorSpecialty, DoctorError> {
        let doctor = Query::new().select("usuario_id").eq("usuario_id", doctor_id);
        if !self.db.exists(tables::DOCTORS, &doctor).await? {
            return Err(DoctorError::NotFound);
        }
        let specialty = self.get(specialty_id).await?;

        let pair = Query::new()
            .select("id")
            .eq("medico_id", doctor_id)
            .eq("especialidad_id", specialty_id);
        if self.db.exists(tables::DOCTOR_SPECIALTIES, &pair).await? {
            return Err(DoctorError::DuplicateAssignment);
        }

        let mut assignment: DoctorSpecialty = self
            .db
            .insert(
                tables::DOCTOR_SPECIALTIES,
                json!({"medico_id": doctor_id, "especialidad_id": specialty_id}),
            )
            .await?;
        assignment.especialidad = Some(specialty);
        info!(assignment_id = assignment.id, "Specialty assigned to doctor");
        Ok(assignment)
    }

    pub async fn unassign(&self, assignment_id: i64) -> Result<(), DoctorError> {
        self.get_assignment(assignment_id).await?;
        self.db
            .delete(tables::DOCTOR_SPECIALTIES, &Query::new().eq("id", assignment_id))
            .await?;
        Ok(())
    }
}
