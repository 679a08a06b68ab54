use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use security_cell::{modules, AuditService, NewAuditEntry};
use shared_config::AppConfig;
use shared_database::{tables, PostgrestClient, Query};
use shared_models::auth::ROLE_DOCTOR;
use user_cell::models::{CreateUserRequest, USER_SELECT};
use user_cell::UserService;

use crate::models::{
    CreateDoctorRequest, Doctor, DoctorError, DoctorQuery, UpdateDoctorRequest, DOCTOR_STATES,
};
use crate::services::specialty::SpecialtyService;

const SEARCH_FIELDS: [&str; 3] = ["nombre", "apellido", "email"];

fn doctor_select() -> String {
    format!(
        "*,usuario:core_usuario!inner({}),especialidades:medico_especialidad(*,especialidad:core_especialidad(*))",
        USER_SELECT
    )
}

fn validate_state(estado: Option<&str>) -> Result<(), DoctorError> {
    match estado {
        Some(e) if !DOCTOR_STATES.contains(&e) => Err(DoctorError::Validation(format!(
            "\"{}\" no es una elección válida para estado.",
            e
        ))),
        _ => Ok(()),
    }
}

pub struct DoctorService {
    db: PostgrestClient,
    users: UserService,
    specialties: SpecialtyService,
    audit: AuditService,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
            users: UserService::new(config),
            specialties: SpecialtyService::new(config),
            audit: AuditService::new(config),
        }
    }

    pub async fn list_doctors(&self, query: DoctorQuery) -> Result<Vec<Doctor>, DoctorError> {
        validate_state(query.estado.as_deref())?;

        let mut q = Query::new().select(&doctor_select());
        if let Some(estado) = query.estado.as_deref() {
            q = q.eq("estado", estado);
        }
        if let Some(specialty_id) = query.especialidad {
            let holders = Query::new()
                .select("medico_id")
                .eq("especialidad_id", specialty_id);
            let rows: Vec<Value> = self.db.select(tables::DOCTOR_SPECIALTIES, &holders).await?;
            let ids: Vec<i64> = rows.iter().filter_map(|r| r["medico_id"].as_i64()).collect();
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            q = q.is_in("usuario_id", &ids);
        }
        if let Some(search) = query.search.as_deref() {
            q = q.search_in("usuario", &SEARCH_FIELDS, search);
        }
        let q = q
            .order("usuario_id", false)
            .paginate(query.limit, query.offset);

        Ok(self.db.select(tables::DOCTORS, &q).await?)
    }

    pub async fn get_doctor(&self, doctor_id: i64) -> Result<Doctor, DoctorError> {
        let q = Query::new()
            .select(&doctor_select())
            .eq("usuario_id", doctor_id);
        self.db
            .select_one(tables::DOCTORS, &q)
            .await?
            .ok_or(DoctorError::NotFound)
    }

    /// Creates the account with the doctor role, the profile and the requested
    /// specialty assignments. The account is removed again when the profile
    /// cannot be stored.
    #[instrument(skip(self, request, client_ip), fields(email = ?request.email))]
    pub async fn create_doctor(
        &self,
        request: CreateDoctorRequest,
        actor_id: i64,
        client_ip: &str,
    ) -> Result<Doctor, DoctorError> {
        let licencia = request
            .numero_licencia
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| {
                DoctorError::Validation("El campo numero_licencia es obligatorio.".to_string())
            })?
            .to_string();
        validate_state(request.estado.as_deref())?;

        let taken = Query::new()
            .select("usuario_id")
            .eq("numero_licencia", &licencia);
        if self.db.exists(tables::DOCTORS, &taken).await? {
            return Err(DoctorError::DuplicateLicense);
        }
        for specialty_id in &request.especialidades {
            self.specialties.get(*specialty_id).await?;
        }

        let role = self.users.find_role_by_name(ROLE_DOCTOR).await?;
        let account = self
            .users
            .create_user(CreateUserRequest {
                email: request.email,
                password: request.password,
                nombre: request.nombre,
                apellido: request.apellido,
                telefono: request.telefono,
                direccion: request.direccion,
                fecha_nacimiento: request.fecha_nacimiento,
                genero: request.genero,
                activo: Some(true),
                id_rol: Some(role.id),
            })
            .await?;

        let profile = json!({
            "usuario_id": account.id,
            "numero_licencia": licencia,
            "firma_digital": request.firma_digital,
            "estado": request.estado.as_deref().unwrap_or("Activo"),
        });
        if let Err(e) = self.db.insert::<Value>(tables::DOCTORS, profile).await {
            warn!(user_id = account.id, "Doctor profile failed, removing account: {}", e);
            if let Err(cleanup) = self.users.delete_user(account.id).await {
                warn!("Could not remove orphaned account {}: {}", account.id, cleanup);
            }
            return Err(e.into());
        }

        for specialty_id in request.especialidades {
            self.specialties.assign(account.id, specialty_id).await?;
        }
        info!(user_id = account.id, "Doctor registered");

        self.audit
            .record(
                NewAuditEntry::new("Registro de médico", modules::DOCTORS)
                    .with_user(actor_id)
                    .with_ip(client_ip)
                    .with_details(format!("Médico {} ({})", account.full_name(), licencia)),
            )
            .await;

        self.get_doctor(account.id).await
    }

    pub async fn update_doctor(
        &self,
        doctor_id: i64,
        request: UpdateDoctorRequest,
    ) -> Result<Doctor, DoctorError> {
        validate_state(request.estado.as_deref())?;
        let body = serde_json::to_value(&request)
            .map_err(|e| DoctorError::Validation(e.to_string()))?;
        if body.as_object().map_or(true, |o| o.is_empty()) {
            return self.get_doctor(doctor_id).await;
        }

        let q = Query::new().eq("usuario_id", doctor_id);
        let rows: Vec<Value> = self.db.update(tables::DOCTORS, &q, body).await?;
        if rows.is_empty() {
            return Err(DoctorError::NotFound);
        }
        if let Some(estado) = request.estado.as_deref() {
            info!(doctor_id, estado, "Doctor state changed");
        }
        self.get_doctor(doctor_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn vacation_is_a_valid_state() {
        assert!(validate_state(Some("Vacaciones")).is_ok());
        assert_matches!(
            validate_state(Some("Jubilado")),
            Err(DoctorError::Validation(_))
        );
    }

    #[test]
    fn doctor_rows_embed_account_and_specialties() {
        let select = doctor_select();
        assert!(select.contains("usuario:core_usuario!inner("));
        assert!(select.ends_with("especialidades:medico_especialidad(*,especialidad:core_especialidad(*))"));
    }
}
