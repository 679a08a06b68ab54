use serde_json::json;
use tracing::{info, instrument, warn};

use medical_record_cell::ClinicalHistoryService;
use security_cell::{modules, AuditService, NewAuditEntry};
use shared_config::AppConfig;
use shared_database::{tables, PostgrestClient, Query};
use shared_models::auth::ROLE_PATIENT;
use user_cell::models::{CreateUserRequest, USER_SELECT};
use user_cell::UserService;

use crate::models::{
    Patient, PatientError, PatientRegistrationRequest, PatientSearchQuery, UpdatePatientRequest,
    PATIENT_STATES,
};

const SEARCH_FIELDS: [&str; 4] = ["nombre", "apellido", "email", "telefono"];

fn patient_select() -> String {
    format!("*,usuario:core_usuario!inner({})", USER_SELECT)
}

fn validate_state(estado: Option<&str>) -> Result<(), PatientError> {
    match estado {
        Some(e) if !PATIENT_STATES.contains(&e) => Err(PatientError::Validation(format!(
            "\"{}\" no es una elección válida para estado.",
            e
        ))),
        _ => Ok(()),
    }
}

pub struct PatientService {
    db: PostgrestClient,
    users: UserService,
    histories: ClinicalHistoryService,
    audit: AuditService,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
            users: UserService::new(config),
            histories: ClinicalHistoryService::new(config),
            audit: AuditService::new(config),
        }
    }

    pub async fn list_patients(&self, query: PatientSearchQuery) -> Result<Vec<Patient>, PatientError> {
        validate_state(query.estado.as_deref())?;

        let mut q = Query::new().select(&patient_select());
        if let Some(estado) = query.estado.as_deref() {
            q = q.eq("estado", estado);
        }
        if let Some(search) = query.search.as_deref() {
            q = q.search_in("usuario", &SEARCH_FIELDS, search);
        }
        let q = q
            .order("usuario_id", true)
            .paginate(query.limit, query.offset);

        Ok(self.db.select(tables::PATIENTS, &q).await?)
    }

    pub async fn get_patient(&self, patient_id: i64) -> Result<Patient, PatientError> {
        let q = Query::new()
            .select(&patient_select())
            .eq("usuario_id", patient_id);
        self.db
            .select_one(tables::PATIENTS, &q)
            .await?
            .ok_or(PatientError::NotFound)
    }

    /// Creates the account, the patient profile and the active clinical history.
    /// The account is removed again when the profile cannot be stored.
    #[instrument(skip(self, request, client_ip), fields(email = ?request.email))]
    pub async fn register(
        &self,
        request: PatientRegistrationRequest,
        client_ip: &str,
    ) -> Result<Patient, PatientError> {
        let role = self.users.find_role_by_name(ROLE_PATIENT).await?;

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
            "tipo_sangre": request.tipo_sangre,
            "alergias": request.alergias,
            "enfermedades_cronicas": request.enfermedades_cronicas,
            "medicamentos_actuales": request.medicamentos_actuales,
            "contacto_emergencia_nombre": request.contacto_emergencia_nombre,
            "contacto_emergencia_telefono": request.contacto_emergencia_telefono,
            "contacto_emergencia_parentesco": request.contacto_emergencia_parentesco,
            "estado": "Activo",
        });
        if let Err(e) = self.db.insert::<serde_json::Value>(tables::PATIENTS, profile).await {
            warn!(user_id = account.id, "Patient profile failed, removing account: {}", e);
            if let Err(cleanup) = self.users.delete_user(account.id).await {
                warn!("Could not remove orphaned account {}: {}", account.id, cleanup);
            }
            return Err(e.into());
        }

        let history = self.histories.open_for_patient(account.id, None).await?;
        info!(
            user_id = account.id,
            history_id = history.id,
            "Patient registered"
        );

        self.audit
            .record(
                NewAuditEntry::new("Registro de paciente", modules::PATIENTS)
                    .with_user(account.id)
                    .with_ip(client_ip),
            )
            .await;

        self.get_patient(account.id).await
    }

    pub async fn update_patient(
        &self,
        patient_id: i64,
        request: UpdatePatientRequest,
    ) -> Result<Patient, PatientError> {
        validate_state(request.estado.as_deref())?;
        let body = serde_json::to_value(&request)
            .map_err(|e| PatientError::Validation(e.to_string()))?;
        if body.as_object().map_or(true, |o| o.is_empty()) {
            return self.get_patient(patient_id).await;
        }

        let q = Query::new().eq("usuario_id", patient_id);
        let rows: Vec<serde_json::Value> = self.db.update(tables::PATIENTS, &q, body).await?;
        if rows.is_empty() {
            return Err(PatientError::NotFound);
        }
        self.get_patient(patient_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn only_known_states_are_accepted() {
        assert!(validate_state(Some("Activo")).is_ok());
        assert!(validate_state(None).is_ok());
        assert_matches!(
            validate_state(Some("Suspendido")),
            Err(PatientError::Validation(msg)) if msg.contains("Suspendido")
        );
    }

    #[test]
    fn patient_rows_embed_the_account() {
        let select = patient_select();
        assert!(select.starts_with("*,usuario:core_usuario!inner(*,rol:core_rol(*)"));
    }
}
