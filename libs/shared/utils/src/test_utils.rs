use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{JwtClaims, TokenType, User, ROLE_ADMIN, ROLE_DOCTOR, ROLE_PATIENT};

use crate::jwt::encode_token;

static NEXT_TEST_ID: AtomicI64 = AtomicI64::new(1000);

fn next_id() -> i64 {
    NEXT_TEST_ID.fetch_add(1, Ordering::Relaxed)
}

pub struct TestConfig {
    pub jwt_secret: String,
    pub postgrest_url: String,
    pub postgrest_service_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            postgrest_url: "http://localhost:3001".to_string(),
            postgrest_service_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_postgrest(url: &str) -> Self {
        Self {
            postgrest_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            postgrest_url: self.postgrest_url.clone(),
            postgrest_service_key: self.postgrest_service_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub role: String,
    pub permissions: Vec<String>,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", ROLE_PATIENT)
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: next_id(),
            email: email.to_string(),
            role: role.to_string(),
            permissions: Vec::new(),
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, ROLE_DOCTOR)
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, ROLE_PATIENT)
    }

    pub fn admin(email: &str) -> Self {
        let mut user = Self::new(email, ROLE_ADMIN);
        user.permissions.push("admin_full".to_string());
        user
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub fn with_permission(mut self, code: &str) -> Self {
        self.permissions.push(code.to_string());
        self
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            permissions: self.permissions.clone(),
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    fn claims(user: &TestUser, exp_hours: i64, token_type: TokenType) -> JwtClaims {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours);
        JwtClaims {
            sub: user.id.to_string(),
            exp: Some(exp.timestamp().max(0) as u64),
            iat: Some(now.timestamp() as u64),
            jti: Some(Uuid::new_v4().to_string()),
            email: Some(user.email.clone()),
            role: Some(user.role.clone()),
            permissions: user.permissions.clone(),
            token_type: Some(token_type),
        }
    }

    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let claims = Self::claims(user, exp_hours.unwrap_or(24), TokenType::Access);
        encode_token(&claims, secret).expect("test token must encode")
    }

    pub fn create_refresh_token(user: &TestUser, secret: &str) -> String {
        let claims = Self::claims(user, 24, TokenType::Refresh);
        encode_token(&claims, secret).expect("test token must encode")
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Canned PostgREST rows in the shape of the clinic schema.
pub struct MockPostgrestResponses;

impl MockPostgrestResponses {
    pub fn role_row(id: i64, nombre_rol: &str) -> Value {
        json!({
            "id": id,
            "nombre_rol": nombre_rol,
            "descripcion": null
        })
    }

    pub fn user_row(id: i64, email: &str, role_id: i64, role_name: &str) -> Value {
        json!({
            "id": id,
            "email": email,
            "password": "",
            "nombre": "Ana",
            "apellido": "Pérez",
            "telefono": "600111222",
            "direccion": null,
            "fecha_nacimiento": "1990-01-01",
            "genero": "F",
            "activo": true,
            "id_rol_id": role_id,
            "rol": Self::role_row(role_id, role_name),
            "medico": null,
            "paciente": null,
            "administrador": null
        })
    }

    pub fn specialty_row(id: i64, codigo: &str, nombre: &str) -> Value {
        json!({
            "id": id,
            "codigo": codigo,
            "nombre": nombre,
            "descripcion": null
        })
    }

    pub fn doctor_specialty_row(id: i64, medico_id: i64, especialidad_id: i64) -> Value {
        json!({
            "id": id,
            "medico_id": medico_id,
            "especialidad_id": especialidad_id
        })
    }

    pub fn doctor_row(user_id: i64, estado: &str) -> Value {
        json!({
            "usuario_id": user_id,
            "numero_licencia": format!("M-{}", user_id),
            "firma_digital": null,
            "estado": estado
        })
    }

    pub fn patient_row(user_id: i64) -> Value {
        json!({
            "usuario_id": user_id,
            "tipo_sangre": "O+",
            "alergias": "Penicilina",
            "enfermedades_cronicas": null,
            "medicamentos_actuales": null,
            "contacto_emergencia_nombre": "Luis",
            "contacto_emergencia_telefono": "600000000",
            "contacto_emergencia_parentesco": "Padre",
            "estado": "Activo"
        })
    }

    pub fn schedule_row(id: i64, medico_especialidad_id: i64, dia: &str, inicio: &str, fin: &str) -> Value {
        json!({
            "id": id,
            "medico_especialidad_id": medico_especialidad_id,
            "dia_semana": dia,
            "hora_inicio": inicio,
            "hora_fin": fin,
            "activo": true
        })
    }

    pub fn appointment_row(id: i64, paciente_id: i64, medico_especialidad_id: i64, fecha: &str, hora: &str, estado: &str) -> Value {
        json!({
            "id": id,
            "paciente_id": paciente_id,
            "medico_especialidad_id": medico_especialidad_id,
            "fecha_cita": fecha,
            "hora_cita": hora,
            "estado": estado,
            "motivo": "Consulta general",
            "notas": null,
            "fecha_creacion": "2024-01-01T00:00:00Z"
        })
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "message": message,
            "code": code
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::validate_token;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.postgrest_url, "http://localhost:3001");
        assert_eq!(app_config.postgrest_service_key, "test-service-key");
        assert!(!app_config.jwt_secret.is_empty());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::doctor("doc@example.com");
        assert_eq!(user.email, "doc@example.com");
        assert_eq!(user.role, ROLE_DOCTOR);

        let user_model = user.to_user();
        assert_eq!(user_model.email, Some(user.email.clone()));
        assert_eq!(user_model.id, user.id);
    }

    #[test]
    fn test_jwt_token_round_trips_through_validator() {
        let user = TestUser::admin("admin1@salud.com");
        let secret = "test-secret";
        let token = JwtTestUtils::create_test_token(&user, secret, Some(1));

        let validated = validate_token(&token, secret).unwrap();
        assert_eq!(validated.id, user.id);
        assert!(validated.is_admin());
    }
}
