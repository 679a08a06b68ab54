use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "Administrador";
pub const ROLE_DOCTOR: &str = "Medico";
pub const ROLE_PATIENT: &str = "Paciente";

/// Grants every permission check.
pub const PERMISSION_ADMIN_FULL: &str = "admin_full";

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub iat: Option<u64>,
    pub jti: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub token_type: Option<TokenType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: Option<String>,
    pub role: Option<String>,
    pub permissions: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ROLE_ADMIN)
            || self.permissions.iter().any(|p| p == PERMISSION_ADMIN_FULL)
    }

    pub fn is_doctor(&self) -> bool {
        self.role.as_deref() == Some(ROLE_DOCTOR)
    }

    pub fn is_patient(&self) -> bool {
        self.role.as_deref() == Some(ROLE_PATIENT)
    }

    pub fn has_permission(&self, code: &str) -> bool {
        self.is_admin() || self.permissions.iter().any(|p| p == code)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str, permissions: &[&str]) -> User {
        User {
            id: 1,
            email: None,
            role: Some(role.to_string()),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            created_at: None,
        }
    }

    #[test]
    fn admin_role_has_every_permission() {
        let admin = user(ROLE_ADMIN, &[]);
        assert!(admin.is_admin());
        assert!(admin.has_permission("crear_usuarios"));
    }

    #[test]
    fn admin_full_permission_acts_as_admin() {
        let doctor = user(ROLE_DOCTOR, &[PERMISSION_ADMIN_FULL]);
        assert!(doctor.is_admin());
        assert!(doctor.is_doctor());
    }

    #[test]
    fn named_permission_is_checked() {
        let patient = user(ROLE_PATIENT, &["ver_usuarios"]);
        assert!(patient.has_permission("ver_usuarios"));
        assert!(!patient.has_permission("crear_usuarios"));
        assert!(!patient.is_admin());
    }
}
