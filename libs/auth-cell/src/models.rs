use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::error::AppError;
use user_cell::UserError;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessResponse {
    pub access: String,
}

/// Row of `token_blacklist`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistedToken {
    pub jti: String,
    pub usuario_id: Option<i64>,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No se encontró una cuenta activa con las credenciales proporcionadas")]
    InvalidCredentials,

    #[error("Token inválido o expirado: {0}")]
    InvalidToken(String),

    #[error("El token ha sido revocado")]
    Blacklisted,

    #[error("Token issuing failed: {0}")]
    Issuing(String),

    #[error(transparent)]
    User(#[from] UserError),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Database(err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::InvalidToken(_)
            | AuthError::Blacklisted => AppError::Auth(err.to_string()),
            AuthError::Issuing(msg) => AppError::Internal(msg),
            AuthError::User(inner) => inner.into(),
            AuthError::Database(msg) => AppError::Database(msg),
        }
    }
}
