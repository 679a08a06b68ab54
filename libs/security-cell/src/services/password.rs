// =====================================================================================
// PASSWORD SECURITY SERVICE
// =====================================================================================

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use tracing::instrument;

use crate::models::SecurityError;

pub const MIN_PASSWORD_LENGTH: usize = 6;

pub struct PasswordSecurityService;

impl PasswordSecurityService {
    pub fn validate_length(password: &str) -> Result<(), SecurityError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(SecurityError::PasswordTooShort(MIN_PASSWORD_LENGTH));
        }
        Ok(())
    }

    #[instrument(skip(password))]
    pub fn hash_password(password: &str) -> Result<String, SecurityError> {
        Self::validate_length(password)?;

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| SecurityError::Hashing(e.to_string()))?;
        Ok(password_hash.to_string())
    }

    /// A malformed stored hash counts as a mismatch.
    #[instrument(skip(password, hash))]
    pub fn verify_password(password: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn hash_then_verify() {
        let hash = PasswordSecurityService::hash_password("paciente123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(PasswordSecurityService::verify_password("paciente123", &hash));
        assert!(!PasswordSecurityService::verify_password("paciente124", &hash));
    }

    #[test]
    fn short_password_is_rejected() {
        assert_matches!(
            PasswordSecurityService::hash_password("abc"),
            Err(SecurityError::PasswordTooShort(6))
        );
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!PasswordSecurityService::verify_password("whatever", "pbkdf2_sha256$1$x$y"));
    }
}
