use shared_models::auth::User;
use shared_models::error::AppError;

pub fn require_admin(user: &User) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only administrators can perform this action".to_string(),
        ))
    }
}

pub fn require_permission(user: &User, code: &str) -> Result<(), AppError> {
    if user.has_permission(code) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("Missing permission: {}", code)))
    }
}

/// Clinical staff: doctors and administrators.
pub fn require_staff(user: &User) -> Result<(), AppError> {
    if user.is_doctor() || user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only medical staff can perform this action".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn user(role: &str) -> User {
        User {
            id: 7,
            email: None,
            role: Some(role.to_string()),
            permissions: vec![],
            created_at: None,
        }
    }

    #[test]
    fn patients_are_not_staff() {
        assert_matches!(require_staff(&user("Paciente")), Err(AppError::Forbidden(_)));
        assert!(require_staff(&user("Medico")).is_ok());
    }

    #[test]
    fn permission_error_names_the_code() {
        assert_matches!(
            require_permission(&user("Medico"), "crear_usuarios"),
            Err(AppError::Forbidden(msg)) if msg.contains("crear_usuarios")
        );
    }
}
