use tracing::{instrument, warn};

use security_cell::{modules, AuditService, NewAuditEntry, PasswordSecurityService};
use shared_config::AppConfig;
use shared_models::auth::TokenPair;
use user_cell::UserService;

use crate::models::{AuthError, LoginRequest};
use crate::services::token::{TokenService, TokenSubject};

pub struct LoginService {
    users: UserService,
    tokens: TokenService,
    audit: AuditService,
}

impl LoginService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            users: UserService::new(config),
            tokens: TokenService::new(config),
            audit: AuditService::new(config),
        }
    }

    /// Email/password login. Unknown email, wrong password and inactive accounts
    /// all fail the same way.
    #[instrument(skip(self, request, client_ip), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest, client_ip: &str) -> Result<TokenPair, AuthError> {
        let Some(account) = self.users.find_by_email(&request.email).await? else {
            warn!("Login attempt for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !PasswordSecurityService::verify_password(&request.password, &account.password) {
            warn!(user_id = account.id, "Login attempt with wrong password");
            return Err(AuthError::InvalidCredentials);
        }
        if !account.activo {
            warn!(user_id = account.id, "Login attempt on inactive account");
            return Err(AuthError::InvalidCredentials);
        }

        let permissions = self.users.permission_codes(account.id_rol_id).await?;
        let pair = self
            .tokens
            .issue_pair(&TokenSubject::from_account(&account, permissions))?;

        self.audit
            .record(
                NewAuditEntry::new("Inicio de sesión exitoso", modules::AUTH)
                    .with_user(account.id)
                    .with_ip(client_ip),
            )
            .await;

        Ok(pair)
    }
}
