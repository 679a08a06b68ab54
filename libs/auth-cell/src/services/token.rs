use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{tables, PostgrestClient, Query};
use shared_models::auth::{JwtClaims, TokenPair, TokenType};
use shared_utils::jwt::{decode_token, encode_token};
use user_cell::UserAccount;

use crate::models::AuthError;

pub struct TokenService {
    db: PostgrestClient,
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

/// Identity carried by both tokens of a pair.
#[derive(Debug, Clone)]
pub struct TokenSubject {
    pub user_id: i64,
    pub email: String,
    pub role: Option<String>,
    pub permissions: Vec<String>,
}

impl TokenSubject {
    pub fn from_account(account: &UserAccount, permissions: Vec<String>) -> Self {
        Self {
            user_id: account.id,
            email: account.email.clone(),
            role: account.role_name().map(str::to_string),
            permissions,
        }
    }
}

pub fn build_claims(
    subject: &TokenSubject,
    token_type: TokenType,
    ttl: Duration,
    now: DateTime<Utc>,
) -> JwtClaims {
    JwtClaims {
        sub: subject.user_id.to_string(),
        exp: Some((now + ttl).timestamp().max(0) as u64),
        iat: Some(now.timestamp().max(0) as u64),
        jti: Some(Uuid::new_v4().simple().to_string()),
        email: Some(subject.email.clone()),
        role: subject.role.clone(),
        permissions: subject.permissions.clone(),
        token_type: Some(token_type),
    }
}

fn subject_from_claims(claims: &JwtClaims) -> Result<TokenSubject, AuthError> {
    let user_id = claims
        .sub
        .parse()
        .map_err(|_| AuthError::InvalidToken("Invalid subject".to_string()))?;
    Ok(TokenSubject {
        user_id,
        email: claims.email.clone().unwrap_or_default(),
        role: claims.role.clone(),
        permissions: claims.permissions.clone(),
    })
}

impl TokenService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
            secret: config.jwt_secret.clone(),
            access_ttl: Duration::minutes(config.jwt_access_ttl_minutes),
            refresh_ttl: Duration::hours(config.jwt_refresh_ttl_hours),
        }
    }

    fn sign(&self, claims: &JwtClaims) -> Result<String, AuthError> {
        encode_token(claims, &self.secret).map_err(AuthError::Issuing)
    }

    pub fn issue_pair(&self, subject: &TokenSubject) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let access = build_claims(subject, TokenType::Access, self.access_ttl, now);
        let refresh = build_claims(subject, TokenType::Refresh, self.refresh_ttl, now);

        Ok(TokenPair {
            access: self.sign(&access)?,
            refresh: self.sign(&refresh)?,
        })
    }

    /// Verifies a refresh token: signature, expiry, type and blacklist.
    async fn verified_refresh_claims(&self, refresh_token: &str) -> Result<JwtClaims, AuthError> {
        let claims = decode_token(refresh_token, &self.secret).map_err(AuthError::InvalidToken)?;
        if claims.token_type != Some(TokenType::Refresh) {
            return Err(AuthError::InvalidToken("Token has wrong type".to_string()));
        }
        let jti = claims
            .jti
            .as_deref()
            .ok_or_else(|| AuthError::InvalidToken("Token has no id".to_string()))?;

        let q = Query::new().select("jti").eq("jti", jti);
        if self.db.exists(tables::TOKEN_BLACKLIST, &q).await? {
            debug!(jti, "Refresh token is blacklisted");
            return Err(AuthError::Blacklisted);
        }
        Ok(claims)
    }

    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self.verified_refresh_claims(refresh_token).await?;
        let subject = subject_from_claims(&claims)?;

        let access = build_claims(&subject, TokenType::Access, self.access_ttl, Utc::now());
        self.sign(&access)
    }

    #[instrument(skip_all)]
    pub async fn blacklist(&self, refresh_token: &str) -> Result<(), AuthError> {
        let claims = self.verified_refresh_claims(refresh_token).await?;
        let subject = subject_from_claims(&claims)?;
        let expires_at = claims
            .exp
            .and_then(|exp| Utc.timestamp_opt(exp as i64, 0).single());

        let _: Value = self
            .db
            .insert(
                tables::TOKEN_BLACKLIST,
                json!({
                    "jti": claims.jti,
                    "usuario_id": subject.user_id,
                    "expires_at": expires_at,
                }),
            )
            .await?;

        info!(user_id = subject.user_id, "Refresh token blacklisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_utils::jwt::validate_token;

    fn subject() -> TokenSubject {
        TokenSubject {
            user_id: 42,
            email: "medico1@salud.com".to_string(),
            role: Some("Medico".to_string()),
            permissions: vec!["ver_usuarios".to_string()],
        }
    }

    fn service() -> TokenService {
        TokenService::new(&AppConfig {
            jwt_secret: "unit-test-secret".to_string(),
            ..AppConfig::default()
        })
    }

    #[test]
    fn claims_carry_identity_and_lifetime() {
        let now = Utc::now();
        let claims = build_claims(&subject(), TokenType::Refresh, Duration::hours(24), now);

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.token_type, Some(TokenType::Refresh));
        assert_eq!(claims.exp.unwrap() - claims.iat.unwrap(), 24 * 3600);
        assert_eq!(claims.permissions, vec!["ver_usuarios"]);
    }

    #[test]
    fn issued_access_token_validates_and_refresh_does_not() {
        let pair = service().issue_pair(&subject()).unwrap();

        let user = validate_token(&pair.access, "unit-test-secret").unwrap();
        assert_eq!(user.id, 42);
        assert!(user.is_doctor());
        assert!(validate_token(&pair.refresh, "unit-test-secret").is_err());
    }

    #[test]
    fn pair_tokens_have_distinct_ids() {
        let now = Utc::now();
        let a = build_claims(&subject(), TokenType::Access, Duration::minutes(5), now);
        let b = build_claims(&subject(), TokenType::Refresh, Duration::minutes(5), now);
        assert_ne!(a.jti, b.jti);
    }
}
