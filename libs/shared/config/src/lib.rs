use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,

    // Data API (PostgREST in front of PostgreSQL)
    pub postgrest_url: String,
    pub postgrest_service_key: String,

    // Token issuing
    pub jwt_secret: String,
    pub jwt_access_ttl_minutes: i64,
    pub jwt_refresh_ttl_hours: i64,

    // Direct database access for pg_dump / psql
    pub db_host: String,
    pub db_port: String,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    pub pg_bin_dir: Option<String>,
    pub backup_dir: String,
    pub backup_retention_days: i64,
    pub backup_interval_hours: u64,
    pub backup_timeout_secs: u64,

    // Push notifications (FCM HTTP v1)
    pub fcm_project_id: String,
    pub fcm_service_account_path: String,
    /// Contents of the service-account key, read once at startup.
    pub fcm_service_account_json: Option<String>,

    // Email
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub smtp_from: String,
}

fn string_var(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| {
        if default.is_empty() {
            warn!("{} not set, using empty value", name);
        } else {
            warn!("{} not set, using default", name);
        }
        default.to_string()
    })
}

fn read_key_file(path: &str) -> Option<String> {
    if path.is_empty() {
        return None;
    }
    match std::fs::read_to_string(path) {
        Ok(raw) => Some(raw),
        Err(e) => {
            warn!("FCM service account not readable at {}: {}", path, e);
            None
        }
    }
}

fn parsed_var<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value ({}), using default", name, raw);
            default
        }),
        Err(_) => default,
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let fcm_service_account_path =
            string_var("FCM_SERVICE_ACCOUNT_PATH", "firebase/service-account-key.json");
        let fcm_project_id = string_var("FCM_PROJECT_ID", "");
        let fcm_service_account_json = if fcm_project_id.is_empty() {
            None
        } else {
            read_key_file(&fcm_service_account_path)
        };

        let config = Self {
            server_port: parsed_var("SERVER_PORT", 3000),
            postgrest_url: string_var("POSTGREST_URL", ""),
            postgrest_service_key: string_var("POSTGREST_SERVICE_KEY", ""),
            jwt_secret: string_var("JWT_SECRET", ""),
            jwt_access_ttl_minutes: parsed_var("JWT_ACCESS_TTL_MINUTES", 60),
            jwt_refresh_ttl_hours: parsed_var("JWT_REFRESH_TTL_HOURS", 24),
            db_host: string_var("DB_HOST", "localhost"),
            db_port: string_var("DB_PORT", "5432"),
            db_user: string_var("DB_USER", ""),
            db_password: string_var("DB_PASSWORD", ""),
            db_name: string_var("DB_NAME", ""),
            pg_bin_dir: env::var("PG_BIN_DIR").ok(),
            backup_dir: string_var("BACKUP_DIR", "backups"),
            backup_retention_days: parsed_var("BACKUP_RETENTION_DAYS", 7),
            backup_interval_hours: parsed_var("BACKUP_INTERVAL_HOURS", 24),
            backup_timeout_secs: parsed_var("BACKUP_TIMEOUT_SECS", 300),
            fcm_project_id,
            fcm_service_account_path,
            fcm_service_account_json,
            smtp_host: string_var("SMTP_HOST", "smtp.gmail.com"),
            smtp_port: parsed_var("SMTP_PORT", 587),
            smtp_username: string_var("SMTP_USERNAME", ""),
            smtp_password: string_var("SMTP_PASSWORD", ""),
            smtp_from: string_var("SMTP_FROM", ""),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.postgrest_url.is_empty()
            && !self.postgrest_service_key.is_empty()
            && !self.jwt_secret.is_empty()
    }

    pub fn is_push_configured(&self) -> bool {
        !self.fcm_project_id.is_empty() && self.fcm_service_account_json.is_some()
    }

    pub fn is_email_configured(&self) -> bool {
        !self.smtp_host.is_empty() && !self.smtp_username.is_empty() && !self.smtp_from.is_empty()
    }

    pub fn is_backup_configured(&self) -> bool {
        !self.db_user.is_empty() && !self.db_name.is_empty()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 3000,
            postgrest_url: String::new(),
            postgrest_service_key: String::new(),
            jwt_secret: String::new(),
            jwt_access_ttl_minutes: 60,
            jwt_refresh_ttl_hours: 24,
            db_host: "localhost".to_string(),
            db_port: "5432".to_string(),
            db_user: String::new(),
            db_password: String::new(),
            db_name: String::new(),
            pg_bin_dir: None,
            backup_dir: "backups".to_string(),
            backup_retention_days: 7,
            backup_interval_hours: 24,
            backup_timeout_secs: 300,
            fcm_project_id: String::new(),
            fcm_service_account_path: String::new(),
            fcm_service_account_json: None,
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            smtp_from: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_not_configured() {
        let config = AppConfig::default();
        assert!(!config.is_configured());
        assert!(!config.is_push_configured());
        assert!(!config.is_email_configured());
        assert_eq!(config.backup_retention_days, 7);
        assert_eq!(config.backup_timeout_secs, 300);
    }

    #[test]
    fn missing_key_file_disables_push() {
        assert!(read_key_file("").is_none());
        assert!(read_key_file("/nonexistent/service-account-key.json").is_none());
    }

    #[test]
    fn configured_when_data_api_and_secret_present() {
        let config = AppConfig {
            postgrest_url: "http://localhost:3001".to_string(),
            postgrest_service_key: "service".to_string(),
            jwt_secret: "secret".to_string(),
            ..AppConfig::default()
        };
        assert!(config.is_configured());
    }
}
