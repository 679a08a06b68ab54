use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    Json,
};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::guard::require_admin;

use crate::models::{AuditEntry, AuditLogQuery};
use crate::services::AuditService;

#[axum::debug_handler]
pub async fn list_audit_entries(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<Vec<AuditEntry>>, AppError> {
    require_admin(&user)?;

    let service = AuditService::new(&config);
    let entries = service.list(query).await?;

    Ok(Json(entries))
}
