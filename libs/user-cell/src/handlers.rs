use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::guard::{require_admin, require_permission};

use crate::models::{
    permission_codes, AdministratorResponse, ChangePasswordRequest, CreateUserRequest,
    GrantedComponent, PageQuery, Permission, PermissionRequest, Role, RolePermissionsRequest,
    RoleRequest, UiComponent, UpdateUserRequest, UserError, UserListQuery, UserResponse,
};
use crate::services::{ComponentService, RoleService, UserService};

// ==============================================================================
// USUARIOS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_users(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    require_permission(&user, permission_codes::VIEW_USERS)?;

    let users = UserService::new(&config).list_users(query).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[axum::debug_handler]
pub async fn get_user(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    if user.id != user_id {
        require_permission(&user, permission_codes::VIEW_USERS)?;
    }

    let account = UserService::new(&config).get_user(user_id).await?;
    Ok(Json(account.into()))
}

#[axum::debug_handler]
pub async fn create_user(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    require_permission(&user, permission_codes::CREATE_USERS)?;

    let account = UserService::new(&config).create_user(request).await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

#[axum::debug_handler]
pub async fn replace_user(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(user_id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    require_permission(&user, permission_codes::EDIT_USERS)?;
    if let Some(field) = request.missing_required() {
        return Err(UserError::Validation(format!("El campo {} es obligatorio.", field)).into());
    }

    let account = UserService::new(&config).update_user(user_id, request).await?;
    Ok(Json(account.into()))
}

#[axum::debug_handler]
pub async fn update_user(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(user_id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    require_permission(&user, permission_codes::EDIT_USERS)?;

    let account = UserService::new(&config).update_user(user_id, request).await?;
    Ok(Json(account.into()))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_admin(&user)?;

    UserService::new(&config).delete_user(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Users may change their own password; anyone else needs `editar_usuarios`.
#[axum::debug_handler]
pub async fn change_password(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(user_id): Path<i64>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    if user.id != user_id {
        require_permission(&user, permission_codes::EDIT_USERS)?;
    }

    UserService::new(&config)
        .change_password(user_id, request.password.as_deref())
        .await?;

    Ok(Json(json!({ "detail": "Password actualizado correctamente." })))
}

// ==============================================================================
// ADMINISTRADORES
// ==============================================================================

#[axum::debug_handler]
pub async fn list_administrators(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<AdministratorResponse>>, AppError> {
    require_permission(&user, permission_codes::VIEW_USERS)?;

    let admins = UserService::new(&config)
        .list_administrators(page.limit, page.offset)
        .await?;
    Ok(Json(admins.into_iter().map(Into::into).collect()))
}

#[axum::debug_handler]
pub async fn get_administrator(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(user_id): Path<i64>,
) -> Result<Json<AdministratorResponse>, AppError> {
    require_permission(&user, permission_codes::VIEW_USERS)?;

    let admin = UserService::new(&config).get_administrator(user_id).await?;
    Ok(Json(admin.into()))
}

// ==============================================================================
// ROLES
// ==============================================================================

#[axum::debug_handler]
pub async fn list_roles(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Vec<Role>>, AppError> {
    Ok(Json(RoleService::new(&config).list_roles().await?))
}

#[axum::debug_handler]
pub async fn get_role(
    State(config): State<Arc<AppConfig>>,
    Path(role_id): Path<i64>,
) -> Result<Json<Role>, AppError> {
    Ok(Json(RoleService::new(&config).get_role(role_id).await?))
}

#[axum::debug_handler]
pub async fn create_role(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<RoleRequest>,
) -> Result<(StatusCode, Json<Role>), AppError> {
    require_admin(&user)?;

    let role = RoleService::new(&config).create_role(request).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

#[axum::debug_handler]
pub async fn update_role(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(role_id): Path<i64>,
    Json(request): Json<RoleRequest>,
) -> Result<Json<Role>, AppError> {
    require_admin(&user)?;

    Ok(Json(RoleService::new(&config).update_role(role_id, request).await?))
}

#[axum::debug_handler]
pub async fn delete_role(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(role_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_admin(&user)?;

    RoleService::new(&config).delete_role(role_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn get_role_permissions(
    State(config): State<Arc<AppConfig>>,
    Path(role_id): Path<i64>,
) -> Result<Json<Vec<Permission>>, AppError> {
    Ok(Json(RoleService::new(&config).role_permissions(role_id).await?))
}

#[axum::debug_handler]
pub async fn set_role_permissions(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(role_id): Path<i64>,
    Json(request): Json<RolePermissionsRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    RoleService::new(&config)
        .set_role_permissions(role_id, &request.permisos)
        .await?;
    Ok(Json(json!({ "detail": "Permisos actualizados correctamente." })))
}

// ==============================================================================
// PERMISOS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_permissions(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Vec<Permission>>, AppError> {
    Ok(Json(RoleService::new(&config).list_permissions().await?))
}

#[axum::debug_handler]
pub async fn get_permission(
    State(config): State<Arc<AppConfig>>,
    Path(permission_id): Path<i64>,
) -> Result<Json<Permission>, AppError> {
    Ok(Json(RoleService::new(&config).get_permission(permission_id).await?))
}

#[axum::debug_handler]
pub async fn create_permission(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<PermissionRequest>,
) -> Result<(StatusCode, Json<Permission>), AppError> {
    require_admin(&user)?;

    let permission = RoleService::new(&config).create_permission(request).await?;
    Ok((StatusCode::CREATED, Json(permission)))
}

#[axum::debug_handler]
pub async fn update_permission(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(permission_id): Path<i64>,
    Json(request): Json<PermissionRequest>,
) -> Result<Json<Permission>, AppError> {
    require_admin(&user)?;

    Ok(Json(
        RoleService::new(&config)
            .update_permission(permission_id, request)
            .await?,
    ))
}

#[axum::debug_handler]
pub async fn delete_permission(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(permission_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_admin(&user)?;

    RoleService::new(&config).delete_permission(permission_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// COMPONENTES UI
// ==============================================================================

#[axum::debug_handler]
pub async fn list_components(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Vec<UiComponent>>, AppError> {
    Ok(Json(ComponentService::new(&config).list_active().await?))
}

#[axum::debug_handler]
pub async fn my_components(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<GrantedComponent>>, AppError> {
    Ok(Json(ComponentService::new(&config).components_for(&user).await?))
}
