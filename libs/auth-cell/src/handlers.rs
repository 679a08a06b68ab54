use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{TokenPair, User};
use shared_models::error::AppError;
use shared_utils::extractor::client_ip;
use user_cell::models::ProfileUpdateRequest;
use user_cell::{UserResponse, UserService};

use crate::models::{AccessResponse, LoginRequest, RefreshRequest};
use crate::services::{LoginService, TokenService};

#[axum::debug_handler]
pub async fn obtain_token_pair(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenPair>, AppError> {
    let ip = client_ip(&headers);
    let pair = LoginService::new(&config).login(request, &ip).await?;
    Ok(Json(pair))
}

#[axum::debug_handler]
pub async fn refresh_token(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<AccessResponse>, AppError> {
    let access = TokenService::new(&config).refresh(&request.refresh).await?;
    Ok(Json(AccessResponse { access }))
}

#[axum::debug_handler]
pub async fn blacklist_token(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<Value>, AppError> {
    TokenService::new(&config).blacklist(&request.refresh).await?;
    Ok(Json(json!({})))
}

#[axum::debug_handler]
pub async fn get_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<UserResponse>, AppError> {
    debug!("Getting profile for user: {}", user.id);

    let account = UserService::new(&config).get_user(user.id).await?;
    Ok(Json(account.into()))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<ProfileUpdateRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let account = UserService::new(&config)
        .update_profile(user.id, request)
        .await?;
    Ok(Json(account.into()))
}
