// src/handlers/auth_handler.rs
use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use super::AccessToken;
use crate::{
    errors::SurplusError as AppError,
    models::profile::{LoginRequest, LoginResponse, RoleResponse, SignUpRequest},
    services::AuthUser,
    state::AppState,
};

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<AuthUser>), AppError> {
    let user = state.auth_service.signup(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    Ok(Json(state.auth_service.login(request).await?))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    AccessToken(token): AccessToken,
) -> Result<Json<Value>, AppError> {
    state.auth_service.logout(token.as_deref()).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn get_role(
    State(state): State<Arc<AppState>>,
    AccessToken(token): AccessToken,
) -> Result<Json<RoleResponse>, AppError> {
    let role = state.auth_service.get_user_role(token.as_deref()).await?;
    Ok(Json(RoleResponse { role }))
}
