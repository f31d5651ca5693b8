// src/handlers/mod.rs
use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{FromRequestParts, multipart::Field},
    http::{
        HeaderMap, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
        request::Parts,
    },
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};

use crate::{
    errors::SurplusError as AppError, models::donation::ImageUpload, services::AuthUser,
    state::AppState,
};

pub mod auth_handler;
pub mod donation_handler;
pub mod task_handler;

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Bearer token of the request, if any.
pub struct AccessToken(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for AccessToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(AccessToken(bearer_token(&parts.headers)))
    }
}

/// The signed-in user; rejects with 401 when the token resolves to nobody.
pub struct CurrentUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers);
        let user = state.auth_service.current_user(token.as_deref()).await?;
        Ok(CurrentUser(user))
    }
}

/// Reads a file part into an upload.
pub async fn read_upload(field: Field<'_>) -> Result<ImageUpload, AppError> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field.bytes().await?.to_vec();

    Ok(ImageUpload {
        file_name,
        content_type,
        bytes,
    })
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(health))
        .route("/auth/signup", post(auth_handler::signup))
        .route("/auth/login", post(auth_handler::login))
        .route("/auth/logout", post(auth_handler::logout))
        .route("/auth/role", get(auth_handler::get_role))
        .route("/ai/check", post(donation_handler::check_food))
        .route(
            "/donations",
            get(donation_handler::list_donations).post(donation_handler::submit_donation),
        )
        .route("/donations/:id/claim", post(donation_handler::claim_donation))
        .route("/tasks/open", get(task_handler::open_tasks))
        .route("/tasks/assigned", get(task_handler::assigned_tasks))
        .route("/tasks/:id/accept", post(task_handler::accept_task))
        .route("/tasks/:id/complete", post(task_handler::complete_delivery))
        .route("/leaderboard", get(task_handler::leaderboard))
        .layer(cors)
        .with_state(state)
}
