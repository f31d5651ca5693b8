// src/handlers/task_handler.rs
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};

use super::CurrentUser;
use crate::{
    errors::SurplusError as AppError,
    models::{
        profile::LeaderboardEntry,
        task::{AcceptTaskResponse, CompleteDeliveryResponse, VolunteerTask},
    },
    state::AppState,
};

pub async fn open_tasks(State(state): State<Arc<AppState>>) -> Json<Vec<VolunteerTask>> {
    Json(state.volunteer_service.get_open_tasks().await)
}

pub async fn assigned_tasks(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Json<Vec<VolunteerTask>> {
    Json(state.volunteer_service.get_assigned_tasks(&user).await)
}

pub async fn accept_task(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<String>,
) -> Result<Json<AcceptTaskResponse>, AppError> {
    Ok(Json(state.volunteer_service.accept_task(&user, &task_id).await?))
}

pub async fn complete_delivery(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<String>,
) -> Result<Json<CompleteDeliveryResponse>, AppError> {
    Ok(Json(state.volunteer_service.complete_delivery(&user, &task_id).await?))
}

pub async fn leaderboard(State(state): State<Arc<AppState>>) -> Json<Vec<LeaderboardEntry>> {
    Json(state.volunteer_service.get_leaderboard().await)
}
