// src/handlers/donation_handler.rs
use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};

use super::{CurrentUser, read_upload};
use crate::{
    errors::SurplusError as AppError,
    models::{
        claim::{ClaimRequest, ClaimResponse},
        donation::{Donation, DonationSubmission, SubmitDonationResponse},
        inspection::FreshnessReport,
    },
    state::AppState,
};

/// Assigns a text form field; unknown names are ignored.
fn set_text_field(submission: &mut DonationSubmission, name: &str, value: String) {
    let slot = match name {
        "food_category" => &mut submission.food_category,
        "weight_kg" => &mut submission.weight_kg,
        "expiry_hours" => &mut submission.expiry_hours,
        "pickup_instructions" => &mut submission.pickup_instructions,
        "pickup_address" => &mut submission.pickup_address,
        "freshness_score" => &mut submission.freshness_score,
        "ai_notes" => &mut submission.ai_notes,
        "can_deliver" => &mut submission.can_deliver,
        "latitude" => &mut submission.latitude,
        "longitude" => &mut submission.longitude,
        other => {
            tracing::debug!("Ignoring unknown form field: {}", other);
            return;
        }
    };
    *slot = Some(value);
}

async fn read_submission(mut multipart: Multipart) -> Result<DonationSubmission, AppError> {
    let mut submission = DonationSubmission::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            submission.image = Some(read_upload(field).await?);
        } else {
            let value = field.text().await?;
            set_text_field(&mut submission, &name, value);
        }
    }

    Ok(submission)
}

pub async fn check_food(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<FreshnessReport>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("image") {
            let upload = read_upload(field).await?;
            let report = state.inspector.inspect(&upload.bytes, &upload.content_type).await?;
            return Ok(Json(report));
        }
    }

    Err(AppError::bad_request("No image provided"))
}

pub async fn submit_donation(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitDonationResponse>), AppError> {
    let submission = read_submission(multipart).await?;
    let response = state.donation_service.submit_donation(&user, submission).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_donations(State(state): State<Arc<AppState>>) -> Json<Vec<Donation>> {
    Json(state.donation_service.get_available_donations().await)
}

pub async fn claim_donation(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(donation_id): Path<String>,
    Json(request): Json<ClaimRequest>,
) -> Result<Json<ClaimResponse>, AppError> {
    let response = state
        .logistics_service
        .claim_donation(&user, &donation_id, request.method)
        .await?;
    Ok(Json(response))
}
