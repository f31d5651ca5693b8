// src/services/logistics_service.rs
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing;

use crate::{
    errors::SurplusError as AppError,
    models::{
        claim::{Claim, ClaimResponse, ClaimStatus, FulfillmentMethod, NewClaim},
        donation::DonationStatus,
        task::{NewTask, Task, TaskStatus},
    },
    services::auth_service::AuthUser,
    store::{DataStore, Query, Table},
};

#[async_trait]
pub trait LogisticsOperations: Send + Sync {
    async fn claim_donation(&self, user: &AuthUser, donation_id: &str, method: FulfillmentMethod) -> Result<ClaimResponse, AppError>;
}

pub struct LogisticsService {
    store: Arc<dyn DataStore>,
}

impl LogisticsService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    async fn mark_claimed(&self, donation_id: &str) -> Result<(), AppError> {
        let guarded = Query::from(Table::Donations)
            .eq("id", donation_id)
            .eq("status", DonationStatus::Available.as_str());

        let updated = self
            .store
            .update(&guarded, json!({ "status": DonationStatus::Claimed }))
            .await?;
        if updated > 0 {
            return Ok(());
        }

        // Nothing matched: tell a missing donation apart from a taken one
        let exists = self
            .store
            .single(&Query::from(Table::Donations).eq("id", donation_id))
            .await?
            .is_some();
        if exists {
            Err(AppError::DonationNotAvailable(donation_id.to_string()))
        } else {
            Err(AppError::DonationNotFound(donation_id.to_string()))
        }
    }

    async fn record_claim(&self, user: &AuthUser, donation_id: &str, method: FulfillmentMethod) -> Result<ClaimResponse, AppError> {
        self.mark_claimed(donation_id).await?;

        let claim: Claim = self
            .store
            .insert_as(
                Table::Claims,
                &NewClaim {
                    donation_id: donation_id.to_string(),
                    ngo_id: user.id.clone(),
                    status: ClaimStatus::Pending,
                    fulfillment_method: method,
                },
            )
            .await?;

        // Only volunteer fulfilment needs a delivery task
        let task_id = if method.needs_volunteer() {
            let task: Task = self
                .store
                .insert_as(
                    Table::Tasks,
                    &NewTask {
                        claim_id: claim.id.clone(),
                        status: TaskStatus::Open,
                    },
                )
                .await?;
            Some(task.id)
        } else {
            None
        };

        Ok(ClaimResponse {
            success: true,
            claim_id: claim.id,
            task_id,
        })
    }
}

#[async_trait]
impl LogisticsOperations for LogisticsService {
    async fn claim_donation(&self, user: &AuthUser, donation_id: &str, method: FulfillmentMethod) -> Result<ClaimResponse, AppError> {
        tracing::info!("NGO {} claiming donation {} via {:?}", user.id, donation_id, method);

        match self.record_claim(user, donation_id, method).await {
            Ok(response) => {
                tracing::info!("Donation {} claimed as {}", donation_id, response.claim_id);
                Ok(response)
            }
            Err(e @ (AppError::DonationNotFound(_) | AppError::DonationNotAvailable(_))) => Err(e),
            Err(e) => {
                tracing::error!("Claim error: {}", e);
                Err(AppError::ClaimFailed(e.to_string()))
            }
        }
    }
}
