// src/services/volunteer_service.rs
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing;

use crate::{
    errors::SurplusError as AppError,
    models::{
        claim::Claim,
        donation::Donation,
        profile::{LeaderboardEntry, Role},
        task::{
            AcceptTaskResponse, CompleteDeliveryResponse, DELIVERY_POINTS, OrganizationRef, Task,
            TaskClaim, TaskDonation, TaskStatus, VolunteerTask,
        },
    },
    services::auth_service::AuthUser,
    store::{DataStore, Query, Table},
};

const UNKNOWN_NGO: &str = "Unknown NGO";
const ANONYMOUS_DONOR: &str = "Anonymous Donor";
const UNKNOWN_DONOR: &str = "Unknown Donor";
const LEADERBOARD_SIZE: usize = 5;

#[async_trait]
pub trait VolunteerOperations: Send + Sync {
    async fn get_open_tasks(&self) -> Vec<VolunteerTask>;
    async fn get_assigned_tasks(&self, user: &AuthUser) -> Vec<VolunteerTask>;
    async fn accept_task(&self, user: &AuthUser, task_id: &str) -> Result<AcceptTaskResponse, AppError>;
    async fn complete_delivery(&self, user: &AuthUser, task_id: &str) -> Result<CompleteDeliveryResponse, AppError>;
    async fn get_leaderboard(&self) -> Vec<LeaderboardEntry>;
}

#[derive(Debug, Deserialize)]
struct OrganizationRow {
    id: String,
    #[serde(default)]
    organization_name: Option<String>,
}

pub struct VolunteerService {
    store: Arc<dyn DataStore>,
}

impl VolunteerService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    async fn organizations(&self, ids: &BTreeSet<String>) -> Result<HashMap<String, Option<String>>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = Query::from(Table::Profiles)
            .select("id, organization_name")
            .in_("id", ids.iter().cloned());
        let rows: Vec<OrganizationRow> = self.store.fetch_valid(&query).await?;

        // A blank organization name counts as none
        Ok(rows
            .into_iter()
            .map(|row| (row.id, row.organization_name.filter(|name| !name.trim().is_empty())))
            .collect())
    }

    /// Joins tasks with their claim, donation, NGO and donor.
    async fn expand(&self, tasks: Vec<Task>) -> Result<Vec<VolunteerTask>, AppError> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let claim_ids: BTreeSet<String> = tasks.iter().map(|t| t.claim_id.clone()).collect();
        let claims: Vec<Claim> = self
            .store
            .fetch_valid(&Query::from(Table::Claims).in_("id", claim_ids))
            .await?;

        let donation_ids: BTreeSet<String> = claims.iter().map(|c| c.donation_id.clone()).collect();
        let donations: Vec<Donation> = if donation_ids.is_empty() {
            Vec::new()
        } else {
            self.store
                .fetch_valid(&Query::from(Table::Donations).in_("id", donation_ids))
                .await?
        };

        let ngo_ids: BTreeSet<String> = claims.iter().map(|c| c.ngo_id.clone()).collect();
        let donor_ids: BTreeSet<String> = donations.iter().map(|d| d.donor_id.clone()).collect();
        let (ngos, donors) = futures::try_join!(self.organizations(&ngo_ids), self.organizations(&donor_ids))?;

        let claims: HashMap<String, Claim> = claims.into_iter().map(|c| (c.id.clone(), c)).collect();
        let donations: HashMap<String, Donation> = donations.into_iter().map(|d| (d.id.clone(), d)).collect();

        let views = tasks
            .into_iter()
            .filter_map(|task| {
                let Some(claim) = claims.get(&task.claim_id) else {
                    tracing::warn!("Task {} references missing claim {}", task.id, task.claim_id);
                    return None;
                };
                let Some(donation) = donations.get(&claim.donation_id) else {
                    tracing::warn!("Claim {} references missing donation {}", claim.id, claim.donation_id);
                    return None;
                };

                let ngo_name = ngos
                    .get(&claim.ngo_id)
                    .cloned()
                    .flatten()
                    .unwrap_or_else(|| UNKNOWN_NGO.to_string());
                let donor_name = match donors.get(&donation.donor_id) {
                    Some(Some(name)) => name.clone(),
                    Some(None) => ANONYMOUS_DONOR.to_string(),
                    None => UNKNOWN_DONOR.to_string(),
                };

                Some(VolunteerTask {
                    id: task.id,
                    status: task.status,
                    created_at: task.created_at,
                    claim: TaskClaim {
                        id: claim.id.clone(),
                        ngo: OrganizationRef { organization_name: ngo_name },
                        donation: TaskDonation {
                            id: donation.id.clone(),
                            food_category: donation.food_category,
                            weight_kg: donation.weight_kg,
                            pickup_instructions: donation.pickup_instructions.clone(),
                            pickup_address: donation.pickup_address.clone(),
                            image_url: donation.image_url.clone(),
                            latitude: donation.latitude,
                            longitude: donation.longitude,
                            donor_id: donation.donor_id.clone(),
                            donor: OrganizationRef { organization_name: donor_name },
                        },
                    },
                })
            })
            .collect();

        Ok(views)
    }

    async fn task_views(&self, query: Query) -> Result<Vec<VolunteerTask>, AppError> {
        let tasks: Vec<Task> = self.store.fetch_valid(&query).await?;
        self.expand(tasks).await
    }

    async fn award_points(&self, volunteer_id: &str) -> Result<(), AppError> {
        let query = Query::from(Table::Profiles).eq("id", volunteer_id);
        let profile: LeaderboardEntry = self
            .store
            .fetch_one(&query)
            .await?
            .ok_or_else(|| AppError::not_found(format!("profile {}", volunteer_id)))?;

        self.store
            .update(
                &query,
                json!({
                    "points": profile.points + DELIVERY_POINTS,
                    "lifetime_deliveries": profile.lifetime_deliveries + 1,
                }),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl VolunteerOperations for VolunteerService {
    async fn get_open_tasks(&self) -> Vec<VolunteerTask> {
        tracing::debug!("Fetching open tasks");

        let query = Query::from(Table::Tasks)
            .eq("status", TaskStatus::Open.as_str())
            .order("created_at", false);

        self.task_views(query).await.unwrap_or_else(|e| {
            tracing::error!("Error fetching open tasks: {}", e);
            Vec::new()
        })
    }

    async fn get_assigned_tasks(&self, user: &AuthUser) -> Vec<VolunteerTask> {
        tracing::debug!("Fetching tasks assigned to {}", user.id);

        let query = Query::from(Table::Tasks)
            .eq("status", TaskStatus::Assigned.as_str())
            .eq("volunteer_id", user.id.as_str())
            .order("created_at", false);

        self.task_views(query).await.unwrap_or_else(|e| {
            tracing::error!("Error fetching assigned tasks: {}", e);
            Vec::new()
        })
    }

    async fn accept_task(&self, user: &AuthUser, task_id: &str) -> Result<AcceptTaskResponse, AppError> {
        tracing::info!("Volunteer {} accepting task {}", user.id, task_id);

        let guarded = Query::from(Table::Tasks)
            .eq("id", task_id)
            .eq("status", TaskStatus::Open.as_str());
        let updated = self
            .store
            .update(&guarded, json!({ "status": TaskStatus::Assigned, "volunteer_id": user.id }))
            .await?;

        if updated == 0 {
            let exists = self
                .store
                .single(&Query::from(Table::Tasks).eq("id", task_id))
                .await?
                .is_some();
            return Err(if exists {
                AppError::TaskNotOpen(task_id.to_string())
            } else {
                AppError::TaskNotFound(task_id.to_string())
            });
        }

        Ok(AcceptTaskResponse { success: true })
    }

    async fn complete_delivery(&self, user: &AuthUser, task_id: &str) -> Result<CompleteDeliveryResponse, AppError> {
        tracing::info!("Volunteer {} completing task {}", user.id, task_id);

        let owned = Query::from(Table::Tasks)
            .eq("id", task_id)
            .eq("volunteer_id", user.id.as_str())
            .eq("status", TaskStatus::Assigned.as_str());

        // The guarded update is the ownership check; a racing completion sees zero rows
        let updated = self
            .store
            .update(&owned, json!({ "status": TaskStatus::Completed }))
            .await?;
        if updated == 0 {
            return Err(AppError::TaskNotAssignedToUser(task_id.to_string()));
        }

        // The delivery stands even if the reward write fails
        if let Err(e) = self.award_points(&user.id).await {
            tracing::error!("Failed to award points to {}: {}", user.id, e);
        }

        Ok(CompleteDeliveryResponse {
            success: true,
            points_earned: DELIVERY_POINTS,
        })
    }

    async fn get_leaderboard(&self) -> Vec<LeaderboardEntry> {
        let query = Query::from(Table::Profiles)
            .select("id, full_name, points, lifetime_deliveries")
            .eq("role", Role::Volunteer.as_str())
            .order("points", false)
            .limit(LEADERBOARD_SIZE);

        self.store.fetch_all(&query).await.unwrap_or_else(|e| {
            tracing::error!("Error fetching leaderboard: {}", e);
            Vec::new()
        })
    }
}
