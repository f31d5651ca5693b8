// src/models/task.rs
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use super::donation::FoodCategory;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Open,      // Waiting for a volunteer
    Assigned,  // A volunteer accepted it
    Completed, // Delivered
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "OPEN",
            TaskStatus::Assigned => "ASSIGNED",
            TaskStatus::Completed => "COMPLETED",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Task {
    pub id: String,
    pub claim_id: String,
    #[serde(default)]
    pub volunteer_id: Option<String>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Clone)]
pub struct NewTask {
    pub claim_id: String,
    pub status: TaskStatus,
}

/// Points awarded to a volunteer per completed delivery.
pub const DELIVERY_POINTS: i64 = 50;

// Volunteer-facing views
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OrganizationRef {
    pub organization_name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TaskDonation {
    pub id: String,
    pub food_category: FoodCategory,
    pub weight_kg: f64,
    pub pickup_instructions: String,
    pub pickup_address: Option<String>,
    pub image_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub donor_id: String,
    pub donor: OrganizationRef,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TaskClaim {
    pub id: String,
    pub ngo: OrganizationRef,
    pub donation: TaskDonation,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VolunteerTask {
    pub id: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub claim: TaskClaim,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptTaskResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompleteDeliveryResponse {
    pub success: bool,
    pub points_earned: i64,
}
