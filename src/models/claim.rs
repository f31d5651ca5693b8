// src/models/claim.rs
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClaimStatus {
    Pending,
    Completed,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentMethod {
    Pickup,        // NGO collects the food itself
    Volunteer,     // A volunteer delivery task is opened
    DonorDelivery, // Donor drops it off
}

impl FulfillmentMethod {
    pub fn needs_volunteer(&self) -> bool {
        matches!(self, FulfillmentMethod::Volunteer)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claim {
    pub id: String,
    pub donation_id: String,
    pub ngo_id: String,
    pub status: ClaimStatus,
    pub fulfillment_method: FulfillmentMethod,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Clone)]
pub struct NewClaim {
    pub donation_id: String,
    pub ngo_id: String,
    pub status: ClaimStatus,
    pub fulfillment_method: FulfillmentMethod,
}

// Request/Response Models
#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub method: FulfillmentMethod,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub success: bool,
    pub claim_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}
