// src/models/donation.rs
use serde::{Deserialize, Serialize};
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum FoodCategory {
    Cooked,
    Raw,
    Packaged,
}

impl FoodCategory {
    pub const ALL: [FoodCategory; 3] = [FoodCategory::Cooked, FoodCategory::Raw, FoodCategory::Packaged];

    pub fn as_str(&self) -> &'static str {
        match self {
            FoodCategory::Cooked => "Cooked",
            FoodCategory::Raw => "Raw",
            FoodCategory::Packaged => "Packaged",
        }
    }
}

impl fmt::Display for FoodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FoodCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FoodCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Invalid enum value. Expected 'Cooked' | 'Raw' | 'Packaged', received '{}'",
                    s
                )
            })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum DonationStatus {
    Available, // Listed and waiting for an NGO
    Claimed,   // An NGO has accepted it
    Completed, // Handed over
}

impl DonationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Available => "AVAILABLE",
            DonationStatus::Claimed => "CLAIMED",
            DonationStatus::Completed => "COMPLETED",
        }
    }

}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Donation {
    pub id: String,
    pub donor_id: String,
    pub food_category: FoodCategory,
    pub weight_kg: f64,
    pub pickup_instructions: String,
    #[serde(default)]
    pub pickup_address: Option<String>,
    #[serde(default)]
    pub freshness_score: Option<f64>,
    #[serde(default)]
    pub ai_notes: Option<String>,
    #[serde(default)]
    pub can_deliver: bool,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    pub expiry_at: DateTime<Utc>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub status: DonationStatus,
    #[serde(default)]
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Row written when a donor lists food; the store assigns `id` and `created_at`.
#[derive(Debug, Serialize, Clone)]
pub struct NewDonation {
    pub donor_id: String,
    pub food_category: FoodCategory,
    pub weight_kg: f64,
    pub pickup_instructions: String,
    pub pickup_address: Option<String>,
    pub freshness_score: Option<f64>,
    pub ai_notes: Option<String>,
    pub can_deliver: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub expiry_at: DateTime<Utc>,
    pub image_url: String,
    pub status: DonationStatus,
    pub is_verified: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Text after the last `.` of the file name, or the whole name.
    pub fn extension(&self) -> &str {
        self.file_name.rsplit('.').next().unwrap_or(&self.file_name)
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Raw donation form fields, as received.
#[derive(Debug, Clone, Default)]
pub struct DonationSubmission {
    pub food_category: Option<String>,
    pub weight_kg: Option<String>,
    pub expiry_hours: Option<String>,
    pub pickup_instructions: Option<String>,
    pub pickup_address: Option<String>,
    pub freshness_score: Option<String>,
    pub ai_notes: Option<String>,
    pub can_deliver: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone)]
pub struct ValidatedDonation {
    pub food_category: FoodCategory,
    pub weight_kg: f64,
    pub expiry_hours: f64,
    pub expiry_at: DateTime<Utc>,
    pub pickup_instructions: String,
    pub pickup_address: Option<String>,
    pub freshness_score: Option<f64>,
    pub ai_notes: Option<String>,
    pub can_deliver: bool,
    pub coordinates: Option<Coordinates>,
    pub image: ImageUpload,
}

const NOT_A_NUMBER: &str = "Expected number, received nan";

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// Coerces a form value to a number; missing or blank input counts as zero.
fn coerce_number(value: Option<&str>) -> Result<f64, &'static str> {
    let raw = value.unwrap_or_default().trim();
    if raw.is_empty() {
        return Ok(0.0);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or(NOT_A_NUMBER)
}

fn positive(field: &str, value: Option<&str>, issues: &mut Vec<ValidationError>) -> f64 {
    match coerce_number(value) {
        Ok(n) if n > 0.0 => n,
        Ok(_) => {
            issues.push(issue(field, "Number must be greater than 0"));
            0.0
        }
        Err(message) => {
            issues.push(issue(field, message));
            0.0
        }
    }
}

/// `now + hours`, or `None` when the instant is out of range.
pub fn expiry_from(now: DateTime<Utc>, hours: f64) -> Option<DateTime<Utc>> {
    let millis = (hours * 3_600_000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    now.checked_add_signed(TimeDelta::try_milliseconds(millis as i64)?)
}

fn issue(field: &str, message: &str) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        message: message.to_string(),
    }
}

impl DonationSubmission {
    /// Checks every field and reports all problems at once.
    pub fn validate(self) -> Result<ValidatedDonation, Vec<ValidationError>> {
        let mut issues = Vec::new();

        let food_category = match self.food_category.as_deref() {
            None => {
                issues.push(issue("food_category", "Required"));
                None
            }
            Some(raw) => match raw.parse::<FoodCategory>() {
                Ok(category) => Some(category),
                Err(message) => {
                    issues.push(issue("food_category", &message));
                    None
                }
            },
        };

        let weight_kg = positive("weight_kg", self.weight_kg.as_deref(), &mut issues);
        let expiry_hours = positive("expiry_hours", self.expiry_hours.as_deref(), &mut issues);
        let expiry_at = match expiry_from(Utc::now(), expiry_hours) {
            Some(at) => at,
            None => {
                issues.push(issue("expiry_hours", "Expiry is out of range"));
                Utc::now()
            }
        };

        let pickup_instructions = match self.pickup_instructions.as_deref() {
            None => {
                issues.push(issue("pickup_instructions", "Required"));
                String::new()
            }
            Some("") => {
                issues.push(issue("pickup_instructions", "Pickup instructions are required"));
                String::new()
            }
            Some(text) => text.to_string(),
        };

        let freshness_score = match non_empty(&self.freshness_score) {
            None => None,
            Some(raw) => match coerce_number(Some(&raw)) {
                Ok(score) => Some(score),
                Err(message) => {
                    issues.push(issue("freshness_score", message));
                    None
                }
            },
        };

        let coordinates = match (non_empty(&self.latitude), non_empty(&self.longitude)) {
            (Some(lat), Some(lon)) => match (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) {
                (Ok(lat), Ok(lon)) if lat.is_finite() && lon.is_finite() => Some(Coordinates { lat, lon }),
                _ => {
                    issues.push(issue("latitude", "Invalid coordinates"));
                    None
                }
            },
            _ => None,
        };

        let image = match self.image {
            Some(image) if !image.is_empty() => Some(image),
            _ => {
                issues.push(issue("image", "Image is required"));
                None
            }
        };

        match (food_category, image) {
            (Some(food_category), Some(image)) if issues.is_empty() => Ok(ValidatedDonation {
                food_category,
                weight_kg,
                expiry_hours,
                expiry_at,
                pickup_instructions,
                pickup_address: non_empty(&self.pickup_address),
                freshness_score,
                ai_notes: non_empty(&self.ai_notes),
                can_deliver: self.can_deliver.as_deref() == Some("true"),
                coordinates,
                image,
            }),
            _ => Err(issues),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitDonationResponse {
    pub success: bool,
    pub message: String,
}
