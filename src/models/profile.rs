// src/models/profile.rs
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Donor,      // Lists surplus food
    Ngo,        // Claims donations
    Volunteer,  // Delivers claimed donations
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Donor => "DONOR",
            Role::Ngo => "NGO",
            Role::Volunteer => "VOLUNTEER",
        }
    }

    /// Landing page for a signed-in user of this role.
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Donor => "/donate",
            Role::Ngo => "/dashboard/ngo",
            Role::Volunteer => "/dashboard/volunteer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DONOR" => Ok(Role::Donor),
            "NGO" => Ok(Role::Ngo),
            "VOLUNTEER" => Ok(Role::Volunteer),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub lifetime_deliveries: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn new(id: impl Into<String>, full_name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            full_name: Some(full_name.into()),
            role,
            organization_name: None,
            points: 0,
            lifetime_deliveries: 0,
            created_at: None,
        }
    }

    pub fn with_organization(mut self, organization_name: impl Into<String>) -> Self {
        self.organization_name = Some(organization_name.into());
        self
    }

    pub fn with_points(mut self, points: i64) -> Self {
        self.points = points;
        self
    }
}

/// Profiles seeded into a fresh demo database.
pub fn demo_profiles() -> Vec<Profile> {
    vec![
        Profile::new("donor-1", "Demo Donor", Role::Donor)
            .with_organization("Community Kitchen")
            .with_points(100),
        Profile::new("ngo-1", "Demo NGO", Role::Ngo).with_organization("Food Bank Central"),
        Profile::new("volunteer-1", "Demo Volunteer", Role::Volunteer),
    ]
}

// Request/Response Models
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub lifetime_deliveries: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SignUpRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub organization_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user_id: String,
    pub role: Option<Role>,
    pub redirect_to: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoleResponse {
    pub role: Option<Role>,
}
