// src/models/inspection.rs
use serde::{Deserialize, Serialize};

/// Verdict returned by the AI food inspector.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FreshnessReport {
    pub is_safe: bool,
    pub freshness_score: f64, // 1-10
    pub detected_category: String,
    pub reasoning: String,
}
