// src/utils/id_generator.rs
use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::store::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdType {
    Profile,
    Donation,
    Claim,
    Task,
    Row,
}

impl IdType {
    pub fn to_prefix(&self) -> &'static str {
        match self {
            IdType::Profile => "prf",
            IdType::Donation => "don",
            IdType::Claim => "clm",
            IdType::Task => "tsk",
            IdType::Row => "row",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "prf" => Some(IdType::Profile),
            "don" => Some(IdType::Donation),
            "clm" => Some(IdType::Claim),
            "tsk" => Some(IdType::Task),
            "row" => Some(IdType::Row),
            _ => None,
        }
    }

    pub fn for_table(table: &Table) -> Self {
        match table {
            Table::Profiles => IdType::Profile,
            Table::Donations => IdType::Donation,
            Table::Claims => IdType::Claim,
            Table::Tasks => IdType::Task,
            Table::Other(_) => IdType::Row,
        }
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_prefix())
    }
}

pub struct IdGenerator;

impl IdGenerator {
    /// Generate a unique ID with format: {prefix}-{yymmdd}-{random_suffix}
    pub fn generate(id_type: IdType) -> String {
        Self::generate_with_timestamp(id_type, Utc::now())
    }

    /// Generate ID with a specific timestamp (useful for testing)
    pub fn generate_with_timestamp(id_type: IdType, timestamp: DateTime<Utc>) -> String {
        let date_part = timestamp.format("%y%m%d").to_string();
        let random_suffix = Self::generate_random_suffix();

        format!("{}-{}-{}", id_type.to_prefix(), date_part, random_suffix)
    }

    /// 5 characters: 3 hex + 2 alphanumeric, or 3 alphanumeric + 2 hex
    fn generate_random_suffix() -> String {
        if rand::random::<bool>() {
            format!(
                "{}{}",
                Self::generate_from_chars(HEX_CHARS, 3),
                Self::generate_from_chars(ALPHANUMERIC_CHARS, 2)
            )
        } else {
            format!(
                "{}{}",
                Self::generate_from_chars(ALPHANUMERIC_CHARS, 3),
                Self::generate_from_chars(HEX_CHARS, 2)
            )
        }
    }

    fn generate_from_chars(charset: &[u8], n: usize) -> String {
        let mut rng = rand::rng();
        (0..n)
            .map(|_| charset[rng.random_range(0..charset.len())] as char)
            .collect()
    }

    /// Parse an ID to extract its components
    pub fn parse_id(id: &str) -> Option<ParsedId> {
        let parts: Vec<&str> = id.split('-').collect();
        let [prefix, date_part, random_suffix] = parts.as_slice() else {
            return None;
        };

        if date_part.len() != 6 || random_suffix.len() != 5 {
            return None;
        }
        if !random_suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }

        let id_type = IdType::from_prefix(prefix)?;

        let year = 2000 + date_part[0..2].parse::<i32>().ok()?;
        let month = date_part[2..4].parse::<u32>().ok()?;
        let day = date_part[4..6].parse::<u32>().ok()?;

        let parsed = ParsedId {
            id_type,
            year,
            month,
            day,
            random_suffix: random_suffix.to_string(),
        };
        // The date part must name a real calendar day
        parsed.to_datetime()?;
        Some(parsed)
    }

    /// Validate if an ID matches the expected format and type
    pub fn validate_id(id: &str, expected_type: Option<IdType>) -> bool {
        match Self::parse_id(id) {
            Some(parsed) => expected_type.is_none_or(|expected| parsed.id_type == expected),
            None => false,
        }
    }
}

const HEX_CHARS: &[u8] = b"0123456789abcdef";
const ALPHANUMERIC_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedId {
    pub id_type: IdType,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub random_suffix: String,
}

impl ParsedId {
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.with_ymd_and_hms(self.year, self.month, self.day, 0, 0, 0).single()
    }
}
