// src/config.rs
use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

use crate::errors::{SurplusError, SurplusResult};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-flash-latest";
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_USER_AGENT: &str = "SurplusConnect/1.0";
pub const DEFAULT_IMAGE_BUCKET: &str = "food-images";

/// Managed backend connection (auth, tables, storage).
///
/// `key` must be the service-role key. Table and storage calls authenticate
/// with it directly, so an anon key only sees what row-level policies grant
/// to anonymous callers. End-user tokens are used for auth calls only.
#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub url: String,
    pub key: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub backend: Option<BackendConfig>,
    pub mock_db_path: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_url: String,
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    pub image_bucket: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            backend: None,
            mock_db_path: "db.json".to_string(),
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_url: DEFAULT_GEMINI_URL.to_string(),
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            geocoder_user_agent: DEFAULT_USER_AGENT.to_string(),
            image_bucket: DEFAULT_IMAGE_BUCKET.to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> SurplusResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> SurplusResult<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let backend = match (var("BACKEND_URL"), var("BACKEND_KEY")) {
            (Some(url), Some(key)) => Some(BackendConfig { url, key }),
            (Some(_), None) | (None, Some(_)) => {
                warn!("BACKEND_URL and BACKEND_KEY must both be set, falling back to mock backend");
                None
            }
            (None, None) => None,
        };

        Ok(Self {
            port: try_load(&var, "PORT", defaults.port)?,
            backend,
            mock_db_path: or_default(&var, "MOCK_DB_PATH", defaults.mock_db_path),
            gemini_api_key: var("GEMINI_API_KEY"),
            gemini_model: or_default(&var, "GEMINI_MODEL", defaults.gemini_model),
            gemini_url: or_default(&var, "GEMINI_URL", defaults.gemini_url),
            geocoder_url: or_default(&var, "GEOCODER_URL", defaults.geocoder_url),
            geocoder_user_agent: or_default(&var, "GEOCODER_USER_AGENT", defaults.geocoder_user_agent),
            image_bucket: or_default(&var, "IMAGE_BUCKET", defaults.image_bucket),
        })
    }
}

fn or_default(var: &impl Fn(&str) -> Option<String>, key: &str, default: String) -> String {
    var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default
    })
}

fn try_load<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> SurplusResult<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match var(key) {
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
        Some(raw) => raw.trim().parse().map_err(|e| {
            warn!("Invalid {key} value: {e}");
            SurplusError::ConfigurationError(format!("Invalid {key} value '{raw}': {e}"))
        }),
    }
}
