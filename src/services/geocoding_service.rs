// src/services/geocoding_service.rs
use async_trait::async_trait;
use serde::Deserialize;

use crate::{errors::SurplusError as AppError, models::donation::Coordinates};

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Best match for a free-form address; failures resolve to `None`.
    async fn geocode(&self, address: &str) -> Option<Coordinates>;
}

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

fn first_hit(places: Vec<Place>) -> Option<Coordinates> {
    let place = places.into_iter().next()?;
    Some(Coordinates {
        lat: place.lat.trim().parse().ok()?,
        lon: place.lon.trim().parse().ok()?,
    })
}

pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
}

impl NominatimGeocoder {
    pub fn new(client: reqwest::Client, base_url: &str, user_agent: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    async fn search(&self, address: &str) -> Result<Vec<Place>, AppError> {
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("format", "json"), ("q", address)])
            // Nominatim rejects anonymous clients
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::ServiceUnavailable(format!("geocoder returned {}", response.status())));
        }

        Ok(response.json::<Vec<Place>>().await?)
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Option<Coordinates> {
        match self.search(address).await {
            Ok(places) => {
                let coordinates = first_hit(places);
                if coordinates.is_none() {
                    tracing::warn!("No geocoding match for address: {}", address);
                }
                coordinates
            }
            Err(e) => {
                tracing::error!("Geocoding error: {}", e);
                None
            }
        }
    }
}

// Offline geocoder that never resolves
#[derive(Debug, Default)]
pub struct NoopGeocoder;

#[async_trait]
impl Geocoder for NoopGeocoder {
    async fn geocode(&self, address: &str) -> Option<Coordinates> {
        tracing::info!("[MOCK] Skipping geocoding for: {}", address);
        None
    }
}
