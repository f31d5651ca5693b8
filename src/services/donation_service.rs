// src/services/donation_service.rs
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing;

use crate::{
    errors::SurplusError as AppError,
    models::donation::{
        Donation, DonationStatus, DonationSubmission, NewDonation, SubmitDonationResponse,
    },
    services::{auth_service::AuthUser, geocoding_service::Geocoder, storage_service::{ImageStorage, object_path}},
    store::{DataStore, Query, Table},
};

#[async_trait]
pub trait DonationOperations: Send + Sync {
    async fn submit_donation(&self, user: &AuthUser, submission: DonationSubmission) -> Result<SubmitDonationResponse, AppError>;
    async fn get_available_donations(&self) -> Vec<Donation>;
}

pub struct DonationService {
    store: Arc<dyn DataStore>,
    storage: Arc<dyn ImageStorage>,
    geocoder: Arc<dyn Geocoder>,
}

impl DonationService {
    pub fn new(
        store: Arc<dyn DataStore>,
        storage: Arc<dyn ImageStorage>,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        Self {
            store,
            storage,
            geocoder,
        }
    }
}

#[async_trait]
impl DonationOperations for DonationService {
    async fn submit_donation(&self, user: &AuthUser, submission: DonationSubmission) -> Result<SubmitDonationResponse, AppError> {
        let donation = submission.validate().map_err(AppError::ValidationFailed)?;

        tracing::info!("Submitting {} donation for donor: {}", donation.food_category, user.id);

        let path = object_path(&user.id, donation.image.extension(), Utc::now());
        let content_type = donation.image.content_type.clone();
        let image_url = self
            .storage
            .upload(&path, donation.image.bytes, &content_type)
            .await?;

        // Coordinates picked on the form win over server-side geocoding
        let coordinates = match (donation.coordinates, donation.pickup_address.as_deref()) {
            (Some(coordinates), _) => Some(coordinates),
            (None, Some(address)) => self.geocoder.geocode(address).await,
            (None, None) => None,
        };

        let row = NewDonation {
            donor_id: user.id.clone(),
            food_category: donation.food_category,
            weight_kg: donation.weight_kg,
            pickup_instructions: donation.pickup_instructions,
            pickup_address: donation.pickup_address,
            is_verified: donation.freshness_score.is_some(),
            freshness_score: donation.freshness_score,
            ai_notes: donation.ai_notes,
            can_deliver: donation.can_deliver,
            latitude: coordinates.map(|c| c.lat),
            longitude: coordinates.map(|c| c.lon),
            expiry_at: donation.expiry_at,
            image_url,
            status: DonationStatus::Available,
        };

        let stored: Donation = self.store.insert_as(Table::Donations, &row).await.map_err(|e| {
            tracing::error!("Insert Error: {}", e);
            AppError::internal_error("Failed to save donation")
        })?;

        tracing::info!("Donation listed: {}", stored.id);

        Ok(SubmitDonationResponse {
            success: true,
            message: "Donation submitted successfully".to_string(),
        })
    }

    async fn get_available_donations(&self) -> Vec<Donation> {
        tracing::debug!("Fetching available donations");

        let query = Query::from(Table::Donations)
            .select("*")
            .eq("status", DonationStatus::Available.as_str())
            .order("created_at", false);

        // The feed degrades to empty rather than failing the page
        self.store.fetch_all(&query).await.unwrap_or_else(|e| {
            tracing::error!("Error fetching donations: {}", e);
            Vec::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::donation::{Coordinates, ImageUpload};
    use crate::models::profile::Role;
    use crate::services::storage_service::{DEMO_IMAGE_URL, MockStorage};
    use crate::store::JsonFileStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FixedGeocoder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, _address: &str) -> Option<Coordinates> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Some(Coordinates { lat: 12.5, lon: -3.25 })
        }
    }

    fn donor() -> AuthUser {
        AuthUser {
            id: "donor-1".to_string(),
            email: None,
            role: Some(Role::Donor),
            full_name: None,
        }
    }

    fn submission() -> DonationSubmission {
        DonationSubmission {
            food_category: Some("Packaged".to_string()),
            weight_kg: Some("12".to_string()),
            expiry_hours: Some("24".to_string()),
            pickup_instructions: Some("Loading bay".to_string()),
            image: Some(ImageUpload {
                file_name: "crates.png".to_string(),
                content_type: "image/png".to_string(),
                bytes: vec![1, 2, 3],
            }),
            ..Default::default()
        }
    }

    fn service() -> (TempDir, DonationService, Arc<FixedGeocoder>) {
        let dir = TempDir::new().unwrap();
        let store: Arc<dyn DataStore> = Arc::new(JsonFileStore::new(dir.path().join("db.json")));
        let geocoder = Arc::new(FixedGeocoder { calls: AtomicUsize::new(0) });
        let service = DonationService::new(store, Arc::new(MockStorage), geocoder.clone());
        (dir, service, geocoder)
    }

    #[tokio::test]
    async fn test_submit_lists_available_donation() {
        let (_dir, service, geocoder) = service();
        let before = Utc::now();

        let response = service.submit_donation(&donor(), submission()).await.unwrap();
        assert!(response.success);
        assert_eq!(response.message, "Donation submitted successfully");

        let feed = service.get_available_donations().await;
        assert_eq!(feed.len(), 1);
        let donation = &feed[0];
        assert_eq!(donation.donor_id, "donor-1");
        assert_eq!(donation.status, DonationStatus::Available);
        assert_eq!(donation.image_url.as_deref(), Some(DEMO_IMAGE_URL));
        assert!(!donation.is_verified);
        assert!(donation.latitude.is_none());
        assert!(donation.expiry_at >= before + chrono::Duration::hours(24));
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_address_is_geocoded_and_score_verifies() {
        let (_dir, service, geocoder) = service();
        let mut form = submission();
        form.pickup_address = Some("1 Market St".to_string());
        form.freshness_score = Some("9".to_string());

        service.submit_donation(&donor(), form).await.unwrap();

        let donation = service.get_available_donations().await.remove(0);
        assert_eq!(donation.latitude, Some(12.5));
        assert_eq!(donation.longitude, Some(-3.25));
        assert!(donation.is_verified);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_form_coordinates_skip_geocoding() {
        let (_dir, service, geocoder) = service();
        let mut form = submission();
        form.pickup_address = Some("1 Market St".to_string());
        form.latitude = Some("40.0".to_string());
        form.longitude = Some("-70.0".to_string());

        service.submit_donation(&donor(), form).await.unwrap();

        let donation = service.get_available_donations().await.remove(0);
        assert_eq!(donation.latitude, Some(40.0));
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_submission_stores_nothing() {
        let (_dir, service, _) = service();
        let mut form = submission();
        form.weight_kg = Some("-1".to_string());

        let err = service.submit_donation(&donor(), form).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationFailed(ref issues) if issues[0].field == "weight_kg"));
        assert!(service.get_available_donations().await.is_empty());
    }

    #[tokio::test]
    async fn test_unrepresentable_expiry_is_rejected_before_upload() {
        let (_dir, service, _) = service();
        let mut form = submission();
        form.expiry_hours = Some("1e13".to_string());

        let err = service.submit_donation(&donor(), form).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationFailed(ref issues) if issues[0].field == "expiry_hours"));
        assert!(service.get_available_donations().await.is_empty());
    }

    #[tokio::test]
    async fn test_feed_is_newest_first_and_available_only() {
        let (_dir, service, _) = service();
        service.submit_donation(&donor(), submission()).await.unwrap();
        let mut second = submission();
        second.pickup_instructions = Some("Second".to_string());
        service.submit_donation(&donor(), second).await.unwrap();

        let feed = service.get_available_donations().await;
        assert_eq!(feed.len(), 2);
        assert!(feed[0].created_at >= feed[1].created_at);

        service
            .store
            .update(
                &Query::from(Table::Donations).eq("id", feed[0].id.as_str()),
                serde_json::json!({ "status": "CLAIMED" }),
            )
            .await
            .unwrap();
        assert_eq!(service.get_available_donations().await.len(), 1);
    }
}
