// src/state.rs
use std::sync::Arc;

use crate::{
    config::AppConfig,
    errors::SurplusResult,
    services::{
        AuthOperations, AuthProvider, AuthService, DonationOperations, DonationService, FoodInspector,
        GeminiInspector, Geocoder, ImageStorage, LogisticsOperations, LogisticsService, ManagedAuth,
        ManagedStorage, MockAuth, MockInspector, MockStorage, NominatimGeocoder, VolunteerOperations,
        VolunteerService,
    },
    store::{DataStore, JsonFileStore, RestStore},
};

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthOperations>,
    pub donation_service: Arc<dyn DonationOperations>,
    pub logistics_service: Arc<dyn LogisticsOperations>,
    pub volunteer_service: Arc<dyn VolunteerOperations>,
    pub inspector: Arc<dyn FoodInspector>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> SurplusResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.geocoder_user_agent.as_str())
            .build()?;

        let store: Arc<dyn DataStore>;
        let auth: Arc<dyn AuthProvider>;
        let storage: Arc<dyn ImageStorage>;
        match &config.backend {
            Some(backend) => {
                tracing::info!("Using managed backend at {}", backend.url);
                store = Arc::new(RestStore::new(client.clone(), &backend.url, &backend.key));
                auth = Arc::new(ManagedAuth::new(client.clone(), backend.clone()));
                storage = Arc::new(ManagedStorage::new(client.clone(), backend.clone(), &config.image_bucket));
            }
            None => {
                tracing::warn!("Backend not configured, using mock store at {}", config.mock_db_path);
                store = Arc::new(JsonFileStore::new(&config.mock_db_path));
                auth = Arc::new(MockAuth::new(store.clone()));
                storage = Arc::new(MockStorage);
            }
        }

        let inspector: Arc<dyn FoodInspector> = match &config.gemini_api_key {
            Some(api_key) => Arc::new(
                GeminiInspector::new(client.clone(), api_key, &config.gemini_model).with_base_url(&config.gemini_url),
            ),
            None => {
                tracing::warn!("GEMINI_API_KEY not set, using mock food inspector");
                Arc::new(MockInspector)
            }
        };

        let geocoder: Arc<dyn Geocoder> = Arc::new(NominatimGeocoder::new(
            client,
            &config.geocoder_url,
            &config.geocoder_user_agent,
        ));

        Ok(Self::from_parts(config, store, auth, storage, geocoder, inspector))
    }

    /// Wires the services over already-built backends.
    pub fn from_parts(
        config: AppConfig,
        store: Arc<dyn DataStore>,
        auth: Arc<dyn AuthProvider>,
        storage: Arc<dyn ImageStorage>,
        geocoder: Arc<dyn Geocoder>,
        inspector: Arc<dyn FoodInspector>,
    ) -> Self {
        Self {
            auth_service: Arc::new(AuthService::new(auth)),
            donation_service: Arc::new(DonationService::new(store.clone(), storage, geocoder)),
            logistics_service: Arc::new(LogisticsService::new(store.clone())),
            volunteer_service: Arc::new(VolunteerService::new(store)),
            inspector,
            config,
        }
    }
}
