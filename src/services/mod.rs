// src/services/mod.rs
pub mod auth_service;
pub mod donation_service;
pub mod geocoding_service;
pub mod inspection_service;
pub mod logistics_service;
pub mod storage_service;
pub mod volunteer_service;

pub use auth_service::{AuthOperations, AuthProvider, AuthService, AuthUser, ManagedAuth, MockAuth};
pub use donation_service::{DonationOperations, DonationService};
pub use geocoding_service::{Geocoder, NominatimGeocoder, NoopGeocoder};
pub use inspection_service::{FoodInspector, GeminiInspector, MockInspector};
pub use logistics_service::{LogisticsOperations, LogisticsService};
pub use storage_service::{ImageStorage, ManagedStorage, MockStorage};
pub use volunteer_service::{VolunteerOperations, VolunteerService};
