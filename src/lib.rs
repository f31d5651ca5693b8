pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;

#[cfg(test)]
mod test_support;


// Re-export commonly used types
pub use errors::{SurplusError, SurplusResult, ValidationError};
pub use handlers::router;
pub use state::AppState;
