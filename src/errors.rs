use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for the surplus-connect service
#[derive(Debug)]
pub enum SurplusError {
    // HTTP and API errors
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    InternalServer(String),

    // Data store errors
    StoreConnection(String),
    StoreQuery(String),
    StoreCorrupted(String),

    // External service errors
    AuthProvider(String),
    ImageUpload(String),
    AiRateLimited,
    AiUnavailable(String),
    AiResponseInvalid { raw: String },

    // Network and HTTP client errors
    NetworkTimeout,
    NetworkConnection(String),
    HttpClient(String),

    // Serialization and parsing errors
    JsonParsing(String),
    JsonSerialization(String),

    // Business logic errors
    DonationNotFound(String),
    DonationNotAvailable(String),
    TaskNotFound(String),
    TaskNotOpen(String),
    TaskNotAssignedToUser(String),
    ClaimFailed(String),

    // Validation errors
    ValidationFailed(Vec<ValidationError>),
    MissingRequiredField(String),

    // Configuration errors
    ConfigurationError(String),

    ServiceUnavailable(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl fmt::Display for SurplusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurplusError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            SurplusError::Unauthorized(msg) => write!(f, "{}", msg),
            SurplusError::NotFound(msg) => write!(f, "Not found: {}", msg),
            SurplusError::InternalServer(msg) => write!(f, "Internal server error: {}", msg),

            SurplusError::StoreConnection(msg) => write!(f, "Data store connection error: {}", msg),
            SurplusError::StoreQuery(msg) => write!(f, "Data store query error: {}", msg),
            SurplusError::StoreCorrupted(msg) => write!(f, "Data store is corrupted: {}", msg),

            SurplusError::AuthProvider(msg) => write!(f, "{}", msg),
            SurplusError::ImageUpload(msg) => write!(f, "Failed to upload image: {}", msg),
            SurplusError::AiRateLimited => write!(
                f,
                "AI Service is busy (Rate Limit Exceeded). Please try again in a minute."
            ),
            SurplusError::AiUnavailable(_) => write!(f, "AI Service currently unavailable."),
            SurplusError::AiResponseInvalid { .. } => write!(f, "Failed to parse AI response"),

            SurplusError::NetworkTimeout => write!(f, "Network request timed out"),
            SurplusError::NetworkConnection(msg) => write!(f, "Network connection error: {}", msg),
            SurplusError::HttpClient(msg) => write!(f, "HTTP client error: {}", msg),

            SurplusError::JsonParsing(msg) => write!(f, "JSON parsing error: {}", msg),
            SurplusError::JsonSerialization(msg) => write!(f, "JSON serialization error: {}", msg),

            SurplusError::DonationNotFound(id) => write!(f, "Donation not found: {}", id),
            SurplusError::DonationNotAvailable(id) => write!(f, "Donation is no longer available: {}", id),
            SurplusError::TaskNotFound(id) => write!(f, "Task not found: {}", id),
            SurplusError::TaskNotOpen(id) => write!(f, "Task is no longer open: {}", id),
            SurplusError::TaskNotAssignedToUser(_) => write!(f, "Task not found or not assigned to you"),
            SurplusError::ClaimFailed(_) => write!(f, "Failed to claim donation"),

            SurplusError::ValidationFailed(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            SurplusError::MissingRequiredField(message) => write!(f, "{}", message),

            SurplusError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),

            SurplusError::ServiceUnavailable(service) => write!(f, "Service unavailable: {}", service),
        }
    }
}

impl std::error::Error for SurplusError {}

impl IntoResponse for SurplusError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details) = match self {
            SurplusError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            SurplusError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            SurplusError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),

            SurplusError::ValidationFailed(errors) => {
                let details = serde_json::to_value(group_issues(&errors)).ok();
                (StatusCode::BAD_REQUEST, "validation_failed", "Validation failed".to_string(), details)
            }
            SurplusError::MissingRequiredField(message) => {
                (StatusCode::BAD_REQUEST, "missing_field", message, None)
            }

            SurplusError::AuthProvider(msg) => (StatusCode::BAD_REQUEST, "auth_error", msg, None),
            SurplusError::ImageUpload(msg) => (
                StatusCode::BAD_GATEWAY,
                "upload_failed",
                format!("Failed to upload image: {}", msg),
                None,
            ),

            SurplusError::AiRateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "ai_rate_limited",
                SurplusError::AiRateLimited.to_string(),
                None,
            ),
            SurplusError::AiUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "ai_unavailable",
                "AI Service currently unavailable.".to_string(),
                None,
            ),
            SurplusError::AiResponseInvalid { raw } => (
                StatusCode::BAD_GATEWAY,
                "ai_response_invalid",
                "Failed to parse AI response".to_string(),
                Some(serde_json::json!({ "raw": raw })),
            ),

            SurplusError::DonationNotFound(id) => (StatusCode::NOT_FOUND, "donation_not_found", format!("Donation not found: {}", id), None),
            SurplusError::DonationNotAvailable(id) => (StatusCode::CONFLICT, "donation_not_available", format!("Donation is no longer available: {}", id), None),
            SurplusError::TaskNotFound(id) => (StatusCode::NOT_FOUND, "task_not_found", format!("Task not found: {}", id), None),
            SurplusError::TaskNotOpen(id) => (StatusCode::CONFLICT, "task_not_open", format!("Task is no longer open: {}", id), None),
            SurplusError::TaskNotAssignedToUser(_) => (
                StatusCode::NOT_FOUND,
                "task_not_assigned",
                "Task not found or not assigned to you".to_string(),
                None,
            ),

            SurplusError::ServiceUnavailable(service) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", format!("Service unavailable: {}", service), None)
            }

            // Claim failures hide the underlying cause from the caller
            SurplusError::ClaimFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "claim_failed",
                "Failed to claim donation".to_string(),
                None,
            ),

            // All other errors are treated as internal server errors
            other => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", other.to_string(), None),
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, axum::Json(error_response)).into_response()
    }
}

/// Groups issues by field, keeping the order fields first appeared in.
fn group_issues(errors: &[ValidationError]) -> serde_json::Map<String, serde_json::Value> {
    let mut grouped = serde_json::Map::new();
    for error in errors {
        let entry = grouped
            .entry(error.field.clone())
            .or_insert_with(|| serde_json::Value::Array(Vec::new()));
        if let serde_json::Value::Array(messages) = entry {
            messages.push(serde_json::Value::String(error.message.clone()));
        }
    }
    grouped
}

// Convenience type alias for Results
pub type SurplusResult<T> = Result<T, SurplusError>;

impl From<reqwest::Error> for SurplusError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SurplusError::NetworkTimeout
        } else if err.is_connect() {
            SurplusError::NetworkConnection(err.to_string())
        } else {
            SurplusError::HttpClient(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SurplusError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_data() {
            SurplusError::JsonParsing(err.to_string())
        } else {
            SurplusError::JsonSerialization(err.to_string())
        }
    }
}

impl From<std::io::Error> for SurplusError {
    fn from(err: std::io::Error) -> Self {
        SurplusError::StoreConnection(err.to_string())
    }
}

impl From<axum::extract::multipart::MultipartError> for SurplusError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        SurplusError::BadRequest(format!("Malformed form data: {}", err))
    }
}

// Helper functions for creating common errors
impl SurplusError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        SurplusError::BadRequest(msg.into())
    }

    pub fn unauthorized() -> Self {
        SurplusError::Unauthorized("Unauthorized".to_string())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        SurplusError::NotFound(resource.into())
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        SurplusError::InternalServer(msg.into())
    }

    pub fn validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        SurplusError::ValidationFailed(vec![ValidationError {
            field: field.into(),
            message: message.into(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_display() {
        let error = SurplusError::TaskNotAssignedToUser("tsk-1".to_string());
        assert_eq!(error.to_string(), "Task not found or not assigned to you");
        assert_eq!(
            SurplusError::AiRateLimited.to_string(),
            "AI Service is busy (Rate Limit Exceeded). Please try again in a minute."
        );
    }

    #[test]
    fn test_validation_error() {
        let error = SurplusError::validation_error("weight_kg", "Number must be greater than 0");
        match error {
            SurplusError::ValidationFailed(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "weight_kg");
            }
            _ => panic!("Expected ValidationFailed error"),
        }
    }

    #[tokio::test]
    async fn test_validation_response_groups_by_field() {
        let error = SurplusError::ValidationFailed(vec![
            ValidationError { field: "image".into(), message: "Image is required".into() },
            ValidationError { field: "weight_kg".into(), message: "a".into() },
            ValidationError { field: "weight_kg".into(), message: "b".into() },
        ]);
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_failed");
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["details"]["weight_kg"], serde_json::json!(["a", "b"]));
        assert_eq!(body["details"]["image"], serde_json::json!(["Image is required"]));
    }

    #[tokio::test]
    async fn test_claim_failure_hides_cause() {
        let response = SurplusError::ClaimFailed("disk full".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Failed to claim donation");
    }

    #[test]
    fn test_helper_functions() {
        assert!(matches!(SurplusError::bad_request("test"), SurplusError::BadRequest(_)));
        assert!(matches!(SurplusError::unauthorized(), SurplusError::Unauthorized(_)));
        assert!(matches!(SurplusError::not_found("test"), SurplusError::NotFound(_)));
        assert!(matches!(SurplusError::internal_error("test"), SurplusError::InternalServer(_)));
    }
}
