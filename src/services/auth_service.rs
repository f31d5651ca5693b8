// src/services/auth_service.rs
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing;
use uuid::Uuid;

use crate::{
    config::BackendConfig,
    errors::{SurplusError as AppError, SurplusResult},
    models::profile::{LoginRequest, LoginResponse, Profile, Role, SignUpRequest},
    store::{DataStore, Query, Table},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub user: AuthUser,
}

#[derive(Debug, Clone)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub organization_name: Option<String>,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError>;
    async fn sign_up(&self, sign_up: SignUp) -> Result<AuthUser, AppError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), AppError>;
    async fn get_user(&self, access_token: Option<&str>) -> Result<Option<AuthUser>, AppError>;
}

// Managed backend (GoTrue-style endpoints)
pub struct ManagedAuth {
    client: reqwest::Client,
    config: BackendConfig,
}

impl ManagedAuth {
    pub fn new(client: reqwest::Client, config: BackendConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.url.trim_end_matches('/'), path)
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        ["msg", "error_description", "message", "error"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Authentication failed ({})", status))
    }
}

/// Maps an auth user object, reading role and name from its metadata.
pub fn user_from_json(user: &Value) -> Option<AuthUser> {
    let id = user.get("id")?.as_str()?.to_string();
    let metadata = user.get("user_metadata");
    let meta_str = |key: &str| {
        metadata
            .and_then(|m| m.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    Some(AuthUser {
        id,
        email: user.get("email").and_then(Value::as_str).map(str::to_string),
        role: meta_str("role").and_then(|r| r.parse().ok()),
        full_name: meta_str("full_name"),
    })
}

#[async_trait]
impl AuthProvider for ManagedAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let response = self
            .client
            .post(self.endpoint("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.config.key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::AuthProvider(Self::error_message(response).await));
        }

        let body: Value = response.json().await?;
        let access_token = body
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::AuthProvider("Missing access token".to_string()))?
            .to_string();
        let user = body
            .get("user")
            .and_then(user_from_json)
            .ok_or_else(|| AppError::AuthProvider("Missing user".to_string()))?;

        Ok(Session { access_token, user })
    }

    async fn sign_up(&self, sign_up: SignUp) -> Result<AuthUser, AppError> {
        let response = self
            .client
            .post(self.endpoint("signup"))
            .header("apikey", &self.config.key)
            .json(&json!({
                "email": sign_up.email,
                "password": sign_up.password,
                "data": {
                    "full_name": sign_up.full_name,
                    "role": sign_up.role,
                    "organization_name": sign_up.organization_name,
                },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::AuthProvider(Self::error_message(response).await));
        }

        // Either a bare user or a session wrapping one, depending on confirmation settings
        let body: Value = response.json().await?;
        body.get("user")
            .and_then(user_from_json)
            .or_else(|| user_from_json(&body))
            .ok_or_else(|| AppError::AuthProvider("Missing user".to_string()))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        let response = self
            .client
            .post(self.endpoint("logout"))
            .header("apikey", &self.config.key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!("Sign out returned {}", response.status());
        }
        Ok(())
    }

    async fn get_user(&self, access_token: Option<&str>) -> Result<Option<AuthUser>, AppError> {
        let Some(token) = access_token else {
            return Ok(None);
        };

        let response = self
            .client
            .get(self.endpoint("user"))
            .header("apikey", &self.config.key)
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::debug!("Token rejected by auth backend: {}", response.status());
            return Ok(None);
        }

        let body: Value = response.json().await?;
        Ok(user_from_json(&body))
    }
}

// Offline auth over the mock profiles table
pub struct MockAuth {
    store: Arc<dyn DataStore>,
}

impl MockAuth {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    fn to_auth_user(profile: Profile) -> AuthUser {
        AuthUser {
            id: profile.id,
            email: Some("demo@example.com".to_string()),
            role: Some(profile.role),
            full_name: profile.full_name,
        }
    }

    async fn default_user(&self) -> Result<Option<Profile>, AppError> {
        let profiles: Vec<Profile> = self.store.fetch_all(&Query::from(Table::Profiles)).await?;
        let donor = profiles.iter().position(|p| p.role == Role::Donor).unwrap_or(0);
        Ok(profiles.into_iter().nth(donor))
    }
}

#[async_trait]
impl AuthProvider for MockAuth {
    async fn sign_in(&self, email: &str, _password: &str) -> Result<Session, AppError> {
        let local_part = email.split('@').next().unwrap_or_default().to_uppercase();

        let by_role = match local_part.parse::<Role>() {
            Ok(role) => {
                self.store
                    .fetch_one::<Profile>(&Query::from(Table::Profiles).eq("role", role.as_str()))
                    .await?
            }
            Err(_) => None,
        };

        let profile = match by_role {
            Some(profile) => profile,
            None => self
                .default_user()
                .await?
                .ok_or_else(|| AppError::AuthProvider("No demo profiles available".to_string()))?,
        };

        tracing::info!("[MOCK] Signed in as {} ({})", profile.id, profile.role);
        Ok(Session {
            access_token: profile.id.clone(),
            user: Self::to_auth_user(profile),
        })
    }

    async fn sign_up(&self, sign_up: SignUp) -> Result<AuthUser, AppError> {
        let mut profile = Profile::new(
            Uuid::new_v4().to_string(),
            sign_up.full_name.clone().unwrap_or_default(),
            sign_up.role,
        );
        profile.full_name = sign_up.full_name;
        profile.organization_name = sign_up.organization_name;

        let stored: Profile = self.store.insert_as(Table::Profiles, &profile).await?;
        tracing::info!("[MOCK] Registered {} as {}", sign_up.email, stored.role);

        let mut user = Self::to_auth_user(stored);
        user.email = Some(sign_up.email);
        Ok(user)
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AppError> {
        tracing::info!("[MOCK] Signed out");
        Ok(())
    }

    async fn get_user(&self, access_token: Option<&str>) -> Result<Option<AuthUser>, AppError> {
        if let Some(token) = access_token {
            let query = Query::from(Table::Profiles).eq("id", token);
            if let Some(profile) = self.store.fetch_one::<Profile>(&query).await? {
                return Ok(Some(Self::to_auth_user(profile)));
            }
        }

        Ok(self.default_user().await?.map(Self::to_auth_user))
    }
}

#[async_trait]
pub trait AuthOperations: Send + Sync {
    async fn signup(&self, request: SignUpRequest) -> Result<AuthUser, AppError>;
    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError>;
    async fn logout(&self, access_token: Option<&str>) -> Result<(), AppError>;
    async fn get_user_role(&self, access_token: Option<&str>) -> Result<Option<Role>, AppError>;
    async fn current_user(&self, access_token: Option<&str>) -> Result<AuthUser, AppError>;
}

pub struct AuthService {
    provider: Arc<dyn AuthProvider>,
}

impl AuthService {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self { provider }
    }
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[async_trait]
impl AuthOperations for AuthService {
    async fn signup(&self, request: SignUpRequest) -> Result<AuthUser, AppError> {
        let (Some(email), Some(password), Some(role)) = (
            required(request.email),
            required(request.password),
            required(request.role),
        ) else {
            return Err(AppError::MissingRequiredField("Missing required fields".to_string()));
        };

        let role: Role = role
            .parse()
            .map_err(|message: String| AppError::validation_error("role", message))?;

        tracing::info!("Registering {} as {}", email, role);

        let user = self
            .provider
            .sign_up(SignUp {
                email,
                password,
                full_name: request.full_name,
                role,
                organization_name: match role {
                    Role::Ngo => request.organization_name,
                    _ => None,
                },
            })
            .await?;

        tracing::info!("Registered user {}", user.id);
        Ok(user)
    }

    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        let (Some(email), Some(password)) = (required(request.email), required(request.password)) else {
            return Err(AppError::MissingRequiredField("Email and password are required".to_string()));
        };

        let session = self.provider.sign_in(&email, &password).await?;
        tracing::info!("User logged in: {}", session.user.id);

        Ok(LoginResponse {
            redirect_to: session
                .user
                .role
                .map(|r| r.dashboard_path())
                .unwrap_or(Role::Donor.dashboard_path())
                .to_string(),
            access_token: session.access_token,
            user_id: session.user.id,
            role: session.user.role,
        })
    }

    async fn logout(&self, access_token: Option<&str>) -> Result<(), AppError> {
        if let Some(token) = access_token {
            self.provider.sign_out(token).await?;
        }
        Ok(())
    }

    async fn get_user_role(&self, access_token: Option<&str>) -> Result<Option<Role>, AppError> {
        Ok(self
            .provider
            .get_user(access_token)
            .await?
            .and_then(|user| user.role))
    }

    async fn current_user(&self, access_token: Option<&str>) -> SurplusResult<AuthUser> {
        self.provider
            .get_user(access_token)
            .await?
            .ok_or_else(AppError::unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonFileStore;
    use tempfile::TempDir;

    fn service() -> (TempDir, AuthService, Arc<dyn DataStore>) {
        let dir = TempDir::new().unwrap();
        let store: Arc<dyn DataStore> = Arc::new(JsonFileStore::new(dir.path().join("db.json")));
        let service = AuthService::new(Arc::new(MockAuth::new(store.clone())));
        (dir, service, store)
    }

    #[tokio::test]
    async fn test_default_user_is_demo_donor() {
        let (_dir, service, _) = service();
        let user = service.current_user(None).await.unwrap();
        assert_eq!(user.id, "donor-1");
        assert_eq!(service.get_user_role(None).await.unwrap(), Some(Role::Donor));
    }

    #[tokio::test]
    async fn test_token_selects_profile() {
        let (_dir, service, _) = service();
        let user = service.current_user(Some("volunteer-1")).await.unwrap();
        assert_eq!(user.role, Some(Role::Volunteer));

        let fallback = service.current_user(Some("nobody")).await.unwrap();
        assert_eq!(fallback.id, "donor-1");
    }

    #[tokio::test]
    async fn test_login_requires_credentials() {
        let (_dir, service, _) = service();
        let err = service
            .login(LoginRequest { email: Some("ngo@example.com".into()), password: None })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Email and password are required");
    }

    #[tokio::test]
    async fn test_login_picks_role_from_email() {
        let (_dir, service, _) = service();
        let response = service
            .login(LoginRequest {
                email: Some("ngo@example.com".into()),
                password: Some("secret".into()),
            })
            .await
            .unwrap();
        assert_eq!(response.user_id, "ngo-1");
        assert_eq!(response.access_token, "ngo-1");
        assert_eq!(response.redirect_to, "/dashboard/ngo");
    }

    #[tokio::test]
    async fn test_signup_validates_and_drops_org_for_non_ngo() {
        let (_dir, service, store) = service();

        let missing = service.signup(SignUpRequest::default()).await;
        assert!(matches!(missing, Err(AppError::MissingRequiredField(_))));

        let bad_role = service
            .signup(SignUpRequest {
                email: Some("a@b.c".into()),
                password: Some("pw".into()),
                role: Some("ADMIN".into()),
                ..Default::default()
            })
            .await;
        assert!(matches!(bad_role, Err(AppError::ValidationFailed(_))));

        let user = service
            .signup(SignUpRequest {
                email: Some("helper@b.c".into()),
                password: Some("pw".into()),
                full_name: Some("Helper".into()),
                role: Some("VOLUNTEER".into()),
                organization_name: Some("Ignored Org".into()),
            })
            .await
            .unwrap();
        assert_eq!(user.email.as_deref(), Some("helper@b.c"));

        let profile: Profile = store
            .fetch_one(&Query::from(Table::Profiles).eq("id", user.id.as_str()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.role, Role::Volunteer);
        assert!(profile.organization_name.is_none());
        assert_eq!(profile.points, 0);
    }

    #[test]
    fn test_user_from_json_reads_metadata() {
        let user = user_from_json(&json!({
            "id": "u1",
            "email": "x@y.z",
            "user_metadata": { "role": "NGO", "full_name": "Food Bank" },
        }))
        .unwrap();
        assert_eq!(user.role, Some(Role::Ngo));
        assert_eq!(user.full_name.as_deref(), Some("Food Bank"));

        assert!(user_from_json(&json!({ "email": "x@y.z" })).is_none());
    }

    fn managed(base_url: &str) -> ManagedAuth {
        ManagedAuth::new(
            reqwest::Client::new(),
            BackendConfig { url: base_url.to_string(), key: "service-key".to_string() },
        )
    }

    #[tokio::test]
    async fn test_managed_sign_in_reads_session() {
        use crate::test_support::canned;
        use axum::http::StatusCode;

        let session = json!({
            "access_token": "jwt-123",
            "user": {
                "id": "u-1",
                "email": "ngo@example.com",
                "user_metadata": { "role": "NGO", "full_name": "Food Bank Central" },
            },
        });
        let (base_url, log) = canned(StatusCode::OK, session).await;

        let session = managed(&base_url).sign_in("ngo@example.com", "pw").await.unwrap();
        assert_eq!(session.access_token, "jwt-123");
        assert_eq!(session.user.role, Some(Role::Ngo));
        assert_eq!(session.user.full_name.as_deref(), Some("Food Bank Central"));

        let requests = log.lock().unwrap();
        assert_eq!(requests[0].path, "/auth/v1/token");
        assert_eq!(requests[0].query, "grant_type=password");
        assert_eq!(requests[0].header("apikey"), Some("service-key"));
        assert_eq!(requests[0].body["email"], "ngo@example.com");
    }

    #[tokio::test]
    async fn test_managed_sign_in_surfaces_backend_message() {
        use crate::test_support::canned;
        use axum::http::StatusCode;

        let (base_url, _) = canned(
            StatusCode::BAD_REQUEST,
            json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" }),
        )
        .await;

        let err = managed(&base_url).sign_in("ngo@example.com", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[tokio::test]
    async fn test_managed_rejected_token_is_anonymous() {
        use crate::test_support::canned;
        use axum::http::StatusCode;

        let (base_url, log) = canned(StatusCode::UNAUTHORIZED, json!({ "msg": "bad jwt" })).await;
        let user = managed(&base_url).get_user(Some("expired")).await.unwrap();
        assert_eq!(user, None);
        assert_eq!(log.lock().unwrap()[0].header("authorization"), Some("Bearer expired"));
    }
}
