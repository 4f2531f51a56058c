//! API client for the Matchday backend.
//!
//! This module provides the `ApiClient` struct wrapping `reqwest::Client`
//! with the auth endpoints and the bearer-token request helpers used by the
//! rest of the client.

use std::time::Duration;

use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{Event, UserProfile};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Deadline for login and register requests.
/// 30s allows for slow mobile networks while still failing fast enough for a form.
const LOGIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline for the token refresh request.
const REFRESH_TIMEOUT: Duration = Duration::from_secs(15);

/// Deadline for the startup verify request. Resume must not hang the app.
const VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadline for the best-effort logout request.
const LOGOUT_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadline for resource fetches (events, messages, reviews).
const RESOURCE_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-operation request deadlines. Each request carries its own deadline;
/// expiry cancels the in-flight request instead of hanging indefinitely.
#[derive(Debug, Clone)]
pub struct Timeouts {
    /// Applies to both login and register.
    pub login: Duration,
    pub refresh: Duration,
    pub verify: Duration,
    pub logout: Duration,
    pub resource: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            login: LOGIN_TIMEOUT,
            refresh: REFRESH_TIMEOUT,
            verify: VERIFY_TIMEOUT,
            logout: LOGOUT_TIMEOUT,
            resource: RESOURCE_TIMEOUT,
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    #[serde(rename = "rememberMe")]
    pub remember_me: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: &'a str,
    #[serde(rename = "rememberMe")]
    pub remember_me: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    /// Access-token lifetime in milliseconds.
    #[serde(rename = "expiresIn")]
    pub expires_in: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionInfo {
    pub duration: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthSuccess {
    pub user: UserProfile,
    pub tokens: TokenPair,
    #[serde(rename = "sessionInfo", default)]
    pub session_info: Option<SessionInfo>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub tokens: TokenPair,
    #[serde(rename = "rememberMe", default)]
    pub remember_me: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    user: UserProfile,
}

// ============================================================================
// Client
// ============================================================================

/// API client for the Matchday backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    timeouts: Timeouts,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client against the given base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeouts: Timeouts::default(),
            token: None,
        })
    }

    /// Override the per-operation deadlines.
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set or clear the bearer token for authenticated requests.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            timeouts: self.timeouts.clone(),
            token: Some(token.into()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ApiError::InvalidResponse(format!("Invalid bearer token: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    // ===== Auth endpoints =====

    /// Authenticate with email and password.
    pub async fn login(&self, request: &LoginRequest<'_>) -> Result<AuthSuccess, ApiError> {
        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .timeout(self.timeouts.login)
            .json(request)
            .send()
            .await
            .map_err(ApiError::from_transport)?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response).await
    }

    /// Create an account. Success shape matches `login`.
    pub async fn register(&self, request: &RegisterRequest<'_>) -> Result<AuthSuccess, ApiError> {
        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .timeout(self.timeouts.login)
            .json(request)
            .send()
            .await
            .map_err(ApiError::from_transport)?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response).await
    }

    /// Exchange a refresh token for a rotated token pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, ApiError> {
        let body = serde_json::json!({ "refreshToken": refresh_token });
        let response = self
            .client
            .post(self.url("/api/auth/refresh"))
            .timeout(self.timeouts.refresh)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::from_transport)?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response).await
    }

    /// Validate an access token and fetch the authoritative user profile.
    pub async fn verify(&self, access_token: &str) -> Result<UserProfile, ApiError> {
        let response = self
            .client
            .get(self.url("/api/auth/verify"))
            .timeout(self.timeouts.verify)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(ApiError::from_transport)?;
        let response = Self::check_response(response).await?;
        let verified: VerifyResponse = Self::parse_json(response).await?;
        Ok(verified.user)
    }

    /// Revoke the session server-side. The response body is ignored.
    pub async fn logout(&self, access_token: &str, refresh_token: &str) -> Result<(), ApiError> {
        let body = serde_json::json!({ "refreshToken": refresh_token });
        let response = self
            .client
            .post(self.url("/api/auth/logout"))
            .timeout(self.timeouts.logout)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::from_transport)?;
        Self::check_response(response).await?;
        Ok(())
    }

    // ===== Authenticated resource helpers =====

    /// GET a resource endpoint as JSON, carrying the bearer token if set.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .client
            .get(self.url(path))
            .timeout(self.timeouts.resource)
            .headers(self.auth_headers()?)
            .send()
            .await
            .map_err(ApiError::from_transport)?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response).await
    }

    /// POST to a resource endpoint, carrying the bearer token if set.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .client
            .post(self.url(path))
            .timeout(self.timeouts.resource)
            .headers(self.auth_headers()?)
            .json(body)
            .send()
            .await
            .map_err(ApiError::from_transport)?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response).await
    }

    async fn get_text(&self, path: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .get(self.url(path))
            .timeout(self.timeouts.resource)
            .headers(self.auth_headers()?)
            .send()
            .await
            .map_err(ApiError::from_transport)?;
        let response = Self::check_response(response).await?;
        response
            .text()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    /// Parse a list response that may be a bare array or wrapped in an object
    /// under `field` or `data`.
    fn parse_list<T: DeserializeOwned>(text: &str, field: &str) -> Result<Vec<T>, ApiError> {
        if let Ok(items) = serde_json::from_str::<Vec<T>>(text) {
            return Ok(items);
        }

        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        for key in [field, "data"] {
            if let Some(inner) = value.get(key) {
                return serde_json::from_value(inner.clone())
                    .map_err(|e| ApiError::InvalidResponse(e.to_string()));
            }
        }
        Ok(vec![])
    }

    /// Fetch events visible to the current user.
    pub async fn fetch_events(&self) -> Result<Vec<Event>, ApiError> {
        let text = self.get_text("/api/events").await?;
        debug!("Events response received");
        Self::parse_list(&text, "events")
    }

    /// Fetch events near a location. Radius is in meters; the proximity query
    /// itself is delegated to the backend's geospatial index.
    pub async fn fetch_nearby_events(
        &self,
        latitude: f64,
        longitude: f64,
        radius_m: u32,
    ) -> Result<Vec<Event>, ApiError> {
        let path = format!(
            "/api/events/nearby?lat={}&lng={}&radius={}",
            latitude, longitude, radius_m
        );
        let text = self.get_text(&path).await?;
        debug!(latitude, longitude, radius_m, "Nearby events response received");
        Self::parse_list(&text, "events")
    }
}
