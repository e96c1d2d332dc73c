//! Typed wrappers over the backend's REST routes.
//!
//! Everything here is a thin delegation to [`ApiClient::request`]; the retry
//! and refresh behavior lives in the client, not in the wrappers.

use std::time::Duration;

use app_core::{Credentials, RegisterRequest, TokenPair, UserProfile};
use log::warn;
use serde_json::Value;
use storage_manager::{KeyValueStorage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_DATA_KEY};

use crate::client::{ApiClient, RequestOptions};
use crate::error::{ApiError, Result};

pub const REGISTER_ENDPOINT: &str = "/register/";
pub const LOGIN_ENDPOINT: &str = "/login/";
pub const REFRESH_ENDPOINT: &str = "/token/refresh/";
pub const PROFILE_ENDPOINT: &str = "/profile/";
pub const LOGOUT_ENDPOINT: &str = "/logout/";
pub const HEALTH_ENDPOINT: &str = "/health/";

const CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(5);

impl ApiClient {
    /// Create a new account. Registration does not authenticate; the caller
    /// follows up with [`ApiClient::login`].
    pub async fn register(&self, user_data: &RegisterRequest) -> Result<Value> {
        let body = serde_json::to_value(user_data).map_err(|_| ApiError::InvalidServerResponse)?;
        self.request(REGISTER_ENDPOINT, RequestOptions::post(body))
            .await
    }

    /// Exchange credentials for a token pair and persist both tokens.
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenPair> {
        let body =
            serde_json::to_value(credentials).map_err(|_| ApiError::InvalidServerResponse)?;
        let value = self.request(LOGIN_ENDPOINT, RequestOptions::post(body)).await?;

        let tokens: TokenPair =
            serde_json::from_value(value).map_err(|_| ApiError::InvalidServerResponse)?;
        self.storage().set(ACCESS_TOKEN_KEY, &tokens.access).await?;
        self.storage().set(REFRESH_TOKEN_KEY, &tokens.refresh).await?;
        Ok(tokens)
    }

    /// Best-effort server-side logout. The caller clears local state
    /// unconditionally afterwards, whatever this returns.
    pub async fn logout_server(&self) -> Result<()> {
        self.request(LOGOUT_ENDPOINT, RequestOptions::post_empty())
            .await
            .map(|_| ())
    }

    pub async fn get_profile(&self) -> Result<UserProfile> {
        let value = self.request(PROFILE_ENDPOINT, RequestOptions::get()).await?;
        serde_json::from_value(value).map_err(|_| ApiError::InvalidServerResponse)
    }

    pub async fn update_profile(&self, fields: Value) -> Result<UserProfile> {
        let value = self
            .request(PROFILE_ENDPOINT, RequestOptions::put(fields))
            .await?;
        serde_json::from_value(value).map_err(|_| ApiError::InvalidServerResponse)
    }

    /// Read the persisted profile snapshot. A missing or unparseable cache
    /// reads as `None`; the cache is best-effort by design.
    pub async fn cached_profile(&self) -> Option<UserProfile> {
        let raw = match self.storage().get(USER_DATA_KEY).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read cached profile: {e}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!("Discarding unparseable cached profile: {e}");
                None
            }
        }
    }

    pub async fn cache_profile(&self, profile: &UserProfile) -> Result<()> {
        let serialized =
            serde_json::to_string(profile).map_err(|_| ApiError::InvalidServerResponse)?;
        self.storage().set(USER_DATA_KEY, &serialized).await?;
        Ok(())
    }

    pub async fn clear_cached_profile(&self) -> Result<()> {
        self.storage().remove(&[USER_DATA_KEY]).await?;
        Ok(())
    }

    /// Quick reachability probe against `/health/`. Never errors; any
    /// failure just reads as "offline".
    pub async fn check_connectivity(&self) -> bool {
        let url = format!("{}{}", self.api_base(), HEALTH_ENDPOINT);
        match self
            .http()
            .get(&url)
            .timeout(CONNECTIVITY_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    // ---- Donation platform resources ----
    // List/create wrappers used by the dashboard, scheduling, and emergency
    // screens. They return raw JSON; the screens own the presentation shape.

    pub async fn donation_centers(&self) -> Result<Value> {
        self.request("/donation-centers/", RequestOptions::get()).await
    }

    pub async fn donation_history(&self) -> Result<Value> {
        self.request("/donations/", RequestOptions::get()).await
    }

    pub async fn appointments(&self) -> Result<Value> {
        self.request("/appointments/", RequestOptions::get()).await
    }

    pub async fn create_appointment(&self, appointment: Value) -> Result<Value> {
        self.request("/appointments/", RequestOptions::post(appointment))
            .await
    }

    pub async fn cancel_appointment(&self, id: i64) -> Result<()> {
        self.request(&format!("/appointments/{id}/"), RequestOptions::delete())
            .await
            .map(|_| ())
    }

    pub async fn emergency_requests(&self) -> Result<Value> {
        self.request("/emergency-requests/", RequestOptions::get())
            .await
    }

    pub async fn respond_to_emergency(&self, response: Value) -> Result<Value> {
        self.request("/emergency-responses/", RequestOptions::post(response))
            .await
    }

    // ---- Medical history resources ----

    pub async fn allergies(&self) -> Result<Value> {
        self.request("/allergies/", RequestOptions::get()).await
    }

    pub async fn add_allergy(&self, allergy: Value) -> Result<Value> {
        self.request("/allergies/", RequestOptions::post(allergy)).await
    }

    pub async fn remove_allergy(&self, id: i64) -> Result<()> {
        self.request(&format!("/allergies/{id}/"), RequestOptions::delete())
            .await
            .map(|_| ())
    }

    pub async fn medications(&self) -> Result<Value> {
        self.request("/medications/", RequestOptions::get()).await
    }

    pub async fn add_medication(&self, medication: Value) -> Result<Value> {
        self.request("/medications/", RequestOptions::post(medication))
            .await
    }

    pub async fn medical_conditions(&self) -> Result<Value> {
        self.request("/medical-conditions/", RequestOptions::get())
            .await
    }

    pub async fn add_medical_condition(&self, condition: Value) -> Result<Value> {
        self.request("/medical-conditions/", RequestOptions::post(condition))
            .await
    }
}
