//! Data models shared between the request client and the session manager.
//!
//! These mirror the backend's JSON contracts. Profile fields are optional
//! because cached snapshots may predate schema additions on the server.

use serde::{Deserialize, Serialize};

/// Username/password pair sent to `POST /login/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Payload for `POST /register/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Response of `POST /login/`: a short-lived access token plus the refresh
/// token used to mint replacements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Response of `POST /token/refresh/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access: String,
}

/// Donor-specific profile details nested under the user record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileDetails {
    #[serde(default)]
    pub blood_type: String,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub emergency_contact_name: String,
    #[serde(default)]
    pub emergency_contact_phone: String,
    #[serde(default)]
    pub emergency_contact_relationship: String,
    pub last_checkup: Option<String>,
    #[serde(default = "default_eligibility")]
    pub donation_eligibility: bool,
}

fn default_eligibility() -> bool {
    true
}

/// Denormalized snapshot of the authenticated user, as returned by
/// `GET /profile/` and persisted under the `user_data` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub profile: ProfileDetails,
}
