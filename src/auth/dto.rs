use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for account creation. Fields default to empty so that a
/// missing field is reported by validation rather than rejected by the
/// JSON deserializer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for a profile picture change. The image travels as a
/// base64 data URL.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub profile_pic: Option<String>,
}

/// Public part of the user returned after signup and login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub profile_pic: String,
}

/// Plain confirmation message, e.g. after logout.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub message: String,
}
