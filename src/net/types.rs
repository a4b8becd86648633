//! Wire types shared with the dashboard API.
//!
//! Field names follow the server's camelCase JSON; timestamps stay opaque
//! ISO-8601 strings because the client never does date arithmetic on them.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

/// Closed role set. Unknown roles fail deserialization rather than being
/// silently mapped to the least-privileged role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Supervisor,
    Enduser,
}

impl UserRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Supervisor => "supervisor",
            Self::Enduser => "enduser",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
}

/// A dashboard user as returned by the API.
///
/// The authoritative copy lives server-side; this is a cached snapshot
/// refreshed on login and on explicit profile fetch.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub is_verified: bool,
    pub status: UserStatus,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

// =============================================================================
// REQUEST PAYLOADS
// =============================================================================

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remember_me: Option<bool>,
}

impl LoginCredentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            remember_me: None,
        }
    }
}

/// Registration input. `confirm_password` is checked client-side and never
/// sent over the wire.
#[derive(Clone, Debug)]
pub struct RegisterCredentials {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Partial profile update; absent fields are left unchanged server-side.
#[derive(Clone, Debug, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

// =============================================================================
// RESPONSE PAYLOADS
// =============================================================================

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: User,
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Catch-all for endpoints that only return a human-readable message.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}
