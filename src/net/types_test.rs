use super::*;

use serde_json::json;

// =============================================================================
// Role and status encoding
// =============================================================================

#[test]
fn roles_serialize_lowercase() {
    assert_eq!(serde_json::to_value(UserRole::Admin).unwrap(), json!("admin"));
    assert_eq!(serde_json::to_value(UserRole::Supervisor).unwrap(), json!("supervisor"));
    assert_eq!(serde_json::to_value(UserRole::Enduser).unwrap(), json!("enduser"));
}

#[test]
fn unknown_role_fails_deserialization() {
    assert!(serde_json::from_value::<UserRole>(json!("superadmin")).is_err());
}

#[test]
fn role_as_str_matches_wire_form() {
    for role in [UserRole::Admin, UserRole::Supervisor, UserRole::Enduser] {
        assert_eq!(json!(role), json!(role.as_str()));
    }
}

#[test]
fn statuses_round_trip() {
    for status in [UserStatus::Active, UserStatus::Inactive, UserStatus::Suspended] {
        let encoded = serde_json::to_value(status).unwrap();
        assert_eq!(serde_json::from_value::<UserStatus>(encoded).unwrap(), status);
    }
}

// =============================================================================
// User
// =============================================================================

fn user_json() -> serde_json::Value {
    json!({
        "_id": "64a1",
        "username": "alice",
        "email": "alice@example.com",
        "role": "admin",
        "isVerified": true,
        "status": "active",
        "createdAt": "2025-01-01T00:00:00Z",
        "updatedAt": "2025-02-01T00:00:00Z"
    })
}

#[test]
fn user_deserializes_from_camel_case() {
    let user: User = serde_json::from_value(user_json()).unwrap();
    assert_eq!(user.id, "64a1");
    assert_eq!(user.role, UserRole::Admin);
    assert!(user.is_verified);
    assert_eq!(user.status, UserStatus::Active);
}

#[test]
fn user_optional_fields_default_to_none() {
    let user: User = serde_json::from_value(user_json()).unwrap();
    assert!(user.last_login.is_none());
    assert!(user.profile_picture.is_none());
}

#[test]
fn user_serializes_id_back_to_underscore_form() {
    let user: User = serde_json::from_value(user_json()).unwrap();
    let encoded = serde_json::to_value(&user).unwrap();
    assert_eq!(encoded.get("_id"), Some(&json!("64a1")));
    assert!(encoded.get("profilePicture").is_none());
}

// =============================================================================
// Payloads
// =============================================================================

#[test]
fn login_credentials_omit_absent_remember_me() {
    let encoded = serde_json::to_value(LoginCredentials::new("alice", "Secret123!")).unwrap();
    assert_eq!(encoded, json!({ "username": "alice", "password": "Secret123!" }));
}

#[test]
fn auth_response_tolerates_missing_refresh_token() {
    let response: AuthResponse = serde_json::from_value(json!({
        "accessToken": "AT1",
        "user": user_json(),
    }))
    .unwrap();
    assert_eq!(response.access_token, "AT1");
    assert!(response.refresh_token.is_none());
}

#[test]
fn profile_update_skips_absent_fields() {
    let update = ProfileUpdate {
        email: Some("new@example.com".to_owned()),
        ..ProfileUpdate::default()
    };
    assert_eq!(serde_json::to_value(update).unwrap(), json!({ "email": "new@example.com" }));
}
