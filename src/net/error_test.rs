use super::*;

// =============================================================================
// Display normalization
// =============================================================================

#[test]
fn api_error_displays_server_message() {
    let error = ApiError::Api {
        status: 403,
        message: "Forbidden: admin only".to_owned(),
    };
    assert_eq!(error.to_string(), "Forbidden: admin only");
}

#[test]
fn session_expired_uses_fixed_message() {
    assert_eq!(ApiError::SessionExpired.to_string(), SESSION_EXPIRED_MESSAGE);
}

#[test]
fn validation_error_displays_reason() {
    let error = ApiError::Validation("passwords do not match".to_owned());
    assert_eq!(error.to_string(), "passwords do not match");
}

// =============================================================================
// is_unauthorized
// =============================================================================

#[test]
fn api_401_is_unauthorized() {
    let error = ApiError::Api {
        status: 401,
        message: "Unauthorized".to_owned(),
    };
    assert!(error.is_unauthorized());
}

#[test]
fn session_expired_is_unauthorized() {
    assert!(ApiError::SessionExpired.is_unauthorized());
}

#[test]
fn other_failures_are_not_unauthorized() {
    let forbidden = ApiError::Api {
        status: 403,
        message: "Forbidden".to_owned(),
    };
    assert!(!forbidden.is_unauthorized());
    assert!(!ApiError::Network("timed out".to_owned()).is_unauthorized());
}
