//! Normalized API errors.
//!
//! ERROR HANDLING
//! ==============
//! Callers never inspect transport-specific error shapes. Every failure is
//! normalized here to a displayable message (the server's `message` field
//! when one exists) so UI layers can surface `error.to_string()` directly.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

/// Message shown whenever a refresh failure forces a logout.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx response, carrying the server's message when present.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The refresh token itself was rejected; the session has been torn
    /// down and the user must log in again.
    #[error("{SESSION_EXPIRED_MESSAGE}")]
    SessionExpired,

    /// Connection failure or request timeout.
    #[error("network error: {0}")]
    Network(String),

    /// The server replied with a payload we could not decode.
    #[error("invalid response payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// Client construction failed (bad base URL, TLS setup, ...).
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// True for 401-class responses (including a torn-down session).
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 401,
            Self::SessionExpired => true,
            _ => false,
        }
    }
}
