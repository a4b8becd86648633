//! The intercepting API client.
//!
//! ARCHITECTURE
//! ============
//! Every outbound call reads the access token from the live session (not
//! the credential store, which may lag behind an in-flight rotation) and
//! attaches it as a bearer credential. A 401 response triggers the refresh
//! path exactly once per request: obtain a fresh access token, re-issue the
//! original request once, and propagate whatever comes back.
//!
//! Refresh is coalesced behind an async mutex. When several requests fail
//! on the same expired token, the first caller through the gate performs
//! the one `/auth/refresh` call; the rest wait, then find either a rotated
//! token (reuse it) or a torn-down session (fail with the same expiry
//! error). One failure wave, one refresh, one outcome for everyone.
//!
//! ERROR HANDLING
//! ==============
//! Refresh failure is fatal to the session: the store is cleared, the
//! session resets to anonymous with the "session expired" message, and the
//! original request fails. It is never retried beyond the coalesced single
//! attempt, so a failure wave always terminates in a clean logged-out state.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;

use crate::net::error::{ApiError, SESSION_EXPIRED_MESSAGE};
use crate::net::transport::{ApiRequest, ApiResponse, Transport};
use crate::net::types::{
    AuthResponse, LoginCredentials, MessageResponse, ProfileUpdate, RefreshResponse,
    RegisterCredentials, User,
};
use crate::state::session::Session;
use crate::store::{CredentialPair, CredentialStore};

pub(crate) const LOGIN_PATH: &str = "/auth/login";
pub(crate) const SIGNUP_PATH: &str = "/auth/signup";
pub(crate) const REFRESH_PATH: &str = "/auth/refresh";
pub(crate) const LOGOUT_PATH: &str = "/auth/logout";
pub(crate) const LOGOUT_ALL_PATH: &str = "/auth/logout-all";
pub(crate) const PROFILE_PATH: &str = "/profile";
pub(crate) const CHANGE_PASSWORD_PATH: &str = "/change-password";
pub(crate) const FORGOT_PASSWORD_PATH: &str = "/forgot-password";
pub(crate) const RESET_PASSWORD_PATH: &str = "/reset-password";
pub(crate) const VERIFY_EMAIL_PATH: &str = "/verify-email";
pub(crate) const RESEND_VERIFICATION_PATH: &str = "/resend-verification";

/// API client wrapping a [`Transport`] with bearer attachment and the
/// coalesced refresh-and-retry behavior.
///
/// Constructed explicitly from its collaborators so tests can inject fakes.
pub struct ApiClient<T: Transport> {
    transport: T,
    session: Session,
    store: Arc<dyn CredentialStore>,
    refresh_gate: tokio::sync::Mutex<()>,
}

impl<T: Transport> ApiClient<T> {
    #[must_use]
    pub fn new(transport: T, session: Session, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            transport,
            session,
            store,
            refresh_gate: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    // =========================================================================
    // REQUEST PIPELINE
    // =========================================================================

    /// Send one API call through the interceptor.
    ///
    /// A missing access token is not an error here; the request goes out
    /// unauthenticated and the server decides.
    ///
    /// # Errors
    ///
    /// Any non-2xx outcome after at most one refresh-and-retry, normalized
    /// to [`ApiError`].
    pub async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, ApiError> {
        let token = self.session.access_token();
        let response = self
            .transport
            .send(build_request(&method, path, token.clone(), body.as_ref()))
            .await?;
        if response.status != 401 {
            return into_result(response);
        }

        let fresh = self.refresh_after_unauthorized(token.as_deref(), &response).await?;
        let retried = self
            .transport
            .send(build_request(&method, path, Some(fresh), body.as_ref()))
            .await?;
        // Single retry: a second 401 propagates without another refresh.
        into_result(retried)
    }

    /// Resolve a 401 into a usable access token, or the error to fail with.
    ///
    /// `failed_token` is the bearer the rejected request carried; comparing
    /// it against the live session decides whether this caller performs the
    /// refresh or rides on one that already happened.
    async fn refresh_after_unauthorized(
        &self,
        failed_token: Option<&str>,
        original: &ApiResponse,
    ) -> Result<String, ApiError> {
        let _gate = self.refresh_gate.lock().await;

        if let Some(current) = self.session.access_token() {
            if failed_token != Some(current.as_str()) {
                tracing::debug!("token already rotated by a concurrent refresh");
                return Ok(current);
            }
        } else if failed_token.is_some() {
            // The coalesced refresh we waited on failed and tore the
            // session down; fail the same way it did.
            return Err(ApiError::SessionExpired);
        }

        let Some(refresh_token) = self.store.read().and_then(|pair| pair.refresh_token) else {
            // Nothing to refresh with: propagate the original rejection.
            return Err(error_from(original));
        };

        let generation = self.session.begin_refresh();
        tracing::debug!("access token rejected; refreshing");

        let refresh_request = ApiRequest::new(Method::POST, REFRESH_PATH)
            .with_body(serde_json::json!({ "refreshToken": refresh_token }));
        let outcome = match self.transport.send(refresh_request).await {
            Ok(response) if response.is_success() => {
                serde_json::from_value::<RefreshResponse>(response.body).map_err(ApiError::from)
            }
            Ok(response) => Err(error_from(&response)),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(refreshed) => {
                // The session is the arbiter: commit there first, and only
                // persist the rotated pair if the commit applied. A logout
                // that landed while the refresh was in flight stays final.
                if !self.session.finish_refresh(generation, refreshed.access_token.clone()) {
                    tracing::debug!("refresh result discarded; session moved on");
                    return Err(ApiError::SessionExpired);
                }
                let pair = CredentialPair {
                    access_token: refreshed.access_token.clone(),
                    refresh_token: Some(refresh_token),
                };
                if let Err(e) = self.store.save(&pair) {
                    tracing::warn!(error = %e, "failed to persist rotated credentials");
                }
                Ok(refreshed.access_token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "token refresh failed; clearing session");
                if let Err(clear_err) = self.store.clear() {
                    tracing::warn!(error = %clear_err, "credential clear failed");
                }
                self.session.reset_with_error(SESSION_EXPIRED_MESSAGE.to_owned());
                Err(ApiError::SessionExpired)
            }
        }
    }

    // =========================================================================
    // GENERIC VERBS
    // =========================================================================

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, path, None).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn put(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.request(Method::PUT, path, Some(body)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::DELETE, path, None).await
    }

    // =========================================================================
    // TYPED ENDPOINTS
    // =========================================================================

    /// # Errors
    ///
    /// Bad credentials or an unverified account come back as
    /// [`ApiError::Api`] with the server's message.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ApiError> {
        let body = serde_json::to_value(credentials)?;
        let value = self.request(Method::POST, LOGIN_PATH, Some(body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`]. `confirm_password` never leaves the
    /// client.
    pub async fn signup(&self, data: &RegisterCredentials) -> Result<MessageResponse, ApiError> {
        let body = serde_json::json!({
            "username": data.username,
            "email": data.email,
            "password": data.password,
        });
        let value = self.request(Method::POST, SIGNUP_PATH, Some(body)).await?;
        Ok(message_from(value))
    }

    /// Fetch the current user (session restore / explicit profile fetch).
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn current_user(&self) -> Result<User, ApiError> {
        let value = self.request(Method::GET, PROFILE_PATH, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let body = serde_json::to_value(update)?;
        let value = self.request(Method::PUT, PROFILE_PATH, Some(body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Invalidate the current refresh token server-side.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn logout(&self, refresh_token: Option<&str>) -> Result<MessageResponse, ApiError> {
        let body = serde_json::json!({ "refreshToken": refresh_token });
        let value = self.request(Method::POST, LOGOUT_PATH, Some(body)).await?;
        Ok(message_from(value))
    }

    /// Revoke every refresh token for the account.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn logout_all(&self) -> Result<MessageResponse, ApiError> {
        let value = self.request(Method::POST, LOGOUT_ALL_PATH, None).await?;
        Ok(message_from(value))
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn change_password(&self, current: &str, new: &str) -> Result<MessageResponse, ApiError> {
        let body = serde_json::json!({ "currentPassword": current, "newPassword": new });
        let value = self.request(Method::POST, CHANGE_PASSWORD_PATH, Some(body)).await?;
        Ok(message_from(value))
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse, ApiError> {
        let body = serde_json::json!({ "email": email });
        let value = self.request(Method::POST, FORGOT_PASSWORD_PATH, Some(body)).await?;
        Ok(message_from(value))
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<MessageResponse, ApiError> {
        let body = serde_json::json!({ "token": token, "newPassword": new_password });
        let value = self.request(Method::POST, RESET_PASSWORD_PATH, Some(body)).await?;
        Ok(message_from(value))
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn verify_email(&self, token: &str) -> Result<MessageResponse, ApiError> {
        let body = serde_json::json!({ "token": token });
        let value = self.request(Method::POST, VERIFY_EMAIL_PATH, Some(body)).await?;
        Ok(message_from(value))
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn resend_verification(&self, email: &str) -> Result<MessageResponse, ApiError> {
        let body = serde_json::json!({ "email": email });
        let value = self.request(Method::POST, RESEND_VERIFICATION_PATH, Some(body)).await?;
        Ok(message_from(value))
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn build_request(method: &Method, path: &str, bearer: Option<String>, body: Option<&Value>) -> ApiRequest {
    let mut request = ApiRequest::new(method.clone(), path).with_bearer(bearer);
    if let Some(body) = body {
        request = request.with_body(body.clone());
    }
    request
}

/// Normalize a non-2xx response, preferring the server's `message` field.
fn error_from(response: &ApiResponse) -> ApiError {
    let message = response
        .body
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| format!("request failed with status {}", response.status));
    ApiError::Api {
        status: response.status,
        message,
    }
}

fn into_result(response: ApiResponse) -> Result<Value, ApiError> {
    if response.is_success() {
        Ok(response.body)
    } else {
        Err(error_from(&response))
    }
}

fn message_from(value: Value) -> MessageResponse {
    serde_json::from_value(value).unwrap_or_else(|_| MessageResponse { message: String::new() })
}
