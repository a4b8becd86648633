//! Authentication transitions tying the session, the credential store, and
//! the API client together.
//!
//! DESIGN
//! ======
//! Each operation here is one session transition: it marks the session
//! loading, performs its network call through the interceptor, and commits
//! the result through a single atomic applier. Validation failures are
//! rejected before any network call and never touch the session.
//!
//! Logout always clears local state, even when the server call fails: the
//! client must never remain authenticated after the user asked to leave.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::net::client::ApiClient;
use crate::net::error::ApiError;
use crate::net::transport::{HttpTransport, Transport};
use crate::net::types::{
    LoginCredentials, MessageResponse, ProfileUpdate, RegisterCredentials, User,
};
use crate::state::session::Session;
use crate::store::{CredentialPair, CredentialStore, FileCredentialStore};

/// High-level authentication client.
///
/// Owns the intercepting [`ApiClient`] and exposes the closed set of
/// session transitions plus the account operations of the auth API.
pub struct AuthClient<T: Transport> {
    api: ApiClient<T>,
}

impl AuthClient<HttpTransport> {
    /// Build a production client: HTTP transport, file-backed credential
    /// store, fresh session.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] when the transport cannot be built.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(config)?;
        let store: Arc<dyn CredentialStore> =
            Arc::new(FileCredentialStore::new(config.credentials_path.clone()));
        Ok(Self::new(transport, Session::new(), store))
    }
}

impl<T: Transport> AuthClient<T> {
    #[must_use]
    pub fn new(transport: T, session: Session, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            api: ApiClient::new(transport, session, store),
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        self.api.session()
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient<T> {
        &self.api
    }

    fn store(&self) -> &Arc<dyn CredentialStore> {
        self.api.store()
    }

    // =========================================================================
    // SESSION TRANSITIONS
    // =========================================================================

    /// Authenticate and populate the session.
    ///
    /// A login completing after the session has moved on (logout raced it)
    /// commits nothing; the later transition wins.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] for empty input (no network call is made),
    /// otherwise the server's rejection with its message.
    pub async fn login(&self, credentials: LoginCredentials) -> Result<User, ApiError> {
        if credentials.username.trim().is_empty() || credentials.password.is_empty() {
            return Err(ApiError::Validation("username and password are required".to_owned()));
        }

        let generation = self.session().begin_authenticating(None);
        match self.api.login(&credentials).await {
            Ok(response) => {
                let applied = self.session().finish_login(
                    generation,
                    response.user.clone(),
                    response.access_token.clone(),
                );
                if applied {
                    let pair = CredentialPair {
                        access_token: response.access_token,
                        refresh_token: response.refresh_token,
                    };
                    if let Err(e) = self.store().save(&pair) {
                        tracing::warn!(error = %e, "failed to persist credentials after login");
                    }
                    tracing::info!(username = %response.user.username, "logged in");
                } else {
                    tracing::debug!("login result discarded; session moved on");
                }
                Ok(response.user)
            }
            Err(e) => {
                self.session().fail_login(generation, e.to_string());
                Err(e)
            }
        }
    }

    /// Register a new account. Does not authenticate: the account still
    /// needs email verification before it can log in.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] for empty fields or a password mismatch,
    /// otherwise the server's rejection.
    pub async fn register(&self, data: RegisterCredentials) -> Result<MessageResponse, ApiError> {
        if data.username.trim().is_empty() || data.email.trim().is_empty() || data.password.is_empty() {
            return Err(ApiError::Validation("username, email, and password are required".to_owned()));
        }
        if data.password != data.confirm_password {
            return Err(ApiError::Validation("passwords do not match".to_owned()));
        }

        let generation = self.session().begin_loading();
        match self.api.signup(&data).await {
            Ok(response) => {
                self.session().finish_loading(generation);
                Ok(response)
            }
            Err(e) => {
                self.session().fail_loading(generation, e.to_string());
                Err(e)
            }
        }
    }

    /// Attempt to resume a previous session from the credential store.
    ///
    /// The stored access token is seeded into the session so the profile
    /// fetch goes out authenticated; if it has expired in the meantime the
    /// interceptor rotates it transparently. Returns whether a session was
    /// restored. A missing stored pair is a silent no-op; a rejected one
    /// clears the store and leaves the session anonymous without surfacing
    /// an error (the user simply is not logged in).
    pub async fn restore_session(&self) -> bool {
        let Some(pair) = self.store().read() else {
            return false;
        };

        let generation = self.session().begin_authenticating(Some(pair.access_token));
        match self.api.current_user().await {
            Ok(user) => {
                let applied = self.session().finish_restore(generation, user);
                if applied {
                    tracing::info!("session restored");
                }
                applied
            }
            Err(e) => {
                tracing::debug!(error = %e, "session restore failed");
                if let Err(clear_err) = self.store().clear() {
                    tracing::warn!(error = %clear_err, "credential clear failed");
                }
                self.session().fail_restore(generation);
                false
            }
        }
    }

    /// Log out of this device. Server-side revocation is best effort; the
    /// local session and credential store are cleared unconditionally.
    pub async fn logout(&self) {
        let refresh_token = self.store().read().and_then(|pair| pair.refresh_token);
        if let Err(e) = self.api.logout(refresh_token.as_deref()).await {
            tracing::warn!(error = %e, "server logout failed; clearing local session anyway");
        }
        if let Err(e) = self.store().clear() {
            tracing::warn!(error = %e, "credential clear failed");
        }
        self.session().reset();
        tracing::info!("logged out");
    }

    /// Log out of every device by revoking all refresh tokens server-side.
    ///
    /// # Errors
    ///
    /// The server's rejection. The local session is cleared either way; on
    /// failure the error is also surfaced on the session so the UI can
    /// explain why other devices may still be signed in.
    pub async fn logout_all_devices(&self) -> Result<(), ApiError> {
        let result = self.api.logout_all().await;
        if let Err(e) = self.store().clear() {
            tracing::warn!(error = %e, "credential clear failed");
        }
        match result {
            Ok(_) => {
                self.session().reset();
                tracing::info!("logged out everywhere");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "logout-all failed; local session cleared");
                self.session().reset_with_error(e.to_string());
                Err(e)
            }
        }
    }

    /// Drop the session error. No-op when none is present.
    pub fn clear_error(&self) {
        self.session().clear_error();
    }

    // =========================================================================
    // ACCOUNT OPERATIONS
    // =========================================================================

    /// Re-fetch the current user and update the cached copy.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn refresh_profile(&self) -> Result<User, ApiError> {
        let user = self.api.current_user().await?;
        self.session().update_user(user.clone());
        Ok(user)
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<User, ApiError> {
        let user = self.api.update_profile(&update).await?;
        self.session().update_user(user.clone());
        Ok(user)
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn change_password(&self, current: &str, new: &str) -> Result<MessageResponse, ApiError> {
        if current.is_empty() || new.is_empty() {
            return Err(ApiError::Validation("current and new password are required".to_owned()));
        }
        self.api.change_password(current, new).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse, ApiError> {
        if email.trim().is_empty() {
            return Err(ApiError::Validation("email is required".to_owned()));
        }
        self.api.forgot_password(email).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<MessageResponse, ApiError> {
        if token.is_empty() || new_password.is_empty() {
            return Err(ApiError::Validation("token and new password are required".to_owned()));
        }
        self.api.reset_password(token, new_password).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn verify_email(&self, token: &str) -> Result<MessageResponse, ApiError> {
        if token.is_empty() {
            return Err(ApiError::Validation("verification token is required".to_owned()));
        }
        self.api.verify_email(token).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn resend_verification(&self, email: &str) -> Result<MessageResponse, ApiError> {
        if email.trim().is_empty() {
            return Err(ApiError::Validation("email is required".to_owned()));
        }
        self.api.resend_verification(email).await
    }
}
