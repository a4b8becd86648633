//! # adminboard
//!
//! Client-side session and authorization core for the admin dashboard:
//! one shared layer for UI frontends and operator tooling to manage who is
//! logged in, with what token, and what they may see.
//!
//! The crate is built from four pieces:
//!
//! - [`store`]: durable credential-pair persistence that survives restarts.
//! - [`state`]: the observable session state machine. All mutation goes
//!   through a closed set of transitions; observers subscribe to a watch
//!   channel and never touch fields directly.
//! - [`net`]: the transport interceptor. Every call carries the session's
//!   current access token and a 401 triggers one coalesced refresh followed
//!   by a single retry.
//! - [`guard`]: the pure route-guard decision used to gate navigation by
//!   authentication and role.
//!
//! [`auth::AuthClient`] ties them together and exposes the transition API
//! (login, register, session restore, logout, account operations).

pub mod auth;
pub mod config;
pub mod guard;
pub mod net;
pub mod state;
pub mod store;

pub use auth::AuthClient;
pub use config::ApiConfig;
pub use guard::{RouteDecision, RouteRequest, evaluate, has_role};
pub use net::client::ApiClient;
pub use net::error::{ApiError, SESSION_EXPIRED_MESSAGE};
pub use net::transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
pub use net::types::{
    AuthResponse, LoginCredentials, MessageResponse, ProfileUpdate, RefreshResponse,
    RegisterCredentials, User, UserRole, UserStatus,
};
pub use state::session::{Session, SessionPhase, SessionSnapshot};
pub use store::{CredentialPair, CredentialStore, FileCredentialStore, MemoryCredentialStore, StoreError};
