use super::*;

use crate::net::types::{UserRole, UserStatus};

fn sample_user(role: UserRole) -> User {
    User {
        id: "u-1".to_owned(),
        username: "alice".to_owned(),
        email: "alice@example.com".to_owned(),
        role,
        is_verified: true,
        status: UserStatus::Active,
        created_at: "2025-01-01T00:00:00Z".to_owned(),
        updated_at: "2025-01-01T00:00:00Z".to_owned(),
        last_login: None,
        profile_picture: None,
    }
}

fn authenticated_session(token: &str) -> Session {
    let session = Session::new();
    let generation = session.begin_authenticating(None);
    assert!(session.finish_login(generation, sample_user(UserRole::Admin), token.to_owned()));
    session
}

// =============================================================================
// Initial shape
// =============================================================================

#[test]
fn new_session_is_anonymous() {
    let snapshot = Session::new().snapshot();
    assert_eq!(snapshot, SessionSnapshot::default());
    assert!(!snapshot.is_authenticated());
}

#[test]
fn new_session_has_no_token() {
    assert!(Session::new().access_token().is_none());
}

// =============================================================================
// Login transitions
// =============================================================================

#[test]
fn begin_authenticating_sets_loading() {
    let session = Session::new();
    session.begin_authenticating(None);
    let snapshot = session.snapshot();
    assert!(snapshot.loading);
    assert_eq!(snapshot.phase, SessionPhase::Authenticating);
    assert!(!snapshot.is_authenticated());
}

#[test]
fn begin_authenticating_clears_previous_error() {
    let session = Session::new();
    let generation = session.begin_authenticating(None);
    session.fail_login(generation, "bad credentials".to_owned());
    session.begin_authenticating(None);
    assert!(session.snapshot().error.is_none());
}

#[test]
fn finish_login_authenticates() {
    let session = Session::new();
    let generation = session.begin_authenticating(None);
    assert!(session.finish_login(generation, sample_user(UserRole::Admin), "AT1".to_owned()));

    let snapshot = session.snapshot();
    assert!(snapshot.is_authenticated());
    assert_eq!(snapshot.phase, SessionPhase::Authenticated);
    assert_eq!(snapshot.access_token.as_deref(), Some("AT1"));
    assert_eq!(snapshot.user.as_ref().map(|u| u.role), Some(UserRole::Admin));
    assert!(!snapshot.loading);
    assert!(snapshot.error.is_none());
}

#[test]
fn fail_login_returns_to_anonymous_with_message() {
    let session = Session::new();
    let generation = session.begin_authenticating(None);
    assert!(session.fail_login(generation, "Invalid credentials".to_owned()));

    let snapshot = session.snapshot();
    assert!(!snapshot.is_authenticated());
    assert!(snapshot.user.is_none());
    assert!(!snapshot.loading);
    assert_eq!(snapshot.error.as_deref(), Some("Invalid credentials"));
}

#[test]
fn superseded_finish_login_is_discarded() {
    let session = Session::new();
    let generation = session.begin_authenticating(None);
    session.reset(); // logout won the race
    assert!(!session.finish_login(generation, sample_user(UserRole::Admin), "AT1".to_owned()));
    assert_eq!(session.snapshot(), SessionSnapshot::default());
}

#[test]
fn superseded_fail_login_is_discarded() {
    let session = Session::new();
    let generation = session.begin_authenticating(None);
    session.reset();
    assert!(!session.fail_login(generation, "too late".to_owned()));
    assert!(session.snapshot().error.is_none());
}

// =============================================================================
// Restore transitions
// =============================================================================

#[test]
fn begin_authenticating_seeds_stored_token() {
    let session = Session::new();
    session.begin_authenticating(Some("AT1".to_owned()));
    assert_eq!(session.access_token().as_deref(), Some("AT1"));
}

#[test]
fn finish_restore_keeps_rotated_token() {
    let session = Session::new();
    let generation = session.begin_authenticating(Some("AT1".to_owned()));
    // The interceptor rotated the token while the profile fetch retried.
    let refresh_generation = session.begin_refresh();
    assert!(session.finish_refresh(refresh_generation, "AT2".to_owned()));
    assert!(session.finish_restore(generation, sample_user(UserRole::Enduser)));

    let snapshot = session.snapshot();
    assert!(snapshot.is_authenticated());
    assert_eq!(snapshot.access_token.as_deref(), Some("AT2"));
}

#[test]
fn fail_restore_is_silent() {
    let session = Session::new();
    let generation = session.begin_authenticating(Some("AT1".to_owned()));
    assert!(session.fail_restore(generation));
    assert_eq!(session.snapshot(), SessionSnapshot::default());
}

// =============================================================================
// Refresh transitions
// =============================================================================

#[test]
fn begin_refresh_requires_authenticated() {
    let session = Session::new();
    session.begin_refresh();
    assert_eq!(session.snapshot().phase, SessionPhase::Anonymous);
}

#[test]
fn refreshing_is_still_authenticated_and_not_loading() {
    let session = authenticated_session("AT1");
    session.begin_refresh();

    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Refreshing);
    assert!(snapshot.is_authenticated());
    assert!(!snapshot.loading);
}

#[test]
fn finish_refresh_rotates_token() {
    let session = authenticated_session("AT1");
    let generation = session.begin_refresh();
    assert!(session.finish_refresh(generation, "AT2".to_owned()));

    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Authenticated);
    assert_eq!(snapshot.access_token.as_deref(), Some("AT2"));
}

#[test]
fn superseded_finish_refresh_is_discarded() {
    let session = authenticated_session("AT1");
    let generation = session.begin_refresh();
    session.reset(); // logout won the race
    assert!(!session.finish_refresh(generation, "AT2".to_owned()));
    assert_eq!(session.snapshot(), SessionSnapshot::default());
}

// =============================================================================
// Reset
// =============================================================================

#[test]
fn reset_restores_initial_shape() {
    let session = authenticated_session("AT1");
    session.reset();
    assert_eq!(session.snapshot(), SessionSnapshot::default());
}

#[test]
fn reset_with_error_clears_auth_but_surfaces_message() {
    let session = authenticated_session("AT1");
    session.reset_with_error("Your session has expired. Please log in again.".to_owned());

    let snapshot = session.snapshot();
    assert!(!snapshot.is_authenticated());
    assert!(snapshot.user.is_none());
    assert!(snapshot.access_token.is_none());
    assert_eq!(
        snapshot.error.as_deref(),
        Some("Your session has expired. Please log in again.")
    );
}

#[test]
fn login_then_logout_round_trips_to_initial() {
    let session = Session::new();
    let initial = session.snapshot();

    let generation = session.begin_authenticating(None);
    session.finish_login(generation, sample_user(UserRole::Supervisor), "AT1".to_owned());
    session.reset();

    assert_eq!(session.snapshot(), initial);
}

// =============================================================================
// clear_error
// =============================================================================

#[test]
fn clear_error_drops_only_the_error() {
    let session = authenticated_session("AT1");
    session.fail_loading(session.begin_loading(), "profile update failed".to_owned());
    session.clear_error();

    let snapshot = session.snapshot();
    assert!(snapshot.error.is_none());
    assert!(snapshot.is_authenticated());
}

#[test]
fn clear_error_without_error_is_noop() {
    let session = authenticated_session("AT1");
    let before = session.snapshot();
    session.clear_error();
    assert_eq!(session.snapshot(), before);
}

// =============================================================================
// update_user
// =============================================================================

#[test]
fn update_user_replaces_cached_copy() {
    let session = authenticated_session("AT1");
    let mut demoted = sample_user(UserRole::Enduser);
    demoted.username = "alice2".to_owned();
    session.update_user(demoted.clone());
    assert_eq!(session.snapshot().user, Some(demoted));
}

#[test]
fn update_user_ignored_when_anonymous() {
    let session = Session::new();
    session.update_user(sample_user(UserRole::Admin));
    assert!(session.snapshot().user.is_none());
}

// =============================================================================
// Observation
// =============================================================================

#[test]
fn subscribers_observe_committed_transitions() {
    let session = Session::new();
    let mut rx = session.subscribe();
    assert!(!rx.borrow_and_update().loading);

    session.begin_authenticating(None);
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().loading);
}

#[test]
fn late_subscriber_starts_from_current_snapshot() {
    let session = authenticated_session("AT1");
    let rx = session.subscribe();
    assert!(rx.borrow().is_authenticated());
}
