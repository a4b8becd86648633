//! The session state machine.
//!
//! DESIGN
//! ======
//! The session is the single in-memory answer to "who is logged in and with
//! what token". No component mutates fields directly: all writes go through
//! the crate-internal transition appliers below, each of which is one atomic
//! update of the record under a mutex (single-writer discipline). Committed
//! snapshots are published on a `tokio::sync::watch` channel so UI layers
//! and the route guard observe every change without polling.
//!
//! A generation counter makes superseded transitions harmless: `login`,
//! `register`, and `restore_session` capture the generation when they start
//! and their completion is discarded if anything (a logout, a forced expiry)
//! has moved the session since. Last-applied wins.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use crate::net::types::User;

/// Lifecycle phase of the session.
///
/// `Refreshing` means authenticated with a background token rotation
/// outstanding; it is deliberately invisible to `loading`, so the UI does
/// not flicker while the interceptor rotates a token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionPhase {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated,
    Refreshing,
}

/// One committed view of the session.
///
/// Invariants: `is_authenticated()` implies `user` and `access_token` are
/// present; not authenticated implies `user` is absent. `loading` is true
/// only while a transition's asynchronous work is outstanding.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub user: Option<User>,
    pub access_token: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self.phase, SessionPhase::Authenticated | SessionPhase::Refreshing)
    }
}

struct SessionRecord {
    snapshot: SessionSnapshot,
    generation: u64,
}

struct SessionInner {
    record: Mutex<SessionRecord>,
    tx: watch::Sender<SessionSnapshot>,
}

/// Cheaply cloneable handle to the shared session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::default());
        Self {
            inner: Arc::new(SessionInner {
                record: Mutex::new(SessionRecord {
                    snapshot: SessionSnapshot::default(),
                    generation: 0,
                }),
                tx,
            }),
        }
    }

    /// Current committed snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner
            .record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot
            .clone()
    }

    /// Subscribe to committed snapshots. The receiver starts at the current
    /// value.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.tx.subscribe()
    }

    /// The live access token, read by the interceptor's request phase.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.inner
            .record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot
            .access_token
            .clone()
    }

    /// Drop the current error without touching authentication flags.
    /// A no-op when no error is present.
    pub fn clear_error(&self) {
        self.apply(|record| {
            record.snapshot.error = None;
        });
    }

    // =========================================================================
    // TRANSITION APPLIERS (crate-internal)
    // =========================================================================

    /// Enter `Authenticating` for a login or session restore. `seed_token`
    /// carries a stored access token so in-flight restore requests are sent
    /// authenticated. Returns the generation the transition must present to
    /// commit its result.
    pub(crate) fn begin_authenticating(&self, seed_token: Option<String>) -> u64 {
        self.apply(|record| {
            record.generation += 1;
            record.snapshot.phase = SessionPhase::Authenticating;
            record.snapshot.loading = true;
            record.snapshot.error = None;
            if seed_token.is_some() {
                record.snapshot.access_token = seed_token;
            }
            record.generation
        })
    }

    /// Commit a successful login. Returns false when the result was
    /// superseded and discarded.
    pub(crate) fn finish_login(&self, generation: u64, user: User, access_token: String) -> bool {
        self.apply(|record| {
            if record.generation != generation || record.snapshot.phase != SessionPhase::Authenticating {
                return false;
            }
            record.snapshot.phase = SessionPhase::Authenticated;
            record.snapshot.user = Some(user);
            record.snapshot.access_token = Some(access_token);
            record.snapshot.loading = false;
            record.snapshot.error = None;
            true
        })
    }

    /// Commit a failed login: back to anonymous with a user-facing message.
    pub(crate) fn fail_login(&self, generation: u64, message: String) -> bool {
        self.apply(|record| {
            if record.generation != generation || record.snapshot.phase != SessionPhase::Authenticating {
                return false;
            }
            record.snapshot = SessionSnapshot {
                error: Some(message),
                ..SessionSnapshot::default()
            };
            true
        })
    }

    /// Commit a successful restore. The access token is left as-is because
    /// the interceptor may have rotated it while fetching the profile.
    pub(crate) fn finish_restore(&self, generation: u64, user: User) -> bool {
        self.apply(|record| {
            if record.generation != generation || record.snapshot.phase != SessionPhase::Authenticating {
                return false;
            }
            record.snapshot.phase = SessionPhase::Authenticated;
            record.snapshot.user = Some(user);
            record.snapshot.loading = false;
            true
        })
    }

    /// Commit a failed restore: silently back to anonymous.
    pub(crate) fn fail_restore(&self, generation: u64) -> bool {
        self.apply(|record| {
            if record.generation != generation || record.snapshot.phase != SessionPhase::Authenticating {
                return false;
            }
            record.snapshot = SessionSnapshot::default();
            true
        })
    }

    /// Mark non-authenticating async work (registration, account ops).
    pub(crate) fn begin_loading(&self) -> u64 {
        self.apply(|record| {
            record.generation += 1;
            record.snapshot.loading = true;
            record.snapshot.error = None;
            record.generation
        })
    }

    pub(crate) fn finish_loading(&self, generation: u64) -> bool {
        self.apply(|record| {
            if record.generation != generation {
                return false;
            }
            record.snapshot.loading = false;
            true
        })
    }

    pub(crate) fn fail_loading(&self, generation: u64, message: String) -> bool {
        self.apply(|record| {
            if record.generation != generation {
                return false;
            }
            record.snapshot.loading = false;
            record.snapshot.error = Some(message);
            true
        })
    }

    /// Enter `Refreshing` for a background rotation. Does not bump the
    /// generation: a pending restore must still be able to commit after the
    /// rotation completes. Returns the generation the rotation must present
    /// to commit its result.
    pub(crate) fn begin_refresh(&self) -> u64 {
        self.apply(|record| {
            if record.snapshot.phase == SessionPhase::Authenticated {
                record.snapshot.phase = SessionPhase::Refreshing;
            }
            record.generation
        })
    }

    /// Install a rotated access token. Returns false when the session moved
    /// on (a logout won the race) and the token was discarded.
    pub(crate) fn finish_refresh(&self, generation: u64, access_token: String) -> bool {
        self.apply(|record| {
            if record.generation != generation {
                return false;
            }
            record.snapshot.access_token = Some(access_token);
            if record.snapshot.phase == SessionPhase::Refreshing {
                record.snapshot.phase = SessionPhase::Authenticated;
            }
            true
        })
    }

    /// Unconditional local logout back to the initial anonymous shape.
    pub(crate) fn reset(&self) {
        self.apply(|record| {
            record.generation += 1;
            record.snapshot = SessionSnapshot::default();
        });
    }

    /// Forced logout with a user-facing message (refresh failure, failed
    /// logout-all). Bumps the generation so any in-flight transition is
    /// discarded.
    pub(crate) fn reset_with_error(&self, message: String) {
        self.apply(|record| {
            record.generation += 1;
            record.snapshot = SessionSnapshot {
                error: Some(message),
                ..SessionSnapshot::default()
            };
        });
    }

    /// Replace the cached user after an explicit profile fetch or update.
    pub(crate) fn update_user(&self, user: User) {
        self.apply(|record| {
            if record.snapshot.is_authenticated() {
                record.snapshot.user = Some(user);
            }
        });
    }

    /// Run one atomic mutation and publish the committed snapshot.
    fn apply<R>(&self, mutate: impl FnOnce(&mut SessionRecord) -> R) -> R {
        let mut record = self
            .inner
            .record
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let result = mutate(&mut record);
        // send_replace publishes even while no receiver is subscribed, so a
        // later subscriber always starts from the current snapshot.
        let _ = self.inner.tx.send_replace(record.snapshot.clone());
        result
    }
}
