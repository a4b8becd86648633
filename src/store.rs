//! Credential persistence — the durable half of the session.
//!
//! DESIGN
//! ======
//! The store holds exactly one access/refresh token pair and survives
//! process restarts (the browser build kept these under the
//! `accessToken`/`refreshToken` storage keys; the file store keeps the same
//! field names). It has no network or business logic: the session state
//! machine and the interceptor's refresh path are its only writers.
//!
//! `save` must be atomic from a reader's point of view: after it returns, a
//! fresh `read` sees the whole pair or the previous state, never a torn
//! write. The file store writes a sibling temp file and renames it over the
//! target.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// The access/refresh token pair.
///
/// Outside an in-flight refresh the pair is all-or-nothing: both tokens
/// present or the store empty. A missing refresh token is valid for
/// deployments that keep it in an HTTP-only cookie instead.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("credential store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("credential encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable holder of the current credential pair.
///
/// `read` never fails: unreadable or corrupt state is reported as absent so
/// boot-time session restore degrades to "logged out" instead of crashing.
pub trait CredentialStore: Send + Sync {
    /// Persist the pair. After this returns, a fresh `read` returns an
    /// equal pair.
    ///
    /// # Errors
    ///
    /// Fails if the underlying storage cannot be written.
    fn save(&self, pair: &CredentialPair) -> Result<(), StoreError>;

    /// The stored pair, or `None` when absent or unreadable.
    fn read(&self) -> Option<CredentialPair>;

    /// Remove the stored pair. Idempotent.
    ///
    /// # Errors
    ///
    /// Fails only on an io error other than the pair already being gone.
    fn clear(&self) -> Result<(), StoreError>;
}

// =============================================================================
// FILE STORE
// =============================================================================

/// JSON-file-backed credential store.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, pair: &CredentialPair) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Write-then-rename so a concurrent read never observes a partial pair.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(pair)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn read(&self) -> Option<CredentialPair> {
        let raw = std::fs::read(&self.path).ok()?;
        match serde_json::from_slice(&raw) {
            Ok(pair) => Some(pair),
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "unreadable credential file; treating as absent");
                None
            }
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// In-process credential store for tests and embedders that manage
/// persistence themselves.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<Option<CredentialPair>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, pair: &CredentialPair) -> Result<(), StoreError> {
        *self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(pair.clone());
        Ok(())
    }

    fn read(&self) -> Option<CredentialPair> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        Ok(())
    }
}
