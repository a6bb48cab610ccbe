use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::storage::{Storage, StorageError, TOKEN_KEY, USERNAME_KEY};

/// Snapshot of the authenticated identity.
///
/// Both fields are empty when there is no session. They are only ever set
/// or cleared together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub username: String,
}

impl SessionData {
    pub fn is_logged_in(&self) -> bool {
        !self.token.is_empty()
    }
}

/// In-memory session mirrored to durable storage.
///
/// One `Session` exists per console; it is shared by `Arc` with the
/// transport (token reads, forced logout) and the session store (login,
/// logout).
pub struct Session {
    storage: Arc<dyn Storage>,
    data: RwLock<SessionData>,
}

impl Session {
    /// Build a session from whatever is persisted.
    ///
    /// A half-written pair (one key without the other) hydrates as logged out
    /// and the leftover entry is removed so memory and storage agree.
    pub fn hydrate(storage: Arc<dyn Storage>) -> Self {
        let token = read_entry(storage.as_ref(), TOKEN_KEY);
        let username = read_entry(storage.as_ref(), USERNAME_KEY);

        let data = match (token, username) {
            (Some(token), Some(username)) if !token.is_empty() && !username.is_empty() => {
                debug!(%username, "Session restored from storage");
                SessionData { token, username }
            }
            (None, None) => {
                debug!("No persisted session");
                SessionData::default()
            }
            (token, username) => {
                warn!(
                    has_token = token.is_some(),
                    has_username = username.is_some(),
                    "Partial session in storage, treating as logged out"
                );
                remove_pair(storage.as_ref());
                SessionData::default()
            }
        };

        Self {
            storage,
            data: RwLock::new(data),
        }
    }

    /// Current bearer token, empty when logged out
    pub fn token(&self) -> String {
        self.read().token.clone()
    }

    pub fn username(&self) -> String {
        self.read().username.clone()
    }

    pub fn snapshot(&self) -> SessionData {
        self.read().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.read().is_logged_in()
    }

    /// Persist a new token/username pair, then publish it in memory.
    ///
    /// On a storage failure the previously persisted pair is restored
    /// (best-effort) and memory is left untouched.
    pub(crate) fn establish(&self, token: String, username: String) -> Result<(), StorageError> {
        let mut data = self.write();

        if let Err(e) = write_pair(self.storage.as_ref(), &token, &username) {
            warn!(error = %e, "Failed to persist session, restoring previous state");
            if data.is_logged_in() {
                if let Err(e) = write_pair(self.storage.as_ref(), &data.token, &data.username) {
                    warn!(error = %e, "Failed to restore previous session");
                }
            } else {
                remove_pair(self.storage.as_ref());
            }
            return Err(e);
        }

        *data = SessionData { token, username };
        Ok(())
    }

    /// Drop the session from memory and storage. Never fails; storage errors
    /// are logged.
    pub fn clear(&self) {
        let mut data = self.write();
        *data = SessionData::default();
        remove_pair(self.storage.as_ref());
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionData> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionData> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_entry(storage: &dyn Storage, key: &str) -> Option<String> {
    match storage.get(key) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "Failed to read session entry");
            None
        }
    }
}

fn write_pair(storage: &dyn Storage, token: &str, username: &str) -> Result<(), StorageError> {
    storage.set(TOKEN_KEY, token)?;
    storage.set(USERNAME_KEY, username)?;
    Ok(())
}

fn remove_pair(storage: &dyn Storage) {
    for key in [TOKEN_KEY, USERNAME_KEY] {
        if let Err(e) = storage.remove(key) {
            warn!(key, error = %e, "Failed to remove session entry");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
