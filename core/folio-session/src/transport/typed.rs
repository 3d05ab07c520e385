//! Credential adapter for the generated typed API client.
//!
//! The generated client has no interceptor hooks; it reads its bearer token
//! from a single credential field on its configuration. Rather than letting
//! that field drift as an implicit global, this adapter owns the mirror
//! explicitly: read-through against [`SessionStore`] on every token read, and
//! write-through on every login/logout.

use std::sync::Mutex;

use crate::store::SessionStore;

/// Error shape produced by the generated typed client.
///
/// The status code sits directly on the error, unlike the generic transport's
/// nested shape. [`crate::classify::classify`] checks this shape first.
#[derive(Debug, thiserror::Error)]
#[error("API call failed with status {status}: {message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

/// Read-through/write-through stand-in for the typed client's credential
/// field.
pub struct TypedClientAuth {
    store: SessionStore,
    /// The value the generated client actually sees. Initialized on first
    /// read, refreshed on every read and every login/logout.
    mirror: Mutex<Option<String>>,
}

impl TypedClientAuth {
    pub fn new(store: SessionStore) -> Self {
        TypedClientAuth {
            store,
            mirror: Mutex::new(None),
        }
    }

    /// Returns the current credential, refreshing the mirror from the store.
    pub fn token(&self) -> Option<String> {
        let current = self.store.read_credential();
        *self.lock_mirror() = current.clone();
        current
    }

    /// Pushes a credential change into the mirror. Called by the session
    /// engine on login and logout; the store is already up to date by then.
    pub(crate) fn write_through(&self, credential: Option<&str>) {
        *self.lock_mirror() = credential.map(str::to_string);
    }

    /// The mirrored value as the generated client would see it, without a
    /// store read.
    pub fn mirrored(&self) -> Option<String> {
        self.lock_mirror().clone()
    }

    fn lock_mirror(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.mirror.lock().expect("typed client credential mirror lock")
    }
}
