//! Authoritative in-memory view of the current session.
//!
//! Exactly two logical states exist, derived purely from credential presence:
//! authenticated and not. There is no loading state because the seed read from
//! the store is synchronous.
//!
//! Mutations come from three places at different times: the login flow, a
//! rejected request in this process, and another process logging out or
//! expiring. The last two arrive as resync signals, possibly duplicated and
//! possibly stale, which is why [`SessionReconciler::resync`] compares the
//! store against the state held *at the moment of the re-read* rather than
//! values captured earlier. A late notification for a change that has since
//! been superseded becomes a harmless no-op instead of a lost update.

use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::store::SessionStore;

/// Reconciled snapshot of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthView {
    pub credential: Option<String>,
    pub principal: Option<String>,
}

impl AuthView {
    /// Derived, never stored: authenticated iff a credential is present.
    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }
}

/// Owns the in-memory session view and keeps it consistent with the store.
pub struct SessionReconciler {
    store: SessionStore,
    view: Mutex<AuthView>,
}

impl SessionReconciler {
    /// Seeds the view from the store, synchronously.
    pub fn new(store: SessionStore) -> Self {
        let seed = AuthView {
            credential: store.read_credential(),
            principal: store.read_principal(),
        };
        SessionReconciler {
            store,
            view: Mutex::new(seed),
        }
    }

    /// Adopts a freshly obtained session.
    ///
    /// Does not write the store; the login flow persists the pair before
    /// calling this (see [`crate::engine::SessionEngine::login`]).
    pub fn login(&self, credential: &str, principal: &str) {
        let mut view = self.lock_view();
        view.credential = Some(credential.to_string());
        view.principal = Some(principal.to_string());
    }

    /// Ends the session regardless of prior state. Idempotent.
    pub fn logout(&self) {
        let mut view = self.lock_view();
        self.store.clear();
        *view = AuthView::default();
    }

    /// Re-derives the view from the store in response to a change signal.
    ///
    /// The store is read while the view lock is held, so both checks compare
    /// against current state: (1) store cleared while memory still holds a
    /// credential drops the session; (2) store holding a different credential
    /// than memory adopts it. The principal is checked independently so a
    /// principal-only change is still observed. Duplicate and stale signals
    /// fall through both checks unchanged.
    pub fn resync(&self) {
        let mut view = self.lock_view();

        let stored_credential = self.store.read_credential();
        let stored_principal = self.store.read_principal();

        match stored_credential {
            None => {
                if view.credential.is_some() {
                    debug!("Store cleared externally, dropping in-memory session");
                    view.credential = None;
                    view.principal = None;
                }
            }
            Some(credential) => {
                if view.credential.as_deref() != Some(credential.as_str()) {
                    debug!("Store holds a new credential, adopting it");
                    view.credential = Some(credential);
                }
                if view.principal != stored_principal {
                    view.principal = stored_principal;
                }
            }
        }
    }

    /// Current snapshot of the reconciled view.
    pub fn snapshot(&self) -> AuthView {
        self.lock_view().clone()
    }

    fn lock_view(&self) -> MutexGuard<'_, AuthView> {
        self.view.lock().expect("session view lock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorePaths;
    use tempfile::tempdir;

    fn store_in(temp: &tempfile::TempDir) -> SessionStore {
        SessionStore::new(StorePaths::with_root(temp.path().to_path_buf()))
    }

    #[test]
    fn test_seeds_unauthenticated_from_empty_store() {
        let temp = tempdir().unwrap();
        let reconciler = SessionReconciler::new(store_in(&temp));
        let view = reconciler.snapshot();
        assert!(!view.is_authenticated());
        assert!(view.principal.is_none());
    }

    #[test]
    fn test_seeds_from_persisted_session() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        store.write("tok-1", "alice");

        let reconciler = SessionReconciler::new(store);
        let view = reconciler.snapshot();
        assert!(view.is_authenticated());
        assert_eq!(view.credential.as_deref(), Some("tok-1"));
        assert_eq!(view.principal.as_deref(), Some("alice"));
    }

    #[test]
    fn test_login_round_trip() {
        let temp = tempdir().unwrap();
        let reconciler = SessionReconciler::new(store_in(&temp));

        reconciler.login("tok-1", "alice");

        let view = reconciler.snapshot();
        assert_eq!(view.credential.as_deref(), Some("tok-1"));
        assert_eq!(view.principal.as_deref(), Some("alice"));
        assert!(view.is_authenticated());
    }

    #[test]
    fn test_logout_clears_store_and_view() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        store.write("tok-1", "alice");
        let reconciler = SessionReconciler::new(store.clone());

        reconciler.logout();

        assert!(!reconciler.snapshot().is_authenticated());
        assert!(store.read_credential().is_none());
    }

    #[test]
    fn test_logout_when_already_out_is_idempotent() {
        let temp = tempdir().unwrap();
        let reconciler = SessionReconciler::new(store_in(&temp));
        reconciler.logout();
        reconciler.logout();
        assert!(!reconciler.snapshot().is_authenticated());
    }

    #[test]
    fn test_resync_drops_session_when_store_cleared() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        store.write("tok-1", "alice");
        let reconciler = SessionReconciler::new(store.clone());

        store.clear();
        reconciler.resync();

        let view = reconciler.snapshot();
        assert!(!view.is_authenticated());
        assert!(view.principal.is_none());
    }

    #[test]
    fn test_resync_adopts_new_credential() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        store.write("tok-1", "alice");
        let reconciler = SessionReconciler::new(store.clone());

        // Another process re-logged in as someone else.
        store.write("tok-2", "bob");
        reconciler.resync();

        let view = reconciler.snapshot();
        assert_eq!(view.credential.as_deref(), Some("tok-2"));
        assert_eq!(view.principal.as_deref(), Some("bob"));
    }

    #[test]
    fn test_resync_observes_principal_only_change() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        store.write("tok-1", "alice");
        let reconciler = SessionReconciler::new(store.clone());

        store.write("tok-1", "alice (work)");
        reconciler.resync();

        let view = reconciler.snapshot();
        assert_eq!(view.credential.as_deref(), Some("tok-1"));
        assert_eq!(view.principal.as_deref(), Some("alice (work)"));
    }

    #[test]
    fn test_duplicate_resync_is_a_noop() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        store.write("tok-1", "alice");
        let reconciler = SessionReconciler::new(store.clone());

        store.clear();
        reconciler.resync();
        reconciler.resync();

        assert!(!reconciler.snapshot().is_authenticated());
    }

    #[test]
    fn test_stale_notification_after_relogin_is_safe() {
        // A clear happened, but the user logged back in before the clear's
        // notification arrived. The late resync must not revert the session.
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        store.write("tok-1", "alice");
        let reconciler = SessionReconciler::new(store.clone());

        store.clear();
        // Re-login lands before the notification for the clear.
        store.write("tok-2", "alice");
        reconciler.login("tok-2", "alice");

        reconciler.resync();

        let view = reconciler.snapshot();
        assert!(view.is_authenticated());
        assert_eq!(view.credential.as_deref(), Some("tok-2"));
    }

    #[test]
    fn test_resync_on_empty_store_and_empty_view_is_a_noop() {
        let temp = tempdir().unwrap();
        let reconciler = SessionReconciler::new(store_in(&temp));
        reconciler.resync();
        assert_eq!(reconciler.snapshot(), AuthView::default());
    }
}
