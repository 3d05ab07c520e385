//! Facade wiring the session subsystem together.
//!
//! Consumers (route guards, the login page, the logout action, the expired
//! notice) talk to [`SessionEngine`]; transports get the invalidation handler
//! from it. The engine owns the wiring order the design depends on: login
//! persists the pair *before* the reconciler adopts it, so a concurrent
//! resync can only ever observe the store at or ahead of memory.

use std::sync::Arc;

use crate::bridge::CrossTabBridge;
use crate::invalidation::InvalidationHandler;
use crate::reconciler::{AuthView, SessionReconciler};
use crate::signal::signal_channel;
use crate::storage::StorePaths;
use crate::store::SessionStore;
use crate::transport::http::{HttpClient, TransportError};
use crate::transport::typed::TypedClientAuth;

/// Entry point for the session lifecycle core.
pub struct SessionEngine {
    store: SessionStore,
    reconciler: Arc<SessionReconciler>,
    invalidation: InvalidationHandler,
    typed_auth: TypedClientAuth,
    // Held for teardown; the bridge thread and watcher die with the engine.
    _bridge: CrossTabBridge,
}

impl SessionEngine {
    /// Creates an engine over `~/.folio`.
    pub fn new() -> Self {
        Self::with_paths(StorePaths::default())
    }

    /// Creates an engine over a custom store root. Used by tests and by
    /// clients that relocate their data directory.
    pub fn with_paths(paths: StorePaths) -> Self {
        let store = SessionStore::new(paths.clone());
        let (notifier, signals) = signal_channel();
        let reconciler = Arc::new(SessionReconciler::new(store.clone()));
        let invalidation = InvalidationHandler::new(store.clone(), notifier.clone());
        let typed_auth = TypedClientAuth::new(store.clone());

        // The bridge degrades internally when the filesystem watch cannot be
        // established: same-process signals keep draining either way, so this
        // process always sees its own logins and 401s.
        let bridge = CrossTabBridge::start(&paths, Arc::clone(&reconciler), notifier, signals);

        SessionEngine {
            store,
            reconciler,
            invalidation,
            typed_auth,
            _bridge: bridge,
        }
    }

    /// Adopts a freshly obtained credential: persist first, then update the
    /// in-memory view and the typed client's mirror.
    pub fn login(&self, credential: &str, principal: &str) {
        self.store.write(credential, principal);
        self.reconciler.login(credential, principal);
        self.typed_auth.write_through(Some(credential));
    }

    /// Voluntary logout. Never sets the expired flag.
    pub fn logout(&self) {
        self.reconciler.logout();
        self.typed_auth.write_through(None);
    }

    /// Current reconciled session view.
    pub fn view(&self) -> AuthView {
        self.reconciler.snapshot()
    }

    /// One-shot read-and-clear of the "session expired" notice.
    ///
    /// Returns true at most once per forced invalidation; the caller shows
    /// the notice and routes to re-authentication.
    pub fn take_expired_notice(&self) -> bool {
        if self.store.read_flag() {
            self.store.clear_flag();
            true
        } else {
            false
        }
    }

    /// The chokepoint transports forward failures to.
    pub fn invalidation_handler(&self) -> &InvalidationHandler {
        &self.invalidation
    }

    /// The reconciler, for consumers that subscribe to session state.
    pub fn reconciler(&self) -> &Arc<SessionReconciler> {
        &self.reconciler
    }

    /// Credential adapter for the generated typed API client.
    pub fn typed_client_auth(&self) -> &TypedClientAuth {
        &self.typed_auth
    }

    /// Builds a generic HTTP client wired to this engine's store and
    /// invalidation handler.
    pub fn http_client(&self, base_url: impl Into<String>) -> Result<HttpClient, TransportError> {
        HttpClient::new(base_url, self.store.clone(), self.invalidation.clone())
    }
}

impl Default for SessionEngine {
    fn default() -> Self {
        Self::new()
    }
}
