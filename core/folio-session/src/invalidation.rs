//! The single chokepoint for credential rejection.
//!
//! Both transports hand their failures here. Anything that classifies as a
//! 401 ends the persisted session; everything else is deliberately ignored so
//! presentation code can render its own error states.

use std::error::Error;

use tracing::debug;

use crate::classify::{classify, STATUS_UNAUTHORIZED};
use crate::signal::SessionNotifier;
use crate::store::SessionStore;

/// Clears the session on classified 401s.
///
/// Safe to call from any error path with any failure; never panics and never
/// mutates the failure itself.
#[derive(Clone)]
pub struct InvalidationHandler {
    store: SessionStore,
    notifier: SessionNotifier,
}

impl InvalidationHandler {
    pub fn new(store: SessionStore, notifier: SessionNotifier) -> Self {
        InvalidationHandler { store, notifier }
    }

    /// Handles one failure. Non-401 classifications (including failures with
    /// no status at all) are explicit no-ops.
    ///
    /// On a 401 the store is cleared unconditionally, but the expired flag and
    /// the resync signal fire only if a credential existed beforehand: a stale
    /// in-flight request racing a prior logout must not re-trigger the
    /// "session expired" flow for a user who was never logged in for it.
    pub fn handle(&self, failure: &(dyn Error + 'static)) {
        let Some(status) = classify(failure) else {
            return;
        };
        if status != STATUS_UNAUTHORIZED {
            return;
        }

        let had_credential = self.store.read_credential().is_some();
        self.store.clear();

        if had_credential {
            debug!("Credential rejected by backend, ending session");
            self.store.set_flag();
            self.notifier.notify();
        }
    }
}
