//! Funnels same-process and other-process change notifications into one
//! resync path.
//!
//! Other Folio processes mutate the same store files; a `notify` watcher on
//! the store root surfaces those changes. Same-process invalidation arrives on
//! the signal channel. Both end up as the same payload-free resync signal
//! handled by one background thread, so there is exactly one code path from
//! "something changed" to [`SessionReconciler::resync`].
//!
//! The watcher is the optional half: if the filesystem watch cannot be
//! established the bridge still drains the signal channel, so same-process
//! logins and 401s keep reconciling and only other-process changes go
//! unobserved. Watcher events are filtered to the two files the store owns;
//! unrelated files in the same directory never trigger a resync. Delivery is
//! treated as at-least-once and unordered, which resync is built to tolerate.

use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::reconciler::SessionReconciler;
use crate::signal::{SessionNotifier, Signal, SignalReceiver};
use crate::storage::StorePaths;

const IDLE_TIMEOUT_SECS: u64 = 60;

/// Watches the store for external changes and drives reconciliation.
///
/// Dropping the bridge tears down both subscriptions: the watcher is dropped
/// with the struct and the background thread is signaled and joined.
pub struct CrossTabBridge {
    shutdown: SessionNotifier,
    handle: Option<JoinHandle<()>>,
    // Held for its Drop; dropping deregisters the filesystem watch.
    _watcher: Option<RecommendedWatcher>,
}

impl CrossTabBridge {
    /// Starts the resync thread, and the filesystem watcher when possible.
    ///
    /// A failed watch (e.g. inotify exhaustion) costs cross-process
    /// propagation only; it is logged and the signal channel keeps draining.
    ///
    /// `notifier`/`signals` are the two halves of the session channel; the
    /// invalidation handler holds its own clone of the sender.
    pub fn start(
        paths: &StorePaths,
        reconciler: Arc<SessionReconciler>,
        notifier: SessionNotifier,
        signals: SignalReceiver,
    ) -> Self {
        let watcher = match watch_store(paths, notifier.clone()) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!(
                    error = %e,
                    "Session store watcher unavailable, other-process changes will not be observed"
                );
                None
            }
        };

        Self::assemble(watcher, reconciler, notifier, signals)
    }

    /// Drain-only bridge with no filesystem watch, as `start` degrades to
    /// when the watch cannot be established.
    #[cfg(test)]
    pub(crate) fn start_without_watcher(
        reconciler: Arc<SessionReconciler>,
        notifier: SessionNotifier,
        signals: SignalReceiver,
    ) -> Self {
        Self::assemble(None, reconciler, notifier, signals)
    }

    fn assemble(
        watcher: Option<RecommendedWatcher>,
        reconciler: Arc<SessionReconciler>,
        notifier: SessionNotifier,
        signals: SignalReceiver,
    ) -> Self {
        let handle = std::thread::spawn(move || loop {
            match signals.rx.recv_timeout(Duration::from_secs(IDLE_TIMEOUT_SECS)) {
                Ok(Signal::Resync) => {
                    debug!("Session change signal received, reconciling");
                    reconciler.resync();
                }
                Ok(Signal::Shutdown) => break,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        CrossTabBridge {
            shutdown: notifier,
            handle: Some(handle),
            _watcher: watcher,
        }
    }
}

impl Drop for CrossTabBridge {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Establishes the filesystem watch on the store root, filtered to the two
/// files the store owns.
fn watch_store(
    paths: &StorePaths,
    notifier: SessionNotifier,
) -> Result<RecommendedWatcher, notify::Error> {
    paths.ensure_dirs().map_err(notify::Error::io)?;

    let session_name = paths
        .session_file()
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    let flag_name = paths
        .expired_flag_file()
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();

    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        if let Ok(event) = res {
            if is_store_change(&event, &session_name, &flag_name) {
                notifier.notify();
            }
        }
    })?;

    watcher.watch(paths.root(), RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

/// Whether a filesystem event touches one of the two files the store owns.
fn is_store_change(
    event: &Event,
    session_name: &std::ffi::OsStr,
    flag_name: &std::ffi::OsStr,
) -> bool {
    if !matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    ) {
        return false;
    }
    event.paths.iter().any(|path| {
        path.file_name()
            .map(|name| name == session_name || name == flag_name)
            .unwrap_or(false)
    })
}
