//! Same-process resync signaling.
//!
//! A single mpsc channel carries payload-free resync events from the
//! invalidation handler (same-process 401s) and from the filesystem watcher
//! (other-process changes) to the bridge thread, which funnels both into
//! [`crate::reconciler::SessionReconciler::resync`]. Delivery is
//! fire-and-forget: a send to a torn-down bridge is silently dropped.

use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Signal {
    /// The store may have changed; re-derive in-memory state from it.
    Resync,
    /// Tear down the bridge thread.
    Shutdown,
}

/// Sending half of the session signal channel.
#[derive(Clone)]
pub struct SessionNotifier {
    tx: Sender<Signal>,
}

impl SessionNotifier {
    /// Fire-and-forget resync notification.
    pub(crate) fn notify(&self) {
        let _ = self.tx.send(Signal::Resync);
    }

    pub(crate) fn shutdown(&self) {
        let _ = self.tx.send(Signal::Shutdown);
    }
}

/// Receiving half of the session signal channel, consumed by the bridge.
pub struct SignalReceiver {
    pub(crate) rx: Receiver<Signal>,
}

/// Creates the channel wiring the invalidation handler and watcher to the
/// bridge.
pub fn signal_channel() -> (SessionNotifier, SignalReceiver) {
    let (tx, rx) = mpsc::channel();
    (SessionNotifier { tx }, SignalReceiver { rx })
}
