//! # folio-session
//!
//! Session lifecycle core for Folio, a portfolio-viewing dashboard. Owns how
//! the authentication credential is stored, how its rejection by the backend
//! is detected, and how invalidation propagates consistently to every
//! consumer, including other Folio processes sharing the same store.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Store reads are cheap file
//!   reads; clients wrap with async if needed.
//! - **Graceful degradation**: Storage trouble costs persistence, never
//!   correctness. Missing or corrupt state reads as "not logged in".
//! - **One invalidation decision**: Both transports funnel failures through a
//!   single chokepoint; only a classified 401 ends the session.
//! - **Race-safe reconciliation**: Resync compares the store against current
//!   in-memory state, so duplicate and stale notifications are no-ops.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use folio_session::SessionEngine;
//!
//! let engine = SessionEngine::new();
//! engine.login("tok-1", "alice");
//! assert!(engine.view().is_authenticated());
//! ```

pub mod bridge;
pub mod classify;
pub mod engine;
pub mod invalidation;
pub mod reconciler;
pub mod signal;
pub mod storage;
pub mod store;
pub mod transport;

pub use bridge::CrossTabBridge;
pub use classify::{classify, STATUS_UNAUTHORIZED};
pub use engine::SessionEngine;
pub use invalidation::InvalidationHandler;
pub use reconciler::{AuthView, SessionReconciler};
pub use signal::{signal_channel, SessionNotifier, SignalReceiver};
pub use storage::StorePaths;
pub use store::SessionStore;
pub use transport::{ApiError, HttpClient, ResponseInfo, TransportError, TypedClientAuth};
