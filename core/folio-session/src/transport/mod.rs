//! Transport seams the session core instruments.
//!
//! Request/response plumbing belongs to the transports themselves; this
//! module only adds the two session-aware behaviors: fresh credential
//! attachment on the way out, and invalidation forwarding on the way back.

pub mod http;
pub mod typed;

pub use http::{HttpClient, ResponseInfo, TransportError};
pub use typed::{ApiError, TypedClientAuth};
