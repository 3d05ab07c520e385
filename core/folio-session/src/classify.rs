//! Failure classification.
//!
//! Two independent transport layers can reject a request: the generated typed
//! API client (errors carry a status code directly) and the generic HTTP
//! transport (errors carry a status nested in the response, when a response
//! arrived at all). Neither layer knows about the other; this module
//! normalizes both shapes into one optional status code so the invalidation
//! handler has a single decision to make.

use std::error::Error;

use crate::transport::http::TransportError;
use crate::transport::typed::ApiError;

/// The only status this subsystem acts on.
pub const STATUS_UNAUTHORIZED: u16 = 401;

/// Extracts an HTTP status code from an arbitrary failure, if it has one.
///
/// Checks the typed-client shape first (status carried directly), then the
/// generic-transport shape (status nested in the response). Every other error
/// type, including io errors and foreign error types from other crates,
/// degrades to `None`. Never panics.
pub fn classify(failure: &(dyn Error + 'static)) -> Option<u16> {
    if let Some(api) = failure.downcast_ref::<ApiError>() {
        return Some(api.status);
    }

    if let Some(transport) = failure.downcast_ref::<TransportError>() {
        return transport.response().map(|r| r.status);
    }

    None
}
