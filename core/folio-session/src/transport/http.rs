//! Generic HTTP transport, instrumented for session invalidation.
//!
//! A thin wrapper over a blocking `reqwest` client that does two things the
//! raw client does not:
//!
//! 1. Reads the credential fresh from [`SessionStore`] on every request and
//!    attaches it as a bearer `Authorization` header. The credential is never
//!    cached on the client, so a login or logout in between requests takes
//!    effect immediately.
//! 2. Forwards every failure to the [`InvalidationHandler`] before returning
//!    it unchanged to the caller. Non-401 failures pass through untouched for
//!    presentation-level handling; the chokepoint only acts on 401.

use std::error::Error;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::invalidation::InvalidationHandler;
use crate::store::SessionStore;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// The slice of a rejected response this subsystem cares about.
#[derive(Debug, Clone)]
pub struct ResponseInfo {
    pub status: u16,
}

/// Failure raised by the generic transport.
///
/// The status code, when a response arrived, lives nested under the response
/// rather than on the error itself; [`crate::classify::classify`] knows how to
/// dig it out.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed before a response arrived: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },

    #[error("request to {url} was rejected with status {}", .response.status)]
    Rejected { url: String, response: ResponseInfo },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl TransportError {
    /// The rejected response, when one arrived.
    pub fn response(&self) -> Option<&ResponseInfo> {
        match self {
            TransportError::Rejected { response, .. } => Some(response),
            _ => None,
        }
    }
}

/// Blocking JSON-over-HTTP client for the dashboard backend.
pub struct HttpClient {
    inner: reqwest::blocking::Client,
    base_url: String,
    store: SessionStore,
    invalidation: InvalidationHandler,
}

impl HttpClient {
    pub fn new(
        base_url: impl Into<String>,
        store: SessionStore,
        invalidation: InvalidationHandler,
    ) -> Result<Self, TransportError> {
        let inner = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|source| TransportError::Client { source })?;

        Ok(HttpClient {
            inner,
            base_url: base_url.into(),
            store,
            invalidation,
        })
    }

    pub fn get(&self, path: &str) -> Result<Value, TransportError> {
        self.execute(reqwest::Method::GET, path, None)
    }

    pub fn post(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        self.execute(reqwest::Method::POST, path, Some(body))
    }

    fn execute(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        let url = join_url(&self.base_url, path);

        let mut request = self.inner.request(method, &url);

        // Read fresh on every request, never cached on the client.
        if let Some(credential) = self.store.read_credential() {
            request = request.bearer_auth(credential);
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let result = match request.send() {
            Err(source) => Err(TransportError::Network {
                url,
                source: Box::new(source),
            }),
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    response
                        .json()
                        .map_err(|source| TransportError::Decode { url, source })
                } else {
                    debug!(status = status.as_u16(), "Backend rejected request");
                    Err(TransportError::Rejected {
                        url,
                        response: ResponseInfo {
                            status: status.as_u16(),
                        },
                    })
                }
            }
        };

        // Every failure funnels through the invalidation chokepoint, then
        // propagates unchanged so callers can render their own error states.
        if let Err(failure) = &result {
            self.invalidation.handle(failure);
        }

        result
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url_handles_slashes() {
        assert_eq!(
            join_url("https://api.example.com/", "/positions"),
            "https://api.example.com/positions"
        );
        assert_eq!(
            join_url("https://api.example.com", "positions"),
            "https://api.example.com/positions"
        );
    }

    #[test]
    fn test_rejected_error_exposes_response() {
        let err = TransportError::Rejected {
            url: "https://api.example.com/positions".to_string(),
            response: ResponseInfo { status: 401 },
        };
        assert_eq!(err.response().map(|r| r.status), Some(401));
    }

    #[test]
    fn test_network_error_has_no_response() {
        let err = TransportError::Network {
            url: "https://api.example.com/positions".to_string(),
            source: Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "refused",
            )),
        };
        assert!(err.response().is_none());
    }
}
