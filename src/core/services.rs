use crate::core::client::RequestConfig;
use crate::core::error::TransportError;
use futures::future::BoxFuture;
use serde_json::Value;
use url::Url;

/// A trait for the HTTP primitive underneath the request layer.
///
/// This decouples retries, caching and recovery from the actual network stack. The default
/// implementation is [`HttpTransport`](crate::core::net::HttpTransport), backed by `reqwest`;
/// tests and embedders can plug in their own.
pub trait Transport: Send + Sync {
    /// Performs exactly one attempt of `request` against `base_url`.
    ///
    /// # Returns
    /// The decoded JSON body (`Value::Null` for an empty body) on a 2xx response, or a
    /// [`TransportError`] describing what went wrong. Non-2xx responses must be reported as
    /// [`TransportError::Status`] so the body can drive classification.
    fn send<'a>(
        &'a self,
        base_url: &'a Url,
        request: &'a RequestConfig,
    ) -> BoxFuture<'a, Result<Value, TransportError>>;
}
