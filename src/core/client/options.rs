//! Per-call options and the outgoing request description.

use super::constants::{DEFAULT_CACHE_TTL, DEFAULT_RETRIES, DEFAULT_TIMEOUT};
use crate::core::error::{ApiError, ErrorKind};
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// One file in a multipart upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilePart {
    /// Form field name (e.g. `arquivo`).
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// MIME type; defaults to `application/xml` when `None`.
    pub mime: Option<String>,
}

impl FilePart {
    pub fn xml(field: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            bytes,
            mime: None,
        }
    }
}

/// Request payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    /// Sent as `application/json`.
    Json(Value),
    /// Sent as `multipart/form-data`; the boundary header is set by the HTTP client.
    Multipart(Vec<FilePart>),
}

/// Options for a single [`ApiClient::api_call`](crate::ApiClient::api_call).
///
/// Unset fields fall back to the defaults: 3 retries, 30 s timeout, no caching, 5 min TTL.
#[derive(Clone, Debug, Default)]
pub struct ApiOptions {
    pub method: Option<Method>,
    pub headers: HeaderMap,
    pub query: BTreeMap<String, String>,
    pub body: Body,
    pub timeout: Option<Duration>,
    pub retry: Option<u32>,
    pub cache: bool,
    pub cache_ttl: Option<Duration>,
    /// First header rejected by [`header`](Self::header); fails the call before it is sent.
    invalid_header: Option<String>,
}

impl ApiOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get() -> Self {
        Self::default().method(Method::GET)
    }

    pub fn post(body: Value) -> Self {
        Self::default().method(Method::POST).json(body)
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Adds a header. An invalid name or value makes the call fail with `INVALID_INPUT`
    /// instead of being sent without it.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            (Err(e), _) => {
                self.invalid_header
                    .get_or_insert_with(|| format!("invalid header name {name:?}: {e}"));
            }
            (_, Err(e)) => {
                self.invalid_header
                    .get_or_insert_with(|| format!("invalid value for header {name:?}: {e}"));
            }
        }
        self
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.insert(key.into(), value.to_string());
        self
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Body::Json(body);
        self
    }

    #[must_use]
    pub fn multipart(mut self, parts: Vec<FilePart>) -> Self {
        self.body = Body::Multipart(parts);
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn retry(mut self, retries: u32) -> Self {
        self.retry = Some(retries);
        self
    }

    /// Enables caching with the given TTL (only effective for safe methods).
    #[must_use]
    pub const fn cached(mut self, ttl: Duration) -> Self {
        self.cache = true;
        self.cache_ttl = Some(ttl);
        self
    }

    #[must_use]
    pub const fn cache(mut self, enabled: bool) -> Self {
        self.cache = enabled;
        self
    }

    /// Applies the defaults.
    ///
    /// # Errors
    ///
    /// Fails with `INVALID_INPUT` (status 0) if a header was rejected.
    pub(crate) fn resolve(self, endpoint: &str) -> Result<ResolvedOptions, ApiError> {
        if let Some(reason) = self.invalid_header {
            return Err(ApiError::new(0, ErrorKind::InvalidInput, reason));
        }
        Ok(ResolvedOptions {
            request: RequestConfig {
                method: self.method.unwrap_or(Method::GET),
                endpoint: endpoint.to_string(),
                headers: self.headers,
                query: self.query,
                body: self.body,
                timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            },
            retries: self.retry.unwrap_or(DEFAULT_RETRIES),
            cache: self.cache,
            cache_ttl: self.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL),
        })
    }
}

/// Options after defaults are applied.
#[derive(Clone, Debug)]
pub(crate) struct ResolvedOptions {
    pub(crate) request: RequestConfig,
    pub(crate) retries: u32,
    pub(crate) cache: bool,
    pub(crate) cache_ttl: Duration,
}

/// The outgoing request as seen by request interceptors and transports.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestConfig {
    pub method: Method,
    /// Path relative to the client's base URL, e.g. `/api/v1/api/documents`.
    pub endpoint: String,
    pub headers: HeaderMap,
    pub query: BTreeMap<String, String>,
    pub body: Body,
    pub timeout: Duration,
}
