//! Request / response / error hooks applied around every call.

use crate::core::client::RequestConfig;
use crate::core::error::ApiError;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A hook that transforms requests, responses or errors passing through the client.
///
/// All methods default to the identity. Returning `Err` aborts the remaining interceptors and
/// the returned error replaces the in-flight value.
pub trait Interceptor: Send + Sync {
    fn on_request(&self, request: RequestConfig) -> Result<RequestConfig, ApiError> {
        Ok(request)
    }

    fn on_response(&self, response: Value) -> Result<Value, ApiError> {
        Ok(response)
    }

    /// `Ok` passes the (possibly rewritten) error on to the next interceptor.
    fn on_error(&self, error: ApiError) -> Result<ApiError, ApiError> {
        Ok(error)
    }
}

type RequestHook = Box<dyn Fn(RequestConfig) -> Result<RequestConfig, ApiError> + Send + Sync>;
type ResponseHook = Box<dyn Fn(Value) -> Result<Value, ApiError> + Send + Sync>;
type ErrorHook = Box<dyn Fn(ApiError) -> Result<ApiError, ApiError> + Send + Sync>;

/// An [`Interceptor`] assembled from closures.
///
/// ```
/// use fiscal_api_rs::FnInterceptor;
///
/// let auth = FnInterceptor::new().on_request(|mut req| {
///     req.headers.insert("authorization", "Bearer t0k3n".parse().unwrap());
///     Ok(req)
/// });
/// # let _ = auth;
/// ```
#[derive(Default)]
pub struct FnInterceptor {
    request: Option<RequestHook>,
    response: Option<ResponseHook>,
    error: Option<ErrorHook>,
}

impl FnInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_request<F>(mut self, f: F) -> Self
    where
        F: Fn(RequestConfig) -> Result<RequestConfig, ApiError> + Send + Sync + 'static,
    {
        self.request = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_response<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, ApiError> + Send + Sync + 'static,
    {
        self.response = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(ApiError) -> Result<ApiError, ApiError> + Send + Sync + 'static,
    {
        self.error = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for FnInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnInterceptor")
            .field("request", &self.request.is_some())
            .field("response", &self.response.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

impl Interceptor for FnInterceptor {
    fn on_request(&self, request: RequestConfig) -> Result<RequestConfig, ApiError> {
        match &self.request {
            Some(f) => f(request),
            None => Ok(request),
        }
    }

    fn on_response(&self, response: Value) -> Result<Value, ApiError> {
        match &self.response {
            Some(f) => f(response),
            None => Ok(response),
        }
    }

    fn on_error(&self, error: ApiError) -> Result<ApiError, ApiError> {
        match &self.error {
            Some(f) => f(error),
            None => Ok(error),
        }
    }
}

/// An ordered, immutable snapshot of registered interceptors.
#[derive(Clone, Default)]
pub struct InterceptorPipeline {
    hooks: Vec<Arc<dyn Interceptor>>,
}

impl fmt::Debug for InterceptorPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorPipeline")
            .field("len", &self.hooks.len())
            .finish()
    }
}

impl InterceptorPipeline {
    pub fn new(hooks: Vec<Arc<dyn Interceptor>>) -> Self {
        Self { hooks }
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Folds every request hook over `request` in registration order.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a hook.
    pub fn apply_request(&self, request: RequestConfig) -> Result<RequestConfig, ApiError> {
        self.hooks
            .iter()
            .try_fold(request, |req, hook| hook.on_request(req))
    }

    /// Folds every response hook over `response` in registration order.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a hook.
    pub fn apply_response(&self, response: Value) -> Result<Value, ApiError> {
        self.hooks
            .iter()
            .try_fold(response, |resp, hook| hook.on_response(resp))
    }

    /// Folds every error hook over `error`; a hook returning `Err` stops the fold and wins.
    pub fn apply_error(&self, error: ApiError) -> ApiError {
        let mut current = error;
        for hook in &self.hooks {
            match hook.on_error(current) {
                Ok(next) => current = next,
                Err(replacement) => return replacement,
            }
        }
        current
    }
}
