use crate::core::error::{ApiError, ErrorKind, TransportError};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Decides whether a classified failure should be retried.
pub type RetryPredicate = Arc<dyn Fn(&ApiError) -> bool + Send + Sync>;

/// Configuration for the automatic retry mechanism.
///
/// The delay before retry `n` (0-indexed) is `min(base_delay * backoff_factor^n, max_delay)`.
#[derive(Clone)]
pub struct RetryConfig {
    /// The maximum number of retries to attempt. The total number of attempts will be `max_retries + 1`.
    pub max_retries: u32,
    /// The delay before the first retry.
    pub base_delay: Duration,
    /// The maximum duration to wait between retries.
    pub max_delay: Duration,
    /// The multiplicative factor for each subsequent retry.
    pub backoff_factor: f64,
    /// Failures for which this returns `false` are surfaced immediately.
    pub predicate: RetryPredicate,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            backoff_factor: 2.0,
            predicate: Arc::new(is_retryable_error),
        }
    }
}

impl fmt::Debug for RetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("backoff_factor", &self.backoff_factor)
            .finish_non_exhaustive()
    }
}

impl RetryConfig {
    /// A configuration that never retries.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Replaces the retry predicate.
    #[must_use]
    pub fn with_predicate<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&ApiError) -> bool + Send + Sync + 'static,
    {
        self.predicate = Arc::new(predicate);
        self
    }

    /// Backoff delay to wait after the failed attempt `attempt` (0-indexed).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let max_ms = self.max_delay.as_millis() as f64;
        let delay_ms = self.base_delay.as_millis() as f64 * self.backoff_factor.powi(exp);
        if !delay_ms.is_finite() || delay_ms >= max_ms {
            return self.max_delay;
        }
        Duration::from_millis(delay_ms.round() as u64)
    }
}

/// Whether a failure is transient and worth another attempt.
///
/// True for the network, timeout, connection, server, unavailable and rate-limit kinds,
/// and for any 5xx, 429 or 408 status regardless of kind.
pub fn is_retryable_error(error: &ApiError) -> bool {
    matches!(
        error.kind(),
        ErrorKind::NetworkError
            | ErrorKind::TimeoutError
            | ErrorKind::ConnectionError
            | ErrorKind::ServerError
            | ErrorKind::ServiceUnavailable
            | ErrorKind::RateLimitExceeded
    ) || (500..600).contains(&error.status())
        || error.status() == 429
        || error.status() == 408
}

/// Errors an operation under retry may fail with. Raw failures are classified before the
/// predicate sees them.
pub trait IntoApiError {
    fn into_api_error(self) -> ApiError;
}

impl IntoApiError for ApiError {
    fn into_api_error(self) -> ApiError {
        self
    }
}

impl IntoApiError for TransportError {
    fn into_api_error(self) -> ApiError {
        crate::core::error::handle_api_error(self)
    }
}

/// The result of a retried operation together with the number of retries it consumed.
#[derive(Debug)]
pub(crate) struct Attempted<T> {
    pub(crate) result: Result<T, ApiError>,
    pub(crate) retries: u32,
}

/// Runs `operation` until it succeeds, the retry budget is spent, or the predicate rejects
/// the failure. Fails with the last classified error.
///
/// # Errors
///
/// Returns the [`ApiError`] of the final attempt.
pub async fn with_retry<T, E, F, Fut>(config: &RetryConfig, operation: F) -> Result<T, ApiError>
where
    E: IntoApiError,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    run_with_retry(config, operation).await.result
}

pub(crate) async fn run_with_retry<T, E, F, Fut>(
    config: &RetryConfig,
    mut operation: F,
) -> Attempted<T>
where
    E: IntoApiError,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt: u32 = 0;
    loop {
        let err = match operation().await {
            Ok(value) => {
                return Attempted {
                    result: Ok(value),
                    retries: attempt,
                };
            }
            Err(e) => e.into_api_error(),
        };

        if attempt >= config.max_retries || !(config.predicate)(&err) {
            return Attempted {
                result: Err(err),
                retries: attempt,
            };
        }

        let delay = config.delay_for(attempt);
        #[cfg(feature = "tracing")]
        tracing::warn!(
            attempt = attempt + 1,
            total = config.max_retries + 1,
            delay_ms = crate::core::error::duration_ms(delay),
            error = %err,
            "request failed, retrying"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
