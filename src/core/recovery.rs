//! Fallbacks tried once retries are exhausted.

use crate::core::cache::ResponseCache;
use crate::core::error::{ApiError, ErrorKind};
use futures::future::BoxFuture;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Detail key under which the request layer passes the failed call's cache key.
pub const CACHE_KEY_DETAIL: &str = "cache_key";

/// A fallback for a class of failures.
///
/// `Ok` from [`recover`](Self::recover) is a recovery, whatever the value (including
/// `Value::Null`). `Err` declines and lets the next strategy try.
pub trait RecoveryStrategy: Send + Sync {
    fn can_recover(&self, error: &ApiError) -> bool;

    fn recover<'a>(&'a self, error: &'a ApiError) -> BoxFuture<'a, Result<Value, ApiError>>;
}

/// Serves the last cached value for the failed request when the backend is unreachable.
pub struct CacheFallback {
    cache: Arc<ResponseCache>,
}

impl CacheFallback {
    pub fn new(cache: Arc<ResponseCache>) -> Self {
        Self { cache }
    }
}

impl RecoveryStrategy for CacheFallback {
    fn can_recover(&self, error: &ApiError) -> bool {
        matches!(
            error.kind(),
            ErrorKind::NetworkError | ErrorKind::ServiceUnavailable
        )
    }

    fn recover<'a>(&'a self, error: &'a ApiError) -> BoxFuture<'a, Result<Value, ApiError>> {
        Box::pin(async move {
            let key = error
                .detail(CACHE_KEY_DETAIL)
                .and_then(Value::as_str)
                .ok_or_else(|| error.clone())?;
            self.cache.get(key).await.ok_or_else(|| error.clone())
        })
    }
}

/// Re-establishes an expired session. Provided by the authentication layer.
pub trait Reauthenticator: Send + Sync {
    /// Called with the `SESSION_EXPIRED` error; the returned value becomes the call's result.
    fn reauthenticate<'a>(&'a self, error: &'a ApiError) -> BoxFuture<'a, Result<Value, ApiError>>;
}

/// Handles `SESSION_EXPIRED` by delegating to a [`Reauthenticator`]; declines when none is set.
#[derive(Default)]
pub struct SessionRefresh {
    reauth: Option<Arc<dyn Reauthenticator>>,
}

impl SessionRefresh {
    pub fn new(reauth: Option<Arc<dyn Reauthenticator>>) -> Self {
        Self { reauth }
    }
}

impl RecoveryStrategy for SessionRefresh {
    fn can_recover(&self, error: &ApiError) -> bool {
        error.kind() == ErrorKind::SessionExpired
    }

    fn recover<'a>(&'a self, error: &'a ApiError) -> BoxFuture<'a, Result<Value, ApiError>> {
        Box::pin(async move {
            match &self.reauth {
                Some(reauth) => reauth.reauthenticate(error).await,
                None => Err(error.clone()),
            }
        })
    }
}

/// [`CacheFallback`] followed by [`SessionRefresh`].
pub fn default_strategies(
    cache: Arc<ResponseCache>,
    reauth: Option<Arc<dyn Reauthenticator>>,
) -> Vec<Arc<dyn RecoveryStrategy>> {
    vec![
        Arc::new(CacheFallback::new(cache)),
        Arc::new(SessionRefresh::new(reauth)),
    ]
}

/// Ordered list of [`RecoveryStrategy`]s; the first success wins.
#[derive(Default)]
pub struct RecoveryManager {
    strategies: RwLock<Vec<Arc<dyn RecoveryStrategy>>>,
}

impl fmt::Debug for RecoveryManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveryManager").finish_non_exhaustive()
    }
}

impl RecoveryManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_strategies(strategies: Vec<Arc<dyn RecoveryStrategy>>) -> Self {
        Self {
            strategies: RwLock::new(strategies),
        }
    }

    pub async fn add_strategy(&self, strategy: Arc<dyn RecoveryStrategy>) {
        self.strategies.write().await.push(strategy);
    }

    pub async fn len(&self) -> usize {
        self.strategies.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.strategies.read().await.is_empty()
    }

    /// Tries each applicable strategy in order.
    ///
    /// # Errors
    ///
    /// Returns `error` unchanged when no strategy recovers.
    pub async fn try_recover(&self, error: &ApiError) -> Result<Value, ApiError> {
        let strategies = self.strategies.read().await.clone();
        for strategy in strategies {
            if !strategy.can_recover(error) {
                continue;
            }
            match strategy.recover(error).await {
                Ok(value) => return Ok(value),
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(error = %_e, "recovery strategy failed");
                }
            }
        }
        Err(error.clone())
    }
}
