//! Public client surface + builder.
//! Internals are split into `call` (the request orchestrator), `options` (per-call knobs),
//! `retry` (backoff engine) and `constants` (UA + defaults).

mod call;
mod constants;
mod options;
pub mod retry;

pub use options::{ApiOptions, Body, FilePart, RequestConfig};
pub use retry::{RetryConfig, RetryPredicate, is_retryable_error, with_retry};

use crate::core::cache::ResponseCache;
use crate::core::error::{ApiError, TransportError};
use crate::core::interceptor::{Interceptor, InterceptorPipeline};
use crate::core::metrics::{MetricsRecorder, PerformanceData};
use crate::core::net::HttpTransport;
use crate::core::recovery::{
    Reauthenticator, RecoveryManager, RecoveryStrategy, default_strategies,
};
use crate::core::services::Transport;
use constants::{BASE_URL_ENV_VARS, DEFAULT_BASE_URL, USER_AGENT};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use url::Url;

/// Entry point to the backend API.
///
/// Holds the per-session shared state: response cache, metrics buffer, interceptors and
/// recovery strategies. Cloning is cheap and clones share that state.
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    transport: Arc<dyn Transport>,
    retry: RetryConfig,
    cache: Arc<ResponseCache>,
    metrics: Arc<MetricsRecorder>,
    interceptors: Arc<RwLock<Vec<Arc<dyn Interceptor>>>>,
    recovery: Arc<RecoveryManager>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new builder.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn metrics(&self) -> &Arc<MetricsRecorder> {
        &self.metrics
    }

    /// Drops cached responses whose key contains `pattern`, or everything when `None`.
    pub async fn clear_cache(&self, pattern: Option<&str>) {
        self.cache.clear(pattern).await;
    }

    /// Rollup of the last hour of calls made through this client.
    pub fn performance_data(&self) -> PerformanceData {
        self.metrics.performance_data()
    }

    /// Appends an interceptor. Calls already in flight keep the list they started with.
    pub async fn add_interceptor(&self, interceptor: impl Interceptor + 'static) {
        self.interceptors.write().await.push(Arc::new(interceptor));
    }

    pub async fn add_recovery_strategy(&self, strategy: Arc<dyn RecoveryStrategy>) {
        self.recovery.add_strategy(strategy).await;
    }

    pub(crate) async fn interceptor_snapshot(&self) -> InterceptorPipeline {
        InterceptorPipeline::new(self.interceptors.read().await.clone())
    }
}

/* ----------------------- Builder ----------------------- */

#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<Url>,
    base_url_raw: Option<String>,
    user_agent: Option<String>,
    connect_timeout: Option<Duration>,
    retry: Option<RetryConfig>,
    transport: Option<Arc<dyn Transport>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    strategies: Vec<Arc<dyn RecoveryStrategy>>,
    reauthenticator: Option<Arc<dyn Reauthenticator>>,
    skip_default_recovery: bool,
}

impl ApiClientBuilder {
    /// A builder whose base URL comes from `NUXT_PUBLIC_API_BASE_URL` or `API_BASE_URL`.
    pub fn from_env() -> Self {
        let raw = BASE_URL_ENV_VARS
            .iter()
            .find_map(|name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()));
        Self {
            base_url_raw: raw,
            ..Self::default()
        }
    }

    /// Override the backend root (default `http://localhost:8000`).
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Override the User-Agent.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set a connect timeout. Default: none.
    pub fn connect_timeout(mut self, dur: Duration) -> Self {
        self.connect_timeout = Some(dur);
        self
    }

    /// Backoff and predicate used by every call. The per-call `retry` option overrides
    /// `max_retries` only.
    pub fn retry_config(mut self, cfg: RetryConfig) -> Self {
        self.retry = Some(cfg);
        self
    }

    /// Replace the HTTP primitive.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Register an interceptor; interceptors run in registration order.
    pub fn interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Append a recovery strategy after the defaults.
    pub fn recovery_strategy(mut self, strategy: Arc<dyn RecoveryStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Collaborator used by the session-expired strategy.
    pub fn reauthenticator(mut self, reauth: Arc<dyn Reauthenticator>) -> Self {
        self.reauthenticator = Some(reauth);
        self
    }

    /// Do not install the cache-fallback and session-refresh strategies.
    pub fn without_default_recovery(mut self) -> Self {
        self.skip_default_recovery = true;
        self
    }

    /// # Errors
    ///
    /// Fails if the base URL is invalid or the HTTP client cannot be constructed.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let base_url = match (self.base_url, self.base_url_raw) {
            (Some(url), _) => url,
            (None, Some(raw)) => Url::parse(&raw).map_err(TransportError::from)?,
            (None, None) => Url::parse(DEFAULT_BASE_URL).map_err(TransportError::from)?,
        };

        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => {
                let mut httpb = reqwest::Client::builder()
                    .user_agent(self.user_agent.as_deref().unwrap_or(USER_AGENT));
                if let Some(ct) = self.connect_timeout {
                    httpb = httpb.connect_timeout(ct);
                }
                let http = httpb.build().map_err(TransportError::from)?;
                Arc::new(HttpTransport::new(http))
            }
        };

        let cache = Arc::new(ResponseCache::new());
        let mut strategies = if self.skip_default_recovery {
            Vec::new()
        } else {
            default_strategies(cache.clone(), self.reauthenticator)
        };
        strategies.extend(self.strategies);
        let recovery = Arc::new(RecoveryManager::from_strategies(strategies));

        Ok(ApiClient {
            base_url,
            transport,
            retry: self.retry.unwrap_or_default(),
            cache,
            metrics: Arc::new(MetricsRecorder::new()),
            interceptors: Arc::new(RwLock::new(self.interceptors)),
            recovery,
        })
    }
}
