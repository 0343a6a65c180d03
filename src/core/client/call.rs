//! The request orchestrator: cache, interceptors, retries, recovery and metrics around one call.

use super::options::{ApiOptions, RequestConfig};
use super::retry::{Attempted, RetryConfig, run_with_retry};
use super::ApiClient;
use crate::core::cache::{cache_key, is_cacheable};
use crate::core::error::{ApiError, TransportError};
use crate::core::interceptor::InterceptorPipeline;
use crate::core::metrics::ApiMetric;
use crate::core::recovery::CACHE_KEY_DETAIL;
use chrono::Utc;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;

impl ApiClient {
    /// Calls `endpoint` and decodes the JSON response into `T`.
    ///
    /// See [`api_call_value`](Self::api_call_value) for the full call sequence.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] when the call fails and no recovery strategy
    /// applies, or when the body does not match `T`.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, options), err))]
    pub async fn api_call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: ApiOptions,
    ) -> Result<T, ApiError> {
        let value = self.api_call_value(endpoint, options).await?;
        serde_json::from_value(value).map_err(|e| TransportError::Data(e.to_string()).into())
    }

    /// Calls `endpoint` and returns the raw JSON response.
    ///
    /// In order:
    /// 1. a cache hit (safe methods with caching enabled) is returned immediately;
    /// 2. request interceptors run;
    /// 3. the request is sent with a timeout, retried with exponential backoff while the
    ///    failure is retryable;
    /// 4. on success, response interceptors run and the result is cached if requested;
    /// 5. on failure, error interceptors run and recovery strategies are tried.
    ///
    /// Every completed call appends one metric record. Options rejected up front (an invalid
    /// header) fail before step 1 and are not recorded.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] when no recovery strategy succeeds.
    pub async fn api_call_value(
        &self,
        endpoint: &str,
        options: ApiOptions,
    ) -> Result<Value, ApiError> {
        let opts = options.resolve(endpoint)?;
        let method = opts.request.method.clone();
        let key = cache_key(&method, endpoint, &opts.request.query);
        let use_cache = opts.cache && is_cacheable(&method);
        let started = Instant::now();

        if use_cache && let Some(hit) = self.cache.get(&key).await {
            #[cfg(feature = "tracing")]
            tracing::debug!(cache_key = %key, "cache hit");
            self.record(endpoint, &method, started.elapsed(), 200, true, 0);
            return Ok(hit);
        }

        let pipeline = self.interceptor_snapshot().await;
        let Attempted { result, retries } =
            self.execute(&pipeline, opts.request, opts.retries).await;
        let result = result.and_then(|value| pipeline.apply_response(value));

        match result {
            Ok(value) => {
                if use_cache {
                    self.cache.set(key, value.clone(), opts.cache_ttl).await;
                }
                self.record(endpoint, &method, started.elapsed(), 200, false, retries);
                Ok(value)
            }
            Err(err) => {
                let err = pipeline.apply_error(err);
                self.record(endpoint, &method, started.elapsed(), err.status(), false, retries);
                let err = err.with_detail(CACHE_KEY_DETAIL, key);
                self.recovery.try_recover(&err).await
            }
        }
    }

    async fn execute(
        &self,
        pipeline: &InterceptorPipeline,
        request: RequestConfig,
        max_retries: u32,
    ) -> Attempted<Value> {
        let request = match pipeline.apply_request(request) {
            Ok(r) => r,
            Err(e) => {
                return Attempted {
                    result: Err(e),
                    retries: 0,
                };
            }
        };
        let retry = RetryConfig {
            max_retries,
            ..self.retry.clone()
        };
        run_with_retry(&retry, || self.attempt(&request)).await
    }

    /// One network attempt; the in-flight request is dropped once `request.timeout` elapses.
    async fn attempt(&self, request: &RequestConfig) -> Result<Value, TransportError> {
        match tokio::time::timeout(request.timeout, self.transport.send(&self.base_url, request))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(request.timeout)),
        }
    }

    fn record(
        &self,
        endpoint: &str,
        method: &Method,
        duration: Duration,
        status: u16,
        cache_hit: bool,
        retry_count: u32,
    ) {
        self.metrics.record(ApiMetric {
            endpoint: endpoint.to_string(),
            method: method.as_str().to_string(),
            duration,
            status,
            timestamp: Utc::now(),
            cache_hit,
            retry_count,
        });
    }
}
