//! Core components of the `fiscal-api-rs` client.
//!
//! This module contains the request layer every backend call goes through:
//! - The main [`ApiClient`], its builder and the `api_call` orchestrator.
//! - The classified [`ApiError`] and the error taxonomy.
//! - Retry, caching, interceptor, recovery and metrics building blocks.
//! - The reactive [`ApiResource`] wrapper for UI layers.

/// Response cache with per-entry TTL.
pub mod cache;
/// The main client (`ApiClient`), builder, per-call options and retry engine.
pub mod client;
/// Error taxonomy, classification and user-facing messages.
pub mod error;
pub mod interceptor;
/// Bounded per-call metrics and rollups.
pub mod metrics;
pub mod net;
pub mod recovery;
/// Service traits for abstracting the HTTP primitive.
pub mod services;
pub mod state;

// convenient re-exports so most code can just `use crate::core::ApiClient`
pub use cache::ResponseCache;
pub use client::{
    ApiClient, ApiClientBuilder, ApiOptions, Body, FilePart, RequestConfig, RetryConfig,
    is_retryable_error, with_retry,
};
pub use error::{ApiError, ErrorKind, TransportError, handle_api_error, user_friendly_message};
pub use interceptor::{FnInterceptor, Interceptor, InterceptorPipeline};
pub use metrics::{ApiMetric, EndpointTiming, MetricsRecorder, PerformanceData};
pub use recovery::{
    CacheFallback, Reauthenticator, RecoveryManager, RecoveryStrategy, SessionRefresh,
};
pub use services::Transport;
pub use state::{ApiResource, RequestState};
