//! fiscal-api-rs: resilient request layer for the fiscal-document analytics backend.
//!
//! Every backend call goes through [`ApiClient::api_call`], which layers a TTL response cache,
//! request/response/error interceptors, retries with exponential backoff, recovery strategies
//! and per-call metrics over a pluggable HTTP transport. [`ApiClient::api_call_with_state`]
//! wraps a call in an observable [`ApiResource`] for dashboard widgets.
//!
//! ```no_run
//! # use fiscal_api_rs::{ApiClient, ApiOptions};
//! # use std::time::Duration;
//! # #[tokio::main]
//! # async fn main() -> Result<(), fiscal_api_rs::ApiError> {
//! let client = ApiClient::builder().build()?;
//! let activities: serde_json::Value = client
//!     .api_call(
//!         "/api/v1/api/activity/recent",
//!         ApiOptions::get().query("limit", 10).cached(Duration::from_secs(60)),
//!     )
//!     .await?;
//! println!("{activities}");
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod documents;

pub use crate::core::{
    ApiClient, ApiClientBuilder, ApiError, ApiOptions, ApiResource, Body, ErrorKind, FilePart,
    FnInterceptor, Interceptor, PerformanceData, RecoveryStrategy, RequestConfig, RequestState,
    RetryConfig, Transport, TransportError, handle_api_error, is_retryable_error,
    user_friendly_message, with_retry,
};
pub use documents::{
    DocumentStatus, Documents, PollConfig, PollState, ProcessingStatus, StatusPoller, UploadResponse,
};

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default `fiscal_api_rs=info`).
///
/// Does nothing if a global subscriber is already set.
#[cfg(feature = "tracing-subscriber")]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fiscal_api_rs=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
