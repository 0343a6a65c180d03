//! Centralized constants for default endpoints, UA and per-call defaults.

use std::time::Duration;

/// Default UA sent with every request.
pub(crate) const USER_AGENT: &str = concat!("fiscal-api-rs/", env!("CARGO_PKG_VERSION"));

/// Backend root used when nothing else is configured.
pub(crate) const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Environment variables consulted by `ApiClientBuilder::from_env`, in order.
pub(crate) const BASE_URL_ENV_VARS: [&str; 2] = ["NUXT_PUBLIC_API_BASE_URL", "API_BASE_URL"];

pub(crate) const DEFAULT_RETRIES: u32 = 3;

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

pub(crate) const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(300_000);
