//! Observable load/error/data state over a single endpoint.

use crate::core::client::{ApiClient, ApiOptions};
use crate::core::error::{ApiError, user_friendly_message};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Snapshot of an [`ApiResource`].
#[derive(Clone, Debug, PartialEq)]
pub struct RequestState<T> {
    /// Last successfully loaded value. Kept when a later refresh fails.
    pub data: Option<T>,
    /// User-facing message of the last failure, cleared when a refresh starts.
    pub error: Option<String>,
    pub is_loading: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
            last_updated: None,
        }
    }
}

/// Bookkeeping for overlapping loads. Only touched inside `watch` updates, which serialize it.
#[derive(Debug, Default)]
struct Loads {
    latest: AtomicU64,
    outstanding: AtomicUsize,
}

impl Loads {
    fn start(&self) -> u64 {
        self.outstanding.fetch_add(1, Ordering::Relaxed);
        self.latest.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// `(is_newest, none_left)` for the load that just ended.
    fn finish(&self, generation: u64) -> (bool, bool) {
        let left = self.outstanding.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
        (self.latest.load(Ordering::Relaxed) == generation, left == 0)
    }
}

/// A live view over one endpoint, refreshed on demand.
///
/// Created by [`ApiClient::api_call_with_state`], which starts the first load immediately.
/// Clones share the same state. When refreshes overlap, only the most recently started one
/// may publish `data` or `error`, and `is_loading` stays raised until all of them end.
pub struct ApiResource<T> {
    client: ApiClient,
    endpoint: String,
    options: ApiOptions,
    state: Arc<watch::Sender<RequestState<T>>>,
    loads: Arc<Loads>,
}

impl<T> Clone for ApiResource<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            endpoint: self.endpoint.clone(),
            options: self.options.clone(),
            state: self.state.clone(),
            loads: self.loads.clone(),
        }
    }
}

impl<T> fmt::Debug for ApiResource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiResource")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl<T> ApiResource<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// A resource in its initial idle state; nothing is fetched until [`refresh`](Self::refresh).
    pub fn new(client: ApiClient, endpoint: impl Into<String>, options: ApiOptions) -> Self {
        let (tx, _rx) = watch::channel(RequestState::default());
        Self {
            client,
            endpoint: endpoint.into(),
            options,
            state: Arc::new(tx),
            loads: Arc::new(Loads::default()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Current snapshot.
    pub fn state(&self) -> RequestState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.state.subscribe()
    }

    /// Reloads the endpoint. On failure the previous `data` stays available.
    pub async fn refresh(&self) {
        self.begin().run().await;
    }

    /// Starts a refresh in the background. The loading flag is raised before this returns.
    pub fn spawn_refresh(&self) -> JoinHandle<()> {
        tokio::spawn(self.begin().run())
    }

    /// Waits until no refresh is in progress and returns that snapshot.
    pub async fn settled(&self) -> RequestState<T> {
        let mut rx = self.subscribe();
        let settled = rx.wait_for(|s| !s.is_loading).await.map(|s| s.clone());
        settled.unwrap_or_else(|_| self.state())
    }

    fn begin(&self) -> PendingLoad<T> {
        let mut generation = 0;
        self.state.send_modify(|s| {
            generation = self.loads.start();
            s.is_loading = true;
            s.error = None;
        });
        PendingLoad {
            resource: self.clone(),
            generation,
            result: None,
        }
    }

    fn finish(&self, generation: u64, result: Option<Result<T, ApiError>>) {
        self.state.send_modify(|s| {
            let (newest, idle) = self.loads.finish(generation);
            match result {
                Some(Ok(data)) if newest => {
                    s.data = Some(data);
                    s.last_updated = Some(Utc::now());
                }
                Some(Err(e)) if newest => s.error = Some(user_friendly_message(&e).to_string()),
                _ => {}
            }
            if idle {
                s.is_loading = false;
            }
        });
    }
}

/// One started load. Publishes its outcome when dropped, so a refresh that is cancelled
/// (even before its first poll) still releases the loading flag.
struct PendingLoad<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    resource: ApiResource<T>,
    generation: u64,
    result: Option<Result<T, ApiError>>,
}

impl<T> PendingLoad<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn run(mut self) {
        let resource = &self.resource;
        let result = resource
            .client
            .api_call::<T>(&resource.endpoint, resource.options.clone())
            .await;
        self.result = Some(result);
    }
}

impl<T> Drop for PendingLoad<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.resource.finish(self.generation, self.result.take());
    }
}

impl ApiClient {
    /// Wraps `endpoint` in an [`ApiResource`] and starts loading it.
    ///
    /// Must be called within a Tokio runtime.
    pub fn api_call_with_state<T>(
        &self,
        endpoint: impl Into<String>,
        options: ApiOptions,
    ) -> ApiResource<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let resource = ApiResource::new(self.clone(), endpoint, options);
        // Detached: completion is observed through the watch channel.
        drop(resource.spawn_refresh());
        resource
    }
}
