//! Document upload and processing-status endpoints.

mod model;
mod poll;

pub use model::{DocumentStatus, ProcessingStatus, UploadResponse};
pub use poll::{PollConfig, PollState, StatusPoller};

use crate::core::{ApiClient, ApiError, ApiOptions, ApiResource, FilePart};
use futures::future::try_join_all;
use reqwest::Method;
use std::time::Duration;

const UPLOAD_ENDPOINT: &str = "/agentes/upload-xml";
const UPLOAD_FIELD: &str = "arquivo";
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);
const UPLOAD_RETRIES: u32 = 1;

pub(crate) fn status_endpoint(document_id: &str) -> String {
    format!("/api/v1/api/documents/{document_id}/status")
}

/// Document operations bound to a client.
///
/// # Example
///
/// ```no_run
/// # use fiscal_api_rs::{ApiClient, Documents, PollConfig};
/// # #[tokio::main]
/// # async fn main() -> Result<(), fiscal_api_rs::ApiError> {
/// let client = ApiClient::builder().build()?;
/// let docs = Documents::new(&client);
/// let xml = std::fs::read("nfe.xml").unwrap_or_default();
/// let uploaded = docs.upload_xml("nfe.xml", xml).await?;
/// let done = docs
///     .poll_status(&uploaded.document_id, PollConfig::default(), |s| {
///         println!("{}%", s.progress)
///     })
///     .await?;
/// println!("{:?}", done.status);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Documents {
    client: ApiClient,
}

impl Documents {
    pub fn new(client: &ApiClient) -> Self {
        Self {
            client: client.clone(),
        }
    }

    /// Uploads one XML file as multipart form data (60 s timeout, one retry).
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the upload.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, bytes), err))]
    pub async fn upload_xml(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, ApiError> {
        let options = ApiOptions::new()
            .method(Method::POST)
            .multipart(vec![FilePart::xml(UPLOAD_FIELD, file_name, bytes)])
            .timeout(UPLOAD_TIMEOUT)
            .retry(UPLOAD_RETRIES);
        self.client.api_call(UPLOAD_ENDPOINT, options).await
    }

    /// Uploads all files concurrently.
    ///
    /// # Errors
    ///
    /// Fails with the first upload error.
    pub async fn upload_multiple_xml(
        &self,
        files: Vec<(String, Vec<u8>)>,
    ) -> Result<Vec<UploadResponse>, ApiError> {
        let uploads = files
            .into_iter()
            .map(|(name, bytes)| async move { self.upload_xml(&name, bytes).await });
        try_join_all(uploads).await
    }

    /// Live status of one document (never cached, two retries).
    pub fn status(&self, document_id: &str) -> ApiResource<DocumentStatus> {
        self.client
            .api_call_with_state(status_endpoint(document_id), ApiOptions::get().retry(2))
    }

    /// Polls the document's status until it completes, errors or the schedule runs out.
    ///
    /// # Errors
    ///
    /// See [`StatusPoller::run`].
    pub async fn poll_status<F>(
        &self,
        document_id: &str,
        config: PollConfig,
        on_update: F,
    ) -> Result<DocumentStatus, ApiError>
    where
        F: FnMut(&DocumentStatus),
    {
        StatusPoller::new(&self.client, document_id, config)
            .run(on_update)
            .await
    }
}
