use super::model::{DocumentStatus, ProcessingStatus};
use crate::core::{ApiClient, ApiError, ApiOptions, ErrorKind};
use std::time::Duration;

/// Polling schedule. Defaults to 60 attempts five seconds apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollConfig {
    /// Upper bound on status requests, failed ones included.
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_secs(5),
        }
    }
}

/// Where a poll currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollState {
    Pending,
    Processing,
    Completed,
    Error,
    TimedOut,
}

impl PollState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::TimedOut)
    }
}

impl From<ProcessingStatus> for PollState {
    fn from(s: ProcessingStatus) -> Self {
        match s {
            ProcessingStatus::Pending => Self::Pending,
            ProcessingStatus::Processing => Self::Processing,
            ProcessingStatus::Completed => Self::Completed,
            ProcessingStatus::Error => Self::Error,
        }
    }
}

/// Drives one document's status from `Pending` to a terminal state.
#[derive(Debug)]
pub struct StatusPoller {
    client: ApiClient,
    endpoint: String,
    config: PollConfig,
    state: PollState,
    attempts: u32,
}

impl StatusPoller {
    pub fn new(client: &ApiClient, document_id: &str, config: PollConfig) -> Self {
        Self {
            client: client.clone(),
            endpoint: super::status_endpoint(document_id),
            config,
            state: PollState::Pending,
            attempts: 0,
        }
    }

    pub const fn state(&self) -> PollState {
        self.state
    }

    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Polls until the document completes or errors, calling `on_update` with every status.
    ///
    /// # Errors
    ///
    /// Once `max_attempts` is reached the poller moves to [`PollState::TimedOut`] and returns
    /// the error of the final attempt, or a `PROCESSING_TIMEOUT` error if that attempt
    /// succeeded with a non-terminal status.
    pub async fn run<F>(&mut self, mut on_update: F) -> Result<DocumentStatus, ApiError>
    where
        F: FnMut(&DocumentStatus),
    {
        while !self.state.is_terminal() {
            self.attempts += 1;
            let outcome = self
                .client
                .api_call::<DocumentStatus>(&self.endpoint, ApiOptions::get())
                .await;

            match outcome {
                Ok(status) => {
                    on_update(&status);
                    self.state = status.status.into();
                    if self.state.is_terminal() {
                        return Ok(status);
                    }
                    if self.attempts >= self.config.max_attempts {
                        self.state = PollState::TimedOut;
                        return Err(self.timeout_error());
                    }
                }
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(attempt = self.attempts, error = %e, "status poll failed");
                    if self.attempts >= self.config.max_attempts {
                        self.state = PollState::TimedOut;
                        return Err(e);
                    }
                }
            }
            tokio::time::sleep(self.config.interval).await;
        }
        Err(self.timeout_error())
    }

    fn timeout_error(&self) -> ApiError {
        ApiError::new(
            408,
            ErrorKind::ProcessingTimeout,
            format!("polling timeout after {} attempts", self.attempts),
        )
        .with_detail("attempts", self.attempts)
    }
}
