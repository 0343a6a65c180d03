use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Processing state reported by the backend for an uploaded document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

/// Response of `GET /api/v1/api/documents/{id}/status`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentStatus {
    pub document_id: String,
    pub status: ProcessingStatus,
    /// Percentage in `[0, 100]`.
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub current_agent: Option<String>,
    #[serde(default)]
    pub agents_completed: Vec<String>,
    #[serde(default)]
    pub agents_pending: Vec<String>,
    #[serde(default)]
    pub results: Map<String, Value>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

/// Response of the XML upload endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub document_id: String,
    #[serde(default)]
    pub message: String,
    /// `initiated`, `processing`, `completed` or `error`.
    pub processing_status: String,
    #[serde(default)]
    pub estimated_completion: Option<String>,
}
