use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The closed set of error classifications surfaced to callers.
///
/// Serialized as the backend's `SCREAMING_SNAKE_CASE` codes (e.g. `"NETWORK_ERROR"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    // transport
    NetworkError,
    TimeoutError,
    ConnectionError,
    // auth
    AuthenticationError,
    AuthorizationError,
    SessionExpired,
    // validation
    ValidationError,
    InvalidInput,
    MissingRequiredField,
    // business rules
    BusinessRuleViolation,
    DuplicateResource,
    ResourceNotFound,
    // server
    ServerError,
    ServiceUnavailable,
    RateLimitExceeded,
    // file processing
    FileTooLarge,
    InvalidFileType,
    FileProcessingError,
    // agents / LLM
    AgentProcessingError,
    LlmServiceError,
    ProcessingTimeout,

    UnknownError,
}

impl ErrorKind {
    /// The wire code for this kind, as emitted by the backend.
    pub const fn as_code(self) -> &'static str {
        match self {
            Self::NetworkError => "NETWORK_ERROR",
            Self::TimeoutError => "TIMEOUT_ERROR",
            Self::ConnectionError => "CONNECTION_ERROR",
            Self::AuthenticationError => "AUTHENTICATION_ERROR",
            Self::AuthorizationError => "AUTHORIZATION_ERROR",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidInput => "INVALID_INPUT",
            Self::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            Self::BusinessRuleViolation => "BUSINESS_RULE_VIOLATION",
            Self::DuplicateResource => "DUPLICATE_RESOURCE",
            Self::ResourceNotFound => "RESOURCE_NOT_FOUND",
            Self::ServerError => "SERVER_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::FileTooLarge => "FILE_TOO_LARGE",
            Self::InvalidFileType => "INVALID_FILE_TYPE",
            Self::FileProcessingError => "FILE_PROCESSING_ERROR",
            Self::AgentProcessingError => "AGENT_PROCESSING_ERROR",
            Self::LlmServiceError => "LLM_SERVICE_ERROR",
            Self::ProcessingTimeout => "PROCESSING_TIMEOUT",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Parses a backend error code, ignoring ASCII case (`missing_required_field` and
    /// `MISSING_REQUIRED_FIELD` are the same kind). Returns `None` for codes outside the taxonomy.
    pub fn from_code(code: &str) -> Option<Self> {
        let kind = match code.to_ascii_uppercase().as_str() {
            "NETWORK_ERROR" => Self::NetworkError,
            "TIMEOUT_ERROR" => Self::TimeoutError,
            "CONNECTION_ERROR" => Self::ConnectionError,
            "AUTHENTICATION_ERROR" => Self::AuthenticationError,
            "AUTHORIZATION_ERROR" => Self::AuthorizationError,
            "SESSION_EXPIRED" => Self::SessionExpired,
            "VALIDATION_ERROR" => Self::ValidationError,
            "INVALID_INPUT" => Self::InvalidInput,
            "MISSING_REQUIRED_FIELD" => Self::MissingRequiredField,
            "BUSINESS_RULE_VIOLATION" => Self::BusinessRuleViolation,
            "DUPLICATE_RESOURCE" => Self::DuplicateResource,
            "RESOURCE_NOT_FOUND" => Self::ResourceNotFound,
            "SERVER_ERROR" => Self::ServerError,
            "SERVICE_UNAVAILABLE" => Self::ServiceUnavailable,
            "RATE_LIMIT_EXCEEDED" => Self::RateLimitExceeded,
            "FILE_TOO_LARGE" => Self::FileTooLarge,
            "INVALID_FILE_TYPE" => Self::InvalidFileType,
            "FILE_PROCESSING_ERROR" => Self::FileProcessingError,
            "AGENT_PROCESSING_ERROR" => Self::AgentProcessingError,
            "LLM_SERVICE_ERROR" => Self::LlmServiceError,
            "PROCESSING_TIMEOUT" => Self::ProcessingTimeout,
            "UNKNOWN_ERROR" => Self::UnknownError,
            _ => return None,
        };
        Some(kind)
    }

    /// Localized (pt-BR) message suitable for display in the dashboard.
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::NetworkError => {
                "Problema de conexão com o servidor. Verifique sua internet e tente novamente."
            }
            Self::TimeoutError => "A operação demorou muito para responder. Tente novamente.",
            Self::ConnectionError => {
                "Não foi possível conectar ao servidor. Tente novamente em alguns instantes."
            }
            Self::AuthenticationError => "Credenciais inválidas. Verifique seu login e senha.",
            Self::AuthorizationError => "Você não tem permissão para realizar esta ação.",
            Self::SessionExpired => "Sua sessão expirou. Faça login novamente.",
            Self::ValidationError => "Dados inválidos. Verifique os campos preenchidos.",
            Self::InvalidInput => "Formato de dados inválido. Verifique as informações inseridas.",
            Self::MissingRequiredField => "Campos obrigatórios não preenchidos.",
            Self::BusinessRuleViolation => "Operação não permitida pelas regras de negócio.",
            Self::DuplicateResource => "Este recurso já existe no sistema.",
            Self::ResourceNotFound => "Recurso não encontrado.",
            Self::ServerError => "Erro interno do servidor. Nossa equipe foi notificada.",
            Self::ServiceUnavailable => {
                "Serviço temporariamente indisponível. Tente novamente em alguns minutos."
            }
            Self::RateLimitExceeded => {
                "Muitas requisições. Aguarde um momento antes de tentar novamente."
            }
            Self::FileTooLarge => "Arquivo muito grande. O tamanho máximo permitido é 10MB.",
            Self::InvalidFileType => {
                "Tipo de arquivo não suportado. Apenas arquivos XML são aceitos."
            }
            Self::FileProcessingError => {
                "Erro ao processar o arquivo. Verifique se o formato está correto."
            }
            Self::AgentProcessingError => "Erro no processamento pelos agentes IA. Tente novamente.",
            Self::LlmServiceError => "Serviço de IA temporariamente indisponível.",
            Self::ProcessingTimeout => {
                "Processamento demorou muito. O arquivo pode estar sendo processado em segundo plano."
            }
            Self::UnknownError => {
                "Erro inesperado. Tente novamente ou entre em contato com o suporte."
            }
        }
    }

    /// Maps an HTTP status code onto the taxonomy.
    pub const fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::ValidationError,
            401 => Self::AuthenticationError,
            403 => Self::AuthorizationError,
            404 => Self::ResourceNotFound,
            408 | 504 => Self::TimeoutError,
            409 => Self::DuplicateResource,
            413 => Self::FileTooLarge,
            415 => Self::InvalidFileType,
            429 => Self::RateLimitExceeded,
            500 => Self::ServerError,
            502 | 503 => Self::ServiceUnavailable,
            400..=499 => Self::ValidationError,
            500..=599 => Self::ServerError,
            _ => Self::UnknownError,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

/// A failure as observed on the wire, before classification.
///
/// Custom [`Transport`](crate::core::Transport) implementations report failures through
/// this type; the request layer turns it into an [`ApiError`] via [`handle_api_error`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// An error raised by the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The attempt was cancelled because it exceeded its timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// DNS resolution or TCP connect failed; no response was received.
    #[error("network failure: {0}")]
    Network(String),

    /// The request was sent but no response arrived.
    #[error("no response received: {0}")]
    NoResponse(String),

    /// The server answered with a non-success status code.
    #[error("Unexpected response status: {status} at {url}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The URL that returned the error.
        url: String,
        /// The decoded JSON body, when the server sent one.
        body: Option<Value>,
    },

    /// A provided URL could not be parsed.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The response body was not in the expected format.
    #[error("Data format unexpected: {0}")]
    Data(String),
}

/// A classified request failure.
///
/// Every failure leaving the request layer is an `ApiError`: it carries the HTTP status
/// (0 when no response was received), a closed [`ErrorKind`], a message and free-form details.
#[derive(Clone, Debug, PartialEq, Error, Serialize)]
#[error("{kind} ({status}): {message}")]
pub struct ApiError {
    status: u16,
    #[serde(rename = "code")]
    kind: ErrorKind,
    message: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    details: Map<String, Value>,
}

impl ApiError {
    /// Builds an error with an explicit message.
    pub fn new(status: u16, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
            details: Map::new(),
        }
    }

    /// Builds an error whose message is the localized message of `kind`.
    pub fn from_kind(status: u16, kind: ErrorKind) -> Self {
        Self::new(status, kind, kind.user_message())
    }

    /// Returns a copy of this error with one more detail entry.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub const fn status(&self) -> u16 {
        self.status
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn details(&self) -> &Map<String, Value> {
        &self.details
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }
}

impl From<TransportError> for ApiError {
    fn from(e: TransportError) -> Self {
        handle_api_error(e)
    }
}

/// Classifies a raw transport failure into an [`ApiError`].
///
/// Status codes are mapped through [`ErrorKind::from_status`]; an application error code or
/// message in the response body takes precedence over the generic mapping.
pub fn handle_api_error(error: TransportError) -> ApiError {
    match error {
        TransportError::Timeout(after) => ApiError::from_kind(408, ErrorKind::TimeoutError)
            .with_detail("timeout_ms", duration_ms(after)),
        TransportError::Network(reason) => {
            ApiError::from_kind(0, ErrorKind::NetworkError).with_detail("cause", reason)
        }
        TransportError::NoResponse(reason) => {
            ApiError::from_kind(0, ErrorKind::ConnectionError).with_detail("cause", reason)
        }
        TransportError::Status { status, url, body } => classify_response(status, &url, body),
        TransportError::Http(e) => classify_reqwest(&e),
        TransportError::Url(e) => ApiError::new(500, ErrorKind::UnknownError, e.to_string()),
        TransportError::Data(reason) => ApiError::new(500, ErrorKind::UnknownError, reason),
    }
}

fn classify_reqwest(e: &reqwest::Error) -> ApiError {
    let cause = e.to_string();
    if e.is_timeout() {
        return ApiError::from_kind(408, ErrorKind::TimeoutError).with_detail("cause", cause);
    }
    if let Some(status) = e.status() {
        let url = e.url().map(url::Url::to_string).unwrap_or_default();
        return classify_response(status.as_u16(), &url, None);
    }
    if e.is_connect() {
        return ApiError::from_kind(0, ErrorKind::NetworkError).with_detail("cause", cause);
    }
    if e.is_decode() || e.is_builder() {
        return ApiError::new(500, ErrorKind::UnknownError, cause);
    }
    ApiError::from_kind(0, ErrorKind::ConnectionError).with_detail("cause", cause)
}

fn classify_response(status: u16, url: &str, body: Option<Value>) -> ApiError {
    let mut kind = ErrorKind::from_status(status);
    let mut message = kind.user_message().to_string();
    let mut details = Map::new();
    details.insert("url".into(), Value::String(url.to_string()));

    if let Some(body) = body {
        let found = ServerOverride::extract(&body);
        if let Some(code) = found.code {
            match ErrorKind::from_code(&code) {
                Some(k) => {
                    kind = k;
                    message = k.user_message().to_string();
                }
                None => {
                    details.insert("server_code".into(), Value::String(code));
                }
            }
        }
        if let Some(m) = found.message {
            message = m;
        }
        if let Some(d) = found.details {
            details.insert("server_details".into(), d);
        }
        details.insert("response".into(), body);
    }

    ApiError {
        status,
        kind,
        message,
        details,
    }
}

/// Application-level error information carried in a response body.
#[derive(Default)]
struct ServerOverride {
    code: Option<String>,
    message: Option<String>,
    details: Option<Value>,
}

impl ServerOverride {
    // Accepts the flat `{codigo_erro, mensagem}` shape and the `{"error": {code, message}}` envelope.
    fn extract(body: &Value) -> Self {
        let Some(obj) = body.as_object() else {
            return Self::default();
        };
        let text = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);

        let mut out = Self {
            code: text("codigo_erro"),
            message: text("mensagem")
                .or_else(|| text("message"))
                .or_else(|| text("error")),
            details: None,
        };

        if let Some(envelope) = obj.get("error").and_then(Value::as_object) {
            let inner = |key: &str| envelope.get(key).and_then(Value::as_str).map(str::to_string);
            out.code = out.code.or_else(|| inner("code"));
            out.message = out.message.or_else(|| inner("message"));
            out.details = envelope.get("details").cloned();
        }
        out
    }
}

/// The message to show a user for `error`. Never the raw technical text.
pub fn user_friendly_message(error: &ApiError) -> &'static str {
    error.kind().user_message()
}

pub(crate) fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
