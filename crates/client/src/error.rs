//! Client error taxonomy.

use serde_json::Value;
use thiserror::Error;

use visual_erp_core::DomainError;

use crate::transport::TransportError;

/// Result type used by the client crate.
pub type ClientResult<T> = Result<T, ClientError>;

/// Failure of a client operation.
///
/// Retryable variants (`NetworkUnavailable`, `Transient`) are retried by the
/// resource client; everything else surfaces after a single attempt.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClientError {
    /// The backend could not be reached (connection refused, DNS, reset).
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// 5xx response or timeout.
    #[error("transient backend failure: {message}")]
    Transient { status: Option<u16>, message: String },

    /// 401.
    #[error("authentication required: {0}")]
    AuthRequired(String),

    /// 403.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other 4xx (400, 409, 422, ...).
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Client-side validation failed; nothing was sent.
    #[error(transparent)]
    ValidationFailed(#[from] DomainError),

    /// The response body could not be decoded.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// A 2xx response carried `{success: false}`.
    #[error("backend reported failure: {0}")]
    Backend(String),

    /// The login endpoint did not return both a token and a user.
    #[error("login failed: {0}")]
    LoginRejected(String),

    /// A queued request was discarded before it could be replayed.
    #[error("queued request was discarded before replay")]
    QueueDropped,

    /// Durable session storage could not be read or written.
    #[error("session storage error: {0}")]
    Storage(String),
}

impl ClientError {
    /// Map a non-2xx response to a typed error, extracting the backend message
    /// from an `{error|message}` envelope when present.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = error_message(body).unwrap_or_else(|| default_reason(status).to_string());
        match status {
            401 => ClientError::AuthRequired(message),
            403 => ClientError::Forbidden(message),
            404 => ClientError::NotFound(message),
            500..=599 => ClientError::Transient {
                status: Some(status),
                message,
            },
            _ => ClientError::Rejected { status, message },
        }
    }

    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::NetworkUnavailable(_) | ClientError::Transient { .. }
        )
    }

    /// HTTP status behind this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Transient { status, .. } => *status,
            ClientError::AuthRequired(_) => Some(401),
            ClientError::Forbidden(_) => Some(403),
            ClientError::NotFound(_) => Some(404),
            ClientError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message provided by the backend, when the failure came from it.
    ///
    /// `None` when the body carried no message and the text was filled in
    /// from the status code.
    pub fn backend_message(&self) -> Option<&str> {
        let message = match self {
            ClientError::Transient {
                status: Some(_),
                message,
            }
            | ClientError::Rejected { message, .. }
            | ClientError::AuthRequired(message)
            | ClientError::Forbidden(message)
            | ClientError::NotFound(message) => message,
            ClientError::Backend(message) | ClientError::LoginRejected(message) => {
                return Some(message);
            }
            _ => return None,
        };
        match self.status() {
            Some(status) if message == default_reason(status) => None,
            _ => Some(message),
        }
    }

    /// Text suitable for an error banner.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::AuthRequired(_) => "Your session has expired. Please log in again.".into(),
            ClientError::Forbidden(_) => "You do not have permission to perform this action.".into(),
            ClientError::NotFound(_) => "The requested record was not found.".into(),
            ClientError::Transient { status: Some(_), .. } => {
                "The server encountered an error. Please try again later.".into()
            }
            ClientError::Transient { status: None, .. } => {
                "The server took too long to respond. Please try again.".into()
            }
            ClientError::NetworkUnavailable(_) => {
                "Unable to reach the server. Check your connection.".into()
            }
            ClientError::Rejected { message, .. }
            | ClientError::Backend(message)
            | ClientError::LoginRejected(message) => message.clone(),
            ClientError::ValidationFailed(err) => match err {
                DomainError::Validation { message, .. } => message.clone(),
                other => other.to_string(),
            },
            ClientError::Decode(_) => "Unexpected response from the server.".into(),
            ClientError::QueueDropped => {
                "The request was discarded before it could be sent.".into()
            }
            ClientError::Storage(_) => "Could not access local session storage.".into(),
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => ClientError::Transient {
                status: None,
                message: "request timed out".to_string(),
            },
            TransportError::Connect(msg) | TransportError::Other(msg) => {
                ClientError::NetworkUnavailable(msg)
            }
        }
    }
}

/// Extract `message` (preferred) or `error` from a JSON error body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let obj = value.as_object()?;
    ["message", "error"]
        .iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn default_reason(status: u16) -> &'static str {
    match status {
        400 => "bad request",
        401 => "unauthorized",
        403 => "forbidden",
        404 => "not found",
        409 => "conflict",
        422 => "unprocessable entity",
        500..=599 => "server error",
        _ => "request failed",
    }
}

/// Configuration loading failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}
