//! Error types for the alert store transport.

use thiserror::Error;

/// Failure of a single transport call.
///
/// Every variant means the same thing to callers: the fetch or mutation did
/// not take effect. The variant is kept for logging and for the wording of
/// user notices.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Server answered with a non-success status
    #[error("{endpoint} returned HTTP {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// Response body did not match the expected shape
    #[error("Malformed response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// Request never produced a response (connect failure, timeout)
    #[error("Request to {endpoint} failed: {message}")]
    Network {
        endpoint: String,
        message: String,
        timed_out: bool,
    },
}

/// Discriminant of a [`TransportError`], for structured log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Status,
    Decode,
    Network,
}

impl TransportErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Decode => "decode",
            Self::Network => "network",
        }
    }
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TransportError {
    /// Classify an HTTP status and body into a [`TransportError::Status`].
    ///
    /// Django-style `{"error": "..."}` bodies contribute their message;
    /// other bodies are truncated.
    pub fn from_http_status(endpoint: impl Into<String>, status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or_else(|| truncate_body(body));

        TransportError::Status {
            endpoint: endpoint.into(),
            status,
            message,
        }
    }

    /// Create a decode error.
    pub fn decode(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        TransportError::Decode {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a network error.
    pub fn network(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        TransportError::Network {
            endpoint: endpoint.into(),
            message: message.into(),
            timed_out: false,
        }
    }

    /// Map a reqwest failure. Body decode failures become [`TransportError::Decode`].
    pub fn from_reqwest(endpoint: impl Into<String>, err: reqwest::Error) -> Self {
        let endpoint = endpoint.into();
        if err.is_decode() {
            return Self::decode(endpoint, err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::Status {
                endpoint,
                status: status.as_u16(),
                message: err.to_string(),
            };
        }
        TransportError::Network {
            endpoint,
            message: err.to_string(),
            timed_out: err.is_timeout(),
        }
    }

    /// Returns the discriminant.
    pub fn kind(&self) -> TransportErrorKind {
        match self {
            TransportError::Status { .. } => TransportErrorKind::Status,
            TransportError::Decode { .. } => TransportErrorKind::Decode,
            TransportError::Network { .. } => TransportErrorKind::Network,
        }
    }

    /// HTTP status, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Endpoint the failed call targeted.
    pub fn endpoint(&self) -> &str {
        match self {
            TransportError::Status { endpoint, .. }
            | TransportError::Decode { endpoint, .. }
            | TransportError::Network { endpoint, .. } => endpoint,
        }
    }

    /// Short message suitable for a transient status-line notice.
    pub fn friendly_message(&self) -> String {
        match self {
            TransportError::Status { status, .. } if *status == 401 => {
                "Not signed in to the alert server".to_string()
            }
            TransportError::Status { status, .. } if *status == 403 => {
                "Rejected by the alert server (access denied or missing token)".to_string()
            }
            TransportError::Status { status, message, .. } => {
                format!("Server error ({}): {}", status, message)
            }
            TransportError::Decode { .. } => "Unexpected response from the alert server".to_string(),
            TransportError::Network {
                timed_out: true, ..
            } => "Alert server timed out".to_string(),
            TransportError::Network { .. } => "Could not reach the alert server".to_string(),
        }
    }
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    match trimmed.char_indices().nth(120) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

/// Result type for transport calls.
pub type Result<T> = std::result::Result<T, TransportError>;
